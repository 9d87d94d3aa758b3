//! Library synchronization against the GOG release registry.

use std::collections::HashMap;
use std::sync::Arc;

use galaxy_core::types::LibraryEntry;
use galaxy_gog::auth::{AuthError, CredentialProvider};
use galaxy_gog::client::ApiError;
use galaxy_gog::source::ReleaseRegistry;
use tokio::sync::Mutex;

use crate::cache::LibraryCache;

/// Errors from a library import.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No user is logged in; the registry cannot be queried.
    #[error("not logged in to GOG")]
    Unauthenticated,

    /// The credential helper failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The registry request failed and no cached library could stand in.
    #[error(transparent)]
    Registry(#[from] ApiError),
}

/// Keeps the local library in step with the GOG release registry.
pub struct LibrarySynchronizer {
    credentials: Arc<dyn CredentialProvider>,
    registry: Arc<dyn ReleaseRegistry>,
    /// Guards the whole fetch-compare-persist cycle: overlapping imports
    /// serialize rather than interleave snapshot writes.
    cache: Mutex<LibraryCache>,
}

impl LibrarySynchronizer {
    pub fn new(
        credentials: Arc<dyn CredentialProvider>,
        registry: Arc<dyn ReleaseRegistry>,
        cache: LibraryCache,
    ) -> Self {
        Self {
            credentials,
            registry,
            cache: Mutex::new(cache),
        }
    }

    /// Import the user's library and return the composite release key of
    /// every owned entry, in registry order.
    ///
    /// Syncs the snapshot against the registry first. When the registry
    /// is unreachable but a previous snapshot exists, the import degrades
    /// to the cached entries with a warning; with nothing cached the
    /// failure propagates.
    pub async fn import_library(&self) -> Result<Vec<String>, SyncError> {
        let credentials = self
            .credentials
            .credentials()
            .await?
            .ok_or(SyncError::Unauthenticated)?;

        let mut cache = self.cache.lock().await;
        let registry = Arc::clone(&self.registry);
        let sync_error = cache
            .sync(|etag| async move {
                registry
                    .fetch_releases(&credentials, etag.as_deref())
                    .await
            })
            .await
            .err();

        if let Some(error) = sync_error {
            if cache.is_empty() {
                return Err(error.into());
            }
            tracing::warn!(error = %error, "Library sync failed, serving the cached library");
        }

        Ok(cache
            .entries()
            .iter()
            .map(LibraryEntry::release_key)
            .collect())
    }

    /// The cached entries, without touching the network.
    pub async fn cached_entries(&self) -> Vec<LibraryEntry> {
        self.cache.lock().await.entries().to_vec()
    }

    /// The cached entries indexed by their composite release key.
    pub async fn entries_by_key(&self) -> HashMap<String, LibraryEntry> {
        self.cache
            .lock()
            .await
            .entries()
            .iter()
            .map(|entry| (entry.release_key(), entry.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::Mutex as StdMutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use galaxy_gog::auth::Credentials;
    use galaxy_gog::models::RegistryResponse;

    use crate::cache::SnapshotStore;

    use super::*;

    struct StaticCredentials(Option<Credentials>);

    #[async_trait]
    impl CredentialProvider for StaticCredentials {
        async fn credentials(&self) -> Result<Option<Credentials>, AuthError> {
            Ok(self.0.clone())
        }

        async fn finish_login(&self, _code: &str) -> Result<(), AuthError> {
            Ok(())
        }
    }

    /// Registry answering from a queue of scripted responses, recording
    /// the ETag offered on each call.
    #[derive(Default)]
    struct ScriptedRegistry {
        responses: StdMutex<VecDeque<Result<RegistryResponse, ApiError>>>,
        offered_etags: StdMutex<Vec<Option<String>>>,
    }

    impl ScriptedRegistry {
        fn push(&self, response: Result<RegistryResponse, ApiError>) {
            self.responses.lock().unwrap().push_back(response);
        }
    }

    #[async_trait]
    impl ReleaseRegistry for ScriptedRegistry {
        async fn fetch_releases(
            &self,
            _credentials: &Credentials,
            etag: Option<&str>,
        ) -> Result<RegistryResponse, ApiError> {
            self.offered_etags
                .lock()
                .unwrap()
                .push(etag.map(str::to_string));
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected registry call")
        }
    }

    /// Store that never has anything and accepts every write.
    struct NullStore;

    #[async_trait]
    impl SnapshotStore for NullStore {
        async fn read(&self) -> io::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        async fn write(&self, _bytes: &[u8]) -> io::Result<()> {
            Ok(())
        }
    }

    fn credentials() -> Credentials {
        Credentials {
            access_token: "at".to_string(),
            refresh_token: None,
            user_id: "123".to_string(),
            expires_in: Some(3600),
            login_time: Some(9_999_999_999_999),
            token_type: None,
            scope: None,
            session_id: None,
        }
    }

    fn entry(platform_id: &str, external_id: &str) -> LibraryEntry {
        LibraryEntry {
            platform_id: platform_id.to_string(),
            external_id: external_id.to_string(),
            certificate: None,
            owned_since: None,
            date_created: None,
            hidden: false,
        }
    }

    async fn synchronizer(
        logged_in: bool,
        registry: Arc<ScriptedRegistry>,
    ) -> LibrarySynchronizer {
        let creds = if logged_in {
            Some(credentials())
        } else {
            None
        };
        LibrarySynchronizer::new(
            Arc::new(StaticCredentials(creds)),
            registry,
            LibraryCache::load(NullStore).await,
        )
    }

    #[tokio::test]
    async fn import_returns_release_keys_in_registry_order() {
        let registry = Arc::new(ScriptedRegistry::default());
        registry.push(Ok(RegistryResponse::Fresh {
            items: vec![entry("gog", "1207658924"), entry("steam", "377160")],
            etag: Some("W/\"v1\"".to_string()),
        }));
        let sync = synchronizer(true, Arc::clone(&registry)).await;

        let keys = sync.import_library().await.expect("import succeeds");
        assert_eq!(keys, vec!["gog_1207658924", "steam_377160"]);

        // The next import offers the stored validator upstream.
        registry.push(Ok(RegistryResponse::NotModified));
        let keys = sync.import_library().await.expect("revalidation succeeds");
        assert_eq!(keys, vec!["gog_1207658924", "steam_377160"]);

        let offered = registry.offered_etags.lock().unwrap().clone();
        assert_eq!(offered, vec![None, Some("W/\"v1\"".to_string())]);
    }

    #[tokio::test]
    async fn import_without_login_is_unauthenticated() {
        let registry = Arc::new(ScriptedRegistry::default());
        let sync = synchronizer(false, registry).await;

        let result = sync.import_library().await;
        assert_matches!(result, Err(SyncError::Unauthenticated));
    }

    #[tokio::test]
    async fn registry_failure_falls_back_to_the_cached_library() {
        let registry = Arc::new(ScriptedRegistry::default());
        registry.push(Ok(RegistryResponse::Fresh {
            items: vec![entry("gog", "1")],
            etag: Some("W/\"v1\"".to_string()),
        }));
        registry.push(Err(ApiError::ApiError {
            status: 503,
            body: "down".to_string(),
        }));
        let sync = synchronizer(true, Arc::clone(&registry)).await;

        sync.import_library().await.expect("warm-up import");
        let keys = sync.import_library().await.expect("fallback to cache");
        assert_eq!(keys, vec!["gog_1"]);
    }

    #[tokio::test]
    async fn registry_failure_with_a_cold_cache_propagates() {
        let registry = Arc::new(ScriptedRegistry::default());
        registry.push(Err(ApiError::ApiError {
            status: 503,
            body: "down".to_string(),
        }));
        let sync = synchronizer(true, registry).await;

        let result = sync.import_library().await;
        assert_matches!(result, Err(SyncError::Registry(_)));
    }

    #[tokio::test]
    async fn entries_by_key_indexes_the_cached_library() {
        let registry = Arc::new(ScriptedRegistry::default());
        registry.push(Ok(RegistryResponse::Fresh {
            items: vec![entry("gog", "1"), entry("epic", "fn_live")],
            etag: None,
        }));
        let sync = synchronizer(true, registry).await;
        sync.import_library().await.expect("import succeeds");

        let by_key = sync.entries_by_key().await;
        assert_eq!(by_key.len(), 2);
        assert_eq!(by_key["epic_fn_live"].external_id, "fn_live");
        assert_eq!(sync.cached_entries().await.len(), 2);
    }
}
