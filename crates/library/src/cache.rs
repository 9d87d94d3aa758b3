//! The persisted library snapshot and its conditional-refresh logic.
//!
//! The snapshot (entry list + ETag) lives in one JSON document that is
//! replaced wholesale on every fresh registry response. The items and
//! the validator never move independently: a `304 Not Modified` keeps
//! both, a `200` replaces both.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use galaxy_core::types::{LibraryEntry, LibrarySnapshot};
use galaxy_gog::client::ApiError;
use galaxy_gog::models::RegistryResponse;

/// File name of the snapshot document inside the config directory.
pub const SNAPSHOT_FILE: &str = "galaxy-library.json";

/// Where the library snapshot is persisted between sessions.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the stored snapshot bytes, `None` when nothing was stored yet.
    async fn read(&self) -> io::Result<Option<Vec<u8>>>;

    /// Replace the stored snapshot bytes.
    async fn write(&self, bytes: &[u8]) -> io::Result<()>;
}

/// [`SnapshotStore`] backed by a JSON file in the config directory.
pub struct FsSnapshotStore {
    path: PathBuf,
}

impl FsSnapshotStore {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            path: config_dir.as_ref().join(SNAPSHOT_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotStore for FsSnapshotStore {
    async fn read(&self) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, bytes).await
    }
}

/// In-memory library state plus its on-disk mirror.
pub struct LibraryCache {
    store: Box<dyn SnapshotStore>,
    snapshot: LibrarySnapshot,
}

impl LibraryCache {
    /// Load the cache from the store.
    ///
    /// A missing, unreadable, or corrupt snapshot is not fatal: the cache
    /// starts empty (no ETag offered) and the next sync rebuilds it from
    /// a full registry response.
    pub async fn load(store: impl SnapshotStore + 'static) -> Self {
        let snapshot = match store.read().await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    tracing::warn!(error = %e, "Stored library snapshot is corrupt, starting empty");
                    LibrarySnapshot::default()
                }
            },
            Ok(None) => LibrarySnapshot::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored library snapshot, starting empty");
                LibrarySnapshot::default()
            }
        };

        Self {
            store: Box::new(store),
            snapshot,
        }
    }

    /// Cached entries, in registry order.
    pub fn entries(&self) -> &[LibraryEntry] {
        &self.snapshot.items
    }

    /// The validator the cached entries came from.
    pub fn etag(&self) -> Option<&str> {
        self.snapshot.etag.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.items.is_empty()
    }

    /// Revalidate the snapshot against the registry.
    ///
    /// `fetch` receives the cached ETag to offer upstream. On
    /// [`RegistryResponse::NotModified`] the snapshot is kept and nothing
    /// is written; on [`RegistryResponse::Fresh`] items and ETag are
    /// replaced together and persisted. A fetch error leaves the snapshot
    /// untouched.
    pub async fn sync<F, Fut>(&mut self, fetch: F) -> Result<&[LibraryEntry], ApiError>
    where
        F: FnOnce(Option<String>) -> Fut,
        Fut: Future<Output = Result<RegistryResponse, ApiError>>,
    {
        let offered = self.snapshot.etag.clone();
        match fetch(offered).await? {
            RegistryResponse::NotModified => {
                tracing::debug!(
                    items = self.snapshot.items.len(),
                    "Library registry unchanged"
                );
            }
            RegistryResponse::Fresh { items, etag } => {
                tracing::info!(items = items.len(), "Library registry refreshed");
                self.snapshot = LibrarySnapshot { items, etag };
                self.persist().await;
            }
        }
        Ok(&self.snapshot.items)
    }

    /// Write the snapshot out. A persistence failure is logged, not
    /// surfaced: the in-memory state is already current and the next
    /// fresh response retries the write.
    async fn persist(&self) {
        let bytes =
            serde_json::to_vec(&self.snapshot).expect("LibrarySnapshot is always serialisable");
        if let Err(e) = self.store.write(&bytes).await {
            tracing::warn!(error = %e, "Failed to persist library snapshot");
        }
    }
}
