//! Trait seams over the GOG backend calls.
//!
//! The library and metadata layers consume these traits rather than
//! [`GogApi`] directly, so tests can substitute scripted backends.

use async_trait::async_trait;

use crate::auth::Credentials;
use crate::client::{ApiError, GogApi};
use crate::models::{GamesDbRecord, RegistryResponse, ReviewScore, StoreProduct};

/// The release registry: the authoritative list of what a user owns.
#[async_trait]
pub trait ReleaseRegistry: Send + Sync {
    /// Fetch the user's releases, revalidating against a cached ETag.
    async fn fetch_releases(
        &self,
        credentials: &Credentials,
        etag: Option<&str>,
    ) -> Result<RegistryResponse, ApiError>;
}

/// The per-release metadata services (GamesDB, storefront, reviews).
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn games_db(
        &self,
        platform_id: &str,
        external_id: &str,
        certificate: Option<&str>,
    ) -> Result<GamesDbRecord, ApiError>;

    async fn store_product(&self, external_id: &str) -> Result<StoreProduct, ApiError>;

    async fn review_score(&self, external_id: &str) -> Result<ReviewScore, ApiError>;
}

#[async_trait]
impl ReleaseRegistry for GogApi {
    async fn fetch_releases(
        &self,
        credentials: &Credentials,
        etag: Option<&str>,
    ) -> Result<RegistryResponse, ApiError> {
        GogApi::fetch_releases(self, credentials, etag).await
    }
}

#[async_trait]
impl MetadataSource for GogApi {
    async fn games_db(
        &self,
        platform_id: &str,
        external_id: &str,
        certificate: Option<&str>,
    ) -> Result<GamesDbRecord, ApiError> {
        GogApi::games_db(self, platform_id, external_id, certificate).await
    }

    async fn store_product(&self, external_id: &str) -> Result<StoreProduct, ApiError> {
        GogApi::store_product(self, external_id).await
    }

    async fn review_score(&self, external_id: &str) -> Result<ReviewScore, ApiError> {
        GogApi::review_score(self, external_id).await
    }
}
