//! Fan-out aggregation of per-release metadata.
//!
//! For each requested release the aggregator queries the upstream
//! services the requested pieces need, concurrently, then maps the
//! fetched records through the resolver. Batch requests are resolved
//! in fixed-size chunks so results stream to the UI while later chunks
//! are still in flight, and so upstream load stays bounded.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use galaxy_core::pieces;
use galaxy_core::types::{split_release_key, LibraryEntry, GOG_PLATFORM};
use galaxy_gog::source::MetadataSource;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::resolver::{self, RawRecords, ResolveContext};

/// Releases resolved concurrently per delivered chunk.
pub const PIECE_CHUNK_SIZE: usize = 10;

/// Aggregates upstream metadata into piece responses.
pub struct MetadataAggregator {
    source: Arc<dyn MetadataSource>,
}

impl MetadataAggregator {
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        Self { source }
    }

    /// Resolve the requested pieces for one release.
    ///
    /// A malformed release key yields an empty map, never an error. Each
    /// upstream failure is logged and degrades to an absent record; the
    /// pieces it backs are simply left out of the result.
    pub async fn resolve_pieces(
        &self,
        release_key: &str,
        piece_ids: &[String],
        entry: Option<&LibraryEntry>,
    ) -> Map<String, Value> {
        let Some((platform_id, external_id)) = split_release_key(release_key) else {
            tracing::warn!(release_key, "Malformed release key requested");
            return Map::new();
        };

        let records = self
            .fetch_records(platform_id, external_id, entry, piece_ids)
            .await;
        let context = ResolveContext {
            platform_id,
            external_id,
            entry,
        };

        let mut resolved = Map::new();
        for piece_id in piece_ids {
            if let Some(value) = resolver::resolve(piece_id, &records, &context) {
                resolved.insert(piece_id.clone(), value);
            }
        }
        resolved
    }

    /// Fetch the upstream records one release needs, concurrently.
    ///
    /// GamesDB answers for owned entries (the per-entry certificate
    /// authorizes the lookup); the storefront and review services only
    /// know GOG's own releases, and the review score is skipped unless
    /// the request actually asks for it.
    async fn fetch_records(
        &self,
        platform_id: &str,
        external_id: &str,
        entry: Option<&LibraryEntry>,
        piece_ids: &[String],
    ) -> RawRecords {
        let want_store = platform_id == GOG_PLATFORM;
        let want_reviews =
            want_store && piece_ids.iter().any(|id| id == pieces::REVIEW_SCORE);

        let games_db = async {
            let entry = entry?;
            match self
                .source
                .games_db(platform_id, external_id, entry.certificate.as_deref())
                .await
            {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(platform_id, external_id, error = %e, "GamesDB lookup failed");
                    None
                }
            }
        };
        let store = async {
            if !want_store {
                return None;
            }
            match self.source.store_product(external_id).await {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(external_id, error = %e, "Storefront lookup failed");
                    None
                }
            }
        };
        let reviews = async {
            if !want_reviews {
                return None;
            }
            match self.source.review_score(external_id).await {
                Ok(score) => Some(score),
                Err(e) => {
                    tracing::warn!(external_id, error = %e, "Review score lookup failed");
                    None
                }
            }
        };

        let (games_db, store, reviews) = tokio::join!(games_db, store, reviews);
        RawRecords {
            games_db,
            store,
            reviews,
        }
    }

    /// Resolve pieces for a whole batch of releases, streaming results.
    ///
    /// Releases are processed in [`PIECE_CHUNK_SIZE`] chunks; within a
    /// chunk all releases resolve concurrently, and the chunk's merged
    /// map is delivered on `tx` before the next chunk starts. A dropped
    /// receiver stops the batch quietly.
    pub async fn resolve_batch(
        &self,
        release_keys: &[String],
        piece_ids: &[String],
        entries: &HashMap<String, LibraryEntry>,
        tx: mpsc::Sender<HashMap<String, Value>>,
    ) {
        for chunk in release_keys.chunks(PIECE_CHUNK_SIZE) {
            let resolved = join_all(chunk.iter().map(|release_key| async move {
                let entry = entries.get(release_key);
                let pieces = self.resolve_pieces(release_key, piece_ids, entry).await;
                (release_key.clone(), Value::Object(pieces))
            }))
            .await;

            let payload: HashMap<String, Value> = resolved.into_iter().collect();
            if tx.send(payload).await.is_err() {
                tracing::debug!("Piece consumer went away, stopping batch resolution");
                return;
            }
        }
    }
}
