//! Library state and metadata aggregation.
//!
//! Keeps the user's game library in step with the GOG release registry
//! (ETag-revalidated, persisted between sessions) and aggregates
//! per-release metadata from the upstream services into the piece
//! responses the UI consumes.

pub mod aggregator;
pub mod cache;
pub mod resolver;
pub mod sync;
