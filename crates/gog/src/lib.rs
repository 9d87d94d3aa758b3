//! GOG web service client library.
//!
//! Wraps the handful of GOG endpoints the client backend talks to: the
//! library registry (owned releases with ETag revalidation), GamesDB
//! (game metadata), the storefront product API, the review-score
//! service, and presence. Credentials come from an external `gogdl`
//! helper process wrapped by [`auth::GogdlCredentialProvider`].

pub mod auth;
pub mod client;
pub mod endpoints;
pub mod models;
pub mod source;
