//! Shared domain types for the Galaxy client backend.
//!
//! Defines the library entry and snapshot model, release key handling,
//! the piece-id vocabulary understood by the metadata layer, and the
//! GamesDB image URL template helpers. Everything here is plain data;
//! network and persistence concerns live in the `galaxy-gog` and
//! `galaxy-library` crates.

pub mod images;
pub mod pieces;
pub mod types;
