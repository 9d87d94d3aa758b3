//! `galaxy-shell` library crate.
//!
//! The backend half of the desktop client: parses commands from the
//! embedded GOG Galaxy UI, drives library imports and metadata
//! resolution, and produces the callback messages the UI consumes.
//! The binary entrypoint lives in `main.rs`.

pub mod commands;
pub mod config;
pub mod dispatch;
pub mod presence;
pub mod settings;
