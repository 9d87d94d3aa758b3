//! GamesDB image URL template handling.
//!
//! GamesDB returns image URLs as templates with `{formatter}` and
//! `{ext}` placeholders, e.g.
//! `https://images.gog.com/<hash>_{formatter}.{ext}?namespace=gamesdb`.
//! The formatter selects a server-side resize profile; an empty
//! formatter yields the original asset.

/// File extension requested for all GamesDB artwork.
pub const IMAGE_EXTENSION: &str = "webp";

/// Expand a GamesDB URL template into a concrete image URL.
///
/// The formatter placeholder is dropped (original size) and the
/// extension is fixed to [`IMAGE_EXTENSION`]. Templates join the
/// formatter with a `_` separator, which must go too, otherwise the
/// expanded URL ends in a dangling `_.webp`.
pub fn expand_image_url(url_format: &str) -> String {
    url_format
        .replace("_{formatter}", "")
        .replace("{formatter}", "")
        .replace("{ext}", IMAGE_EXTENSION)
}
