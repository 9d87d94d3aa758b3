//! Library entry and snapshot types shared across the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform id GOG assigns to its own store releases.
///
/// Storefront and review lookups only make sense for this platform;
/// entries imported from other launchers (`steam`, `epic`, ...) carry
/// GamesDB metadata at most.
pub const GOG_PLATFORM: &str = "gog";

/// Build the composite release key the UI uses to address a game.
///
/// The key is `{platform_id}_{external_id}`, e.g. `gog_1207658924`.
pub fn join_release_key(platform_id: &str, external_id: &str) -> String {
    format!("{platform_id}_{external_id}")
}

/// Split a composite release key back into `(platform_id, external_id)`.
///
/// Splits on the *first* underscore only, so external ids that themselves
/// contain underscores survive a round trip. Returns `None` when the key
/// has no underscore or either side is empty.
pub fn split_release_key(key: &str) -> Option<(&str, &str)> {
    key.split_once('_')
        .filter(|(platform_id, external_id)| !platform_id.is_empty() && !external_id.is_empty())
}

/// A single owned release as reported by the GOG library registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    /// Platform the release belongs to (`gog`, `steam`, `epic`, ...).
    pub platform_id: String,
    /// Identifier of the release within its platform.
    pub external_id: String,
    /// Per-entry certificate forwarded to GamesDB lookups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    /// When the user acquired the release, if the registry knows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owned_since: Option<DateTime<Utc>>,
    /// When the entry was first added to the user's library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<DateTime<Utc>>,
    /// Whether the user hid the release from their library view.
    #[serde(default)]
    pub hidden: bool,
}

impl LibraryEntry {
    /// Composite key for this entry, `{platform_id}_{external_id}`.
    pub fn release_key(&self) -> String {
        join_release_key(&self.platform_id, &self.external_id)
    }
}

/// The cached library state: the last entry list together with the
/// validator that produced it.
///
/// The two fields always move together. A fresh registry response
/// replaces both; a `304 Not Modified` leaves both untouched. This is
/// also the exact document persisted to disk between sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibrarySnapshot {
    /// Owned releases in registry order.
    #[serde(default)]
    pub items: Vec<LibraryEntry>,
    /// ETag of the registry response the items came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn release_key_round_trips() {
        let key = join_release_key("gog", "1207658924");
        assert_eq!(key, "gog_1207658924");
        assert_eq!(split_release_key(&key), Some(("gog", "1207658924")));
    }

    #[test]
    fn split_uses_first_underscore_only() {
        // External ids may contain underscores; only the platform
        // separator is structural.
        let key = join_release_key("epic", "fn_live_eu");
        assert_eq!(split_release_key(&key), Some(("epic", "fn_live_eu")));
    }

    #[test]
    fn split_rejects_malformed_keys() {
        assert_eq!(split_release_key("gog1234"), None);
        assert_eq!(split_release_key("_1234"), None);
        assert_eq!(split_release_key("gog_"), None);
        assert_eq!(split_release_key(""), None);
    }

    #[test]
    fn entry_release_key_matches_join() {
        assert_eq!(entry("steam", "377160").release_key(), "steam_377160");
    }

    #[test]
    fn entry_deserializes_with_optional_fields_missing() {
        let parsed: LibraryEntry = serde_json::from_str(
            r#"{"platform_id": "gog", "external_id": "1207658924"}"#,
        )
        .expect("minimal entry should parse");
        assert_eq!(parsed, entry("gog", "1207658924"));
    }

    #[test]
    fn snapshot_omits_etag_when_absent() {
        let snapshot = LibrarySnapshot {
            items: vec![entry("gog", "1")],
            etag: None,
        };
        let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
        assert!(!json.contains("etag"));

        let restored: LibrarySnapshot =
            serde_json::from_str(&json).expect("snapshot round trips");
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn snapshot_round_trips_with_etag() {
        let snapshot = LibrarySnapshot {
            items: vec![entry("gog", "1"), entry("steam", "2")],
            etag: Some("W/\"abc123\"".to_string()),
        };
        let json = serde_json::to_string(&snapshot).expect("snapshot serializes");
        let restored: LibrarySnapshot =
            serde_json::from_str(&json).expect("snapshot round trips");
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn entry_parses_registry_timestamps() {
        let parsed: LibraryEntry = serde_json::from_str(
            r#"{
                "platform_id": "gog",
                "external_id": "1207658924",
                "owned_since": "2020-08-12T13:20:23+03:00",
                "date_created": "2020-08-12T10:20:23Z",
                "hidden": true
            }"#,
        )
        .expect("timestamped entry should parse");
        assert!(parsed.hidden);
        // Offsets are normalised to UTC on the way in.
        assert_eq!(parsed.owned_since, parsed.date_created);
    }
}
