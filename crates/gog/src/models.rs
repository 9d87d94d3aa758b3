//! Typed payloads for the GOG web services.
//!
//! Each upstream returns a differently-shaped JSON document. The structs
//! here keep the fields the metadata resolver actually reads strongly
//! typed and tolerate everything else: optional fields default, deep
//! pass-through data (developer lists, release arrays) stays
//! [`serde_json::Value`]. A record that parses with most fields missing
//! is still usable -- the resolver treats absent fields as absent pieces.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use galaxy_core::types::LibraryEntry;

/// One page of the library registry response.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryPage {
    /// Owned releases in registry order.
    pub items: Vec<LibraryEntry>,
}

/// Outcome of a conditional GET against the library registry.
#[derive(Debug, Clone)]
pub enum RegistryResponse {
    /// The offered ETag still matches; the caller's cached items are current.
    NotModified,
    /// A fresh item list, together with the validator that produced it.
    Fresh {
        items: Vec<LibraryEntry>,
        /// `ETag` response header, when the registry sent one.
        etag: Option<String>,
    },
}

/// GamesDB external-release record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamesDbRecord {
    #[serde(default)]
    pub game: GamesDbGame,
    /// Per-release OS support list, passed through to the UI verbatim.
    #[serde(default)]
    pub supported_operating_systems: Value,
}

/// The `game` object nested in a GamesDB record.
///
/// Localized text fields are maps keyed by locale; GamesDB always
/// includes a `"*"` entry carrying the default-locale value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamesDbGame {
    #[serde(default)]
    pub title: HashMap<String, String>,
    #[serde(default)]
    pub sorting_title: HashMap<String, String>,
    /// Release classification (`game`, `dlc`, ...).
    #[serde(rename = "type", default)]
    pub game_type: Option<String>,
    #[serde(default)]
    pub visible_in_library: Option<bool>,
    #[serde(default)]
    pub first_release_date: Option<String>,
    #[serde(default)]
    pub developers: Value,
    #[serde(default)]
    pub publishers: Value,
    #[serde(default)]
    pub genres: Value,
    #[serde(default)]
    pub themes: Value,
    #[serde(default)]
    pub releases: Value,
    /// Aggregated critics score, 0-100.
    #[serde(default)]
    pub aggregated_rating: Option<f64>,
    #[serde(default)]
    pub background: Option<ImageTemplate>,
    #[serde(default)]
    pub vertical_cover: Option<ImageTemplate>,
    #[serde(default)]
    pub square_icon: Option<ImageTemplate>,
    #[serde(default)]
    pub logo: Option<ImageTemplate>,
}

/// An image slot carrying a GamesDB URL template.
///
/// Templates contain `{formatter}`/`{ext}` placeholders; see
/// `galaxy_core::images` for the expansion rules.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageTemplate {
    pub url_format: String,
}

/// Storefront product record (`/v2/games/{id}`), camelCase on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProduct {
    #[serde(default)]
    pub in_development: Option<InDevelopment>,
    #[serde(default)]
    pub is_preorder: Option<bool>,
    #[serde(rename = "_embedded", default)]
    pub embedded: StoreEmbedded,
    #[serde(rename = "_links", default)]
    pub links: StoreLinks,
}

/// Early-access flag wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct InDevelopment {
    #[serde(default)]
    pub active: bool,
}

/// The `_embedded` sub-document of a storefront product.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreEmbedded {
    #[serde(default)]
    pub localizations: Vec<StoreLocalization>,
    #[serde(default)]
    pub supported_operating_systems: Vec<StoreOsSupport>,
    #[serde(default)]
    pub features: Vec<StoreFeature>,
}

/// One localization entry: a language plus the scope it covers.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreLocalization {
    #[serde(rename = "_embedded")]
    pub embedded: LocalizationParts,
}

/// Inner payload of a localization entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationParts {
    pub language: StoreLanguage,
    /// What the localization covers (`text`, `audio`); sometimes absent.
    #[serde(default)]
    pub localization_scope: Option<LocalizationScope>,
}

/// Language descriptor inside a localization entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreLanguage {
    pub code: String,
    #[serde(default)]
    pub name: String,
}

/// Scope descriptor inside a localization entry.
#[derive(Debug, Clone, Deserialize)]
pub struct LocalizationScope {
    #[serde(rename = "type")]
    pub scope_type: String,
}

/// OS support entry of a storefront product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreOsSupport {
    pub operating_system: StoreOperatingSystem,
}

/// Operating system descriptor.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreOperatingSystem {
    pub name: String,
}

/// Store feature tag (cloud saves, achievements, ...), forwarded to the
/// UI as-is.
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct StoreFeature {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// The `_links` sub-document of a storefront product.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreLinks {
    #[serde(default)]
    pub store: Option<StoreLink>,
    #[serde(default)]
    pub support: Option<StoreLink>,
    #[serde(default)]
    pub forum: Option<StoreLink>,
}

/// A single hyperlink reference.
#[derive(Debug, Clone, serde::Serialize, Deserialize)]
pub struct StoreLink {
    pub href: String,
}

/// Average review rating for a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewScore {
    /// Average rating, 0-5.
    pub value: f64,
    /// Number of reviews behind the average.
    #[serde(default)]
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_page_parses_entries_in_order() {
        let json = r#"{
            "total_count": 2,
            "limit": 50,
            "items": [
                {
                    "platform_id": "gog",
                    "external_id": "1207658924",
                    "certificate": "cert-token",
                    "owned_since": "2020-08-12T10:20:23Z",
                    "date_created": "2020-08-12T10:20:23Z",
                    "hidden": false
                },
                {"platform_id": "steam", "external_id": "377160"}
            ]
        }"#;
        let page: RegistryPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].release_key(), "gog_1207658924");
        assert_eq!(page.items[0].certificate.as_deref(), Some("cert-token"));
        assert_eq!(page.items[1].release_key(), "steam_377160");
        assert!(page.items[1].certificate.is_none());
    }

    #[test]
    fn gamesdb_record_parses_fixture() {
        let json = r#"{
            "id": "42",
            "platform_id": "gog",
            "external_id": "1207658924",
            "supported_operating_systems": ["windows", "osx"],
            "game": {
                "title": {"*": "Beneath a Steel Sky", "de-DE": "Beneath a Steel Sky"},
                "sorting_title": {"*": "beneath a steel sky"},
                "type": "game",
                "visible_in_library": true,
                "first_release_date": "1994-03-01T00:00:00+01:00",
                "developers": [{"id": "1", "name": "Revolution Software"}],
                "publishers": [{"id": "2", "name": "Virgin Interactive"}],
                "genres": [{"id": "51", "name": {"*": "Adventure"}, "slug": "adventure"}],
                "themes": [],
                "releases": [{"id": "10", "platform_id": "gog"}],
                "aggregated_rating": 82.5,
                "background": {"url_format": "https://images.gog.com/abc_{formatter}.{ext}"},
                "vertical_cover": {"url_format": "https://images.gog.com/def_{formatter}.{ext}"},
                "square_icon": {"url_format": "https://images.gog.com/ghi_{formatter}.{ext}"}
            }
        }"#;
        let record: GamesDbRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record.game.title.get("*").map(String::as_str),
            Some("Beneath a Steel Sky")
        );
        assert_eq!(record.game.game_type.as_deref(), Some("game"));
        assert_eq!(record.game.visible_in_library, Some(true));
        assert_eq!(record.game.aggregated_rating, Some(82.5));
        assert!(record.game.developers.is_array());
        assert!(record.supported_operating_systems.is_array());
        assert!(record.game.background.is_some());
        assert!(record.game.logo.is_none());
    }

    #[test]
    fn gamesdb_record_tolerates_minimal_payload() {
        let record: GamesDbRecord = serde_json::from_str("{}").unwrap();
        assert!(record.game.title.is_empty());
        assert!(record.game.game_type.is_none());
        assert!(record.supported_operating_systems.is_null());
    }

    #[test]
    fn store_product_parses_fixture() {
        let json = r#"{
            "inDevelopment": {"active": true},
            "isPreorder": false,
            "_embedded": {
                "localizations": [
                    {"_embedded": {
                        "language": {"code": "en", "name": "English"},
                        "localizationScope": {"type": "text"}
                    }},
                    {"_embedded": {
                        "language": {"code": "en", "name": "English"},
                        "localizationScope": {"type": "audio"}
                    }}
                ],
                "supportedOperatingSystems": [
                    {"operatingSystem": {"name": "windows", "versions": "10, 11"}},
                    {"operatingSystem": {"name": "linux"}}
                ],
                "features": [{"id": "single", "name": "Single-player"}]
            },
            "_links": {
                "store": {"href": "https://www.gog.com/game/example"},
                "forum": {"href": "https://www.gog.com/forum/example"}
            }
        }"#;
        let product: StoreProduct = serde_json::from_str(json).unwrap();
        assert!(product.in_development.as_ref().unwrap().active);
        assert_eq!(product.is_preorder, Some(false));
        assert_eq!(product.embedded.localizations.len(), 2);
        assert_eq!(product.embedded.localizations[0].embedded.language.code, "en");
        assert_eq!(
            product.embedded.localizations[1]
                .embedded
                .localization_scope
                .as_ref()
                .unwrap()
                .scope_type,
            "audio"
        );
        assert_eq!(
            product.embedded.supported_operating_systems[1]
                .operating_system
                .name,
            "linux"
        );
        assert_eq!(product.embedded.features[0].id, "single");
        assert!(product.links.store.is_some());
        assert!(product.links.support.is_none());
    }

    #[test]
    fn store_product_tolerates_missing_embedded() {
        let product: StoreProduct = serde_json::from_str("{}").unwrap();
        assert!(product.in_development.is_none());
        assert!(product.is_preorder.is_none());
        assert!(product.embedded.localizations.is_empty());
        assert!(product.links.store.is_none());
    }

    #[test]
    fn review_score_parses() {
        let score: ReviewScore =
            serde_json::from_str(r#"{"value": 4.4, "count": 1861}"#).unwrap();
        assert_eq!(score.value, 4.4);
        assert_eq!(score.count, 1861);

        let bare: ReviewScore = serde_json::from_str(r#"{"value": 3.0}"#).unwrap();
        assert_eq!(bare.count, 0);
    }
}
