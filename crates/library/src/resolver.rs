//! Mapping upstream records to the UI's metadata pieces.
//!
//! One rule per piece id, kept in a flat table. Every rule is a pure
//! function of the fetched records and the per-release context; `None`
//! means the piece cannot be resolved (its backing record is absent)
//! and is omitted from the response rather than sent as a placeholder.

use galaxy_core::images::expand_image_url;
use galaxy_core::pieces;
use galaxy_core::types::LibraryEntry;
use galaxy_gog::models::{GamesDbRecord, ReviewScore, StoreProduct};
use serde_json::{json, Map, Value};

/// Raw upstream records for one release. Each is `None` when the fetch
/// failed or was not attempted for this release.
#[derive(Debug, Default)]
pub struct RawRecords {
    pub games_db: Option<GamesDbRecord>,
    pub store: Option<StoreProduct>,
    pub reviews: Option<ReviewScore>,
}

/// Per-release context a rule may read besides the raw records.
#[derive(Debug, Clone, Copy)]
pub struct ResolveContext<'a> {
    pub platform_id: &'a str,
    pub external_id: &'a str,
    /// The library entry behind the release, when the release is owned.
    pub entry: Option<&'a LibraryEntry>,
}

struct PieceRule {
    id: &'static str,
    resolve: fn(&RawRecords, &ResolveContext) -> Option<Value>,
}

const RULES: &[PieceRule] = &[
    // GamesDB-backed.
    PieceRule { id: pieces::TITLE, resolve: title },
    PieceRule { id: pieces::SORTING_TITLE, resolve: sorting_title },
    PieceRule { id: pieces::META, resolve: meta },
    PieceRule { id: pieces::IMAGES, resolve: images },
    PieceRule { id: pieces::OS_COMPATIBILITY, resolve: os_compatibility },
    PieceRule { id: pieces::IS_VISIBLE_IN_LIBRARY, resolve: is_visible_in_library },
    PieceRule { id: pieces::IS_DLC, resolve: is_dlc },
    // Store-backed.
    PieceRule { id: pieces::LOCALIZATIONS, resolve: localizations },
    PieceRule { id: pieces::PRODUCT_LINKS, resolve: product_links },
    PieceRule { id: pieces::IS_EARLY_ACCESS, resolve: is_early_access },
    PieceRule { id: pieces::IS_PREORDER, resolve: is_preorder },
    PieceRule { id: pieces::STORE_OS_COMPATIBILITY, resolve: store_os_compatibility },
    PieceRule { id: pieces::STORE_FEATURES, resolve: store_features },
    // Reviews-backed.
    PieceRule { id: pieces::REVIEW_SCORE, resolve: review_score },
    // Entry-backed.
    PieceRule { id: pieces::ADDED_TO_LIBRARY_DATES, resolve: added_to_library_dates },
    PieceRule { id: pieces::MY_IS_HIDDEN, resolve: my_is_hidden },
    // Local state this backend does not track; fixed defaults.
    PieceRule { id: pieces::INSTALLATION_DATE, resolve: |_, _| Some(Value::Null) },
    PieceRule { id: pieces::LOCAL_STATE, resolve: |_, _| Some(json!("none")) },
    PieceRule { id: pieces::MY_ACHIEVEMENTS_COUNT, resolve: |_, _| Some(json!(0)) },
    PieceRule { id: pieces::MY_LAST_PLAYED_DATE, resolve: |_, _| Some(Value::Null) },
    PieceRule { id: pieces::MY_PLAY_TIME, resolve: |_, _| Some(json!(false)) },
    PieceRule { id: pieces::MY_RATING, resolve: |_, _| Some(Value::Null) },
    PieceRule { id: pieces::MY_TAGS, resolve: |_, _| Some(json!({ "tags": [] })) },
    PieceRule { id: pieces::ORIGINAL_GAME_LINK, resolve: |_, _| Some(Value::Null) },
    PieceRule { id: pieces::PLATFORM, resolve: |_, _| Some(json!({})) },
    PieceRule { id: pieces::SUBSCRIPTIONS, resolve: |_, _| Some(json!([])) },
];

/// Resolve one piece id against the fetched records.
///
/// Unknown ids are logged and dropped so a newer UI asking for pieces
/// this backend does not know cannot break the rest of the response.
pub fn resolve(piece_id: &str, records: &RawRecords, context: &ResolveContext) -> Option<Value> {
    match RULES.iter().find(|rule| rule.id == piece_id) {
        Some(rule) => (rule.resolve)(records, context),
        None => {
            tracing::warn!(piece_id, "Unsupported piece id requested");
            None
        }
    }
}

fn title(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let title = records.games_db.as_ref()?.game.title.get("*")?;
    Some(Value::String(title.clone()))
}

fn sorting_title(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let title = records.games_db.as_ref()?.game.sorting_title.get("*")?;
    Some(Value::String(title.clone()))
}

fn meta(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let game = &records.games_db.as_ref()?.game;
    Some(json!({
        "releaseDate": game.first_release_date,
        "developers": game.developers,
        "publishers": game.publishers,
        "themes": game.themes,
        "genres": game.genres,
        "releases": game.releases,
        "criticsScore": game.aggregated_rating,
    }))
}

fn images(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let game = &records.games_db.as_ref()?.game;
    let slots = [
        ("background", &game.background),
        ("verticalCover", &game.vertical_cover),
        ("icon", &game.square_icon),
        ("logo", &game.logo),
    ];

    let mut object = Map::new();
    for (slot, template) in slots {
        if let Some(template) = template {
            object.insert(
                slot.to_string(),
                Value::String(expand_image_url(&template.url_format)),
            );
        }
    }
    Some(Value::Object(object))
}

fn os_compatibility(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    match &records.games_db.as_ref()?.supported_operating_systems {
        Value::Null => None,
        value => Some(value.clone()),
    }
}

fn is_visible_in_library(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let visible = records.games_db.as_ref()?.game.visible_in_library?;
    Some(Value::Bool(visible))
}

// Anything GamesDB does not classify as a plain game (dlc, pack, ...)
// counts as DLC for library-view purposes.
fn is_dlc(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let game_type = records.games_db.as_ref()?.game.game_type.as_deref()?;
    Some(Value::Bool(game_type != "game"))
}

/// Store localizations grouped by language: scope entries arrive one
/// per (language, scope) pair and are folded into
/// `{code, name, scopes: [..]}` objects, languages in first-appearance
/// order, scopes deduplicated.
fn localizations(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let product = records.store.as_ref()?;

    let mut languages: Vec<(String, String, Vec<String>)> = Vec::new();
    for localization in &product.embedded.localizations {
        let parts = &localization.embedded;
        let code = &parts.language.code;
        let index = match languages.iter().position(|(existing, _, _)| existing == code) {
            Some(index) => index,
            None => {
                languages.push((code.clone(), parts.language.name.clone(), Vec::new()));
                languages.len() - 1
            }
        };
        if let Some(scope) = &parts.localization_scope {
            let scopes = &mut languages[index].2;
            if !scopes.contains(&scope.scope_type) {
                scopes.push(scope.scope_type.clone());
            }
        }
    }

    Some(Value::Array(
        languages
            .into_iter()
            .map(|(code, name, scopes)| json!({ "code": code, "name": name, "scopes": scopes }))
            .collect(),
    ))
}

fn product_links(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let links = &records.store.as_ref()?.links;
    let slots = [
        ("store", &links.store),
        ("support", &links.support),
        ("forum", &links.forum),
    ];

    let mut object = Map::new();
    for (slot, link) in slots {
        if let Some(link) = link {
            object.insert(slot.to_string(), Value::String(link.href.clone()));
        }
    }
    Some(Value::Object(object))
}

fn is_early_access(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let product = records.store.as_ref()?;
    let active = product
        .in_development
        .as_ref()
        .map_or(false, |status| status.active);
    Some(Value::Bool(active))
}

fn is_preorder(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let product = records.store.as_ref()?;
    Some(Value::Bool(product.is_preorder.unwrap_or(false)))
}

fn store_os_compatibility(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let product = records.store.as_ref()?;
    Some(Value::Array(
        product
            .embedded
            .supported_operating_systems
            .iter()
            .map(|support| Value::String(support.operating_system.name.clone()))
            .collect(),
    ))
}

fn store_features(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let product = records.store.as_ref()?;
    serde_json::to_value(&product.embedded.features).ok()
}

fn review_score(records: &RawRecords, _: &ResolveContext) -> Option<Value> {
    let score = records.reviews.as_ref()?;
    Some(json!(score.value))
}

fn added_to_library_dates(_: &RawRecords, context: &ResolveContext) -> Option<Value> {
    let entry = context.entry?;
    Some(json!({
        "purchaseTimestamp": entry.owned_since,
        "addedTimestamp": entry.date_created,
    }))
}

fn my_is_hidden(_: &RawRecords, context: &ResolveContext) -> Option<Value> {
    Some(Value::Bool(context.entry?.hidden))
}
