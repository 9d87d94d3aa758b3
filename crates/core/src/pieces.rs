//! The piece-id vocabulary.
//!
//! A *piece* is one named fragment of game metadata the UI can request
//! (title, artwork, store links, ...). Piece ids arrive verbatim from
//! the UI in `GetGamesPieces` commands, so the constants here keep the
//! UI's camelCase spelling. The resolver in `galaxy-library` maps each
//! id to the upstream record it is extracted from.

// Backed by the GamesDB record.
pub const TITLE: &str = "title";
pub const SORTING_TITLE: &str = "sortingTitle";
pub const META: &str = "meta";
pub const IMAGES: &str = "images";
pub const OS_COMPATIBILITY: &str = "osCompatibility";
pub const IS_VISIBLE_IN_LIBRARY: &str = "isVisibleInLibrary";
pub const IS_DLC: &str = "isDlc";

// Backed by the storefront product record.
pub const LOCALIZATIONS: &str = "localizations";
pub const PRODUCT_LINKS: &str = "productLinks";
pub const IS_EARLY_ACCESS: &str = "isEarlyAccess";
pub const IS_PREORDER: &str = "isPreorder";
pub const STORE_OS_COMPATIBILITY: &str = "storeOsCompatibility";
pub const STORE_FEATURES: &str = "storeFeatures";

// Backed by the review-score service.
pub const REVIEW_SCORE: &str = "reviewScore";

// Backed by the library entry itself.
pub const ADDED_TO_LIBRARY_DATES: &str = "addedToLibraryDates";
pub const MY_IS_HIDDEN: &str = "myIsHidden";

// Local client state the backend does not track yet. These resolve to
// fixed defaults so the UI renders a consistent "not installed, never
// played" view instead of erroring on a missing field.
pub const INSTALLATION_DATE: &str = "installationDate";
pub const LOCAL_STATE: &str = "localState";
pub const MY_ACHIEVEMENTS_COUNT: &str = "myAchievementsCount";
pub const MY_LAST_PLAYED_DATE: &str = "myLastPlayedDate";
pub const MY_PLAY_TIME: &str = "myPlayTime";
pub const MY_RATING: &str = "myRating";
pub const MY_TAGS: &str = "myTags";
pub const ORIGINAL_GAME_LINK: &str = "originalGameLink";
pub const PLATFORM: &str = "platform";
pub const SUBSCRIPTIONS: &str = "subscriptions";

/// Every piece id the backend can resolve.
pub const KNOWN_PIECE_IDS: &[&str] = &[
    TITLE,
    SORTING_TITLE,
    META,
    IMAGES,
    OS_COMPATIBILITY,
    IS_VISIBLE_IN_LIBRARY,
    IS_DLC,
    LOCALIZATIONS,
    PRODUCT_LINKS,
    IS_EARLY_ACCESS,
    IS_PREORDER,
    STORE_OS_COMPATIBILITY,
    STORE_FEATURES,
    REVIEW_SCORE,
    ADDED_TO_LIBRARY_DATES,
    MY_IS_HIDDEN,
    INSTALLATION_DATE,
    LOCAL_STATE,
    MY_ACHIEVEMENTS_COUNT,
    MY_LAST_PLAYED_DATE,
    MY_PLAY_TIME,
    MY_RATING,
    MY_TAGS,
    ORIGINAL_GAME_LINK,
    PLATFORM,
    SUBSCRIPTIONS,
];

/// Whether `piece_id` is part of the supported vocabulary.
pub fn is_known(piece_id: &str) -> bool {
    KNOWN_PIECE_IDS.contains(&piece_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_are_recognised() {
        assert!(is_known(TITLE));
        assert!(is_known(REVIEW_SCORE));
        assert!(is_known(ADDED_TO_LIBRARY_DATES));
    }

    #[test]
    fn unknown_ids_are_rejected() {
        assert!(!is_known("titel"));
        assert!(!is_known(""));
        assert!(!is_known("Title"));
    }

    #[test]
    fn vocabulary_has_no_duplicates() {
        let mut seen = std::collections::HashSet::new();
        for id in KNOWN_PIECE_IDS {
            assert!(seen.insert(*id), "duplicate piece id: {id}");
        }
    }
}
