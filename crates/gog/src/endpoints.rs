//! Base URLs of the GOG web services.

/// Base URLs for every GOG service the backend calls.
///
/// [`Endpoints::default`] points at production. Tests and forks can
/// substitute their own hosts without touching the client code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// General-purpose REST API (user-triggered fetches).
    pub api: String,
    /// Library registry listing owned releases.
    pub library: String,
    /// GamesDB metadata service.
    pub gamesdb: String,
    /// Storefront product API.
    pub store: String,
    /// Review aggregation service.
    pub reviews: String,
    /// Presence (online status) service.
    pub presence: String,
    /// User account service.
    pub users: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api: "https://api.gog.com".to_string(),
            library: "https://galaxy-library.gog.com".to_string(),
            gamesdb: "https://gamesdb.gog.com".to_string(),
            store: "https://api.gog.com".to_string(),
            reviews: "https://reviews.gog.com".to_string(),
            presence: "https://presence.gog.com".to_string(),
            users: "https://users.gog.com".to_string(),
        }
    }
}
