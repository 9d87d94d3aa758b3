//! Startup settings for the embedded UI.
//!
//! The Galaxy UI boots from an `Initialize` message carrying a settings
//! document: service endpoints, the OAuth client id, version fields the
//! UI displays, and notification defaults. The values here mirror what
//! a stock Galaxy 2.0.61 install hands its window.

use std::io;
use std::path::Path;

use serde_json::{json, Value};

/// OAuth client id of the Galaxy desktop client.
pub const CLIENT_ID: &str = "46899977096215655";

/// The `Initialize` settings document.
pub fn init_settings() -> Value {
    json!({
        "Languages": [],
        "SettingsData": {
            "languageCode": "en-US",
            "notifChatMessage": true,
            "notifDownloadStatus": true,
            "notifDownloadStatus_overlay": true,
            "notifFriendInvite": true,
            "notifFriendOnline": true,
            "notifFriendStartsGame": true,
            "notifGameInvite": true,
            "notifSoundChatMessage": true,
            "notifSoundDownloadStatus": false,
            "notifSoundFriendInvite": true,
            "notifSoundFriendOnline": false,
            "notifSoundFriendStartsGame": false,
            "notifSoundGameInvite": true,
            "notifSoundVolume": 50,
            "showFriendsSidebar": true,
            "store": {},
        },
        "Endpoints": {
            "api": "https://api.gog.com",
            "chat": "https://chat.gog.com",
            "externalAccounts": "https://external-accounts.gog.com",
            "externalUsers": "https://external-users.gog.com",
            "gameplay": "https://gameplay.gog.com",
            "gog": "https://embed.gog.com",
            "gogGalaxyStoreApi": "https://embed.gog.com",
            "notifications": "https://notifications.gog.com",
            "pusher": "https://notifications-pusher.gog.com",
            "library": "https://galaxy-library.gog.com",
            "presence": "https://presence.gog.com",
            "users": "https://users.gog.com",
            "redeem": "https://redeem.gog.com",
            "marketingSections": "https://marketing-sections.gog.com",
            "galaxyPromos": "https://galaxy-promos.gog.com",
            "remoteConfigurationHost": "https://remote-config.gog.com",
            "recommendations": "https://recommendations-api.gog.com",
        },
        "ClientId": CLIENT_ID,
        "ChangelogBasePath": "",
        "ClientVersions": { "Major": 2, "Minor": 0, "Build": 61, "Compilation": 1 },
        "StartupPage": "discover_view",
    })
}

/// Create the config directory and an empty auth config for the
/// credential helper, when they do not exist yet.
pub fn ensure_default_configs(config_dir: &Path) -> io::Result<()> {
    std::fs::create_dir_all(config_dir)?;
    let auth_config = config_dir.join("auth.json");
    if !auth_config.exists() {
        std::fs::write(&auth_config, "{}")?;
    }
    Ok(())
}
