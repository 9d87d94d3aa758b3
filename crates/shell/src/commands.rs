//! The window-bridge command protocol.
//!
//! The embedded GOG Galaxy UI exchanges JSON envelopes of the shape
//! `{"Command": "<name>", "Arguments": {...}}` with its host, in both
//! directions. Incoming text parses into a [`ClientCommand`]; outgoing
//! traffic is built through the [`ClientMessage`] constructors. The
//! `Arguments` field is optional on the way in -- some commands omit it,
//! others send an empty object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Raw envelope as sent by the UI.
#[derive(Debug, Deserialize)]
struct ClientEnvelope {
    #[serde(rename = "Command")]
    command: String,
    #[serde(rename = "Arguments", default)]
    arguments: Value,
}

/// All commands the UI can send to its host.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    /// Forward a UI-side log line into the host's log.
    Log(LogArguments),
    /// Quit the application.
    ExitGalaxyClient,
    /// A window chrome button (close/minimize/maximize) was clicked.
    TitleBarButtonClicked(TitleBarArguments),
    /// The login web flow produced an authorization code.
    LoginSuccess(LoginArguments),
    /// Bring the session online: announce the token, import the library.
    ConnectToGOG,
    /// UI telemetry. Dropped by this backend.
    MetricsEvent,
    /// Start (or change) the presence heartbeat.
    SetPresenceStatus(PresenceArguments),
    /// Resolve metadata pieces for a batch of releases.
    GetGamesPieces(GamesPiecesArguments),
    /// Relay a parameterized GET against the main API host.
    Fetch(FetchArguments),
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogArguments {
    #[serde(rename = "logLevel", default)]
    pub level: Option<String>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TitleBarArguments {
    #[serde(rename = "ButtonId")]
    pub button_id: String,
    /// Which window the click came from; absent for the main window.
    #[serde(rename = "WindowName", default)]
    pub window_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginArguments {
    #[serde(rename = "AuthorizationCode")]
    pub authorization_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresenceArguments {
    /// Requested status; the backend defaults it to `"online"`.
    #[serde(default)]
    pub presence: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GamesPiecesArguments {
    #[serde(rename = "gameReleaseKeys")]
    pub game_release_keys: Vec<String>,
    #[serde(rename = "pieceIds")]
    pub piece_ids: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchArguments {
    /// Opaque correlation id, echoed back verbatim in the response.
    #[serde(rename = "requestId", default)]
    pub request_id: Value,
    /// Path under the main API host.
    pub query: String,
    #[serde(rename = "queryParams", default)]
    pub query_params: HashMap<String, String>,
}

/// Errors from parsing an incoming envelope.
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    /// The text was not a command envelope at all.
    #[error("malformed command envelope: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The command name is not part of the protocol this backend speaks.
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// The command is known but its arguments did not have the expected
    /// shape.
    #[error("invalid arguments for {command}: {source}")]
    InvalidArguments {
        command: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse one envelope from the UI into a typed command.
pub fn parse(text: &str) -> Result<ClientCommand, CommandParseError> {
    let envelope: ClientEnvelope = serde_json::from_str(text)?;
    let command = match envelope.command.as_str() {
        "Log" => ClientCommand::Log(parse_arguments("Log", envelope.arguments)?),
        "ExitGalaxyClient" => ClientCommand::ExitGalaxyClient,
        "TitleBarButtonClicked" => ClientCommand::TitleBarButtonClicked(parse_arguments(
            "TitleBarButtonClicked",
            envelope.arguments,
        )?),
        "LoginSuccess" => {
            ClientCommand::LoginSuccess(parse_arguments("LoginSuccess", envelope.arguments)?)
        }
        "ConnectToGOG" => ClientCommand::ConnectToGOG,
        "MetricsEvent" => ClientCommand::MetricsEvent,
        "SetPresenceStatus" => ClientCommand::SetPresenceStatus(parse_arguments(
            "SetPresenceStatus",
            envelope.arguments,
        )?),
        "GetGamesPieces" => {
            ClientCommand::GetGamesPieces(parse_arguments("GetGamesPieces", envelope.arguments)?)
        }
        "Fetch" => ClientCommand::Fetch(parse_arguments("Fetch", envelope.arguments)?),
        _ => return Err(CommandParseError::UnknownCommand(envelope.command)),
    };
    Ok(command)
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    command: &'static str,
    arguments: Value,
) -> Result<T, CommandParseError> {
    // An omitted `Arguments` member surfaces here as null; the protocol
    // treats both the same as an empty object.
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments)
        .map_err(|source| CommandParseError::InvalidArguments { command, source })
}

/// Outgoing envelope for the UI's callback channel.
#[derive(Debug, Clone, Serialize)]
pub struct ClientMessage {
    #[serde(rename = "Command")]
    pub command: &'static str,
    #[serde(rename = "Arguments")]
    pub arguments: Value,
}

impl ClientMessage {
    /// Replace the UI's set of owned releases.
    pub fn owned_game_release_keys(keys: &[String]) -> Self {
        Self {
            command: "OwnedGameReleaseKeys",
            arguments: json!({ "UpdateType": "set", "GameReleaseKeys": keys }),
        }
    }

    /// Hand the session token to the UI and flip it online.
    pub fn set_online_state(access_token: &str) -> Self {
        Self {
            command: "SetOnlineState",
            arguments: json!({ "AccessToken": access_token }),
        }
    }

    /// One resolved chunk of a `GetGamesPieces` request: release key to
    /// piece object, spread directly as the arguments.
    pub fn games_pieces_data(chunk: HashMap<String, Value>) -> Self {
        Self {
            command: "GamesPiecesData",
            arguments: Value::Object(Map::from_iter(chunk)),
        }
    }

    pub fn authentication_state_changed(state: &str) -> Self {
        Self {
            command: "AuthenticationStateChanged",
            arguments: json!({ "authenticationState": state }),
        }
    }

    /// Answer to a `Fetch` relay, echoing the request id.
    pub fn fetch_response(request_id: Value, status: u16, response: Value) -> Self {
        Self {
            command: "Fetch",
            arguments: json!({
                "requestId": request_id,
                "responseStatus": { "status": status },
                "response": response,
            }),
        }
    }

    /// The startup settings document the UI boots from.
    pub fn initialize(settings: Value) -> Self {
        Self {
            command: "Initialize",
            arguments: settings,
        }
    }

    pub fn set_internet_connectivity_state(online: bool) -> Self {
        Self {
            command: "SetInternetConnectivityState",
            arguments: json!({ "State": online }),
        }
    }

    pub fn set_tray_state(state: &str) -> Self {
        Self {
            command: "SetTrayState",
            arguments: json!({ "state": state }),
        }
    }

    pub fn plugins_details() -> Self {
        Self {
            command: "PluginsDetails",
            arguments: json!({ "availablePlugins": [] }),
        }
    }

    /// Tell the UI a secondary window was closed by the host.
    pub fn window_closed(window_name: &str) -> Self {
        Self {
            command: "closed",
            arguments: json!({ "windowName": window_name }),
        }
    }

    /// Wire form of the envelope, one line of JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("ClientMessage is always serialisable")
    }
}
