//! Command dispatch: the bridge between the embedded UI and the backend.
//!
//! One [`Dispatcher`] handles every envelope the UI sends. Commands that
//! only concern the host process (quitting, window chrome) surface as
//! [`HostAction`]s for the embedder; everything else is handled here and
//! answered on the outgoing message channel.

use std::sync::Arc;

use galaxy_gog::auth::CredentialProvider;
use galaxy_gog::client::GogApi;
use galaxy_library::aggregator::MetadataAggregator;
use galaxy_library::sync::LibrarySynchronizer;
use tokio::sync::mpsc;

use crate::commands::{
    self, ClientCommand, ClientMessage, FetchArguments, GamesPiecesArguments, LogArguments,
    TitleBarArguments,
};
use crate::presence::PresenceKeeper;

/// Buffered piece chunks between the resolver and the outgoing queue.
const CHUNK_CHANNEL_CAPACITY: usize = 4;

/// Longest UI log message re-logged verbatim.
const LOG_MESSAGE_LIMIT: usize = 200;

/// What the embedding host must do in response to a command.
///
/// Window lifecycle stays with the host; the dispatcher only reports
/// what the UI asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    /// Tear the application down.
    Exit,
    /// The login flow finished; the host can swap to the main window.
    LoginCompleted,
    /// Chrome action for the named window (`None` means the window the
    /// command came from).
    Window {
        name: Option<String>,
        action: WindowAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowAction {
    Close,
    Minimize,
    ToggleMaximize,
}

/// Handles the UI's command stream.
pub struct Dispatcher {
    api: Arc<GogApi>,
    credentials: Arc<dyn CredentialProvider>,
    synchronizer: Arc<LibrarySynchronizer>,
    aggregator: Arc<MetadataAggregator>,
    presence: Arc<PresenceKeeper>,
    outgoing: mpsc::Sender<ClientMessage>,
}

impl Dispatcher {
    pub fn new(
        api: Arc<GogApi>,
        credentials: Arc<dyn CredentialProvider>,
        synchronizer: Arc<LibrarySynchronizer>,
        aggregator: Arc<MetadataAggregator>,
        presence: Arc<PresenceKeeper>,
        outgoing: mpsc::Sender<ClientMessage>,
    ) -> Self {
        Self {
            api,
            credentials,
            synchronizer,
            aggregator,
            presence,
            outgoing,
        }
    }

    /// Handle one raw envelope from the UI.
    ///
    /// Unparseable input is logged and dropped; the UI keeps running on
    /// whatever it already has.
    pub async fn dispatch(&self, text: &str) -> Option<HostAction> {
        let command = match commands::parse(text) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unparseable client command");
                return None;
            }
        };

        match command {
            ClientCommand::Log(arguments) => {
                relay_ui_log(&arguments);
                None
            }
            ClientCommand::ExitGalaxyClient => Some(HostAction::Exit),
            ClientCommand::TitleBarButtonClicked(arguments) => {
                self.title_bar_clicked(arguments).await
            }
            ClientCommand::LoginSuccess(arguments) => {
                self.login_success(&arguments.authorization_code).await;
                Some(HostAction::LoginCompleted)
            }
            ClientCommand::ConnectToGOG => {
                self.connect_to_gog().await;
                None
            }
            ClientCommand::MetricsEvent => {
                tracing::debug!("Ignoring UI metrics event");
                None
            }
            ClientCommand::SetPresenceStatus(arguments) => {
                let status = arguments.presence.as_deref().unwrap_or("online");
                self.presence.set_status(status).await;
                None
            }
            ClientCommand::GetGamesPieces(arguments) => {
                self.get_games_pieces(arguments).await;
                None
            }
            ClientCommand::Fetch(arguments) => {
                self.fetch(arguments).await;
                None
            }
        }
    }

    /// Stop background work and clear presence before the host exits.
    pub async fn shutdown(&self) {
        self.presence.stop().await;
    }

    // ---- command handlers ----

    async fn title_bar_clicked(&self, arguments: TitleBarArguments) -> Option<HostAction> {
        let action = match arguments.button_id.as_str() {
            "close" => WindowAction::Close,
            "minimize" => WindowAction::Minimize,
            "maximize" => WindowAction::ToggleMaximize,
            other => {
                tracing::warn!(button_id = other, "Unknown title bar button");
                return None;
            }
        };

        // The UI tears a secondary window's document down when told the
        // window is gone.
        if action == WindowAction::Close {
            if let Some(name) = arguments.window_name.as_deref() {
                if name != "main" {
                    self.send(ClientMessage::window_closed(name)).await;
                }
            }
        }

        Some(HostAction::Window {
            name: arguments.window_name,
            action,
        })
    }

    async fn login_success(&self, code: &str) {
        self.send(ClientMessage::authentication_state_changed("completed"))
            .await;
        if let Err(e) = self.credentials.finish_login(code).await {
            tracing::warn!(error = %e, "Login code exchange failed");
        }
    }

    async fn connect_to_gog(&self) {
        let credentials = match self.credentials.credentials().await {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                tracing::warn!("ConnectToGOG without a logged-in user");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Credential lookup failed");
                return;
            }
        };

        self.send(ClientMessage::set_online_state(&credentials.access_token))
            .await;

        match self.synchronizer.import_library().await {
            Ok(keys) => {
                tracing::info!(releases = keys.len(), "Library imported");
                self.send(ClientMessage::owned_game_release_keys(&keys)).await;
            }
            Err(e) => tracing::warn!(error = %e, "Library import failed"),
        }
    }

    /// Kick off batch resolution in the background; each resolved chunk
    /// goes out as its own `GamesPiecesData` message while later chunks
    /// are still in flight.
    async fn get_games_pieces(&self, arguments: GamesPiecesArguments) {
        let entries = self.synchronizer.entries_by_key().await;
        let aggregator = Arc::clone(&self.aggregator);
        let outgoing = self.outgoing.clone();
        let (tx, mut rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            aggregator
                .resolve_batch(
                    &arguments.game_release_keys,
                    &arguments.piece_ids,
                    &entries,
                    tx,
                )
                .await;
        });

        tokio::spawn(async move {
            while let Some(chunk) = rx.recv().await {
                if outgoing
                    .send(ClientMessage::games_pieces_data(chunk))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        });
    }

    async fn fetch(&self, arguments: FetchArguments) {
        match self
            .api
            .fetch_raw(&arguments.query, &arguments.query_params)
            .await
        {
            Ok((status, response)) => {
                self.send(ClientMessage::fetch_response(
                    arguments.request_id,
                    status,
                    response,
                ))
                .await;
            }
            Err(e) => {
                tracing::warn!(query = %arguments.query, error = %e, "Fetch relay failed");
            }
        }
    }

    async fn send(&self, message: ClientMessage) {
        if self.outgoing.send(message).await.is_err() {
            tracing::debug!("Outgoing channel closed, dropping message");
        }
    }
}

fn relay_ui_log(arguments: &LogArguments) {
    let level = arguments.level.as_deref().unwrap_or("info");
    let message = truncate(&arguments.message, LOG_MESSAGE_LIMIT);
    tracing::info!(level, "UI: {message}");
}

/// Cut a string to at most `limit` characters, on a character boundary.
fn truncate(message: &str, limit: usize) -> &str {
    match message.char_indices().nth(limit) {
        Some((index, _)) => &message[..index],
        None => message,
    }
}
