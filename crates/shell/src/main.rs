//! `galaxy-shell` -- GOG Galaxy desktop client backend over stdio.
//!
//! Hosts the embedded Galaxy UI's backend protocol: command envelopes
//! arrive one JSON line at a time on stdin, callback messages leave one
//! JSON line at a time on stdout. Logs go to stderr so they never mix
//! with the message stream.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default                     | Description                          |
//! |-----------------------|----------|-----------------------------|--------------------------------------|
//! | `GALAXY_CONFIG_DIR`   | no       | `$HOME/.config/open-galaxy` | Auth config + library snapshot dir   |
//! | `GOGDL_PATH`          | no       | `gogdl` (on PATH)           | Credential helper binary             |
//! | `HELPER_TIMEOUT_SECS` | no       | `30`                        | Credential helper run timeout        |
//! | `HTTP_TIMEOUT_SECS`   | no       | `30`                        | Upstream HTTP request timeout        |

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use galaxy_gog::auth::{CredentialProvider, GogdlCredentialProvider};
use galaxy_gog::client::GogApi;
use galaxy_gog::endpoints::Endpoints;
use galaxy_gog::source::{MetadataSource, ReleaseRegistry};
use galaxy_library::aggregator::MetadataAggregator;
use galaxy_library::cache::{FsSnapshotStore, LibraryCache};
use galaxy_library::sync::LibrarySynchronizer;
use galaxy_shell::commands::ClientMessage;
use galaxy_shell::config::ShellConfig;
use galaxy_shell::dispatch::{Dispatcher, HostAction};
use galaxy_shell::presence::PresenceKeeper;
use galaxy_shell::settings;

/// Outgoing messages buffered before dispatch backpressures.
const OUTGOING_CAPACITY: usize = 64;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    // stdout carries the UI message stream, so logs must go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "galaxy_shell=info,galaxy_library=info,galaxy_gog=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // --- Configuration ---
    let config = ShellConfig::from_env();
    tracing::info!(config_dir = %config.config_dir.display(), "Loaded shell configuration");

    settings::ensure_default_configs(&config.config_dir)
        .expect("Failed to prepare the configuration directory");

    // --- GOG API client ---
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .expect("Failed to build the HTTP client");
    let api = Arc::new(GogApi::with_client(http, Endpoints::default()));

    // --- Credentials ---
    let credentials: Arc<dyn CredentialProvider> = Arc::new(GogdlCredentialProvider::new(
        config.gogdl_path.clone(),
        config.auth_config_path(),
        Duration::from_secs(config.helper_timeout_secs),
    ));

    // --- Library ---
    let cache = LibraryCache::load(FsSnapshotStore::new(&config.config_dir)).await;
    let synchronizer = Arc::new(LibrarySynchronizer::new(
        Arc::clone(&credentials),
        Arc::clone(&api) as Arc<dyn ReleaseRegistry>,
        cache,
    ));
    let aggregator = Arc::new(MetadataAggregator::new(
        Arc::clone(&api) as Arc<dyn MetadataSource>,
    ));
    let presence = Arc::new(PresenceKeeper::new(
        Arc::clone(&api),
        Arc::clone(&credentials),
    ));

    // --- Outgoing writer ---
    let (outgoing, mut outgoing_rx) = mpsc::channel::<ClientMessage>(OUTGOING_CAPACITY);
    let writer = tokio::spawn(async move {
        let mut out = tokio::io::stdout();
        while let Some(message) = outgoing_rx.recv().await {
            let mut line = message.to_json();
            line.push('\n');
            if out.write_all(line.as_bytes()).await.is_err() {
                tracing::error!("stdout is gone, stopping the writer");
                return;
            }
            let _ = out.flush().await;
        }
    });

    let dispatcher = Dispatcher::new(
        Arc::clone(&api),
        Arc::clone(&credentials),
        synchronizer,
        aggregator,
        presence,
        outgoing.clone(),
    );

    // --- UI bootstrap ---
    // Same opening sequence the UI got from the original desktop client.
    send(&outgoing, ClientMessage::set_tray_state("notMinimizedToTray")).await;
    send(&outgoing, ClientMessage::set_internet_connectivity_state(true)).await;
    send(&outgoing, ClientMessage::initialize(settings::init_settings())).await;
    send(&outgoing, ClientMessage::plugins_details()).await;

    match credentials.credentials().await {
        Ok(Some(session)) => match api.user_info(&session).await {
            Ok(profile) => {
                let username = profile["username"].as_str().unwrap_or("<unknown>");
                tracing::info!(username, user_id = %session.user_id, "Restored GOG session");
            }
            Err(e) => tracing::warn!(error = %e, "Could not fetch the user profile"),
        },
        Ok(None) => tracing::info!("No stored GOG session, waiting for login"),
        Err(e) => tracing::warn!(error = %e, "Credential helper failed at startup"),
    }

    // --- Command loop ---
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match dispatcher.dispatch(line).await {
                        Some(HostAction::Exit) => {
                            tracing::info!("UI requested exit");
                            break;
                        }
                        Some(HostAction::LoginCompleted) => {
                            tracing::info!("Login flow completed");
                        }
                        Some(HostAction::Window { name, action }) => {
                            // Window chrome belongs to the embedder; a
                            // stdio host just records the request.
                            tracing::info!(
                                window = name.as_deref().unwrap_or("main"),
                                ?action,
                                "Window action requested",
                            );
                        }
                        None => {}
                    }
                }
                Ok(None) => {
                    tracing::info!("Command stream closed");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed reading the command stream");
                    break;
                }
            },
            () = &mut shutdown => break,
        }
    }

    // --- Post-shutdown cleanup ---
    dispatcher.shutdown().await;
    tracing::info!("Presence cleared");

    // Closing every sender lets the writer drain and stop.
    drop(dispatcher);
    drop(outgoing);
    let _ = writer.await;
    tracing::info!("Graceful shutdown complete");
}

async fn send(outgoing: &mpsc::Sender<ClientMessage>, message: ClientMessage) {
    if outgoing.send(message).await.is_err() {
        tracing::error!("Outgoing writer stopped during bootstrap");
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the backend
/// shuts down cleanly whether stopped interactively or by its embedder.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
