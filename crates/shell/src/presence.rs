//! Presence heartbeat.
//!
//! GOG's presence service treats a status as stale unless it is
//! re-posted periodically, so setting a status starts a loop that posts
//! it on a fixed interval until replaced or stopped.

use std::sync::Arc;
use std::time::Duration;

use galaxy_gog::auth::CredentialProvider;
use galaxy_gog::client::GogApi;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Interval between presence re-posts.
const PRESENCE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Keeps the user's presence alive upstream.
pub struct PresenceKeeper {
    api: Arc<GogApi>,
    credentials: Arc<dyn CredentialProvider>,
    task: Mutex<Option<PresenceTask>>,
}

struct PresenceTask {
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

impl PresenceKeeper {
    pub fn new(api: Arc<GogApi>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self {
            api,
            credentials,
            task: Mutex::new(None),
        }
    }

    /// Start the heartbeat with the given status, replacing any running
    /// one. The first post happens immediately.
    pub async fn set_status(&self, status: &str) {
        let mut task = self.task.lock().await;
        if let Some(previous) = task.take() {
            previous.cancel.cancel();
        }

        tracing::info!(status, "Starting presence heartbeat");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_heartbeat(
            Arc::clone(&self.api),
            Arc::clone(&self.credentials),
            status.to_string(),
            cancel.clone(),
        ));
        *task = Some(PresenceTask { cancel, handle });
    }

    /// Stop the heartbeat and clear the presence upstream.
    pub async fn stop(&self) {
        let mut task = self.task.lock().await;
        let Some(previous) = task.take() else {
            return;
        };
        previous.cancel.cancel();
        let _ = previous.handle.await;

        match self.credentials.credentials().await {
            Ok(Some(credentials)) => {
                if let Err(e) = self.api.delete_presence(&credentials).await {
                    tracing::warn!(error = %e, "Failed to clear presence");
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Credential lookup failed while clearing presence");
            }
        }
    }
}

async fn run_heartbeat(
    api: Arc<GogApi>,
    credentials: Arc<dyn CredentialProvider>,
    status: String,
    cancel: CancellationToken,
) {
    // The first tick completes immediately, posting the new status right
    // away; later ticks keep it alive.
    let mut interval = tokio::time::interval(PRESENCE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = interval.tick() => {}
        }

        match credentials.credentials().await {
            Ok(Some(creds)) => {
                if let Err(e) = api.set_presence(&creds, &status).await {
                    tracing::warn!(error = %e, "Failed to update presence");
                }
            }
            Ok(None) => tracing::debug!("Skipping presence update, not logged in"),
            Err(e) => tracing::warn!(error = %e, "Credential lookup failed for presence update"),
        }
    }
}
