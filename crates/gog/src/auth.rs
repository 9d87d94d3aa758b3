//! Credentials and the external `gogdl` credential helper.
//!
//! Token acquisition is delegated to the `gogdl` command-line helper,
//! which owns the OAuth dance and persists refresh tokens in its own
//! auth config file. This module shells out to it
//! (`gogdl --auth-config-path <path> auth [--code <code>]`), parses the
//! JSON credential blob it prints, and caches the result in memory
//! until the access token nears expiry.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::process::Command;
use tokio::sync::Mutex;

/// Tokens are treated as expired this long before their actual expiry,
/// so an in-flight request never rides a token about to lapse.
const REFRESH_MARGIN_SECS: i64 = 60;

/// A GOG session as reported by the credential helper.
///
/// Field names follow the helper's JSON output: snake_case OAuth fields
/// plus the `loginTime` epoch-milliseconds stamp the helper adds.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user_id: String,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// When the token was issued, epoch milliseconds.
    #[serde(rename = "loginTime", default)]
    pub login_time: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl Credentials {
    /// Whether the access token has expired (or will within the refresh
    /// margin). Credentials without issue/lifetime metadata count as
    /// expired so the helper gets re-run rather than trusted blindly.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let (Some(login_time), Some(expires_in)) = (self.login_time, self.expires_in) else {
            return true;
        };
        let expires_at_millis = login_time + (expires_in - REFRESH_MARGIN_SECS) * 1000;
        now.timestamp_millis() >= expires_at_millis
    }
}

/// Errors from the credential helper subprocess.
///
/// "Not logged in" is not an error: [`CredentialProvider::credentials`]
/// reports it as `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The helper binary could not be started.
    #[error("failed to run credential helper {helper}: {source}")]
    Spawn {
        helper: String,
        #[source]
        source: std::io::Error,
    },

    /// The helper did not finish within the configured timeout.
    #[error("credential helper timed out after {0:?}")]
    Timeout(Duration),

    /// The helper rejected a login-code exchange.
    #[error("login exchange failed with exit code {exit_code}: {stderr}")]
    ExchangeFailed { exit_code: i32, stderr: String },
}

/// Source of GOG credentials.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current session credentials, or `None` when no user is logged in.
    async fn credentials(&self) -> Result<Option<Credentials>, AuthError>;

    /// Exchange an OAuth authorization code for a session.
    async fn finish_login(&self, code: &str) -> Result<(), AuthError>;
}

/// [`CredentialProvider`] backed by the external `gogdl` helper.
pub struct GogdlCredentialProvider {
    gogdl_path: PathBuf,
    auth_config_path: PathBuf,
    timeout: Duration,
    /// Last parsed credentials; the helper is only re-run when this is
    /// absent or expired. The lock also serialises concurrent helper runs.
    cached: Mutex<Option<Credentials>>,
}

struct HelperOutput {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl GogdlCredentialProvider {
    pub fn new(
        gogdl_path: impl Into<PathBuf>,
        auth_config_path: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            gogdl_path: gogdl_path.into(),
            auth_config_path: auth_config_path.into(),
            timeout,
            cached: Mutex::new(None),
        }
    }

    /// Run the helper with the given subcommand arguments and capture
    /// its output. The child is killed if the timeout elapses.
    async fn run_helper(&self, args: &[&str]) -> Result<HelperOutput, AuthError> {
        let mut cmd = Command::new(&self.gogdl_path);
        cmd.arg("--auth-config-path")
            .arg(&self.auth_config_path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| AuthError::Timeout(self.timeout))?
            .map_err(|source| AuthError::Spawn {
                helper: self.gogdl_path.display().to_string(),
                source,
            })?;

        Ok(HelperOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

#[async_trait]
impl CredentialProvider for GogdlCredentialProvider {
    async fn credentials(&self) -> Result<Option<Credentials>, AuthError> {
        let mut cached = self.cached.lock().await;
        if let Some(credentials) = cached.as_ref() {
            if !credentials.is_expired(Utc::now()) {
                return Ok(Some(credentials.clone()));
            }
            tracing::debug!("Cached GOG token expired, re-running credential helper");
        }

        let output = self.run_helper(&["auth"]).await?;
        if output.exit_code != 0 {
            tracing::debug!(
                exit_code = output.exit_code,
                "Credential helper reports no active session",
            );
            *cached = None;
            return Ok(None);
        }

        match serde_json::from_str::<Credentials>(output.stdout.trim()) {
            Ok(credentials) => {
                *cached = Some(credentials.clone());
                Ok(Some(credentials))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Credential helper produced unparseable output");
                *cached = None;
                Ok(None)
            }
        }
    }

    async fn finish_login(&self, code: &str) -> Result<(), AuthError> {
        let output = self.run_helper(&["auth", "--code", code]).await?;
        if output.exit_code != 0 {
            return Err(AuthError::ExchangeFailed {
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        match serde_json::from_str::<Credentials>(output.stdout.trim()) {
            Ok(credentials) => {
                tracing::info!(user_id = %credentials.user_id, "GOG login completed");
                *self.cached.lock().await = Some(credentials);
            }
            Err(e) => {
                // The helper has persisted the session to its auth config;
                // the next credentials() call picks it up from there.
                tracing::warn!(error = %e, "Login succeeded but helper output was unparseable");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn credentials(login_time: Option<i64>, expires_in: Option<i64>) -> Credentials {
        Credentials {
            access_token: "token".to_string(),
            refresh_token: None,
            user_id: "123".to_string(),
            expires_in,
            login_time,
            token_type: None,
            scope: None,
            session_id: None,
        }
    }

    #[test]
    fn credentials_parse_helper_json() {
        let parsed: Credentials = serde_json::from_str(
            r#"{
                "access_token": "at",
                "refresh_token": "rt",
                "user_id": "46173147631205406",
                "expires_in": 3600,
                "token_type": "bearer",
                "scope": "",
                "session_id": "sid",
                "loginTime": 1700000000000
            }"#,
        )
        .expect("credentials should parse");
        assert_eq!(parsed.user_id, "46173147631205406");
        assert_eq!(parsed.login_time, Some(1_700_000_000_000));
    }

    #[test]
    fn freshly_issued_token_is_not_expired() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let creds = credentials(Some(now.timestamp_millis()), Some(3600));
        assert!(!creds.is_expired(now));
    }

    #[test]
    fn token_expires_within_refresh_margin() {
        let issued = 1_700_000_000_000;
        let creds = credentials(Some(issued), Some(3600));
        // 30 seconds before nominal expiry: inside the 60s margin.
        let near_expiry = Utc
            .timestamp_millis_opt(issued + (3600 - 30) * 1000)
            .unwrap();
        assert!(creds.is_expired(near_expiry));
    }

    #[test]
    fn token_without_metadata_counts_as_expired() {
        let now = Utc::now();
        assert!(credentials(None, Some(3600)).is_expired(now));
        assert!(credentials(Some(0), None).is_expired(now));
    }

    // ---- helper subprocess tests ----

    /// Write an executable fake `gogdl` into `dir` and return its path.
    fn fake_helper(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("gogdl");
        std::fs::write(&path, format!("#!/bin/bash\n{body}")).expect("write fake helper");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("mark helper executable");
        path
    }

    fn provider(helper: PathBuf, dir: &Path) -> GogdlCredentialProvider {
        GogdlCredentialProvider::new(helper, dir.join("auth.json"), Duration::from_secs(5))
    }

    const VALID_BLOB: &str = r#"{"access_token":"at","user_id":"123","expires_in":3600,"loginTime":9999999999999}"#;

    #[tokio::test]
    async fn credentials_come_from_helper_stdout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let helper = fake_helper(dir.path(), &format!("echo '{VALID_BLOB}'\n"));
        let provider = provider(helper, dir.path());

        let creds = provider
            .credentials()
            .await
            .expect("helper run should succeed")
            .expect("should be logged in");
        assert_eq!(creds.user_id, "123");
        assert_eq!(creds.access_token, "at");
    }

    #[tokio::test]
    async fn nonzero_exit_means_not_logged_in() {
        let dir = tempfile::tempdir().expect("tempdir");
        let helper = fake_helper(dir.path(), "exit 1\n");
        let provider = provider(helper, dir.path());

        let creds = provider.credentials().await.expect("not an error");
        assert!(creds.is_none());
    }

    #[tokio::test]
    async fn garbage_stdout_means_not_logged_in() {
        let dir = tempfile::tempdir().expect("tempdir");
        let helper = fake_helper(dir.path(), "echo not json at all\n");
        let provider = provider(helper, dir.path());

        let creds = provider.credentials().await.expect("not an error");
        assert!(creds.is_none());
    }

    #[tokio::test]
    async fn credentials_are_cached_between_calls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let counter = dir.path().join("runs");
        let helper = fake_helper(
            dir.path(),
            &format!("echo run >> {}\necho '{VALID_BLOB}'\n", counter.display()),
        );
        let provider = provider(helper, dir.path());

        provider.credentials().await.expect("first run");
        provider.credentials().await.expect("cached call");

        let runs = std::fs::read_to_string(&counter).expect("counter file");
        assert_eq!(runs.lines().count(), 1, "helper should only run once");
    }

    #[tokio::test]
    async fn expired_credentials_rerun_the_helper() {
        let dir = tempfile::tempdir().expect("tempdir");
        let counter = dir.path().join("runs");
        // loginTime 0 => long expired.
        let stale = r#"{"access_token":"at","user_id":"123","expires_in":3600,"loginTime":0}"#;
        let helper = fake_helper(
            dir.path(),
            &format!("echo run >> {}\necho '{stale}'\n", counter.display()),
        );
        let provider = provider(helper, dir.path());

        provider.credentials().await.expect("first run");
        provider.credentials().await.expect("second run");

        let runs = std::fs::read_to_string(&counter).expect("counter file");
        assert_eq!(runs.lines().count(), 2, "stale token should re-run helper");
    }

    #[tokio::test]
    async fn finish_login_passes_the_code_through() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args_file = dir.path().join("args");
        let helper = fake_helper(
            dir.path(),
            &format!("echo \"$@\" > {}\necho '{VALID_BLOB}'\n", args_file.display()),
        );
        let provider = provider(helper, dir.path());

        provider
            .finish_login("authcode-42")
            .await
            .expect("exchange should succeed");

        let args = std::fs::read_to_string(&args_file).expect("args file");
        assert!(args.contains("--auth-config-path"));
        assert!(args.contains("auth --code authcode-42"));

        // The parsed credentials prime the cache: no further helper run.
        std::fs::remove_file(&args_file).expect("reset args file");
        let creds = provider.credentials().await.expect("cached");
        assert_eq!(creds.expect("logged in").user_id, "123");
        assert!(!args_file.exists(), "helper should not have re-run");
    }

    #[tokio::test]
    async fn finish_login_surfaces_helper_failure() {
        let dir = tempfile::tempdir().expect("tempdir");
        let helper = fake_helper(dir.path(), "echo bad code >&2\nexit 2\n");
        let provider = provider(helper, dir.path());

        let result = provider.finish_login("nope").await;
        assert_matches!(
            result,
            Err(AuthError::ExchangeFailed { exit_code: 2, ref stderr }) if stderr == "bad code"
        );
    }

    #[tokio::test]
    async fn helper_is_killed_on_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let helper = fake_helper(dir.path(), "sleep 30\n");
        let provider = GogdlCredentialProvider::new(
            helper,
            dir.path().join("auth.json"),
            Duration::from_millis(200),
        );

        let result = provider.credentials().await;
        assert_matches!(result, Err(AuthError::Timeout(_)));
    }

    #[tokio::test]
    async fn missing_helper_is_a_spawn_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let provider = GogdlCredentialProvider::new(
            dir.path().join("does-not-exist"),
            dir.path().join("auth.json"),
            Duration::from_secs(5),
        );

        let result = provider.credentials().await;
        assert_matches!(result, Err(AuthError::Spawn { .. }));
    }
}
