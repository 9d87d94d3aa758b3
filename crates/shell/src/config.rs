use std::path::{Path, PathBuf};

/// Shell configuration loaded from environment variables.
///
/// All fields have defaults suitable for a desktop install; overrides
/// are environment variables so packaging scripts can relocate paths.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Directory holding the helper's auth config and the library snapshot.
    pub config_dir: PathBuf,
    /// The `gogdl` credential helper binary.
    pub gogdl_path: PathBuf,
    /// Timeout for credential helper runs in seconds (default: `30`).
    pub helper_timeout_secs: u64,
    /// Timeout for upstream HTTP requests in seconds (default: `30`).
    pub http_timeout_secs: u64,
}

impl ShellConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default                     |
    /// |-----------------------|-----------------------------|
    /// | `GALAXY_CONFIG_DIR`   | `$HOME/.config/open-galaxy` |
    /// | `GOGDL_PATH`          | `gogdl` (resolved on PATH)  |
    /// | `HELPER_TIMEOUT_SECS` | `30`                        |
    /// | `HTTP_TIMEOUT_SECS`   | `30`                        |
    pub fn from_env() -> Self {
        let config_dir = std::env::var("GALAXY_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_dir());

        let gogdl_path = std::env::var("GOGDL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("gogdl"));

        let helper_timeout_secs: u64 = std::env::var("HELPER_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("HELPER_TIMEOUT_SECS must be a valid u64");

        let http_timeout_secs: u64 = std::env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("HTTP_TIMEOUT_SECS must be a valid u64");

        Self {
            config_dir,
            gogdl_path,
            helper_timeout_secs,
            http_timeout_secs,
        }
    }

    /// Where the credential helper keeps its persisted session.
    pub fn auth_config_path(&self) -> PathBuf {
        self.config_dir.join("auth.json")
    }
}

fn default_config_dir() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".config").join("open-galaxy"),
        None => PathBuf::from(".open-galaxy"),
    }
}
