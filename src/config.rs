//! Configuration file support for docpreview
//!
//! Reads configuration from `~/.config/docpreview/config.json`. Every field
//! is optional, and a leading `~` in a path field means the home directory:
//!
//! ```json
//! {
//!   "target_dir": "/home/coder/documentation-dev",
//!   "log_path": "/home/coder/hugo-server.log",
//!   "preview_port": 1313,
//!   "base_url": "http://preview.localhost/"
//! }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PREVIEW_PORT: u16 = 1313;
const DEFAULT_BASE_URL: &str = "http://preview.localhost/";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot determine config directory. HOME environment variable not set.")]
    NoConfigDir,

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Runtime configuration shared read-only by every orchestrator
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the documentation repository is cloned
    pub target_dir: PathBuf,
    /// File inside `target_dir` that marks a usable site checkout
    pub marker_file: String,
    /// Append-only log of the preview server's output
    pub log_path: PathBuf,
    /// Host the port probe connects to
    pub preview_host: String,
    /// Interface the preview server binds
    pub preview_bind: String,
    pub preview_port: u16,
    pub base_url: String,
    /// Module cache wiped before each preview start
    pub module_cache_dir: PathBuf,
    pub git_program: String,
    pub site_program: String,
    /// Whether `/clone` rejects requests without an email
    pub require_email: bool,

    pub clone_timeout_secs: u64,
    pub remote_timeout_secs: u64,
    pub config_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
    pub module_timeout_secs: u64,
    pub version_timeout_secs: u64,
    pub probe_timeout_ms: u64,
    pub readiness_attempts: u32,
    pub readiness_interval_ms: u64,

    /// Serialize clone and preview start with advisory file locks
    pub exclusive_operations: bool,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            target_dir: home.join("documentation-dev"),
            marker_file: "hugo.yaml".to_string(),
            log_path: home.join("hugo-server.log"),
            preview_host: "127.0.0.1".to_string(),
            preview_bind: "0.0.0.0".to_string(),
            preview_port: DEFAULT_PREVIEW_PORT,
            base_url: DEFAULT_BASE_URL.to_string(),
            module_cache_dir: home.join(".cache").join("hugo_cache"),
            git_program: "git".to_string(),
            site_program: "hugo".to_string(),
            require_email: true,
            clone_timeout_secs: 900,
            remote_timeout_secs: 30,
            config_timeout_secs: 20,
            fetch_timeout_secs: 120,
            module_timeout_secs: 120,
            version_timeout_secs: 10,
            probe_timeout_ms: 500,
            readiness_attempts: 20,
            readiness_interval_ms: 500,
            exclusive_operations: true,
        }
    }
}

impl Config {
    /// Load configuration from the default path or return defaults if not found
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path, defaulting when it is absent
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config: Config =
            serde_json::from_str(&content).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        config.expand_home();
        Ok(config)
    }

    fn expand_home(&mut self) {
        let Some(home) = dirs::home_dir() else {
            return;
        };
        for path in [
            &mut self.target_dir,
            &mut self.log_path,
            &mut self.module_cache_dir,
        ] {
            let expanded = match path.strip_prefix("~") {
                Ok(rest) => home.join(rest),
                Err(_) => continue,
            };
            *path = expanded;
        }
    }

    /// Full path of the site marker file
    pub fn marker_path(&self) -> PathBuf {
        self.target_dir.join(&self.marker_file)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }
}

/// Returns the config file path: `~/.config/docpreview/config.json`
pub fn config_path() -> Result<PathBuf, ConfigError> {
    // Use XDG_CONFIG_HOME if set, otherwise fall back to ~/.config
    let config_base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".config"))
                .unwrap_or_default()
        });

    if config_base.as_os_str().is_empty() {
        return Err(ConfigError::NoConfigDir);
    }

    Ok(config_base.join("docpreview").join("config.json"))
}
