//! Git operations for the documentation checkout
//!
//! Thin typed wrappers over the `git` CLI. Each call runs with its own
//! timeout taken from [`Config`]; callers decide which failures matter.

use crate::auth_url::AuthenticatedUrl;
use crate::command::{self, CommandError, CommandOutput};
use crate::config::Config;
use std::path::PathBuf;
use std::time::Duration;

/// Handle on the git CLI bound to one repository directory
#[derive(Debug, Clone)]
pub struct Git {
    program: String,
    repo: PathBuf,
    clone_timeout: Duration,
    remote_timeout: Duration,
    config_timeout: Duration,
    fetch_timeout: Duration,
}

impl Git {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.git_program.clone(),
            repo: config.target_dir.clone(),
            clone_timeout: Duration::from_secs(config.clone_timeout_secs),
            remote_timeout: Duration::from_secs(config.remote_timeout_secs),
            config_timeout: Duration::from_secs(config.config_timeout_secs),
            fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
        }
    }

    /// `git clone <url> <repo>`
    pub async fn clone_from(&self, url: &AuthenticatedUrl) -> Result<CommandOutput, CommandError> {
        let dest = self.repo.to_string_lossy();
        command::run(
            &self.program,
            &["clone", url.as_str(), &*dest],
            None,
            self.clone_timeout,
        )
        .await
    }

    /// `git remote set-url origin <url>`
    pub async fn set_origin_url(&self, url: &str) -> Result<CommandOutput, CommandError> {
        self.in_repo(&["remote", "set-url", "origin", url], self.remote_timeout)
            .await
    }

    /// `git config <key> <value>` on the repository's local config
    pub async fn set_local_config(
        &self,
        key: &str,
        value: &str,
    ) -> Result<CommandOutput, CommandError> {
        self.in_repo(&["config", key, value], self.config_timeout)
            .await
    }

    /// `git remote set-head origin -a`
    pub async fn sync_origin_head(&self) -> Result<CommandOutput, CommandError> {
        self.in_repo(&["remote", "set-head", "origin", "-a"], self.remote_timeout)
            .await
    }

    /// `git fetch origin --prune`
    pub async fn fetch_prune(&self) -> Result<CommandOutput, CommandError> {
        self.in_repo(&["fetch", "origin", "--prune"], self.fetch_timeout)
            .await
    }

    async fn in_repo(&self, args: &[&str], timeout: Duration) -> Result<CommandOutput, CommandError> {
        let repo = self.repo.to_string_lossy();
        let mut full: Vec<&str> = vec!["-C", &*repo];
        full.extend_from_slice(args);
        command::run(&self.program, &full, None, timeout).await
    }
}
