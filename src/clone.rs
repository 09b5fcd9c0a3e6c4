//! Authenticated clone of the documentation repository
//!
//! Sequence:
//! 1. validate the request
//! 2. build the credential URL (http(s) only)
//! 3. guard the target directory (absent or empty)
//! 4. `git clone` with the credential URL
//! 5. reset `origin` to the plain URL so no secret stays in `.git/config`
//! 6. set local `user.name` / `user.email`
//! 7. sync `origin/HEAD` and fetch with pruning (best effort)
//!
//! Any failure in 1-6 aborts the rest. A failed clone leaves its partial
//! checkout behind; nothing is rolled back.

use crate::auth_url::{self, AuthUrlError};
use crate::command::{HousekeepingStep, StepOutcome};
use crate::config::Config;
use crate::git::Git;
use crate::lock::{self, LockError, OperationLock};
use crate::target::{self, TargetError};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum CloneError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Url(#[from] AuthUrlError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("git clone failed")]
    CloneFailed { stderr: String },

    /// Carries the `remote_set_url` step recorded as fatal
    #[error("Failed to scrub credentials from remote URL")]
    ScrubFailed { step: HousekeepingStep },

    #[error("Failed to configure git user.name or user.email")]
    IdentityFailed {
        stderr_name: String,
        stderr_email: String,
    },
}

/// Fields accepted by `/clone`; absent fields deserialize as empty
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CloneRequest {
    pub repo_url: String,
    pub username: String,
    pub password: String,
    pub email: Option<String>,
}

impl CloneRequest {
    fn trimmed(&self) -> CloneRequest {
        CloneRequest {
            repo_url: self.repo_url.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.trim().to_string(),
            email: self
                .email
                .as_deref()
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string),
        }
    }

    fn validate(&self, require_email: bool) -> Result<(), CloneError> {
        if self.repo_url.is_empty() {
            return Err(CloneError::Validation(
                "Repository URL is required".to_string(),
            ));
        }
        if self.username.is_empty() || self.password.is_empty() {
            return Err(CloneError::Validation(
                "Username and password are required".to_string(),
            ));
        }
        if require_email && self.email.is_none() {
            return Err(CloneError::Validation("Email is required".to_string()));
        }
        Ok(())
    }
}

/// Outcome of a successful clone
#[derive(Debug, Clone)]
pub struct CloneReport {
    pub message: String,
    pub housekeeping: Vec<HousekeepingStep>,
}

pub struct CloneOrchestrator {
    config: Arc<Config>,
    git: Git,
}

impl CloneOrchestrator {
    pub fn new(config: Arc<Config>) -> Self {
        let git = Git::new(&config);
        Self { config, git }
    }

    pub async fn clone_repo(&self, request: &CloneRequest) -> Result<CloneReport, CloneError> {
        let req = request.trimmed();
        req.validate(self.config.require_email)?;

        let auth_url = auth_url::build_auth_url(&req.repo_url, &req.username, &req.password)?;

        let _lock = if self.config.exclusive_operations {
            Some(OperationLock::acquire(&lock::lock_path_for(
                &self.config.target_dir,
            ))?)
        } else {
            None
        };

        target::ensure_clean(&self.config.target_dir)?;

        info!(
            repo_url = %req.repo_url,
            target = %self.config.target_dir.display(),
            "cloning repository"
        );

        if let Err(e) = self.git.clone_from(&auth_url).await {
            let stderr = auth_url::redact(&e.stderr(), &auth_url, &req.repo_url, &req.password);
            warn!(repo_url = %req.repo_url, "git clone failed");
            return Err(CloneError::CloneFailed { stderr });
        }

        let mut housekeeping = Vec::new();

        if let Err(e) = self.git.set_origin_url(&req.repo_url).await {
            let stderr = auth_url::redact(&e.stderr(), &auth_url, &req.repo_url, &req.password);
            warn!("could not reset origin to the plain URL");
            return Err(CloneError::ScrubFailed {
                step: HousekeepingStep::new("remote_set_url", StepOutcome::Fatal { stderr }),
            });
        }
        housekeeping.push(HousekeepingStep::new("remote_set_url", StepOutcome::Succeeded));

        self.configure_identity(&req).await?;

        let head = self.git.sync_origin_head().await;
        let fetch = self.git.fetch_prune().await;
        for (step, result) in [("remote_set_head", head), ("fetch_prune", fetch)] {
            let outcome = match StepOutcome::best_effort(&result) {
                StepOutcome::Degraded { stderr } => {
                    let stderr = auth_url::redact(&stderr, &auth_url, &req.repo_url, &req.password);
                    warn!(step, "housekeeping step failed");
                    StepOutcome::Degraded { stderr }
                }
                other => other,
            };
            housekeeping.push(HousekeepingStep::new(step, outcome));
        }

        info!(target = %self.config.target_dir.display(), "clone complete");

        Ok(CloneReport {
            message: "Repository cloned and git user configured".to_string(),
            housekeeping,
        })
    }

    async fn configure_identity(&self, req: &CloneRequest) -> Result<(), CloneError> {
        let name = self.git.set_local_config("user.name", &req.username).await;
        let email = match &req.email {
            Some(email) => Some(self.git.set_local_config("user.email", email).await),
            None => None,
        };

        let name_failed = name.is_err();
        let email_failed = matches!(email, Some(Err(_)));
        if !name_failed && !email_failed {
            return Ok(());
        }

        Err(CloneError::IdentityFailed {
            stderr_name: name.err().map(|e| e.stderr()).unwrap_or_default(),
            stderr_email: email
                .and_then(|r| r.err())
                .map(|e| e.stderr())
                .unwrap_or_default(),
        })
    }
}
