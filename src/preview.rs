//! Launching the live preview server
//!
//! One best-effort launch-and-poll cycle. The spawned server outlives the
//! request and is never stopped from here. "Already running" means only
//! that something answers on the preview port.

use crate::command::{self, CommandError, HousekeepingStep, StepOutcome};
use crate::config::Config;
use crate::lock::{self, LockError, OperationLock};
use crate::probe;
use crate::site::SiteTool;
use crate::tail;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum PreviewError {
    #[error("No cloned repository detected")]
    NoRepository { target_dir: PathBuf, marker: PathBuf },

    #[error(transparent)]
    Lock(#[from] LockError),

    #[error("Failed to launch preview server: {source}")]
    Spawn {
        source: CommandError,
        log_tail: String,
    },

    #[error("Failed to start preview server")]
    ReadinessTimeout { attempts: u32, log_tail: String },
}

#[derive(Debug, Clone)]
pub enum PreviewOutcome {
    AlreadyRunning,
    Started { housekeeping: Vec<HousekeepingStep> },
}

impl PreviewOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            PreviewOutcome::AlreadyRunning => "Hugo preview already running",
            PreviewOutcome::Started { .. } => "Hugo preview started",
        }
    }
}

pub struct PreviewLauncher {
    config: Arc<Config>,
    site: SiteTool,
}

impl PreviewLauncher {
    pub fn new(config: Arc<Config>) -> Self {
        let site = SiteTool::new(&config);
        Self { config, site }
    }

    pub async fn start(&self) -> Result<PreviewOutcome, PreviewError> {
        let marker = self.config.marker_path();
        if !marker.is_file() {
            return Err(PreviewError::NoRepository {
                target_dir: self.config.target_dir.clone(),
                marker,
            });
        }

        if self.port_open().await {
            info!(port = self.config.preview_port, "preview already running");
            return Ok(PreviewOutcome::AlreadyRunning);
        }

        let _lock = if self.config.exclusive_operations {
            let held = OperationLock::acquire(&lock::lock_path_for(&self.config.log_path))?;
            // Another launch may have finished between the probe and the lock
            if self.port_open().await {
                return Ok(PreviewOutcome::AlreadyRunning);
            }
            Some(held)
        } else {
            None
        };

        let housekeeping = self.prepare_modules().await;

        let spec = self.site.server_spec(&self.config);
        let mut child = match command::spawn_detached(&spec) {
            Ok(child) => child,
            Err(source) => {
                return Err(PreviewError::Spawn {
                    source,
                    log_tail: self.log_tail().await,
                });
            }
        };
        info!(
            port = self.config.preview_port,
            pid = child.id(),
            log = %self.config.log_path.display(),
            "preview server spawned"
        );

        let mut exit_logged = false;
        for attempt in 1..=self.config.readiness_attempts {
            tokio::time::sleep(self.config.readiness_interval()).await;
            if self.port_open().await {
                info!(attempt, "preview server is accepting connections");
                return Ok(PreviewOutcome::Started { housekeeping });
            }
            if !exit_logged {
                if let Ok(Some(status)) = child.try_wait() {
                    warn!(%status, "preview server exited before binding its port");
                    exit_logged = true;
                }
            }
            debug!(attempt, "preview server not ready yet");
        }

        warn!(
            attempts = self.config.readiness_attempts,
            "preview server did not open its port in time"
        );
        Err(PreviewError::ReadinessTimeout {
            attempts: self.config.readiness_attempts,
            log_tail: self.log_tail().await,
        })
    }

    async fn log_tail(&self) -> String {
        tail::tail_file_async(&self.config.log_path, tail::DEFAULT_TAIL_LINES).await
    }

    async fn port_open(&self) -> bool {
        probe::is_port_open(
            &self.config.preview_host,
            self.config.preview_port,
            self.config.probe_timeout(),
        )
        .await
    }

    /// Wipe the module cache and re-resolve modules; failures only degrade
    async fn prepare_modules(&self) -> Vec<HousekeepingStep> {
        let cache = &self.config.module_cache_dir;
        let cleared = match tokio::fs::remove_dir_all(cache).await {
            Ok(()) => StepOutcome::Succeeded,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StepOutcome::Succeeded,
            Err(e) => StepOutcome::Degraded {
                stderr: e.to_string(),
            },
        };

        let tidy = StepOutcome::best_effort(&self.site.mod_tidy().await);
        let graph = StepOutcome::best_effort(&self.site.mod_graph().await);

        let steps = vec![
            HousekeepingStep::new("clear_module_cache", cleared),
            HousekeepingStep::new("mod_tidy", tidy),
            HousekeepingStep::new("mod_graph", graph),
        ];
        for step in steps.iter().filter(|s| !s.outcome.is_success()) {
            warn!(step = %step.step, "module housekeeping failed, continuing");
        }
        steps
    }
}
