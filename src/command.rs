//! External command execution
//!
//! Every delegated tool call goes through [`run`], which captures output and
//! enforces a timeout. A timed-out child is killed when its future is
//! dropped. [`spawn_detached`] is the one exception: it starts a long-lived
//! process in its own process group and hands back a handle that is only
//! used for the immediate readiness check.

use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::debug;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to execute {program}: {source}")]
    Exec {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} timed out after {} seconds", timeout.as_secs())]
    Timeout { program: String, timeout: Duration },

    #[error("{program} exited with status {code}: {stderr}")]
    Failed {
        program: String,
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Failed to open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl CommandError {
    /// Captured stderr, or the error text when the tool never produced any
    pub fn stderr(&self) -> String {
        match self {
            CommandError::Failed { stderr, .. } => stderr.clone(),
            other => other.to_string(),
        }
    }
}

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run `program args...` in `cwd`, failing on timeout or non-zero exit
pub async fn run(
    program: &str,
    args: &[&str],
    cwd: Option<&Path>,
    timeout: Duration,
) -> Result<CommandOutput, CommandError> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    debug!(program, subcommand = args.first().copied().unwrap_or(""), "running command");

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(result) => result.map_err(|source| CommandError::Exec {
            program: program.to_string(),
            source,
        })?,
        Err(_) => {
            return Err(CommandError::Timeout {
                program: program.to_string(),
                timeout,
            });
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if output.status.success() {
        Ok(CommandOutput { stdout, stderr })
    } else {
        Err(CommandError::Failed {
            program: program.to_string(),
            code: output.status.code().unwrap_or(-1),
            stdout,
            stderr,
        })
    }
}

/// How a non-critical step ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Failed, but the surrounding operation carried on
    Degraded { stderr: String },
    /// Failed and aborted the surrounding operation
    Fatal { stderr: String },
}

impl StepOutcome {
    /// Classify a command result as succeeded or degraded
    pub fn best_effort<T>(result: &Result<T, CommandError>) -> Self {
        match result {
            Ok(_) => StepOutcome::Succeeded,
            Err(e) => StepOutcome::Degraded { stderr: e.stderr() },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }

    pub fn stderr(&self) -> Option<&str> {
        match self {
            StepOutcome::Succeeded => None,
            StepOutcome::Degraded { stderr } | StepOutcome::Fatal { stderr } => Some(stderr),
        }
    }
}

/// A named housekeeping step and how it went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HousekeepingStep {
    pub step: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

impl HousekeepingStep {
    pub fn new(step: &str, outcome: StepOutcome) -> Self {
        Self {
            step: step.to_string(),
            outcome,
        }
    }
}

/// Everything needed to start a background process
#[derive(Debug, Clone)]
pub struct SpawnSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// stdout and stderr are both appended here
    pub log_path: PathBuf,
    /// Put the child in its own process group
    pub detach: bool,
}

/// Start the process described by `spec` without waiting for it
///
/// The child is not killed when the handle is dropped; the runtime reaps
/// it once it exits.
pub fn spawn_detached(spec: &SpawnSpec) -> Result<Child, CommandError> {
    if let Some(parent) = spec.log_path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| CommandError::LogFile {
            path: spec.log_path.clone(),
            source,
        })?;
    }

    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&spec.log_path)
        .map_err(|source| CommandError::LogFile {
            path: spec.log_path.clone(),
            source,
        })?;
    let log_err = log.try_clone().map_err(|source| CommandError::LogFile {
        path: spec.log_path.clone(),
        source,
    })?;

    let mut std_cmd = std::process::Command::new(&spec.program);
    std_cmd
        .args(&spec.args)
        .current_dir(&spec.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));

    // New process group so signals aimed at us do not reach the child
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        if spec.detach {
            std_cmd.process_group(0);
        }
    }

    let mut cmd = Command::from(std_cmd);
    cmd.kill_on_drop(false);
    cmd.spawn().map_err(|source| CommandError::Exec {
        program: spec.program.clone(),
        source,
    })
}
