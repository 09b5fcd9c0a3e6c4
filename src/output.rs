//! Response bodies shared by the HTTP facade and the CLI's `--json` mode
//!
//! Every body carries `ok`. Failures add a machine-readable `code`, a
//! human-readable `error`, and whatever tool output helps diagnose them.

use crate::clone::{CloneError, CloneReport};
use crate::command::HousekeepingStep;
use crate::preview::{PreviewError, PreviewOutcome};
use crate::status::StatusReport;
use serde::Serialize;

/// Failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    InvalidScheme,
    TargetNotEmpty,
    ExternalCommand,
    NoRepository,
    ReadinessTimeout,
    NotFound,
    Busy,
    Internal,
}

/// Result of a clone operation
#[derive(Debug, Serialize)]
pub struct CloneResult {
    pub ok: bool,
    pub message: String,
    pub housekeeping: Vec<HousekeepingStep>,
}

/// Result of a preview start
#[derive(Debug, Serialize)]
pub struct PreviewResult {
    pub ok: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub housekeeping: Vec<HousekeepingStep>,
}

#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub ok: bool,
    pub status: StatusReport,
}

#[derive(Debug, Serialize)]
pub struct LogsResult {
    pub ok: bool,
    pub path: String,
    pub lines: usize,
    pub log: String,
}

/// Where a preview start looked for the site
#[derive(Debug, Serialize)]
pub struct PreviewDebug {
    pub target_dir: String,
    pub marker: String,
}

/// Body of every failed request
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub code: ErrorCode,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_tail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<PreviewDebug>,
    /// Steps recorded before the failure, including the fatal one
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub housekeeping: Vec<HousekeepingStep>,
    /// HTTP status this failure maps to
    #[serde(skip)]
    pub status: u16,
}

impl ErrorBody {
    pub fn new(code: ErrorCode, status: u16, error: impl Into<String>) -> Self {
        Self {
            ok: false,
            code,
            error: error.into(),
            stderr: None,
            stderr_name: None,
            stderr_email: None,
            log_tail: None,
            path: None,
            debug: None,
            housekeeping: Vec::new(),
            status,
        }
    }

    pub fn with_stderr(mut self, stderr: &str) -> Self {
        self.stderr = Some(stderr.to_string());
        self
    }

    pub fn with_log_tail(mut self, log_tail: &str) -> Self {
        self.log_tail = Some(log_tail.to_string());
        self
    }

    pub fn with_path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }
}

impl From<CloneReport> for CloneResult {
    fn from(report: CloneReport) -> Self {
        Self {
            ok: true,
            message: report.message,
            housekeeping: report.housekeeping,
        }
    }
}

impl From<PreviewOutcome> for PreviewResult {
    fn from(outcome: PreviewOutcome) -> Self {
        let message = outcome.message().to_string();
        let housekeeping = match outcome {
            PreviewOutcome::Started { housekeeping } => housekeeping,
            PreviewOutcome::AlreadyRunning => Vec::new(),
        };
        Self {
            ok: true,
            message,
            housekeeping,
        }
    }
}

impl From<&CloneError> for ErrorBody {
    fn from(err: &CloneError) -> Self {
        use crate::auth_url::AuthUrlError;
        use crate::target::TargetError;

        let message = err.to_string();
        match err {
            CloneError::Validation(_) => ErrorBody::new(ErrorCode::Validation, 400, message),
            CloneError::Url(AuthUrlError::InvalidScheme { .. }) => {
                ErrorBody::new(ErrorCode::InvalidScheme, 400, message)
            }
            CloneError::Url(_) => ErrorBody::new(ErrorCode::Validation, 400, message),
            CloneError::Target(TargetError::NotEmpty { .. }) => {
                ErrorBody::new(ErrorCode::TargetNotEmpty, 400, message)
            }
            CloneError::Target(_) => ErrorBody::new(ErrorCode::Internal, 500, message),
            CloneError::Lock(crate::lock::LockError::Busy { .. }) => {
                ErrorBody::new(ErrorCode::Busy, 409, message)
            }
            CloneError::Lock(_) => ErrorBody::new(ErrorCode::Internal, 500, message),
            CloneError::CloneFailed { stderr } => {
                ErrorBody::new(ErrorCode::ExternalCommand, 400, message).with_stderr(stderr)
            }
            CloneError::ScrubFailed { step } => {
                let mut body = ErrorBody::new(ErrorCode::ExternalCommand, 400, message)
                    .with_stderr(step.outcome.stderr().unwrap_or_default());
                body.housekeeping = vec![step.clone()];
                body
            }
            CloneError::IdentityFailed {
                stderr_name,
                stderr_email,
            } => {
                let mut body = ErrorBody::new(ErrorCode::ExternalCommand, 400, message);
                body.stderr_name = Some(stderr_name.clone());
                body.stderr_email = Some(stderr_email.clone());
                body
            }
        }
    }
}

impl ErrorBody {
    /// Map a preview failure, carrying its log tail where it has one
    pub fn from_preview(err: &PreviewError) -> Self {
        let message = err.to_string();
        match err {
            PreviewError::NoRepository { target_dir, marker } => {
                let mut body = ErrorBody::new(ErrorCode::NoRepository, 400, message);
                body.debug = Some(PreviewDebug {
                    target_dir: target_dir.to_string_lossy().into_owned(),
                    marker: marker.to_string_lossy().into_owned(),
                });
                body
            }
            PreviewError::Lock(crate::lock::LockError::Busy { .. }) => {
                ErrorBody::new(ErrorCode::Busy, 409, message)
            }
            PreviewError::Lock(_) => ErrorBody::new(ErrorCode::Internal, 500, message),
            PreviewError::Spawn { log_tail, .. } => {
                ErrorBody::new(ErrorCode::ExternalCommand, 500, message).with_log_tail(log_tail)
            }
            PreviewError::ReadinessTimeout { log_tail, .. } => {
                ErrorBody::new(ErrorCode::ReadinessTimeout, 500, message).with_log_tail(log_tail)
            }
        }
    }
}

/// Print JSON output to stdout
pub fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing JSON: {}", e);
            std::process::exit(1);
        }
    }
}
