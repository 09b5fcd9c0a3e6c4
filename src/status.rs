//! Diagnostic snapshot for `/status`

use crate::config::Config;
use crate::probe;
use crate::site::SiteTool;
use crate::tail;
use crate::target;
use serde::Serialize;

/// Lines of log included in the snapshot
pub const STATUS_LOG_LINES: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub target_exists: bool,
    pub marker_exists: bool,
    pub port_open: bool,
    pub tool_path: Option<String>,
    pub tool_version: Option<String>,
    pub listing: Option<String>,
    pub log_path: String,
    pub log_tail: String,
}

/// Gather the current state of checkout, preview port, tool and log
pub async fn collect(config: &Config) -> StatusReport {
    let site = SiteTool::new(config);

    let tool_version = match site.version().await {
        Ok(v) => v,
        Err(e) => format!("error: {}", e),
    };

    let listing = if config.target_dir.is_dir() {
        Some(match target::listing(&config.target_dir) {
            Ok(names) => names.join("\n"),
            Err(e) => format!("error: {}", e),
        })
    } else {
        None
    };

    StatusReport {
        target_exists: config.target_dir.is_dir(),
        marker_exists: config.marker_path().is_file(),
        port_open: probe::is_port_open(
            &config.preview_host,
            config.preview_port,
            config.probe_timeout(),
        )
        .await,
        tool_path: site.path().map(|p| p.to_string_lossy().into_owned()),
        tool_version: Some(tool_version),
        listing,
        log_path: config.log_path.to_string_lossy().into_owned(),
        log_tail: tail::tail_file_async(&config.log_path, STATUS_LOG_LINES).await,
    }
}
