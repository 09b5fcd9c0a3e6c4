//! Static-site tool (Hugo) invocations

use crate::command::{self, CommandError, CommandOutput, SpawnSpec};
use crate::config::Config;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SiteTool {
    program: String,
    site_dir: PathBuf,
    module_timeout: Duration,
    version_timeout: Duration,
}

impl SiteTool {
    pub fn new(config: &Config) -> Self {
        Self {
            program: config.site_program.clone(),
            site_dir: config.target_dir.clone(),
            module_timeout: Duration::from_secs(config.module_timeout_secs),
            version_timeout: Duration::from_secs(config.version_timeout_secs),
        }
    }

    /// Resolved executable path, if the tool is on `PATH`
    pub fn path(&self) -> Option<PathBuf> {
        which::which(&self.program).ok()
    }

    /// Version banner: stdout, or stderr when stdout is empty
    ///
    /// A tool that prints a banner and then exits non-zero still reports
    /// that banner; only a tool that cannot run at all is an error.
    pub async fn version(&self) -> Result<String, CommandError> {
        match command::run(&self.program, &["version"], None, self.version_timeout).await {
            Ok(out) => Ok(banner(&out.stdout, &out.stderr)),
            Err(CommandError::Failed { stdout, stderr, .. }) => Ok(banner(&stdout, &stderr)),
            Err(e) => Err(e),
        }
    }

    /// `hugo mod tidy`
    pub async fn mod_tidy(&self) -> Result<CommandOutput, CommandError> {
        command::run(
            &self.program,
            &["mod", "tidy"],
            Some(&self.site_dir),
            self.module_timeout,
        )
        .await
    }

    /// `hugo mod graph`
    pub async fn mod_graph(&self) -> Result<CommandOutput, CommandError> {
        command::run(
            &self.program,
            &["mod", "graph"],
            Some(&self.site_dir),
            self.module_timeout,
        )
        .await
    }

    /// Detached `hugo server -D` bound per `config`, logging to the preview log
    pub fn server_spec(&self, config: &Config) -> SpawnSpec {
        SpawnSpec {
            program: self.program.clone(),
            args: vec![
                "server".to_string(),
                "-D".to_string(),
                "--bind".to_string(),
                config.preview_bind.clone(),
                "--port".to_string(),
                config.preview_port.to_string(),
                "--baseURL".to_string(),
                config.base_url.clone(),
            ],
            cwd: self.site_dir.clone(),
            log_path: config.log_path.clone(),
            detach: true,
        }
    }
}

fn banner(stdout: &str, stderr: &str) -> String {
    let stdout = stdout.trim();
    if stdout.is_empty() {
        stderr.trim().to_string()
    } else {
        stdout.to_string()
    }
}
