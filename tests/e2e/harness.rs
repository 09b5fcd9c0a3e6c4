use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

pub struct TestContext {
    pub bin_path: PathBuf,
    verbose: bool,
}

/// Isolated HOME plus a config that keeps every path inside it
pub struct TestEnv {
    _dir: TempDir,
    pub root: PathBuf,
    pub home: PathBuf,
    pub xdg_config: PathBuf,
    /// Clone destination configured for this env
    pub target_dir: PathBuf,
    /// Preview log configured for this env
    pub log_path: PathBuf,
}

pub struct CommandOutput {
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestContext {
    pub fn new() -> Result<Self, String> {
        let bin_path = PathBuf::from(env!("CARGO_BIN_EXE_docpreview"));
        if !bin_path.is_file() {
            return Err(format!("binary not built: {}", bin_path.display()));
        }
        Ok(Self {
            bin_path,
            verbose: std::env::var_os("DOCPREVIEW_E2E_LOG").is_some(),
        })
    }

    pub fn create_env(&self, name: &str) -> Result<TestEnv, String> {
        let dir = tempfile::Builder::new()
            .prefix(&format!("docpreview-e2e-{}-", name))
            .tempdir()
            .map_err(|e| format!("Failed to create temp dir: {}", e))?;
        let root = dir.path().to_path_buf();
        let home = root.join("home");
        let xdg_config = home.join(".config");

        let env = TestEnv {
            target_dir: root.join("documentation-dev"),
            log_path: root.join("hugo-server.log"),
            _dir: dir,
            root,
            home,
            xdg_config,
        };

        let config = serde_json::json!({
            "target_dir": env.target_dir,
            "log_path": env.log_path,
            "module_cache_dir": env.root.join("hugo_cache"),
            "site_program": "no-such-site-tool-xyz",
            "preview_port": closed_port()?,
            "probe_timeout_ms": 100,
            "readiness_attempts": 2,
            "readiness_interval_ms": 50
        });
        write_file(
            &env.xdg_config.join("docpreview").join("config.json"),
            &config.to_string(),
        )?;

        Ok(env)
    }

    pub fn run_docpreview(&self, env: &TestEnv, args: &[&str]) -> Result<CommandOutput, String> {
        self.run_docpreview_with_env(env, args, &[])
    }

    /// Run the binary against `env`, with `extra_env` layered on top
    pub fn run_docpreview_with_env(
        &self,
        env: &TestEnv,
        args: &[&str],
        extra_env: &[(&str, &str)],
    ) -> Result<CommandOutput, String> {
        if self.verbose {
            eprintln!("    $ docpreview {}", args.join(" "));
        }
        let mut cmd = Command::new(&self.bin_path);
        cmd.args(args)
            .current_dir(&env.root)
            .env("HOME", &env.home)
            .env("XDG_CONFIG_HOME", &env.xdg_config)
            .env("RUST_LOG", "docpreview=warn")
            .env_remove("DOCPREVIEW_CONFIG")
            .env_remove("DOCPREVIEW_PASSWORD")
            .envs(extra_env.iter().copied());
        capture(&mut cmd)
    }

    pub fn run_system_command(
        &self,
        program: &str,
        args: &[&str],
        cwd: &Path,
    ) -> Result<CommandOutput, String> {
        if self.verbose {
            eprintln!("    $ {} {} (in {})", program, args.join(" "), cwd.display());
        }
        capture(Command::new(program).args(args).current_dir(cwd))
    }

    pub fn command_available(&self, program: &str) -> bool {
        Command::new(program)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }
}

fn capture(cmd: &mut Command) -> Result<CommandOutput, String> {
    cmd.output()
        .map(CommandOutput::from)
        .map_err(|e| format!("Failed to run {:?}: {}", cmd.get_program(), e))
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl CommandOutput {
    pub fn assert_success(&self) -> Result<(), String> {
        if self.status != 0 {
            return Err(format!(
                "exit {} (expected 0)\nstdout: {}\nstderr: {}",
                self.status, self.stdout, self.stderr
            ));
        }
        Ok(())
    }

    pub fn assert_failure(&self) -> Result<(), String> {
        if self.status == 0 {
            return Err(format!("exit 0 (expected failure)\nstdout: {}", self.stdout));
        }
        Ok(())
    }

    pub fn assert_stdout_contains(&self, needle: &str) -> Result<(), String> {
        contains("stdout", &self.stdout, needle)
    }

    pub fn assert_stderr_contains(&self, needle: &str) -> Result<(), String> {
        contains("stderr", &self.stderr, needle)
    }
}

fn contains(stream: &str, haystack: &str, needle: &str) -> Result<(), String> {
    if haystack.contains(needle) {
        Ok(())
    } else {
        Err(format!("{} lacks {:?}:\n{}", stream, needle, haystack))
    }
}

pub fn write_file(path: &Path, content: &str) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    fs::write(path, content).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

pub fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path.display(), e))
}

pub fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))
}

pub fn parse_json(output: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(output).map_err(|e| format!("Invalid JSON output: {}\n{}", e, output))
}

/// A localhost port with nothing listening on it
pub fn closed_port() -> Result<u16, String> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")
        .map_err(|e| format!("Failed to bind probe port: {}", e))?;
    listener
        .local_addr()
        .map(|addr| addr.port())
        .map_err(|e| e.to_string())
}
