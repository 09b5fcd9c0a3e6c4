use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docpreview::cli::{Cli, Command};
use docpreview::clone::{CloneOrchestrator, CloneRequest};
use docpreview::config::Config;
use docpreview::output::{self, ErrorBody, ErrorCode, LogsResult, StatusResult};
use docpreview::preview::PreviewLauncher;
use docpreview::{http, status, tail};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docpreview=info")),
        )
        .init();

    let cli = Cli::parse();
    let json_output = cli.json;

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Command::Serve { listen }) => run_serve(config, listen).await,
        Some(Command::Clone {
            repo_url,
            username,
            password,
            email,
        }) => {
            let request = CloneRequest {
                repo_url,
                username,
                password,
                email,
            };
            run_clone(config, request, json_output).await
        }
        Some(Command::StartPreview) => run_start_preview(config, json_output).await,
        Some(Command::Status) => run_status(config, json_output).await,
        Some(Command::Logs { tail }) => run_logs(config, tail, json_output),
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            std::process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Config::load().context("failed to load config"),
    }
}

async fn run_serve(config: Config, listen: SocketAddr) -> Result<()> {
    tracing::info!(
        target_dir = %config.target_dir.display(),
        preview_port = config.preview_port,
        "starting docpreview"
    );
    http::serve(config, listen)
        .await
        .with_context(|| format!("failed to serve on {}", listen))
}

async fn run_clone(config: Config, request: CloneRequest, json_output: bool) -> Result<()> {
    let orchestrator = CloneOrchestrator::new(Arc::new(config));

    match orchestrator.clone_repo(&request).await {
        Ok(report) => {
            if json_output {
                output::print_json(&output::CloneResult::from(report));
            } else {
                println!("{}", report.message);
                for step in &report.housekeeping {
                    if !step.outcome.is_success() {
                        println!("  warning: {} did not complete", step.step);
                    }
                }
            }
            Ok(())
        }
        Err(e) => exit_with(ErrorBody::from(&e), json_output),
    }
}

async fn run_start_preview(config: Config, json_output: bool) -> Result<()> {
    let launcher = PreviewLauncher::new(Arc::new(config));

    match launcher.start().await {
        Ok(outcome) => {
            if json_output {
                output::print_json(&output::PreviewResult::from(outcome));
            } else {
                println!("{}", outcome.message());
            }
            Ok(())
        }
        Err(e) => exit_with(ErrorBody::from_preview(&e), json_output),
    }
}

async fn run_status(config: Config, json_output: bool) -> Result<()> {
    let report = status::collect(&config).await;

    if json_output {
        output::print_json(&StatusResult {
            ok: true,
            status: report,
        });
        return Ok(());
    }

    let yes_no = |b: bool| if b { "yes" } else { "no" };
    println!(
        "Target directory:  {} ({})",
        config.target_dir.display(),
        yes_no(report.target_exists)
    );
    println!("Site marker:       {}", yes_no(report.marker_exists));
    println!(
        "Preview port:      {} ({})",
        config.preview_port,
        if report.port_open { "open" } else { "closed" }
    );
    println!(
        "Site tool:         {}",
        report.tool_path.as_deref().unwrap_or("not found")
    );
    if let Some(version) = &report.tool_version {
        println!("Site tool version: {}", version);
    }
    println!("Log file:          {}", report.log_path);
    if !report.log_tail.is_empty() {
        println!("\n{}", report.log_tail);
    }
    Ok(())
}

fn run_logs(config: Config, tail_lines: i64, json_output: bool) -> Result<()> {
    let lines = tail::clamp_lines(tail_lines);
    let path = config.log_path.to_string_lossy().into_owned();
    let log = tail::tail_file(&config.log_path, lines);

    if log.is_empty() {
        let body =
            ErrorBody::new(ErrorCode::NotFound, 404, "Log file not found or empty").with_path(&path);
        exit_with(body, json_output);
    }

    if json_output {
        output::print_json(&LogsResult {
            ok: true,
            path,
            lines,
            log,
        });
    } else {
        println!("{}", log);
    }
    Ok(())
}

/// Report a failed operation and exit non-zero
fn exit_with(body: ErrorBody, json_output: bool) -> ! {
    if json_output {
        output::print_json(&body);
    } else {
        eprintln!("Error: {}", body.error);
        for detail in [&body.stderr, &body.stderr_name, &body.stderr_email, &body.log_tail]
            .into_iter()
            .flatten()
        {
            if !detail.trim().is_empty() {
                eprintln!("\n{}", detail.trim_end());
            }
        }
    }
    std::process::exit(1);
}
