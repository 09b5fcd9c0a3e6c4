use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::tail::DEFAULT_TAIL_LINES;

/// Clone a documentation repository and run a live site preview
#[derive(Parser, Debug)]
#[command(name = "docpreview")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Config file (default: ~/.config/docpreview/config.json)
    #[arg(long, global = true, env = "DOCPREVIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP control interface
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080", env = "DOCPREVIEW_LISTEN")]
        listen: SocketAddr,
    },
    /// Clone the documentation repository into the target directory
    Clone {
        /// http(s) URL of the repository
        #[arg(long)]
        repo_url: String,
        /// Account used for the clone and as git user.name
        #[arg(long)]
        username: String,
        /// Password or access token
        #[arg(long, env = "DOCPREVIEW_PASSWORD", hide_env_values = true)]
        password: String,
        /// git user.email for the checkout
        #[arg(long)]
        email: Option<String>,
    },
    /// Start the preview server unless it is already running
    StartPreview,
    /// Show checkout, preview and tool status
    Status,
    /// Print the end of the preview server log
    Logs {
        /// Number of lines (clamped to 1..=5000)
        #[arg(long, default_value_t = DEFAULT_TAIL_LINES as i64, allow_negative_numbers = true)]
        tail: i64,
    },
}
