//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Resumable catalog exporter
#[derive(Parser, Debug)]
#[command(name = "catalog-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Application id (basic auth username)
    #[arg(long, env = "APP_ID", global = true)]
    pub app_id: Option<String>,

    /// Application key (basic auth password)
    #[arg(long, env = "APP_KEY", global = true, hide_env_values = true)]
    pub app_key: Option<String>,

    /// API base URL
    #[arg(long, env = "BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Listed resource (e.g. products)
    #[arg(long, global = true)]
    pub resource: Option<String>,

    /// Output file (JSON Lines)
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Records per page
    #[arg(long, global = true)]
    pub page_size: Option<u32>,

    /// Pause between pages in milliseconds
    #[arg(long, global = true)]
    pub page_delay_ms: Option<u64>,

    /// Wait before retrying a failed page, in milliseconds
    #[arg(long, global = true)]
    pub retry_delay_ms: Option<u64>,

    /// Retries per failed page
    #[arg(long, global = true)]
    pub max_retries: Option<u32>,

    /// Output format for command results
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Log filter: `RUST_LOG` when set, otherwise INFO (DEBUG with `--verbose`)
    pub fn log_filter(&self) -> EnvFilter {
        log_filter_from(std::env::var("RUST_LOG").ok().as_deref(), self.verbose)
    }
}

pub(crate) fn log_filter_from(rust_log: Option<&str>, verbose: bool) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Export all pages to the output file, resuming if possible
    Export {
        /// Discard the progress marker and start from page 1
        #[arg(long)]
        restart: bool,
    },

    /// Fetch page 1 and report catalog size
    Check,

    /// Show progress marker and output line count
    Status,
}

impl Default for Commands {
    fn default() -> Self {
        Self::Export { restart: false }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
