//! CLI definition

use std::fmt;
use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use tracing::debug;

use crate::config::Config;

/// bs - batch Sui transaction submitter
#[derive(Debug, Parser)]
#[command(
    name = "bs",
    about = "Submit one transaction per credential with bounded concurrency, retries, and proxy rotation",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Summary output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Overrides for values otherwise taken from the config file
#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Maximum tasks in flight
    #[arg(short = 'n', long)]
    pub concurrency: Option<usize>,

    /// Retries after the first attempt (rate limits excluded)
    #[arg(short = 'r', long = "max-retries")]
    pub max_retries: Option<u32>,

    /// Wait after a rate-limit signal, in milliseconds
    #[arg(long = "cooldown-ms")]
    pub cooldown_ms: Option<u64>,

    /// Credentials file, one per line
    #[arg(long)]
    pub credentials: Option<PathBuf>,

    /// Proxies file, one URI per line
    #[arg(long)]
    pub proxies: Option<PathBuf>,

    #[arg(long = "success-file")]
    pub success_file: Option<PathBuf>,

    #[arg(long = "fail-file")]
    pub fail_file: Option<PathBuf>,

    /// JSON-RPC endpoint
    #[arg(long = "rpc-url")]
    pub rpc_url: Option<String>,
}

impl RunArgs {
    /// Apply CLI overrides on top of loaded configuration
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "RunArgs::apply: called");
        if let Some(concurrency) = self.concurrency {
            config.run.concurrency = concurrency;
        }
        if let Some(max_retries) = self.max_retries {
            config.run.max_retries = max_retries;
        }
        if let Some(cooldown_ms) = self.cooldown_ms {
            config.run.cooldown_ms = cooldown_ms;
        }
        if let Some(path) = &self.credentials {
            config.files.credentials = path.clone();
        }
        if let Some(path) = &self.proxies {
            config.files.proxies = path.clone();
        }
        if let Some(path) = &self.success_file {
            config.files.success = path.clone();
        }
        if let Some(path) = &self.fail_file {
            config.files.fail = path.clone();
        }
        if let Some(url) = &self.rpc_url {
            config.rpc.url = url.clone();
        }
    }
}

/// Output format for the run summary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("batchsubmit")
        .join("logs")
        .join("batchsubmit.log")
}
