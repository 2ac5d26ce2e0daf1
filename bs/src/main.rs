//! bs - batch Sui transaction submitter
//!
//! CLI entry point: resolves configuration, runs one batch, prints the summary.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use batchsubmit::cli::{Cli, OutputFormat, get_log_path};
use batchsubmit::config::Config;
use batchsubmit::events::{ConsoleSink, render_summary_table};
use batchsubmit::submit::SuiRpcClient;
use batchsubmit::{SubmissionClient, run_batch};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    let log_dir = log_path.parent().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    cli.run.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    debug!(?config, "main: resolved configuration");

    let client: Arc<dyn SubmissionClient> = Arc::new(SuiRpcClient::from_config(&config.rpc, &config.call));

    // JSON mode keeps stdout for the summary object
    let console = match cli.format {
        OutputFormat::Text => ConsoleSink::Stdout,
        OutputFormat::Json => ConsoleSink::Stderr,
    };

    let report = run_batch(&config, client, console).await?;
    info!(
        total = report.summary.total_tasks,
        success = report.summary.success_count,
        fail = report.summary.fail_count,
        "batch complete"
    );

    match cli.format {
        OutputFormat::Text => {
            println!("{}", render_summary_table(&report.summary, &report.success_file, &report.fail_file));
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report).context("Failed to serialize report")?);
        }
    }

    Ok(())
}
