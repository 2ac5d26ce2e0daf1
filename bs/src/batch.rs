//! Batch runner - wires inputs, pool, retry controller, and aggregator

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::ResultAggregator;
use crate::config::Config;
use crate::domain::{Outcome, RunSummary, Task};
use crate::events::{ConsoleSink, Severity, event_channel};
use crate::input;
use crate::pool::WorkerPool;
use crate::proxy::ProxyRotator;
use crate::retry::{RetryController, RetryPolicy};
use crate::submit::SubmissionClient;

/// Terminal outcome of one task, without its secret
#[derive(Debug, Clone, Serialize)]
pub struct TaskReport {
    pub index: usize,
    pub attempts: u32,
    pub rotations: u32,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Everything a completed run produced
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub summary: RunSummary,
    pub success_file: PathBuf,
    pub fail_file: PathBuf,
    /// Result lines that failed to reach the success or fail log
    pub write_errors: usize,
    pub tasks: Vec<TaskReport>,
}

/// Run one batch to completion
///
/// Returns only after every task is terminal and every result line has been
/// written.
pub async fn run_batch(config: &Config, client: Arc<dyn SubmissionClient>, console: ConsoleSink) -> Result<RunReport> {
    debug!(run = ?config.run, "run_batch: called");
    let files = &config.files;

    let credentials = input::load_credentials(&files.credentials).wrap_err("Failed to load credentials")?;
    // Proxy problems never abort the run; they degrade to direct egress
    let endpoints = match input::load_endpoints(&files.proxies) {
        Ok(Some(endpoints)) => endpoints,
        Ok(None) => {
            console.notice(
                Severity::Attempt,
                &format!("Proxy file {} not found, continuing without proxies", files.proxies.display()),
            );
            Vec::new()
        }
        Err(e) => {
            warn!(error = %e, "run_batch: proxy file unreadable");
            console.notice(
                Severity::Attempt,
                &format!("{}, continuing without proxies", describe(&e)),
            );
            Vec::new()
        }
    };

    console.notice(Severity::Info, &format!("Concurrency: {}", config.run.concurrency));
    console.notice(Severity::Info, &format!("Max retries: {}", config.run.max_retries));
    console.notice(Severity::Info, &format!("Loaded {} private keys", credentials.len()));
    console.notice(Severity::Info, &format!("Loaded {} proxies", endpoints.len()));

    let aggregator = Arc::new(
        ResultAggregator::open(&files.success, &files.fail).wrap_err("Failed to open result files")?,
    );

    let tasks = Task::batch(credentials, endpoints.len());
    let controller = RetryController::new(client, ProxyRotator::new(endpoints), RetryPolicy::from_config(&config.run))
        .with_label(config.call.label.clone());

    let (tx, rx) = event_channel();
    let consumer = tokio::spawn(aggregator.clone().run(rx, console));

    let pool = WorkerPool::new(config.run.concurrency, tx);
    let results = pool
        .run(tasks, move |task, emitter| {
            let controller = controller.clone();
            async move { controller.run(task, &emitter).await }
        })
        .await;

    // Close the channel so the consumer can finish draining
    drop(pool);
    let stats = consumer.await.context("Result consumer failed")?;
    info!(?stats, "run_batch: consumer finished");
    if stats.write_errors > 0 {
        console.notice(
            Severity::Error,
            &format!(
                "{} result line(s) could not be written; see the log for details",
                stats.write_errors
            ),
        );
    }

    let summary = aggregator.finalize(&results);
    Ok(RunReport {
        summary,
        success_file: aggregator.success_path().to_path_buf(),
        fail_file: aggregator.fail_path().to_path_buf(),
        write_errors: stats.write_errors,
        tasks: results
            .into_iter()
            .map(|(task, outcome)| TaskReport {
                index: task.index,
                attempts: task.attempt,
                rotations: task.rotations,
                outcome,
            })
            .collect(),
    })
}

/// Error text with its immediate cause
fn describe(e: &input::InputError) -> String {
    match e.source() {
        Some(source) => format!("{}: {}", e, source),
        None => e.to_string(),
    }
}
