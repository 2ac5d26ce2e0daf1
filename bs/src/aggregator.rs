//! Result aggregation
//!
//! The single consumer of the run channel. Prints progress lines, appends one
//! `address:credential` line per task to the success or fail log, and counts
//! terminal outcomes.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::domain::{Outcome, RunSummary, Task};
use crate::events::{ConsoleSink, EventReceiver, PersistRequest, RunEvent};
use crate::retry::UNKNOWN_ADDRESS;

/// Append-only line log
///
/// Each line goes out in a single `write_all` under the lock, so concurrent
/// writers never interleave within a line.
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl ResultLog {
    /// Open for appending, creating the file if absent
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        debug!(path = %path.display(), "ResultLog::open: opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line (a trailing newline is added)
    pub fn append(&self, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let mut file = self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        file.write_all(buf.as_bytes())?;
        file.flush()
    }
}

/// Counts observed by the channel consumer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerStats {
    pub persisted: usize,
    pub terminals: usize,
    pub write_errors: usize,
}

/// Collects terminal results into the success and fail logs
#[derive(Debug)]
pub struct ResultAggregator {
    success: ResultLog,
    fail: ResultLog,
}

impl ResultAggregator {
    /// Open both logs in append mode
    pub fn open(success: impl AsRef<Path>, fail: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            success: ResultLog::open(success)?,
            fail: ResultLog::open(fail)?,
        })
    }

    pub fn success_path(&self) -> &Path {
        self.success.path()
    }

    pub fn fail_path(&self) -> &Path {
        self.fail.path()
    }

    /// Persist one task's line to the matching log
    pub fn on_outcome(&self, request: &PersistRequest) -> io::Result<()> {
        let address = request.address.as_deref().unwrap_or(UNKNOWN_ADDRESS);
        let line = format!("{}:{}", address, request.credential.expose());
        let log = if request.success { &self.success } else { &self.fail };
        debug!(task = request.task_index, success = request.success, "on_outcome: appending");
        log.append(&line)
    }

    /// Compute the run summary once every task is terminal
    pub fn finalize(&self, results: &[(Task, Outcome)]) -> RunSummary {
        let summary = RunSummary::tally(results.iter().map(|(_, outcome)| outcome));
        info!(
            total = summary.total_tasks,
            success = summary.success_count,
            fail = summary.fail_count,
            "ResultAggregator::finalize"
        );
        summary
    }

    /// Drain the run channel until every sender is dropped
    pub async fn run(self: Arc<Self>, mut rx: EventReceiver, console: ConsoleSink) -> ConsumerStats {
        debug!("ResultAggregator::run: consumer started");
        let mut stats = ConsumerStats::default();

        while let Some(event) = rx.recv().await {
            match event {
                RunEvent::Progress(progress) => console.progress(&progress),
                RunEvent::Persist(request) => match self.on_outcome(&request) {
                    Ok(()) => stats.persisted += 1,
                    Err(e) => {
                        warn!(task = request.task_index, error = %e, "failed to persist result");
                        stats.write_errors += 1;
                    }
                },
                RunEvent::Terminal { task_index, outcome } => {
                    debug!(task = task_index, success = outcome.is_success(), "terminal outcome");
                    stats.terminals += 1;
                }
            }
        }

        debug!(?stats, "ResultAggregator::run: channel closed");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Credential;
    use crate::events::event_channel;
    use std::fs;
    use tempfile::TempDir;

    fn request(index: usize, address: Option<&str>, secret: &str, success: bool) -> PersistRequest {
        PersistRequest {
            task_index: index,
            address: address.map(str::to_string),
            credential: Credential::new(secret),
            success,
        }
    }

    #[test]
    fn test_open_creates_missing_files() {
        let dir = TempDir::new().unwrap();
        let agg = ResultAggregator::open(dir.path().join("ok.txt"), dir.path().join("bad.txt")).unwrap();

        assert!(agg.success_path().exists());
        assert!(agg.fail_path().exists());
    }

    #[test]
    fn test_lines_go_to_matching_log() {
        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("ok.txt");
        let bad = dir.path().join("bad.txt");
        let agg = ResultAggregator::open(&ok, &bad).unwrap();

        agg.on_outcome(&request(1, Some("0xaa"), "k1", true)).unwrap();
        agg.on_outcome(&request(2, Some("0xbb"), "k2", false)).unwrap();
        agg.on_outcome(&request(3, None, "k3", false)).unwrap();

        assert_eq!(fs::read_to_string(&ok).unwrap(), "0xaa:k1\n");
        assert_eq!(fs::read_to_string(&bad).unwrap(), "0xbb:k2\ninvalid:k3\n");
    }

    #[test]
    fn test_existing_content_is_preserved() {
        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("ok.txt");
        fs::write(&ok, "0xold:k0\n").unwrap();

        let agg = ResultAggregator::open(&ok, dir.path().join("bad.txt")).unwrap();
        agg.on_outcome(&request(1, Some("0xnew"), "k1", true)).unwrap();

        assert_eq!(fs::read_to_string(&ok).unwrap(), "0xold:k0\n0xnew:k1\n");
    }

    #[test]
    fn test_concurrent_appends_do_not_interleave() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let log = Arc::new(ResultLog::open(&path).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let log = log.clone();
                std::thread::spawn(move || {
                    for i in 0..50 {
                        log.append(&format!("0x{:02}{:02}:{}", t, i, "k".repeat(64))).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 400);
        assert!(content.lines().all(|l| l.len() == 6 + 1 + 64 && l.starts_with("0x")));
    }

    #[tokio::test]
    async fn test_consumer_drains_until_senders_dropped() {
        let dir = TempDir::new().unwrap();
        let agg = Arc::new(ResultAggregator::open(dir.path().join("ok.txt"), dir.path().join("bad.txt")).unwrap());
        let (tx, rx) = event_channel();
        let consumer = tokio::spawn(agg.clone().run(rx, ConsoleSink::Silent));

        let emitter = tx.emitter_for(1);
        emitter.info("hello");
        emitter.persist(Some("0xaa".to_string()), Credential::new("k1"), true);
        emitter.terminal(Outcome::success("d"));
        drop(emitter);
        drop(tx);

        let stats = consumer.await.unwrap();
        assert_eq!(
            stats,
            ConsumerStats {
                persisted: 1,
                terminals: 1,
                write_errors: 0
            }
        );
    }

    #[test]
    fn test_finalize_tallies() {
        let dir = TempDir::new().unwrap();
        let agg = ResultAggregator::open(dir.path().join("ok.txt"), dir.path().join("bad.txt")).unwrap();
        let results = vec![
            (Task::new(1, Credential::new("a"), None), Outcome::success("d")),
            (Task::new(2, Credential::new("b"), None), Outcome::failure("x")),
        ];
        let summary = agg.finalize(&results);
        assert_eq!(summary.total_tasks, 2);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.fail_count, 1);
    }
}
