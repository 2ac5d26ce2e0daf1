//! Bounded-concurrency worker pool
//!
//! Admits tasks in input order, never runs more than `limit` at once, and
//! turns every task (including one that panics) into exactly one terminal
//! outcome.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::domain::{Outcome, Task};
use crate::events::{EventSender, TaskEmitter};

/// Runs tasks with a fixed concurrency ceiling
pub struct WorkerPool {
    limit: usize,
    semaphore: Arc<Semaphore>,
    events: EventSender,
}

impl WorkerPool {
    /// Create a pool admitting at most `limit` tasks at once (minimum 1)
    pub fn new(limit: usize, events: EventSender) -> Self {
        let limit = limit.max(1);
        debug!(limit, "WorkerPool::new: called");
        Self {
            limit,
            semaphore: Arc::new(Semaphore::new(limit)),
            events,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Execute every task and return `(task, outcome)` pairs ordered by index
    ///
    /// Slots are handed out first-come-first-served in the order of `tasks`.
    /// A `Terminal` event is emitted for each task as it finishes.
    pub async fn run<F, Fut>(&self, tasks: Vec<Task>, execute: F) -> Vec<(Task, Outcome)>
    where
        F: Fn(Task, TaskEmitter) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = (Task, Outcome)> + Send + 'static,
    {
        info!(tasks = tasks.len(), limit = self.limit, "WorkerPool::run: starting");
        let execute = Arc::new(execute);
        let mut pending: HashMap<usize, Task> = HashMap::with_capacity(tasks.len());
        let mut running = JoinSet::new();

        for task in tasks {
            let permit = match self.semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!(task = task.index, error = %e, "WorkerPool::run: semaphore closed");
                    pending.insert(task.index, task);
                    continue;
                }
            };
            debug!(task = task.index, "WorkerPool::run: admitted");

            pending.insert(task.index, task.clone());
            let emitter = self.events.emitter_for(task.index);
            let execute = execute.clone();

            running.spawn(async move {
                let snapshot = task.clone();
                let result = AssertUnwindSafe(async { (execute.as_ref())(task, emitter.clone()).await })
                    .catch_unwind()
                    .await;

                let (task, outcome) = match result {
                    Ok(finished) => finished,
                    Err(payload) => {
                        let message = panic_message(payload.as_ref());
                        error!(task = snapshot.index, panic = %message, "task panicked");
                        emitter.error(format!("Unexpected error: {}", message));
                        emitter.persist(None, snapshot.credential.clone(), false);
                        (snapshot, Outcome::failure(format!("panicked: {}", message)))
                    }
                };

                emitter.terminal(outcome.clone());
                drop(permit);
                (task, outcome)
            });
        }

        let mut results = Vec::with_capacity(pending.len());
        while let Some(joined) = running.join_next().await {
            match joined {
                Ok((task, outcome)) => {
                    pending.remove(&task.index);
                    results.push((task, outcome));
                }
                Err(e) => error!(error = %e, "WorkerPool::run: task join failed"),
            }
        }

        // Anything still pending never reported back
        for (index, task) in pending {
            let emitter = self.events.emitter_for(index);
            emitter.persist(None, task.credential.clone(), false);
            let outcome = Outcome::failure("task did not complete");
            emitter.terminal(outcome.clone());
            results.push((task, outcome));
        }

        results.sort_by_key(|(task, _)| task.index);
        info!(finished = results.len(), "WorkerPool::run: all tasks terminal");
        results
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
