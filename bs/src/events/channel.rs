//! Many-producer, single-consumer event channel
//!
//! Producers never block on each other: the channel is unbounded and the only
//! back-pressure is the consumer draining it.

use tokio::sync::mpsc;
use tracing::debug;

use super::types::{PersistRequest, ProgressEvent, RunEvent, Severity};
use crate::domain::{Credential, Outcome};

/// Receiving half, owned by the aggregator
pub type EventReceiver = mpsc::UnboundedReceiver<RunEvent>;

/// Create a new run channel
pub fn event_channel() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

/// Cloneable sending half of the run channel
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<RunEvent>,
}

impl EventSender {
    /// Send a raw event
    ///
    /// Fire-and-forget: if the consumer is gone the event is dropped.
    pub fn send(&self, event: RunEvent) {
        debug!(event_type = event.event_type(), task = event.task_index(), "EventSender::send");
        let _ = self.tx.send(event);
    }

    /// Create an emitter bound to one task
    pub fn emitter_for(&self, task_index: usize) -> TaskEmitter {
        TaskEmitter {
            tx: self.clone(),
            task_index,
        }
    }
}

/// Handle for one execution unit to emit events without knowing the consumer
///
/// Events from one emitter arrive at the consumer in emission order.
#[derive(Debug, Clone)]
pub struct TaskEmitter {
    tx: EventSender,
    task_index: usize,
}

impl TaskEmitter {
    /// Get the task index this emitter is bound to
    pub fn task_index(&self) -> usize {
        self.task_index
    }

    pub fn progress(&self, severity: Severity, message: impl Into<String>) {
        self.tx
            .send(RunEvent::Progress(ProgressEvent::new(self.task_index, severity, message)));
    }

    // === Convenience methods ===

    pub fn info(&self, message: impl Into<String>) {
        self.progress(Severity::Info, message);
    }

    pub fn attempt(&self, message: impl Into<String>) {
        self.progress(Severity::Attempt, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.progress(Severity::Success, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.progress(Severity::Error, message);
    }

    /// Ask the aggregator to append this task's line to a result log
    pub fn persist(&self, address: Option<String>, credential: Credential, success: bool) {
        self.tx.send(RunEvent::Persist(PersistRequest {
            task_index: self.task_index,
            address,
            credential,
            success,
        }));
    }

    /// Announce the task's terminal outcome
    pub fn terminal(&self, outcome: Outcome) {
        self.tx.send(RunEvent::Terminal {
            task_index: self.task_index,
            outcome,
        });
    }
}
