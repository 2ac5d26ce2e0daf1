//! Event types for batch activity streaming

use chrono::{DateTime, Local};

use crate::domain::{Credential, Outcome};

/// Severity of a progress line, drives console colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Attempt,
    Success,
    Error,
}

/// Observability-only message from one task
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub task_index: usize,
    pub message: String,
    pub severity: Severity,
    /// Captured at emission, not at print time
    pub at: DateTime<Local>,
}

impl ProgressEvent {
    pub fn new(task_index: usize, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            task_index,
            message: message.into(),
            severity,
            at: Local::now(),
        }
    }
}

/// Request to append one line to the success or fail log
#[derive(Debug, Clone)]
pub struct PersistRequest {
    pub task_index: usize,
    /// Derived address; None when derivation never succeeded
    pub address: Option<String>,
    pub credential: Credential,
    pub success: bool,
}

/// Everything that flows over the run channel
#[derive(Debug, Clone)]
pub enum RunEvent {
    Progress(ProgressEvent),
    Persist(PersistRequest),
    Terminal { task_index: usize, outcome: Outcome },
}

impl RunEvent {
    /// Get the event type as a string (for logging)
    pub fn event_type(&self) -> &'static str {
        match self {
            RunEvent::Progress(_) => "progress",
            RunEvent::Persist(_) => "persist",
            RunEvent::Terminal { .. } => "terminal",
        }
    }

    /// Get the task index this event belongs to
    pub fn task_index(&self) -> usize {
        match self {
            RunEvent::Progress(p) => p.task_index,
            RunEvent::Persist(p) => p.task_index,
            RunEvent::Terminal { task_index, .. } => *task_index,
        }
    }
}
