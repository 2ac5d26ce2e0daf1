//! Terminal outcomes and run-level summary

use serde::Serialize;

/// Terminal result of one task, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    /// Remote operation accepted; `reference` is the transaction digest
    Success { reference: String },
    /// Task gave up (budget exhausted, fatal derivation error, or fault)
    Failure { reason: String },
}

impl Outcome {
    pub fn success(reference: impl Into<String>) -> Self {
        Self::Success {
            reference: reference.into(),
        }
    }

    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure { reason: reason.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Aggregate counts for a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_tasks: usize,
    pub success_count: usize,
    pub fail_count: usize,
}

impl RunSummary {
    /// Tally a set of terminal outcomes
    pub fn tally<'a>(outcomes: impl IntoIterator<Item = &'a Outcome>) -> Self {
        outcomes.into_iter().fold(Self::default(), |mut summary, outcome| {
            summary.total_tasks += 1;
            if outcome.is_success() {
                summary.success_count += 1;
            } else {
                summary.fail_count += 1;
            }
            summary
        })
    }
}
