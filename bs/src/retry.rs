//! Per-task retry controller
//!
//! Drives one task from its first attempt to a terminal outcome:
//!
//! ```text
//!            ┌──────────── rate limit (rotate, cooldown) ───────────┐
//!            ▼                                                      │
//!   ──▶ Attempting ──▶ success ──▶ Succeeded                   RateLimited
//!            │  ▲                                                   ▲
//!            │  └── rotate, attempt += 1 ── RetryableFailure        │
//!            │                                   │                  │
//!            └──────── failure ─────────────────▶│                  │
//!            └──────── 429 ──────────────────────┼──────────────────┘
//!                                                ▼ budget spent
//!                                            Exhausted
//! ```
//!
//! Rate-limit signals never consume the attempt budget. Attempts for one task
//! are strictly sequential.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::domain::{Outcome, Task};
use crate::events::TaskEmitter;
use crate::identity::{Identity, IdentityProvider};
use crate::proxy::ProxyRotator;
use crate::submit::{SubmissionClient, SubmitError, SubmitResponse};

/// Placeholder written to the address column when no identity exists
pub const UNKNOWN_ADDRESS: &str = "invalid";

/// Retry budget for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub max_retries: u32,

    /// Wait after a rate-limit signal
    pub cooldown: Duration,

    /// Optional bound on rate-limit retries (None = unbounded)
    pub rate_limit_ceiling: Option<u32>,
}

impl RetryPolicy {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            cooldown: config.cooldown(),
            rate_limit_ceiling: config.rate_limit_ceiling,
        }
    }

    /// Total budgeted attempts (first attempt plus retries)
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// States of the per-task machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    Attempting,
    RateLimited,
    RetryableFailure { reason: String },
    Succeeded { reference: String },
    Exhausted { reason: String },
}

/// Structured classification of one submission result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptResult {
    Success { reference: String },
    RateLimited,
    Failed { reason: String },
}

impl AttemptResult {
    /// Classify a raw submission result
    ///
    /// Transport faults and embedded errors are treated alike; only the
    /// rate-limit signal is distinguished.
    pub fn classify(result: Result<SubmitResponse, SubmitError>) -> Self {
        match result {
            Ok(SubmitResponse {
                digest: Some(reference),
                error: None,
            }) => AttemptResult::Success { reference },
            Ok(SubmitResponse { error: Some(reason), .. }) => AttemptResult::Failed { reason },
            Ok(SubmitResponse {
                digest: None,
                error: None,
            }) => AttemptResult::Failed {
                reason: "Unknown error".to_string(),
            },
            Err(e) if e.is_rate_limit() => AttemptResult::RateLimited,
            Err(e) => AttemptResult::Failed { reason: e.to_string() },
        }
    }
}

/// Runs the retry state machine for individual tasks
///
/// Cheap to clone; every clone shares the client and endpoint list.
#[derive(Clone)]
pub struct RetryController {
    client: Arc<dyn SubmissionClient>,
    rotator: ProxyRotator,
    policy: RetryPolicy,
    label: String,
}

impl RetryController {
    pub fn new(client: Arc<dyn SubmissionClient>, rotator: ProxyRotator, policy: RetryPolicy) -> Self {
        Self {
            client,
            rotator,
            policy,
            label: "submit".to_string(),
        }
    }

    /// Name the operation in progress lines ("Attempt 1/6 to mint passport")
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Drive `task` to a terminal outcome
    ///
    /// The task is threaded through by value and returned with its final
    /// cursor and counters.
    pub async fn run(&self, mut task: Task, emitter: &TaskEmitter) -> (Task, Outcome) {
        debug!(task = task.index, "RetryController::run: called");

        let identity = match IdentityProvider::derive(&task.credential) {
            Ok(identity) => identity,
            Err(e) => {
                warn!(task = task.index, error = %e, "identity derivation failed");
                emitter.error(format!("Failed to create keypair: {}", e));
                emitter.persist(None, task.credential.clone(), false);
                return (task, Outcome::failure(format!("identity derivation failed: {}", e)));
            }
        };

        let egress = self.client.probe_egress(self.rotator.select(&task)).await;
        emitter.info(format!("Starting with IP: {}", egress));

        let total = self.policy.total_attempts();
        let mut state = AttemptState::Attempting;

        loop {
            state = match state {
                AttemptState::Attempting => self.attempt(&task, &identity, total, emitter).await,
                AttemptState::RateLimited => {
                    task.rate_limited += 1;
                    if self.policy.rate_limit_ceiling.is_some_and(|c| task.rate_limited > c) {
                        AttemptState::Exhausted {
                            reason: format!("rate limited {} times", task.rate_limited),
                        }
                    } else {
                        emitter.error("Received rate-limit signal. Rotating proxy and retrying (not counting attempt).");
                        self.rotate(&mut task, emitter);
                        tokio::time::sleep(self.policy.cooldown).await;
                        AttemptState::Attempting
                    }
                }
                AttemptState::RetryableFailure { reason } => {
                    emitter.error(format!("Attempt {}/{} failed: {}", task.attempt, total, reason));
                    if task.attempt >= total {
                        AttemptState::Exhausted { reason }
                    } else {
                        self.rotate(&mut task, emitter);
                        task.attempt += 1;
                        AttemptState::Attempting
                    }
                }
                AttemptState::Succeeded { reference } => {
                    info!(task = task.index, %reference, attempt = task.attempt, "task succeeded");
                    emitter.success(format!("{} succeeded, digest: {}", capitalize(&self.label), reference));
                    emitter.persist(Some(identity.address().to_string()), task.credential.clone(), true);
                    return (task, Outcome::success(reference));
                }
                AttemptState::Exhausted { reason } => {
                    warn!(task = task.index, %reason, "task exhausted");
                    emitter.error(format!("All attempts failed for wallet {}", identity.address()));
                    emitter.persist(Some(identity.address().to_string()), task.credential.clone(), false);
                    return (task, Outcome::failure(reason));
                }
            };
        }
    }

    async fn attempt(&self, task: &Task, identity: &Identity, total: u32, emitter: &TaskEmitter) -> AttemptState {
        emitter.attempt(format!("Attempt {}/{} to {}", task.attempt, total, self.label));
        let endpoint = self.rotator.select(task);
        debug!(task = task.index, attempt = task.attempt, endpoint = ?endpoint, "attempt: submitting");

        match AttemptResult::classify(self.client.submit(identity, endpoint).await) {
            AttemptResult::Success { reference } => AttemptState::Succeeded { reference },
            AttemptResult::RateLimited => AttemptState::RateLimited,
            AttemptResult::Failed { reason } => AttemptState::RetryableFailure { reason },
        }
    }

    fn rotate(&self, task: &mut Task, emitter: &TaskEmitter) {
        let len = self.rotator.len();
        if let Some(endpoint) = self.rotator.advance(task) {
            debug!(task = task.index, %endpoint, "rotate: switched endpoint");
            let position = task.proxy_cursor.map_or(0, |c| c + 1);
            emitter.info(format!("Switched to proxy {}/{}", position, len));
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
