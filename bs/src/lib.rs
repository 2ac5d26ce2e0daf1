//! batchsubmit - bounded-concurrency batch submitter
//!
//! Turns a list of credentials into one remote submission each:
//! - `pool`: admits tasks FIFO under a concurrency ceiling
//! - `retry`: per-task state machine with rate-limit aware retries
//! - `proxy`: per-task cyclic egress rotation over a shared endpoint list
//! - `submit`: the remote call seam and its Sui JSON-RPC implementation
//! - `aggregator`: single consumer writing the success and fail logs

pub mod aggregator;
pub mod batch;
pub mod cli;
pub mod config;
pub mod domain;
pub mod events;
pub mod identity;
pub mod input;
pub mod pool;
pub mod proxy;
pub mod retry;
pub mod submit;

pub use aggregator::{ConsumerStats, ResultAggregator, ResultLog};
pub use batch::{RunReport, TaskReport, run_batch};
pub use config::Config;
pub use domain::{Credential, Outcome, RunSummary, Task};
pub use events::{ConsoleSink, EventSender, PersistRequest, ProgressEvent, RunEvent, Severity, TaskEmitter, event_channel};
pub use identity::{Identity, IdentityError, IdentityProvider};
pub use input::InputError;
pub use pool::WorkerPool;
pub use proxy::{EgressEndpoint, ProxyRotator};
pub use retry::{AttemptResult, AttemptState, RetryController, RetryPolicy};
pub use submit::{SubmissionClient, SubmitError, SubmitResponse, SuiRpcClient};
