//! Run events - typed channel between execution units and the aggregator
//!
//! Every execution unit emits through a [`TaskEmitter`]; a single consumer
//! (the result aggregator) drains the channel, prints progress lines, and
//! persists terminal results.

mod channel;
mod console;
mod types;

pub use channel::{EventReceiver, EventSender, TaskEmitter, event_channel};
pub use console::{ConsoleSink, format_progress, render_summary_table};
pub use types::{PersistRequest, ProgressEvent, RunEvent, Severity};
