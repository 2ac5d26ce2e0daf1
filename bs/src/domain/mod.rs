//! Domain types for batchsubmit
//!
//! Core domain types: Credential, Task, Outcome, RunSummary.
//! A Task is owned by exactly one execution unit at a time and is threaded
//! through the retry controller by value.

mod outcome;
mod task;

pub use outcome::{Outcome, RunSummary};
pub use task::{Credential, Task};
