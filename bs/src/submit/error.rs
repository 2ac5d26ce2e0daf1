//! Submission error types

use thiserror::Error;

/// Errors that can occur during a remote submission
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Rate limited (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SubmitError {
    /// Check if this is a rate limit signal
    ///
    /// Rate limits are retried without consuming the attempt budget.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, SubmitError::RateLimited { .. })
    }
}
