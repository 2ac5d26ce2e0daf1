//! Remote submission seam
//!
//! The retry controller only sees [`SubmissionClient`]; the concrete Sui
//! JSON-RPC implementation lives in [`sui`].

use async_trait::async_trait;

mod error;
pub mod sui;

pub use error::SubmitError;
pub use sui::SuiRpcClient;

use crate::identity::Identity;
use crate::proxy::EgressEndpoint;

/// Domain-level result of one submission
///
/// Success is the presence of a reference (transaction digest) without an
/// embedded error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitResponse {
    pub digest: Option<String>,
    pub error: Option<String>,
}

impl SubmitResponse {
    pub fn accepted(digest: impl Into<String>) -> Self {
        Self {
            digest: Some(digest.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            digest: None,
            error: Some(error.into()),
        }
    }
}

/// Performs one remote submission attempt
///
/// Each call is independent; the egress endpoint is chosen by the caller.
#[async_trait]
pub trait SubmissionClient: Send + Sync {
    /// Attempt the remote operation as `identity` through `endpoint`
    async fn submit(
        &self,
        identity: &Identity,
        endpoint: Option<&EgressEndpoint>,
    ) -> Result<SubmitResponse, SubmitError>;

    /// Describe the effective egress identity (e.g. outbound IP)
    ///
    /// Must not fail; implementations fold errors into the returned text.
    async fn probe_egress(&self, endpoint: Option<&EgressEndpoint>) -> String {
        endpoint.map_or_else(|| "direct".to_string(), |e| e.uri().to_string())
    }
}
