//! Sui JSON-RPC submission client
//!
//! One submission is two RPC round trips through the task's egress endpoint:
//! `unsafe_moveCall` builds the transaction bytes, the identity signs them,
//! and `sui_executeTransactionBlock` executes them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, Proxy, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{SubmissionClient, SubmitError, SubmitResponse};
use crate::config::{CallConfig, RpcConfig};
use crate::identity::Identity;
use crate::proxy::EgressEndpoint;

const ADDRESS_PLACEHOLDER: &str = "{address}";
const ADDRESS_SUFFIX_PLACEHOLDER: &str = "{address_last5}";

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoveCallResult {
    tx_bytes: String,
}

#[derive(Debug, Deserialize)]
struct ExecuteResult {
    digest: Option<String>,
    effects: Option<Effects>,
}

#[derive(Debug, Deserialize)]
struct Effects {
    status: ExecutionStatus,
}

#[derive(Debug, Deserialize)]
struct ExecutionStatus {
    status: String,
    error: Option<String>,
}

impl ExecuteResult {
    fn into_response(self) -> SubmitResponse {
        match self.effects {
            Some(Effects { status }) if status.status != "success" => {
                SubmitResponse::rejected(status.error.unwrap_or_else(|| format!("execution {}", status.status)))
            }
            _ => match self.digest {
                Some(digest) => SubmitResponse::accepted(digest),
                None => SubmitResponse::rejected("Unknown error"),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpProbe {
    ip: String,
}

/// Sui JSON-RPC client
pub struct SuiRpcClient {
    rpc_url: String,
    ip_probe_url: Option<String>,
    timeout: Duration,
    call: CallConfig,
    /// One HTTP client per egress endpoint (None = direct)
    clients: Mutex<HashMap<Option<String>, Client>>,
    next_id: AtomicU64,
}

impl SuiRpcClient {
    /// Create a new client from configuration
    pub fn from_config(rpc: &RpcConfig, call: &CallConfig) -> Self {
        debug!(url = %rpc.url, function = %call.function, "SuiRpcClient::from_config: called");
        Self {
            rpc_url: rpc.url.clone(),
            ip_probe_url: rpc.ip_probe_url.clone(),
            timeout: rpc.timeout(),
            call: call.clone(),
            clients: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// HTTP client routed through `endpoint`, built on first use
    fn http_for(&self, endpoint: Option<&EgressEndpoint>) -> Result<Client, SubmitError> {
        let key = endpoint.map(|e| e.uri().to_string());
        let mut clients = self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }

        debug!(endpoint = ?key, "http_for: building client");
        let mut builder = Client::builder().timeout(self.timeout);
        builder = match endpoint {
            Some(endpoint) => builder.proxy(Proxy::all(endpoint.uri())?),
            // Direct egress ignores HTTP(S)_PROXY from the environment
            None => builder.no_proxy(),
        };
        let client = builder.build()?;
        clients.insert(key, client.clone());
        Ok(client)
    }

    async fn rpc_call(&self, http: &Client, method: &str, params: Value) -> Result<Value, SubmitError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(%method, id, "rpc_call: sending");
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = http.post(&self.rpc_url).json(&body).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            debug!(%method, "rpc_call: rate limited (429)");
            return Err(SubmitError::RateLimited {
                status: status.as_u16(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SubmitError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: RpcEnvelope = response
            .json()
            .await
            .map_err(|e| SubmitError::InvalidResponse(format!("{}: {}", method, e)))?;

        if let Some(error) = envelope.error {
            return Err(SubmitError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        envelope
            .result
            .ok_or_else(|| SubmitError::InvalidResponse(format!("{}: missing result", method)))
    }

    /// Substitute per-task placeholders in the configured arguments
    fn render_arguments(&self, address: &str) -> Vec<Value> {
        let suffix = &address[address.len().saturating_sub(5)..];
        self.call
            .arguments
            .iter()
            .map(|arg| match arg.as_str() {
                Some(ADDRESS_PLACEHOLDER) => Value::String(address.to_string()),
                Some(ADDRESS_SUFFIX_PLACEHOLDER) => Value::String(suffix.to_string()),
                _ => arg.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl SubmissionClient for SuiRpcClient {
    async fn submit(
        &self,
        identity: &Identity,
        endpoint: Option<&EgressEndpoint>,
    ) -> Result<SubmitResponse, SubmitError> {
        let http = self.http_for(endpoint)?;

        let params = json!([
            identity.address(),
            self.call.package,
            self.call.module,
            self.call.function,
            self.call.type_arguments,
            self.render_arguments(identity.address()),
            Value::Null,
            self.call.gas_budget.to_string(),
        ]);
        let built: MoveCallResult = serde_json::from_value(self.rpc_call(&http, "unsafe_moveCall", params).await?)
            .map_err(|e| SubmitError::InvalidResponse(format!("unsafe_moveCall: {}", e)))?;

        let tx_bytes = BASE64
            .decode(&built.tx_bytes)
            .map_err(|e| SubmitError::InvalidResponse(format!("txBytes: {}", e)))?;
        let signature = identity.sign_transaction(&tx_bytes);

        let params = json!([
            built.tx_bytes,
            [signature],
            { "showEffects": true, "showEvents": true },
            "WaitForLocalExecution",
        ]);
        let executed: ExecuteResult =
            serde_json::from_value(self.rpc_call(&http, "sui_executeTransactionBlock", params).await?)
                .map_err(|e| SubmitError::InvalidResponse(format!("sui_executeTransactionBlock: {}", e)))?;

        Ok(executed.into_response())
    }

    async fn probe_egress(&self, endpoint: Option<&EgressEndpoint>) -> String {
        let Some(url) = self.ip_probe_url.as_deref() else {
            return endpoint.map_or_else(|| "direct".to_string(), |e| e.uri().to_string());
        };

        let probe = async {
            let http = self.http_for(endpoint)?;
            let ip: IpProbe = http.get(url).send().await?.error_for_status()?.json().await?;
            Ok::<_, SubmitError>(ip.ip)
        };

        match probe.await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(error = %e, "probe_egress: failed");
                format!("Unknown (Error: {})", e)
            }
        }
    }
}
