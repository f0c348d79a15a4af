//! JSON-RPC connection with timeout and failover handling.
//!
//! # Responsibilities
//! - Speak JSON-RPC 2.0 over HTTP to the primary endpoint
//! - Fail over to secondary endpoints for reads
//! - Map node, transport and timeout failures onto `LedgerError`
//!
//! `sendTransaction` only ever goes to the primary endpoint. A transaction
//! that reached one node may already be in flight, so it is never replayed
//! against another.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::RpcConfig;
use crate::ledger::connection::Connection;
use crate::ledger::types::{Hash, LedgerError, LedgerResult, Signature, TransactionStatus};
use crate::observability::metrics;
use crate::resilience::retries::is_retryable;

/// JSON-RPC error code the node uses for preflight simulation failures.
const SIMULATION_FAILED: i64 = -32002;

#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct SimulationData {
    #[serde(default)]
    err: Option<Value>,
    #[serde(default)]
    logs: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct ContextValue<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct BlockhashValue {
    blockhash: Hash,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransactionMeta {
    #[serde(default)]
    log_messages: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct TransactionRecord {
    #[serde(default)]
    meta: Option<TransactionMeta>,
}

/// HTTP JSON-RPC connection to a ledger node.
#[derive(Clone)]
pub struct RpcConnection {
    http: Client,
    /// Primary endpoint first, then failovers.
    endpoints: Vec<String>,
    timeout: Duration,
    skip_preflight: bool,
}

impl RpcConnection {
    /// Create a connection from configuration.
    ///
    /// The primary URL must parse; unparsable failover URLs are skipped with a
    /// warning.
    pub fn new(config: &RpcConfig) -> LedgerResult<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);

        url::Url::parse(&config.url).map_err(|e| {
            LedgerError::Transport(format!("Invalid RPC URL '{}': {}", config.url, e))
        })?;
        let mut endpoints = vec![config.url.clone()];

        for url_str in &config.failover_urls {
            if url::Url::parse(url_str).is_ok() {
                endpoints.push(url_str.clone());
            } else {
                tracing::warn!(url = %url_str, "Ignoring invalid failover RPC URL");
            }
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Transport(e.to_string()))?;

        tracing::info!(
            rpc_url = %config.url,
            failover_count = endpoints.len() - 1,
            timeout_secs = config.request_timeout_secs,
            "RPC connection initialized"
        );

        Ok(Self {
            http,
            endpoints,
            timeout,
            skip_preflight: config.skip_preflight,
        })
    }

    /// Issue one JSON-RPC call against one endpoint.
    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        method: &str,
        params: Value,
    ) -> LedgerResult<Option<T>> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };

        let response = self
            .http
            .post(endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Transport(format!(
                "{} returned HTTP {}",
                endpoint, status
            )));
        }

        let body: JsonRpcResponse<T> = response
            .json()
            .await
            .map_err(|e| LedgerError::Decode(format!("{}: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(map_rpc_error(error));
        }

        Ok(body.result)
    }

    /// Issue a read, failing over to the next endpoint on retryable errors.
    async fn read<T: DeserializeOwned>(&self, method: &str, params: Value) -> LedgerResult<Option<T>> {
        let mut last_error = None;

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            match self.call(endpoint, method, params.clone()).await {
                Ok(result) => return Ok(result),
                Err(e) if is_retryable(&e) => {
                    tracing::warn!(endpoint_idx = i, method, error = %e, "RPC error, trying next endpoint");
                    metrics::record_rpc_error(method);
                    last_error = Some(e);
                }
                Err(e) => {
                    metrics::record_rpc_error(method);
                    return Err(e);
                }
            }
        }

        match last_error {
            Some(e) if self.endpoints.len() == 1 => Err(e),
            _ => Err(LedgerError::NotAvailable(format!(
                "All {} RPC endpoints failed for {}",
                self.endpoints.len(),
                method
            ))),
        }
    }

    fn map_transport_error(&self, e: reqwest::Error) -> LedgerError {
        if e.is_timeout() {
            LedgerError::Timeout(self.timeout)
        } else {
            LedgerError::Transport(e.to_string())
        }
    }

    /// Primary endpoint URL.
    pub fn url(&self) -> &str {
        &self.endpoints[0]
    }
}

fn map_rpc_error(error: JsonRpcError) -> LedgerError {
    if error.code == SIMULATION_FAILED {
        let data: SimulationData = error
            .data
            .and_then(|d| serde_json::from_value(d).ok())
            .unwrap_or_default();
        return LedgerError::Simulation {
            message: error.message,
            err: data.err,
            logs: data.logs.unwrap_or_default(),
        };
    }
    LedgerError::Rpc {
        code: error.code,
        message: error.message,
    }
}

fn required<T>(method: &str, result: Option<T>) -> LedgerResult<T> {
    result.ok_or_else(|| LedgerError::Decode(format!("{} returned an empty result", method)))
}

#[async_trait]
impl Connection for RpcConnection {
    async fn send_transaction(&self, wire_base64: &str) -> LedgerResult<Signature> {
        let params = json!([
            wire_base64,
            {"encoding": "base64", "skipPreflight": self.skip_preflight}
        ]);
        let result = self
            .call::<Signature>(self.url(), "sendTransaction", params)
            .await
            .inspect_err(|_| metrics::record_rpc_error("sendTransaction"))?;
        required("sendTransaction", result)
    }

    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> LedgerResult<Option<TransactionStatus>> {
        let params = json!([[signature.to_string()], {"searchTransactionHistory": true}]);
        let result: ContextValue<Vec<Option<TransactionStatus>>> =
            required("getSignatureStatuses", self.read("getSignatureStatuses", params).await?)?;
        Ok(result.value.into_iter().next().flatten())
    }

    async fn get_latest_blockhash(&self) -> LedgerResult<Hash> {
        let params = json!([{"commitment": "confirmed"}]);
        let result: ContextValue<BlockhashValue> =
            required("getLatestBlockhash", self.read("getLatestBlockhash", params).await?)?;
        Ok(result.value.blockhash)
    }

    async fn get_transaction_logs(&self, signature: &Signature) -> LedgerResult<Vec<String>> {
        let params = json!([
            signature.to_string(),
            {"encoding": "json", "commitment": "confirmed", "maxSupportedTransactionVersion": 0}
        ]);
        let record: Option<TransactionRecord> = self.read("getTransaction", params).await?;
        Ok(record
            .and_then(|r| r.meta)
            .and_then(|m| m.log_messages)
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for RpcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcConnection")
            .field("rpc_url", &self.endpoints[0])
            .field("failover_count", &(self.endpoints.len() - 1))
            .field("timeout", &self.timeout)
            .finish()
    }
}
