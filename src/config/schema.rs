//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the harness.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::ledger::types::{CommitmentLevel, Pubkey};

/// Root configuration for the transaction harness.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HarnessConfig {
    /// Ledger RPC endpoints.
    pub rpc: RpcConfig,

    /// Confirmation waiting policy.
    pub confirmation: ConfirmationConfig,

    /// Program interface location.
    pub program: ProgramConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Ledger RPC configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RpcConfig {
    /// JSON-RPC endpoint URL.
    pub url: String,

    /// Failover JSON-RPC endpoint URLs, used for reads only.
    pub failover_urls: Vec<String>,

    /// RPC request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Ask the node to skip preflight simulation on submission.
    pub skip_preflight: bool,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8899".to_string(),
            failover_urls: Vec::new(),
            request_timeout_secs: 10,
            skip_preflight: false,
        }
    }
}

/// Confirmation waiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Commitment level used when the caller does not pick one.
    pub commitment: CommitmentLevel,

    /// Upper bound on a whole submission, in seconds.
    pub timeout_secs: u64,

    /// First status poll delay in milliseconds.
    pub poll_interval_ms: u64,

    /// Poll delay ceiling for the exponential backoff, in milliseconds.
    pub max_poll_interval_ms: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            commitment: CommitmentLevel::Confirmed,
            timeout_secs: 60,
            poll_interval_ms: 400,
            max_poll_interval_ms: 2000,
        }
    }
}

/// Program interface configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProgramConfig {
    /// Path to the program's IDL JSON.
    pub idl_path: Option<String>,

    /// Program address; overrides the address recorded in the IDL.
    pub program_id: Option<Pubkey>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
