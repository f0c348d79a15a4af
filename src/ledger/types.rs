//! Ledger primitive types and error definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Defines a fixed-width byte newtype that displays and parses as base58.
macro_rules! base58_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr, $what:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name([u8; $len]);

        impl $name {
            /// Byte length of the value.
            pub const LEN: usize = $len;

            pub const fn new(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            pub fn to_bytes(&self) -> [u8; $len] {
                self.0
            }

            /// Build from a slice, failing if the length is wrong.
            pub fn try_from_slice(bytes: &[u8]) -> LedgerResult<Self> {
                let array: [u8; $len] = bytes.try_into().map_err(|_| {
                    LedgerError::Encoding(format!(
                        "{} must be {} bytes, got {}",
                        $what,
                        $len,
                        bytes.len()
                    ))
                })?;
                Ok(Self(array))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&bs58::encode(self.0).into_string())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = bs58::decode(s).into_vec().map_err(|e| {
                    LedgerError::Encoding(format!("Invalid base58 {} '{}': {}", $what, s, e))
                })?;
                Self::try_from_slice(&bytes)
            }
        }

        impl TryFrom<String> for $name {
            type Error = LedgerError;

            fn try_from(s: String) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.to_string()
            }
        }
    };
}

base58_bytes!(
    /// Account address (ed25519 public key or program-derived address).
    Pubkey,
    32,
    "public key"
);

base58_bytes!(
    /// Transaction signature; the first signature doubles as the transaction id.
    Signature,
    64,
    "signature"
);

base58_bytes!(
    /// Recent blockhash that anchors a message to a ledger position.
    Hash,
    32,
    "blockhash"
);

/// Slot number type.
pub type Slot = u64;

/// How deeply a transaction is confirmed against rollback.
///
/// Variants are ordered by strength so `Finalized > Confirmed > Processed`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitmentLevel {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl CommitmentLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitmentLevel::Processed => "processed",
            CommitmentLevel::Confirmed => "confirmed",
            CommitmentLevel::Finalized => "finalized",
        }
    }
}

impl fmt::Display for CommitmentLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommitmentLevel {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(CommitmentLevel::Processed),
            "confirmed" => Ok(CommitmentLevel::Confirmed),
            "finalized" => Ok(CommitmentLevel::Finalized),
            other => Err(LedgerError::Encoding(format!(
                "Unknown commitment level '{}' (expected processed, confirmed or finalized)",
                other
            ))),
        }
    }
}

/// Status of a signature as reported by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    /// Slot the transaction was processed in.
    pub slot: Slot,
    /// Deepest commitment the ledger reports for this transaction.
    #[serde(default)]
    pub confirmation_status: Option<CommitmentLevel>,
    /// Execution error, if the transaction was included but failed.
    #[serde(default)]
    pub err: Option<serde_json::Value>,
}

impl TransactionStatus {
    /// Whether the transaction is at or above `level`.
    pub fn reached(&self, level: CommitmentLevel) -> bool {
        self.confirmation_status.is_some_and(|current| current >= level)
    }
}

/// Whether a ledger error value was raised by a program instruction rather
/// than by the runtime before execution.
pub fn is_program_failure(err: &serde_json::Value) -> bool {
    err.get("InstructionError").is_some()
}

/// Errors that can occur while talking to the ledger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The node answered with a JSON-RPC error.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Preflight simulation rejected the transaction.
    #[error("Simulation failed: {message}")]
    Simulation {
        message: String,
        err: Option<serde_json::Value>,
        logs: Vec<String>,
    },

    /// Connection could not be established or was dropped.
    #[error("Transport error: {0}")]
    Transport(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0:?}")]
    Timeout(Duration),

    /// Response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Value could not be encoded or parsed.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Invalid key material.
    #[error("Keypair error: {0}")]
    Keypair(String),

    /// No endpoint could serve the request.
    #[error("Ledger not available: {0}")]
    NotAvailable(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
