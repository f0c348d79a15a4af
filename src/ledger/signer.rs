//! Transaction signers.
//!
//! # Security
//! - Secret keys are loaded from files or the environment, never from config
//! - Keys are never logged or serialized

use ed25519_dalek::{Signer as _, SigningKey};
use rand::Rng;
use std::path::Path;

use crate::ledger::types::{LedgerError, LedgerResult, Pubkey, Signature};

/// Environment variable holding a keypair (base58 or JSON byte array).
pub const KEYPAIR_ENV_VAR: &str = "TX_HARNESS_KEYPAIR";

/// Anything that can authorize a transaction.
pub trait Signer: Send + Sync {
    /// Address the signature verifies against.
    fn pubkey(&self) -> Pubkey;

    /// Sign serialized message bytes.
    fn sign_message(&self, message: &[u8]) -> Signature;
}

/// Local ed25519 keypair.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        let secret: [u8; 32] = rand::thread_rng().gen();
        Self::from_secret_bytes(&secret)
    }

    /// Create from a 32-byte ed25519 secret.
    pub fn from_secret_bytes(secret: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(secret),
        }
    }

    /// Create from 64 keypair bytes (secret followed by public key).
    ///
    /// Fails if the public half does not match the secret.
    pub fn from_keypair_bytes(bytes: &[u8]) -> LedgerResult<Self> {
        let array: &[u8; 64] = bytes.try_into().map_err(|_| {
            LedgerError::Keypair(format!("Keypair must be 64 bytes, got {}", bytes.len()))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(array)
            .map_err(|e| LedgerError::Keypair(format!("Invalid keypair bytes: {}", e)))?;
        Ok(Self { signing_key })
    }

    /// Parse a keypair from either a JSON byte array or a base58 string.
    pub fn from_encoded(encoded: &str) -> LedgerResult<Self> {
        let trimmed = encoded.trim();
        let bytes = if trimmed.starts_with('[') {
            serde_json::from_str::<Vec<u8>>(trimmed)
                .map_err(|e| LedgerError::Keypair(format!("Invalid keypair JSON: {}", e)))?
        } else {
            bs58::decode(trimmed)
                .into_vec()
                .map_err(|e| LedgerError::Keypair(format!("Invalid base58 keypair: {}", e)))?
        };
        Self::from_keypair_bytes(&bytes)
    }

    /// Load a key file in the JSON byte-array format the ledger CLI writes.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LedgerError::Keypair(format!("Cannot read keypair file {}: {}", path.display(), e))
        })?;
        let keypair = Self::from_encoded(&content)?;
        tracing::info!(pubkey = %keypair.pubkey(), path = %path.display(), "Keypair loaded");
        Ok(keypair)
    }

    /// Load keypair from environment variable.
    ///
    /// Reads `TX_HARNESS_KEYPAIR` from environment.
    pub fn from_env() -> LedgerResult<Self> {
        let encoded = std::env::var(KEYPAIR_ENV_VAR).map_err(|_| {
            LedgerError::Keypair(format!("Environment variable {} not set", KEYPAIR_ENV_VAR))
        })?;
        let keypair = Self::from_encoded(&encoded)?;
        tracing::info!(pubkey = %keypair.pubkey(), "Keypair loaded from environment");
        Ok(keypair)
    }
}

impl Signer for Keypair {
    fn pubkey(&self) -> Pubkey {
        Pubkey::new(self.signing_key.verifying_key().to_bytes())
    }

    fn sign_message(&self, message: &[u8]) -> Signature {
        Signature::new(self.signing_key.sign(message).to_bytes())
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}
