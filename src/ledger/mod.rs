//! Ledger integration subsystem.
//!
//! # Data Flow
//! ```text
//! Key file / environment
//!     → signer.rs (key loading, signing)
//! Instruction + blockhash
//!     → transaction.rs (compile message, sign, serialize)
//!     → connection.rs (capability the harness submits through)
//!     → rpc.rs (JSON-RPC implementation with timeouts and read failover)
//! ```
//!
//! # Security Constraints
//! - Secret keys ONLY from key files or environment variables
//! - Never log secret keys
//! - All RPC calls have configurable timeouts

pub mod connection;
pub mod rpc;
pub mod signer;
pub mod transaction;
pub mod types;

pub use connection::Connection;
pub use rpc::RpcConnection;
pub use signer::{Keypair, Signer};
pub use transaction::{AccountMeta, Instruction, Message, Transaction};
pub use types::{
    CommitmentLevel, Hash, LedgerError, LedgerResult, Pubkey, Signature, Slot, TransactionStatus,
};
