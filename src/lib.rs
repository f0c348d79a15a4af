//! Transaction harness for on-chain programs.
//!
//! Submits a described program call, signs it, and waits until the ledger
//! reports it at a requested commitment level, classifying every other
//! outcome into a typed result.

pub mod config;
pub mod harness;
pub mod ledger;
pub mod lifecycle;
pub mod observability;
pub mod program;
pub mod resilience;

pub use config::schema::HarnessConfig;
pub use harness::{FailureReason, HarnessSettings, SubmissionResult, TransactionHarness};
pub use ledger::{CommitmentLevel, Connection, Keypair, Pubkey, RpcConnection, Signature, Signer};
pub use lifecycle::Shutdown;
pub use program::{ArgType, ArgValue, CallDescriptor, ProgramInterface};
