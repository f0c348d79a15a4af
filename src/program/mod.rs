//! Program interface subsystem.
//!
//! # Data Flow
//! ```text
//! IDL JSON (or code)
//!     → interface.rs (ProgramInterface: method name → accounts + arg types)
//! CallDescriptor (descriptor.rs)
//!     → ProgramInterface::encode (validate, resolve accounts, borsh-encode args)
//!     → ledger::Instruction
//! ```

pub mod descriptor;
pub mod interface;

use thiserror::Error;

use crate::ledger::types::Pubkey;

pub use descriptor::{ArgType, ArgValue, CallDescriptor};
pub use interface::{AccountDef, ArgDef, InstructionDef, ProgramInterface, SYSTEM_PROGRAM_ID};

/// A call descriptor that does not fit the program interface.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Unknown method '{0}'")]
    UnknownMethod(String),

    #[error("Method '{0}' mutates state but no signer was provided")]
    NoSigner(String),

    #[error("Method '{method}' takes {expected} arguments, got {actual}")]
    ArgCount {
        method: String,
        expected: usize,
        actual: usize,
    },

    #[error("Argument '{name}' expects {expected}, got {actual}")]
    ArgType {
        name: String,
        expected: ArgType,
        actual: ArgType,
    },

    #[error("Invalid {ty} value '{raw}': {reason}")]
    InvalidArg {
        ty: ArgType,
        raw: String,
        reason: String,
    },

    #[error("Account '{0}' was not provided")]
    MissingAccount(String),

    #[error("Method '{method}' has no account named '{account}'")]
    UnknownAccount { method: String, account: String },

    #[error("Account '{account}' ({pubkey}) must sign but is not in the signer set")]
    SignerNotProvided { account: String, pubkey: Pubkey },

    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// A program interface document that could not be loaded.
#[derive(Debug, Error)]
pub enum InterfaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid IDL: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IDL does not record a program address and none was configured")]
    MissingProgramId,

    #[error("Instruction '{0}' is defined twice")]
    DuplicateInstruction(String),
}
