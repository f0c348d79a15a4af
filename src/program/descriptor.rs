//! Call descriptors: one method invocation against a deployed program.

use borsh::BorshSerialize;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ledger::signer::Signer;
use crate::ledger::types::Pubkey;
use crate::program::DescriptorError;

/// Argument types an instruction can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I64,
    String,
    Bytes,
    #[serde(rename = "publicKey", alias = "pubkey")]
    Pubkey,
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArgType::Bool => "bool",
            ArgType::U8 => "u8",
            ArgType::U16 => "u16",
            ArgType::U32 => "u32",
            ArgType::U64 => "u64",
            ArgType::I64 => "i64",
            ArgType::String => "string",
            ArgType::Bytes => "bytes",
            ArgType::Pubkey => "publicKey",
        };
        f.write_str(name)
    }
}

/// A typed argument value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I64(i64),
    String(String),
    Bytes(Vec<u8>),
    Pubkey(Pubkey),
}

impl ArgValue {
    pub fn arg_type(&self) -> ArgType {
        match self {
            ArgValue::Bool(_) => ArgType::Bool,
            ArgValue::U8(_) => ArgType::U8,
            ArgValue::U16(_) => ArgType::U16,
            ArgValue::U32(_) => ArgType::U32,
            ArgValue::U64(_) => ArgType::U64,
            ArgValue::I64(_) => ArgType::I64,
            ArgValue::String(_) => ArgType::String,
            ArgValue::Bytes(_) => ArgType::Bytes,
            ArgValue::Pubkey(_) => ArgType::Pubkey,
        }
    }

    /// Parse a textual value as `ty`. Bytes are given as base58.
    pub fn parse(ty: ArgType, raw: &str) -> Result<Self, DescriptorError> {
        let invalid = |reason: String| DescriptorError::InvalidArg {
            ty,
            raw: raw.to_string(),
            reason,
        };
        let value = match ty {
            ArgType::Bool => ArgValue::Bool(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
            ArgType::U8 => ArgValue::U8(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
            ArgType::U16 => ArgValue::U16(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
            ArgType::U32 => ArgValue::U32(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
            ArgType::U64 => ArgValue::U64(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
            ArgType::I64 => ArgValue::I64(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
            ArgType::String => ArgValue::String(raw.to_string()),
            ArgType::Bytes => ArgValue::Bytes(
                bs58::decode(raw)
                    .into_vec()
                    .map_err(|e| invalid(e.to_string()))?,
            ),
            ArgType::Pubkey => ArgValue::Pubkey(raw.parse().map_err(|e| invalid(format!("{}", e)))?),
        };
        Ok(value)
    }

    /// Append the Borsh encoding of this value.
    pub(crate) fn encode_into(&self, buf: &mut Vec<u8>) -> std::io::Result<()> {
        match self {
            ArgValue::Bool(v) => BorshSerialize::serialize(v, buf),
            ArgValue::U8(v) => BorshSerialize::serialize(v, buf),
            ArgValue::U16(v) => BorshSerialize::serialize(v, buf),
            ArgValue::U32(v) => BorshSerialize::serialize(v, buf),
            ArgValue::U64(v) => BorshSerialize::serialize(v, buf),
            ArgValue::I64(v) => BorshSerialize::serialize(v, buf),
            ArgValue::String(v) => BorshSerialize::serialize(v, buf),
            ArgValue::Bytes(v) => BorshSerialize::serialize(v, buf),
            ArgValue::Pubkey(v) => BorshSerialize::serialize(&v.to_bytes(), buf),
        }
    }
}

/// Description of one program call.
///
/// Built per invocation and consumed by
/// [`TransactionHarness::submit`](crate::harness::TransactionHarness::submit).
/// The first signer pays fees.
#[derive(Clone)]
pub struct CallDescriptor {
    method: String,
    args: Vec<ArgValue>,
    accounts: Vec<(String, Pubkey)>,
    signers: Vec<Arc<dyn Signer>>,
}

impl CallDescriptor {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Vec::new(),
            accounts: Vec::new(),
            signers: Vec::new(),
        }
    }

    /// Append the next positional argument.
    pub fn arg(mut self, value: ArgValue) -> Self {
        self.args.push(value);
        self
    }

    /// Bind an instruction account by name.
    pub fn account(mut self, name: impl Into<String>, pubkey: Pubkey) -> Self {
        self.accounts.push((name.into(), pubkey));
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signers.push(signer);
        self
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[ArgValue] {
        &self.args
    }

    pub fn accounts(&self) -> &[(String, Pubkey)] {
        &self.accounts
    }

    pub fn signers(&self) -> &[Arc<dyn Signer>] {
        &self.signers
    }

    pub fn fee_payer(&self) -> Option<&Arc<dyn Signer>> {
        self.signers.first()
    }
}

impl fmt::Debug for CallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signers: Vec<Pubkey> = self.signers.iter().map(|s| s.pubkey()).collect();
        f.debug_struct("CallDescriptor")
            .field("method", &self.method)
            .field("args", &self.args)
            .field("accounts", &self.accounts)
            .field("signers", &signers)
            .finish()
    }
}
