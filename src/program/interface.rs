//! Program interface descriptors.
//!
//! # Responsibilities
//! - Describe a program's instructions (accounts, argument types)
//! - Load that description from an Anchor-style IDL document
//! - Validate a `CallDescriptor` against it and encode the instruction
//!
//! # Encoding
//! ```text
//! data = sha256("global:<snake_case_name>")[..8] ++ borsh(arg_0) ++ borsh(arg_1) ...
//! ```

use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::ledger::transaction::{AccountMeta, Instruction};
use crate::ledger::types::Pubkey;
use crate::program::descriptor::{ArgType, CallDescriptor};
use crate::program::{DescriptorError, InterfaceError};

/// Address of the native system program.
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::new([0u8; 32]);

/// Convert `initializeBlog` to `initialize_blog`; snake_case passes through.
pub fn to_snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, ch) in name.chars().enumerate() {
        if ch.is_ascii_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Account slot declared by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDef {
    pub name: String,
    pub is_mut: bool,
    pub is_signer: bool,
}

impl AccountDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: to_snake_case(&name.into()),
            is_mut: false,
            is_signer: false,
        }
    }

    pub fn writable(mut self) -> Self {
        self.is_mut = true;
        self
    }

    pub fn signer(mut self) -> Self {
        self.is_signer = true;
        self
    }
}

/// Positional argument declared by an instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDef {
    pub name: String,
    pub ty: ArgType,
}

/// One instruction of a program interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionDef {
    pub name: String,
    pub accounts: Vec<AccountDef>,
    pub args: Vec<ArgDef>,
}

impl InstructionDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: to_snake_case(&name.into()),
            accounts: Vec::new(),
            args: Vec::new(),
        }
    }

    pub fn account(mut self, account: AccountDef) -> Self {
        self.accounts.push(account);
        self
    }

    pub fn arg(mut self, name: impl Into<String>, ty: ArgType) -> Self {
        self.args.push(ArgDef {
            name: name.into(),
            ty,
        });
        self
    }

    /// Whether calling this instruction writes ledger state.
    pub fn mutates(&self) -> bool {
        self.accounts.iter().any(|a| a.is_mut)
    }

    /// First eight bytes of `sha256("global:<name>")`.
    pub fn discriminator(&self) -> [u8; 8] {
        let digest = Sha256::digest(format!("global:{}", self.name).as_bytes());
        let mut out = [0u8; 8];
        out.copy_from_slice(&digest[..8]);
        out
    }
}

#[derive(Debug, Deserialize)]
struct IdlDocument {
    #[serde(default)]
    address: Option<Pubkey>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    metadata: Option<IdlMetadata>,
    instructions: Vec<IdlInstruction>,
}

#[derive(Debug, Deserialize)]
struct IdlMetadata {
    #[serde(default)]
    address: Option<Pubkey>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdlInstruction {
    name: String,
    #[serde(default)]
    accounts: Vec<IdlAccount>,
    #[serde(default)]
    args: Vec<IdlArg>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdlAccount {
    name: String,
    #[serde(default, alias = "writable")]
    is_mut: bool,
    #[serde(default, alias = "signer")]
    is_signer: bool,
}

#[derive(Debug, Deserialize)]
struct IdlArg {
    name: String,
    #[serde(rename = "type")]
    ty: ArgType,
}

/// Instruction map for one deployed program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramInterface {
    pub program_id: Pubkey,
    pub name: String,
    instructions: Vec<InstructionDef>,
}

impl ProgramInterface {
    pub fn new(name: impl Into<String>, program_id: Pubkey) -> Self {
        Self {
            program_id,
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    /// Add an instruction. Later definitions with the same name are ignored by lookups.
    pub fn with_instruction(mut self, instruction: InstructionDef) -> Self {
        self.instructions.push(instruction);
        self
    }

    /// Parse an IDL document. `program_id` overrides the address it records.
    pub fn from_idl_json(json: &str, program_id: Option<Pubkey>) -> Result<Self, InterfaceError> {
        let idl: IdlDocument = serde_json::from_str(json)?;

        let (meta_address, meta_name) = idl
            .metadata
            .map(|m| (m.address, m.name))
            .unwrap_or((None, None));
        let program_id = program_id
            .or(idl.address)
            .or(meta_address)
            .ok_or(InterfaceError::MissingProgramId)?;
        let name = idl.name.or(meta_name).unwrap_or_else(|| "program".to_string());

        let mut interface = Self::new(name, program_id);
        for ix in idl.instructions {
            let mut def = InstructionDef::new(ix.name);
            if interface.instruction(&def.name).is_some() {
                return Err(InterfaceError::DuplicateInstruction(def.name));
            }
            for account in ix.accounts {
                def.accounts.push(AccountDef {
                    name: to_snake_case(&account.name),
                    is_mut: account.is_mut,
                    is_signer: account.is_signer,
                });
            }
            for arg in ix.args {
                def = def.arg(arg.name, arg.ty);
            }
            interface.instructions.push(def);
        }

        tracing::debug!(
            program = %interface.name,
            program_id = %interface.program_id,
            instructions = interface.instructions.len(),
            "Program interface loaded"
        );
        Ok(interface)
    }

    /// Load an IDL file from disk.
    pub fn from_idl_file(path: &Path, program_id: Option<Pubkey>) -> Result<Self, InterfaceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_idl_json(&content, program_id)
    }

    /// Look up an instruction by snake_case or camelCase name.
    pub fn instruction(&self, method: &str) -> Option<&InstructionDef> {
        let wanted = to_snake_case(method);
        self.instructions.iter().find(|ix| ix.name == wanted)
    }

    pub fn instructions(&self) -> &[InstructionDef] {
        &self.instructions
    }

    /// Validate `call` and produce the instruction it describes.
    ///
    /// Accounts are resolved in declaration order. A signer account the call
    /// does not bind resolves to the fee payer, and `system_program` resolves to
    /// the system program address.
    pub fn encode(&self, call: &CallDescriptor) -> Result<Instruction, DescriptorError> {
        let def = self
            .instruction(call.method())
            .ok_or_else(|| DescriptorError::UnknownMethod(call.method().to_string()))?;

        if def.mutates() && call.signers().is_empty() {
            return Err(DescriptorError::NoSigner(def.name.clone()));
        }

        if def.args.len() != call.args().len() {
            return Err(DescriptorError::ArgCount {
                method: def.name.clone(),
                expected: def.args.len(),
                actual: call.args().len(),
            });
        }

        let mut data = def.discriminator().to_vec();
        for (arg_def, value) in def.args.iter().zip(call.args()) {
            if arg_def.ty != value.arg_type() {
                return Err(DescriptorError::ArgType {
                    name: arg_def.name.clone(),
                    expected: arg_def.ty,
                    actual: value.arg_type(),
                });
            }
            value
                .encode_into(&mut data)
                .map_err(|e| DescriptorError::Encoding(e.to_string()))?;
        }

        for (name, _) in call.accounts() {
            let normalized = to_snake_case(name);
            if !def.accounts.iter().any(|a| a.name == normalized) {
                return Err(DescriptorError::UnknownAccount {
                    method: def.name.clone(),
                    account: name.clone(),
                });
            }
        }

        let fee_payer = call.fee_payer().map(|s| s.pubkey());
        let mut accounts = Vec::with_capacity(def.accounts.len());
        for account in &def.accounts {
            let bound = call
                .accounts()
                .iter()
                .find(|(name, _)| to_snake_case(name) == account.name)
                .map(|(_, pubkey)| *pubkey);

            let pubkey = match bound {
                Some(pubkey) => pubkey,
                None if account.name == "system_program" => SYSTEM_PROGRAM_ID,
                None if account.is_signer => {
                    fee_payer.ok_or_else(|| DescriptorError::MissingAccount(account.name.clone()))?
                }
                None => return Err(DescriptorError::MissingAccount(account.name.clone())),
            };

            if account.is_signer && !call.signers().iter().any(|s| s.pubkey() == pubkey) {
                return Err(DescriptorError::SignerNotProvided {
                    account: account.name.clone(),
                    pubkey,
                });
            }

            accounts.push(AccountMeta::new(pubkey, account.is_signer, account.is_mut));
        }

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data,
        })
    }
}
