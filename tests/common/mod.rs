//! Shared utilities for integration tests.
//!
//! `MockLedger` is an in-memory `Connection` that decodes submitted
//! transactions, verifies their signatures, and advances each landed
//! transaction one commitment level per status poll.

#![allow(dead_code)]

use async_trait::async_trait;
use base64::Engine as _;
use ed25519_dalek::{Verifier, VerifyingKey};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tx_harness::harness::HarnessSettings;
use tx_harness::ledger::types::{Hash, LedgerError, LedgerResult, TransactionStatus};
use tx_harness::ledger::{CommitmentLevel, Connection, Keypair, Pubkey, Signature, Signer};
use tx_harness::program::{AccountDef, ArgType, InstructionDef, ProgramInterface};
use tx_harness::TransactionHarness;

pub const COUNTER_PROGRAM_ID: Pubkey = Pubkey::new([7u8; 32]);

/// How the mock ledger behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Accepts, executes and confirms transactions.
    Healthy,
    /// Every call fails in transport.
    Unreachable,
    /// Accepts transactions that never land.
    Dropped,
    /// Lands the transaction, then reports a transport error to the sender.
    SendTransportErrorButLands,
    /// Records the transaction, then never answers the send.
    HangOnSend,
    /// Lands transactions, but status queries never answer.
    HangOnStatus,
}

#[derive(Debug, Clone)]
struct Landed {
    slot: u64,
    polls: usize,
    err: Option<Value>,
    logs: Vec<String>,
}

pub struct MockLedger {
    mode: Mode,
    preflight: bool,
    submissions: AtomicUsize,
    blockhashes: AtomicU64,
    slots: AtomicU64,
    initialized: Mutex<HashSet<Pubkey>>,
    landed: Mutex<HashMap<Signature, Landed>>,
    observed: Mutex<HashMap<Signature, Vec<CommitmentLevel>>>,
}

impl MockLedger {
    pub fn new(mode: Mode) -> Arc<Self> {
        Arc::new(Self::build(mode, true))
    }

    /// A ledger that executes without preflight, reporting program errors
    /// through the signature status instead.
    pub fn without_preflight(mode: Mode) -> Arc<Self> {
        Arc::new(Self::build(mode, false))
    }

    fn build(mode: Mode, preflight: bool) -> Self {
        Self {
            mode,
            preflight,
            submissions: AtomicUsize::new(0),
            blockhashes: AtomicU64::new(0),
            slots: AtomicU64::new(100),
            initialized: Mutex::new(HashSet::new()),
            landed: Mutex::new(HashMap::new()),
            observed: Mutex::new(HashMap::new()),
        }
    }

    /// Transactions that passed signature verification.
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Commitment levels reported for `signature`, in order.
    pub fn observed(&self, signature: &Signature) -> Vec<CommitmentLevel> {
        self.observed
            .lock()
            .unwrap()
            .get(signature)
            .cloned()
            .unwrap_or_default()
    }

    fn unreachable() -> LedgerError {
        LedgerError::Transport("error sending request: connection refused".to_string())
    }

    /// Run the transaction's instructions against the mock program state.
    fn execute(&self, tx: &DecodedTransaction) -> Result<(), (Value, Vec<String>)> {
        let initialize = InstructionDef::new("initialize").discriminator();
        let program = COUNTER_PROGRAM_ID.to_string();
        let mut logs = vec![format!("Program {} invoke [1]", program)];

        for (index, ix) in tx.instructions.iter().enumerate() {
            if ix.data.len() >= 8 && ix.data[..8] == initialize {
                logs.push("Program log: Instruction: Initialize".to_string());
                let target = ix.accounts[0];
                let mut initialized = self.initialized.lock().unwrap();
                if !initialized.insert(target) {
                    logs.push(format!(
                        "Allocate: account Address {{ address: {}, base: None }} already in use",
                        target
                    ));
                    logs.push(format!("Program {} failed: custom program error: 0x0", program));
                    return Err((json!({"InstructionError": [index, {"Custom": 0}]}), logs));
                }
            } else {
                logs.push("Program log: Instruction: Increment".to_string());
            }
        }

        logs.push(format!("Program {} success", program));
        Ok(())
    }

    fn land(&self, signature: Signature, err: Option<Value>, logs: Vec<String>) {
        let slot = self.slots.fetch_add(1, Ordering::SeqCst);
        self.landed.lock().unwrap().insert(
            signature,
            Landed {
                slot,
                polls: 0,
                err,
                logs,
            },
        );
    }
}

#[async_trait]
impl Connection for MockLedger {
    async fn send_transaction(&self, wire_base64: &str) -> LedgerResult<Signature> {
        if self.mode == Mode::Unreachable {
            return Err(Self::unreachable());
        }

        let tx = DecodedTransaction::decode(wire_base64)?;
        if !tx.verify() {
            return Err(LedgerError::Rpc {
                code: -32003,
                message: "Transaction signature verification failure".to_string(),
            });
        }
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let signature = tx.signatures[0];

        if self.mode == Mode::HangOnSend {
            return std::future::pending().await;
        }

        if self.mode == Mode::Dropped {
            return Ok(signature);
        }

        match self.execute(&tx) {
            Ok(()) => self.land(signature, None, Vec::new()),
            Err((err, logs)) if self.preflight => {
                return Err(LedgerError::Simulation {
                    message: "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0".to_string(),
                    err: Some(err),
                    logs,
                });
            }
            Err((err, logs)) => self.land(signature, Some(err), logs),
        }

        if self.mode == Mode::SendTransportErrorButLands {
            return Err(LedgerError::Transport("connection reset by peer".to_string()));
        }
        Ok(signature)
    }

    async fn get_signature_status(&self, signature: &Signature) -> LedgerResult<Option<TransactionStatus>> {
        if self.mode == Mode::Unreachable {
            return Err(Self::unreachable());
        }
        if self.mode == Mode::HangOnStatus {
            return std::future::pending().await;
        }

        let mut landed = self.landed.lock().unwrap();
        let Some(entry) = landed.get_mut(signature) else {
            return Ok(None);
        };
        entry.polls += 1;

        let level = match entry.polls {
            1 => CommitmentLevel::Processed,
            2 => CommitmentLevel::Confirmed,
            _ => CommitmentLevel::Finalized,
        };
        self.observed
            .lock()
            .unwrap()
            .entry(*signature)
            .or_default()
            .push(level);

        Ok(Some(TransactionStatus {
            slot: entry.slot,
            confirmation_status: Some(level),
            err: entry.err.clone(),
        }))
    }

    async fn get_latest_blockhash(&self) -> LedgerResult<Hash> {
        if self.mode == Mode::Unreachable {
            return Err(Self::unreachable());
        }
        let n = self.blockhashes.fetch_add(1, Ordering::SeqCst);
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&(n + 1).to_le_bytes());
        Ok(Hash::new(bytes))
    }

    async fn get_transaction_logs(&self, signature: &Signature) -> LedgerResult<Vec<String>> {
        if self.mode == Mode::Unreachable {
            return Err(Self::unreachable());
        }
        Ok(self
            .landed
            .lock()
            .unwrap()
            .get(signature)
            .map(|l| l.logs.clone())
            .unwrap_or_default())
    }
}

/// Instruction with account indexes resolved to keys.
pub struct DecodedInstruction {
    pub program_id: Pubkey,
    pub accounts: Vec<Pubkey>,
    pub data: Vec<u8>,
}

/// A legacy wire transaction, decoded.
pub struct DecodedTransaction {
    pub signatures: Vec<Signature>,
    pub num_required_signatures: usize,
    pub account_keys: Vec<Pubkey>,
    pub message: Vec<u8>,
    pub instructions: Vec<DecodedInstruction>,
}

impl DecodedTransaction {
    pub fn decode(wire_base64: &str) -> LedgerResult<Self> {
        let wire = base64::engine::general_purpose::STANDARD
            .decode(wire_base64)
            .map_err(|e| LedgerError::Decode(e.to_string()))?;
        let mut reader = Reader { buf: &wire, pos: 0 };

        let num_signatures = reader.compact_u16();
        let signatures = (0..num_signatures)
            .map(|_| Signature::try_from_slice(reader.take(64)))
            .collect::<LedgerResult<Vec<_>>>()?;

        let message = wire[reader.pos..].to_vec();
        let header = reader.take(3).to_vec();
        let num_keys = reader.compact_u16();
        let account_keys = (0..num_keys)
            .map(|_| Pubkey::try_from_slice(reader.take(32)))
            .collect::<LedgerResult<Vec<_>>>()?;
        reader.take(32);

        let num_instructions = reader.compact_u16();
        let mut instructions = Vec::with_capacity(num_instructions);
        for _ in 0..num_instructions {
            let program_index = reader.take(1)[0] as usize;
            let num_accounts = reader.compact_u16();
            let accounts = reader
                .take(num_accounts)
                .iter()
                .map(|&i| account_keys[i as usize])
                .collect();
            let data_len = reader.compact_u16();
            let data = reader.take(data_len).to_vec();
            instructions.push(DecodedInstruction {
                program_id: account_keys[program_index],
                accounts,
                data,
            });
        }

        Ok(Self {
            signatures,
            num_required_signatures: header[0] as usize,
            account_keys,
            message,
            instructions,
        })
    }

    /// Whether every required signer produced a valid signature.
    pub fn verify(&self) -> bool {
        if self.signatures.len() != self.num_required_signatures {
            return false;
        }
        self.signatures.iter().zip(&self.account_keys).all(|(sig, key)| {
            let Ok(verifying_key) = VerifyingKey::from_bytes(&key.to_bytes()) else {
                return false;
            };
            let signature = ed25519_dalek::Signature::from_bytes(&sig.to_bytes());
            verifying_key.verify(&self.message, &signature).is_ok()
        })
    }
}

struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> &'a [u8] {
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        slice
    }

    fn compact_u16(&mut self) -> usize {
        let mut value = 0usize;
        let mut shift = 0;
        loop {
            let byte = self.take(1)[0];
            value |= ((byte & 0x7f) as usize) << shift;
            if byte & 0x80 == 0 {
                return value;
            }
            shift += 7;
        }
    }
}

/// Signer that produces signatures the ledger will not accept.
pub struct ForgedSigner(pub Keypair);

impl Signer for ForgedSigner {
    fn pubkey(&self) -> Pubkey {
        self.0.pubkey()
    }

    fn sign_message(&self, _message: &[u8]) -> Signature {
        Signature::new([0x42; 64])
    }
}

/// Program with `initialize` (payer-owned, one-shot) and `increment`.
pub fn counter_interface() -> ProgramInterface {
    ProgramInterface::new("counter", COUNTER_PROGRAM_ID)
        .with_instruction(
            InstructionDef::new("initialize")
                .account(AccountDef::new("payer").writable().signer())
                .account(AccountDef::new("systemProgram")),
        )
        .with_instruction(
            InstructionDef::new("increment")
                .account(AccountDef::new("counter").writable())
                .account(AccountDef::new("authority").signer())
                .arg("amount", ArgType::U64),
        )
}

/// Short timings so failure paths resolve quickly.
pub fn fast_settings() -> HarnessSettings {
    HarnessSettings {
        timeout: Duration::from_millis(800),
        poll_interval: Duration::from_millis(5),
        max_poll_interval: Duration::from_millis(40),
    }
}

pub fn harness(ledger: Arc<MockLedger>) -> TransactionHarness {
    TransactionHarness::new(ledger, Arc::new(counter_interface()), fast_settings())
}

pub fn payer() -> Arc<dyn Signer> {
    Arc::new(Keypair::generate())
}
