//! Transaction message compilation, signing and wire serialization.
//!
//! # Responsibilities
//! - Collect instruction accounts into an ordered key table
//! - Compile instructions against that table (legacy message format)
//! - Sign with every required signer and serialize for `sendTransaction`

use base64::Engine as _;
use std::sync::Arc;

use crate::ledger::signer::Signer;
use crate::ledger::types::{Hash, LedgerError, LedgerResult, Pubkey, Signature};

/// Largest serialized transaction a node accepts.
pub const PACKET_DATA_SIZE: usize = 1232;

/// Account reference used by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountMeta {
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl AccountMeta {
    pub fn new(pubkey: Pubkey, is_signer: bool, is_writable: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable,
        }
    }
}

/// A single program invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub program_id: Pubkey,
    pub accounts: Vec<AccountMeta>,
    pub data: Vec<u8>,
}

/// Counts that tell the runtime how to read the account key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    pub num_required_signatures: u8,
    pub num_readonly_signed_accounts: u8,
    pub num_readonly_unsigned_accounts: u8,
}

/// Instruction with accounts replaced by indexes into the key table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    pub program_id_index: u8,
    pub accounts: Vec<u8>,
    pub data: Vec<u8>,
}

/// Legacy transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub account_keys: Vec<Pubkey>,
    pub recent_blockhash: Hash,
    pub instructions: Vec<CompiledInstruction>,
}

#[derive(Debug, Clone, Copy)]
struct KeyEntry {
    pubkey: Pubkey,
    is_signer: bool,
    is_writable: bool,
}

impl KeyEntry {
    /// Sort bucket: writable signers, readonly signers, writable, readonly.
    fn bucket(&self) -> u8 {
        match (self.is_signer, self.is_writable) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) => 3,
        }
    }
}

fn upsert(keys: &mut Vec<KeyEntry>, pubkey: Pubkey, is_signer: bool, is_writable: bool) {
    if let Some(entry) = keys.iter_mut().find(|k| k.pubkey == pubkey) {
        entry.is_signer |= is_signer;
        entry.is_writable |= is_writable;
    } else {
        keys.push(KeyEntry {
            pubkey,
            is_signer,
            is_writable,
        });
    }
}

fn narrow(value: usize, what: &str) -> LedgerResult<u8> {
    u8::try_from(value)
        .map_err(|_| LedgerError::Encoding(format!("Too many {} for one message: {}", what, value)))
}

impl Message {
    /// Compile instructions into a message paid for by `payer`.
    pub fn compile(
        instructions: &[Instruction],
        payer: &Pubkey,
        recent_blockhash: Hash,
    ) -> LedgerResult<Self> {
        let mut keys = Vec::new();
        upsert(&mut keys, *payer, true, true);
        for ix in instructions {
            if ix.data.len() > PACKET_DATA_SIZE {
                return Err(LedgerError::Encoding(format!(
                    "Instruction data is {} bytes, a transaction holds at most {}",
                    ix.data.len(),
                    PACKET_DATA_SIZE
                )));
            }
            for meta in &ix.accounts {
                upsert(&mut keys, meta.pubkey, meta.is_signer, meta.is_writable);
            }
            upsert(&mut keys, ix.program_id, false, false);
        }

        // Stable sort keeps the payer first and insertion order within a bucket.
        keys.sort_by_key(KeyEntry::bucket);

        let count = |bucket: u8| keys.iter().filter(|k| k.bucket() == bucket).count();
        let header = MessageHeader {
            num_required_signatures: narrow(count(0) + count(1), "signers")?,
            num_readonly_signed_accounts: narrow(count(1), "readonly signers")?,
            num_readonly_unsigned_accounts: narrow(count(3), "readonly accounts")?,
        };
        let account_keys: Vec<Pubkey> = keys.iter().map(|k| k.pubkey).collect();
        narrow(account_keys.len(), "accounts")?;

        let index_of = |pubkey: &Pubkey| -> LedgerResult<u8> {
            let idx = account_keys
                .iter()
                .position(|k| k == pubkey)
                .ok_or_else(|| LedgerError::Encoding(format!("Account {} missing from key table", pubkey)))?;
            narrow(idx, "accounts")
        };

        let compiled = instructions
            .iter()
            .map(|ix| {
                Ok(CompiledInstruction {
                    program_id_index: index_of(&ix.program_id)?,
                    accounts: ix
                        .accounts
                        .iter()
                        .map(|meta| index_of(&meta.pubkey))
                        .collect::<LedgerResult<Vec<u8>>>()?,
                    data: ix.data.clone(),
                })
            })
            .collect::<LedgerResult<Vec<_>>>()?;

        Ok(Self {
            header,
            account_keys,
            recent_blockhash,
            instructions: compiled,
        })
    }

    /// Keys that must sign, fee payer first.
    pub fn signer_keys(&self) -> &[Pubkey] {
        &self.account_keys[..self.header.num_required_signatures as usize]
    }

    /// Serialize to the bytes that get signed.
    pub fn serialize(&self) -> LedgerResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(64 + self.account_keys.len() * 32);
        buf.push(self.header.num_required_signatures);
        buf.push(self.header.num_readonly_signed_accounts);
        buf.push(self.header.num_readonly_unsigned_accounts);

        encode_compact_u16(self.account_keys.len(), &mut buf)?;
        for key in &self.account_keys {
            buf.extend_from_slice(key.as_ref());
        }
        buf.extend_from_slice(self.recent_blockhash.as_ref());

        encode_compact_u16(self.instructions.len(), &mut buf)?;
        for ix in &self.instructions {
            buf.push(ix.program_id_index);
            encode_compact_u16(ix.accounts.len(), &mut buf)?;
            buf.extend_from_slice(&ix.accounts);
            encode_compact_u16(ix.data.len(), &mut buf)?;
            buf.extend_from_slice(&ix.data);
        }
        Ok(buf)
    }
}

/// A signed transaction ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub signatures: Vec<Signature>,
    pub message: Message,
}

impl Transaction {
    /// Sign `message` with the signers that cover its required keys.
    ///
    /// Every required key must be covered; extra signers are ignored. The
    /// signed transaction must fit in [`PACKET_DATA_SIZE`].
    pub fn sign(message: Message, signers: &[Arc<dyn Signer>]) -> LedgerResult<Self> {
        let bytes = message.serialize()?;
        let signatures = message
            .signer_keys()
            .iter()
            .map(|key| {
                signers
                    .iter()
                    .find(|s| s.pubkey() == *key)
                    .map(|s| s.sign_message(&bytes))
                    .ok_or_else(|| LedgerError::Keypair(format!("No signer provided for {}", key)))
            })
            .collect::<LedgerResult<Vec<_>>>()?;

        let tx = Self { signatures, message };
        let size = tx.serialize()?.len();
        if size > PACKET_DATA_SIZE {
            return Err(LedgerError::Encoding(format!(
                "Transaction is {} bytes, limit is {}",
                size, PACKET_DATA_SIZE
            )));
        }
        Ok(tx)
    }

    /// Transaction id: the fee payer's signature.
    pub fn signature(&self) -> Signature {
        self.signatures.first().copied().unwrap_or_default()
    }

    pub fn serialize(&self) -> LedgerResult<Vec<u8>> {
        let message = self.message.serialize()?;
        let mut buf = Vec::with_capacity(3 + self.signatures.len() * 64 + message.len());
        encode_compact_u16(self.signatures.len(), &mut buf)?;
        for sig in &self.signatures {
            buf.extend_from_slice(sig.as_ref());
        }
        buf.extend_from_slice(&message);
        Ok(buf)
    }

    /// Base64 wire encoding accepted by `sendTransaction`.
    pub fn to_base64(&self) -> LedgerResult<String> {
        Ok(base64::engine::general_purpose::STANDARD.encode(self.serialize()?))
    }
}

/// Append a length as a compact-u16 (7 bits per byte, high bit continues).
///
/// Lengths above `u16::MAX` are an encoding error.
pub fn encode_compact_u16(len: usize, buf: &mut Vec<u8>) -> LedgerResult<()> {
    let mut rem = u16::try_from(len).map_err(|_| {
        LedgerError::Encoding(format!("Length {} does not fit a compact-u16", len))
    })?;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            buf.push(byte);
            return Ok(());
        }
        byte |= 0x80;
        buf.push(byte);
    }
}
