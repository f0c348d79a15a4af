//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a ledger error is transient (worth another read)
//!
//! # Design Decisions
//! - Transport failures, timeouts and exhausted failover are transient
//! - Node-side rejections are definitive, except "node is behind" which clears on its own
//! - Classification never applies to `sendTransaction`; callers own that retry

use crate::ledger::types::LedgerError;

/// JSON-RPC code a node returns while it is catching up.
const NODE_UNHEALTHY: i64 = -32005;

/// Whether a read that failed with `err` may succeed if repeated.
pub fn is_retryable(err: &LedgerError) -> bool {
    match err {
        LedgerError::Transport(_) | LedgerError::Timeout(_) | LedgerError::NotAvailable(_) => true,
        LedgerError::Rpc { code, .. } => *code == NODE_UNHEALTHY,
        LedgerError::Simulation { .. }
        | LedgerError::Decode(_)
        | LedgerError::Encoding(_)
        | LedgerError::Keypair(_) => false,
    }
}
