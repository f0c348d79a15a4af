//! Connection capability the harness submits through.

use async_trait::async_trait;

use crate::ledger::types::{Hash, LedgerResult, Signature, TransactionStatus};

/// Network access to the ledger.
///
/// Implementations must be safe to share between concurrent submissions;
/// the harness only ever holds them behind an `Arc`.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Submit a signed, base64-encoded transaction.
    ///
    /// Returns the signature the node acknowledged. Implementations must not
    /// retry this call on their own.
    async fn send_transaction(&self, wire_base64: &str) -> LedgerResult<Signature>;

    /// Look up the status of a signature. `None` means the ledger has not seen it.
    async fn get_signature_status(
        &self,
        signature: &Signature,
    ) -> LedgerResult<Option<TransactionStatus>>;

    /// Fetch a blockhash recent enough to anchor a new message.
    async fn get_latest_blockhash(&self) -> LedgerResult<Hash>;

    /// Fetch the program log lines recorded for an included transaction.
    async fn get_transaction_logs(&self, signature: &Signature) -> LedgerResult<Vec<String>>;
}
