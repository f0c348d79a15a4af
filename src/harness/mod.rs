//! Transaction harness.
//!
//! # Data Flow
//! ```text
//! CallDescriptor + CommitmentLevel
//!     → ProgramInterface::encode (rejected here costs no network call)
//!     → getLatestBlockhash (retried until the deadline)
//!     → Message::compile → Transaction::sign (signature known locally)
//!     → sendTransaction (exactly once)
//!     → confirm.rs (poll status until commitment, error, deadline or cancel)
//!     → SubmissionResult
//! ```
//!
//! # Design Decisions
//! - One deadline bounds the whole submission, including the blockhash fetch
//! - A send that fails in transport is tracked, not resent: it may have landed
//! - Cancellation stops waiting only; a sent transaction may still land
//! - Submissions are not idempotent. Submitting the same call twice produces
//!   two transactions, and whether the second succeeds is up to the program

pub mod confirm;
pub mod result;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::schema::ConfirmationConfig;
use crate::ledger::connection::Connection;
use crate::ledger::transaction::{Message, Transaction};
use crate::ledger::types::{is_program_failure, CommitmentLevel, Hash, LedgerError, Signature};
use crate::observability::metrics;
use crate::program::descriptor::CallDescriptor;
use crate::program::interface::ProgramInterface;
use crate::resilience::backoff::PollSchedule;
use crate::resilience::retries::is_retryable;
use crate::resilience::timeouts::{deadline_after, sleep_within, with_deadline};

use confirm::{wait_for_commitment, Settled};

pub use result::{FailureReason, SubmissionResult};

/// Timing policy for submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarnessSettings {
    /// Upper bound on one submission, from call to result.
    pub timeout: Duration,
    /// First status poll delay.
    pub poll_interval: Duration,
    /// Poll delay ceiling.
    pub max_poll_interval: Duration,
}

impl From<&ConfirmationConfig> for HarnessSettings {
    fn from(config: &ConfirmationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_poll_interval: Duration::from_millis(config.max_poll_interval_ms),
        }
    }
}

impl Default for HarnessSettings {
    fn default() -> Self {
        Self::from(&ConfirmationConfig::default())
    }
}

/// Submits program calls and waits for them to reach a commitment level.
///
/// Cheap to clone; clones share the connection and program interface, so
/// concurrent submissions from several tasks are fine.
#[derive(Clone)]
pub struct TransactionHarness {
    connection: Arc<dyn Connection>,
    interface: Arc<ProgramInterface>,
    settings: HarnessSettings,
}

impl TransactionHarness {
    pub fn new(
        connection: Arc<dyn Connection>,
        interface: Arc<ProgramInterface>,
        settings: HarnessSettings,
    ) -> Self {
        Self {
            connection,
            interface,
            settings,
        }
    }

    pub fn interface(&self) -> &ProgramInterface {
        &self.interface
    }

    pub fn settings(&self) -> &HarnessSettings {
        &self.settings
    }

    /// Submit one call and wait until it reaches `commitment`.
    ///
    /// Every outcome is reported through the returned [`SubmissionResult`];
    /// this never panics on ledger or network failure. A `Timeout` result
    /// means the outcome is unknown, not that the transaction did not land.
    pub async fn submit(&self, descriptor: CallDescriptor, commitment: CommitmentLevel) -> SubmissionResult {
        self.submit_with_cancel(descriptor, commitment, std::future::pending())
            .await
    }

    /// Like [`submit`](Self::submit), but stops waiting once `cancel` completes.
    ///
    /// A cancelled submission reports `Timeout`. If the transaction was
    /// already sent, the result carries its signature.
    pub async fn submit_with_cancel<F>(
        &self,
        descriptor: CallDescriptor,
        commitment: CommitmentLevel,
        cancel: F,
    ) -> SubmissionResult
    where
        F: Future<Output = ()>,
    {
        let span = tracing::info_span!(
            "submission",
            submission_id = %Uuid::new_v4(),
            method = %descriptor.method(),
            commitment = %commitment,
        );
        self.run(descriptor, commitment, cancel).instrument(span).await
    }

    /// Wait for an already-sent transaction to reach `commitment`.
    ///
    /// Used to keep tracking a submission that timed out.
    pub async fn track(&self, signature: Signature, commitment: CommitmentLevel) -> SubmissionResult {
        let started = Instant::now();
        let deadline = deadline_after(started, self.settings.timeout);
        self.wait(&signature, commitment, deadline, started)
            .instrument(tracing::info_span!("track", signature = %signature, commitment = %commitment))
            .await
    }

    async fn run<F>(&self, descriptor: CallDescriptor, commitment: CommitmentLevel, cancel: F) -> SubmissionResult
    where
        F: Future<Output = ()>,
    {
        let started = Instant::now();
        let deadline = deadline_after(started, self.settings.timeout);
        tokio::pin!(cancel);

        let transaction = tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::info!("Cancelled before submission");
                return self.finish(SubmissionResult::timeout(started.elapsed(), None), commitment, started);
            }
            prepared = self.prepare(&descriptor, deadline, started) => match prepared {
                Ok(transaction) => transaction,
                Err(result) => return self.finish(result, commitment, started),
            },
        };

        let signature = transaction.signature();
        if let Some(result) = self.send(&transaction, deadline, started).await {
            return self.finish(result, commitment, started);
        }

        let result = tokio::select! {
            biased;
            _ = &mut cancel => {
                tracing::info!(signature = %signature, "Cancelled while waiting for commitment");
                SubmissionResult::timeout(started.elapsed(), Some(signature))
            }
            result = self.wait(&signature, commitment, deadline, started) => result,
        };
        self.finish(result, commitment, started)
    }

    /// Encode, fetch a blockhash, compile and sign.
    async fn prepare(
        &self,
        descriptor: &CallDescriptor,
        deadline: Instant,
        started: Instant,
    ) -> Result<Transaction, SubmissionResult> {
        let instruction = self.interface.encode(descriptor).map_err(|e| {
            tracing::warn!(error = %e, "Call descriptor rejected");
            SubmissionResult::rejected(e.to_string(), Vec::new(), None)
        })?;

        let payer = descriptor
            .fee_payer()
            .ok_or_else(|| SubmissionResult::rejected("no signer available to pay fees", Vec::new(), None))?
            .pubkey();

        let blockhash = self.fetch_blockhash(deadline, started).await?;

        let message = Message::compile(&[instruction], &payer, blockhash)
            .map_err(|e| SubmissionResult::rejected(e.to_string(), Vec::new(), None))?;
        Transaction::sign(message, descriptor.signers())
            .map_err(|e| SubmissionResult::rejected(e.to_string(), Vec::new(), None))
    }

    async fn fetch_blockhash(&self, deadline: Instant, started: Instant) -> Result<Hash, SubmissionResult> {
        let mut schedule = self.schedule();
        loop {
            match with_deadline(deadline, self.connection.get_latest_blockhash()).await {
                Ok(Ok(hash)) => return Ok(hash),
                Ok(Err(e)) if is_retryable(&e) => {
                    tracing::warn!(error = %e, attempt = schedule.attempts() + 1, "Blockhash fetch failed, retrying");
                }
                Ok(Err(e)) => {
                    return Err(SubmissionResult::rejected(
                        format!("blockhash unavailable: {}", e),
                        Vec::new(),
                        None,
                    ));
                }
                Err(_) => return Err(SubmissionResult::timeout(started.elapsed(), None)),
            }

            if !sleep_within(deadline, schedule.next_delay()).await {
                return Err(SubmissionResult::timeout(started.elapsed(), None));
            }
        }
    }

    /// Send once. `None` means the transaction should be tracked.
    async fn send(&self, transaction: &Transaction, deadline: Instant, started: Instant) -> Option<SubmissionResult> {
        let signature = transaction.signature();
        let wire = match transaction.to_base64() {
            Ok(wire) => wire,
            Err(e) => return Some(SubmissionResult::rejected(e.to_string(), Vec::new(), None)),
        };

        match with_deadline(deadline, self.connection.send_transaction(&wire)).await {
            Ok(Ok(acknowledged)) => {
                if acknowledged != signature {
                    tracing::warn!(
                        acknowledged = %acknowledged,
                        expected = %signature,
                        "Node acknowledged an unexpected signature"
                    );
                }
                tracing::info!(signature = %signature, "Transaction sent");
                None
            }
            Ok(Err(LedgerError::Simulation { message, err, logs })) => {
                if err.as_ref().is_some_and(is_program_failure) {
                    Some(SubmissionResult::execution_failed(message, logs, signature))
                } else {
                    Some(SubmissionResult::rejected(message, logs, Some(signature)))
                }
            }
            Ok(Err(e)) if is_retryable(&e) => {
                tracing::warn!(signature = %signature, error = %e, "Send outcome unknown, tracking signature");
                None
            }
            Ok(Err(e)) => Some(SubmissionResult::rejected(e.to_string(), Vec::new(), Some(signature))),
            Err(_) => {
                tracing::warn!(signature = %signature, "Deadline passed while sending");
                Some(SubmissionResult::timeout(started.elapsed(), Some(signature)))
            }
        }
    }

    async fn wait(
        &self,
        signature: &Signature,
        commitment: CommitmentLevel,
        deadline: Instant,
        started: Instant,
    ) -> SubmissionResult {
        let settled = wait_for_commitment(
            self.connection.as_ref(),
            signature,
            commitment,
            deadline,
            self.schedule(),
        )
        .await;

        match settled {
            Settled::Reached { slot } => SubmissionResult::Confirmed {
                signature: *signature,
                slot,
            },
            Settled::ExecutionFailed { detail, logs } => {
                SubmissionResult::execution_failed(detail, logs, *signature)
            }
            Settled::DeadlinePassed => SubmissionResult::timeout(started.elapsed(), Some(*signature)),
        }
    }

    fn schedule(&self) -> PollSchedule {
        PollSchedule::new(self.settings.poll_interval, self.settings.max_poll_interval)
    }

    fn finish(&self, result: SubmissionResult, commitment: CommitmentLevel, started: Instant) -> SubmissionResult {
        let elapsed = started.elapsed();
        metrics::record_submission(result.outcome_label());

        match &result {
            SubmissionResult::Confirmed { signature, slot } => {
                metrics::record_confirmation_latency(commitment.as_str(), elapsed);
                tracing::info!(
                    signature = %signature,
                    slot = *slot,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Transaction reached commitment"
                );
            }
            SubmissionResult::Failed { reason, logs, signature } => {
                tracing::warn!(
                    outcome = reason.label(),
                    signature = ?signature,
                    log_lines = logs.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Submission failed: {}",
                    reason
                );
            }
        }
        result
    }
}

impl std::fmt::Debug for TransactionHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionHarness")
            .field("program_id", &self.interface.program_id)
            .field("settings", &self.settings)
            .finish()
    }
}
