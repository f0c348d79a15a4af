//! Confirmation polling.
//!
//! # Responsibilities
//! - Poll a signature's status until it reaches a commitment level
//! - Surface execution errors together with the program's log lines
//! - Never poll past the submission deadline

use tokio::time::Instant;

use crate::ledger::connection::Connection;
use crate::ledger::types::{CommitmentLevel, Signature, Slot};
use crate::resilience::backoff::PollSchedule;
use crate::resilience::timeouts::{remaining, sleep_within, with_deadline};

/// How a confirmation wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Settled {
    Reached { slot: Slot },
    ExecutionFailed { detail: String, logs: Vec<String> },
    DeadlinePassed,
}

/// Poll `signature` until it reaches `commitment`, fails, or `deadline` passes.
///
/// Status levels only ever grow, so a `Finalized` result implies the ledger
/// already passed through `Processed` and `Confirmed`.
pub(crate) async fn wait_for_commitment(
    connection: &dyn Connection,
    signature: &Signature,
    commitment: CommitmentLevel,
    deadline: Instant,
    mut schedule: PollSchedule,
) -> Settled {
    let mut last_seen: Option<CommitmentLevel> = None;

    loop {
        match with_deadline(deadline, connection.get_signature_status(signature)).await {
            Err(_) => return Settled::DeadlinePassed,
            Ok(Ok(Some(status))) => {
                if let Some(err) = status.err {
                    let logs = fetch_logs(connection, signature, deadline).await;
                    return Settled::ExecutionFailed {
                        detail: err.to_string(),
                        logs,
                    };
                }

                if status.reached(commitment) {
                    return Settled::Reached { slot: status.slot };
                }

                if status.confirmation_status != last_seen {
                    tracing::debug!(
                        signature = %signature,
                        slot = status.slot,
                        current = ?status.confirmation_status,
                        target = %commitment,
                        remaining_ms = remaining(deadline).as_millis() as u64,
                        "Waiting for commitment"
                    );
                    last_seen = status.confirmation_status;
                }
            }
            Ok(Ok(None)) => {
                tracing::debug!(signature = %signature, "Transaction not yet visible");
            }
            Ok(Err(e)) => {
                tracing::warn!(signature = %signature, error = %e, "Status poll failed");
            }
        }

        if !sleep_within(deadline, schedule.next_delay()).await {
            return Settled::DeadlinePassed;
        }
    }
}

/// Best-effort log retrieval for a failed transaction.
async fn fetch_logs(connection: &dyn Connection, signature: &Signature, deadline: Instant) -> Vec<String> {
    match with_deadline(deadline, connection.get_transaction_logs(signature)).await {
        Ok(Ok(logs)) => logs,
        Ok(Err(e)) => {
            tracing::debug!(signature = %signature, error = %e, "Could not fetch transaction logs");
            Vec::new()
        }
        Err(_) => Vec::new(),
    }
}
