//! Submission outcomes.

use std::time::Duration;
use thiserror::Error;

use crate::ledger::types::{Signature, Slot};

/// Why a submission did not reach the requested commitment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    /// Refused before inclusion: malformed descriptor, bad signature,
    /// stale blockhash, insufficient funds for fees.
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),

    /// Included (or simulated) and the program itself returned an error.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The commitment was not observed in time. The transaction may still land.
    #[error("timed out after {waited:?}; outcome unknown")]
    Timeout { waited: Duration },
}

impl FailureReason {
    /// Short label used for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::SubmissionRejected(_) => "rejected",
            FailureReason::ExecutionFailed(_) => "execution_failed",
            FailureReason::Timeout { .. } => "timeout",
        }
    }
}

/// Outcome of one [`submit`](crate::harness::TransactionHarness::submit) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionResult {
    /// The ledger reported the transaction at or above the requested commitment.
    Confirmed { signature: Signature, slot: Slot },

    /// The transaction did not reach the requested commitment.
    ///
    /// `signature` is set whenever a signed transaction existed, so callers can
    /// keep tracking a timed-out submission.
    Failed {
        reason: FailureReason,
        logs: Vec<String>,
        signature: Option<Signature>,
    },
}

impl SubmissionResult {
    pub(crate) fn rejected(detail: impl Into<String>, logs: Vec<String>, signature: Option<Signature>) -> Self {
        SubmissionResult::Failed {
            reason: FailureReason::SubmissionRejected(detail.into()),
            logs,
            signature,
        }
    }

    pub(crate) fn execution_failed(detail: impl Into<String>, logs: Vec<String>, signature: Signature) -> Self {
        SubmissionResult::Failed {
            reason: FailureReason::ExecutionFailed(detail.into()),
            logs,
            signature: Some(signature),
        }
    }

    pub(crate) fn timeout(waited: Duration, signature: Option<Signature>) -> Self {
        SubmissionResult::Failed {
            reason: FailureReason::Timeout { waited },
            logs: Vec::new(),
            signature,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmissionResult::Confirmed { .. })
    }

    /// Transaction signature, when one was produced.
    pub fn signature(&self) -> Option<&Signature> {
        match self {
            SubmissionResult::Confirmed { signature, .. } => Some(signature),
            SubmissionResult::Failed { signature, .. } => signature.as_ref(),
        }
    }

    pub fn failure_reason(&self) -> Option<&FailureReason> {
        match self {
            SubmissionResult::Confirmed { .. } => None,
            SubmissionResult::Failed { reason, .. } => Some(reason),
        }
    }

    pub fn logs(&self) -> &[String] {
        match self {
            SubmissionResult::Confirmed { .. } => &[],
            SubmissionResult::Failed { logs, .. } => logs,
        }
    }

    pub fn outcome_label(&self) -> &'static str {
        match self {
            SubmissionResult::Confirmed { .. } => "confirmed",
            SubmissionResult::Failed { reason, .. } => reason.label(),
        }
    }
}
