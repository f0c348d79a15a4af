//! Deadline enforcement.
//!
//! # Responsibilities
//! - Bound every ledger call by the submission's overall deadline
//! - Sleep between polls without overshooting the deadline
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Deadline expiry is distinct from call errors (`Elapsed` vs the call's own error)

use std::future::Future;
use std::time::Duration;
use tokio::time::{error::Elapsed, timeout_at, Instant};

/// Run `fut` unless `deadline` passes first.
pub async fn with_deadline<F: Future>(deadline: Instant, fut: F) -> Result<F::Output, Elapsed> {
    timeout_at(deadline, fut).await
}

/// Roughly 30 years; stands in for deadlines too far out to represent.
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `start + timeout`, clamped when the sum does not fit an `Instant`.
pub fn deadline_after(start: Instant, timeout: Duration) -> Instant {
    start
        .checked_add(timeout)
        .or_else(|| start.checked_add(FAR_FUTURE))
        .unwrap_or(start)
}

/// Sleep for `delay`, returning `false` if the deadline would pass first.
///
/// When the deadline is closer than `delay` this sleeps until the deadline.
pub async fn sleep_within(deadline: Instant, delay: Duration) -> bool {
    match Instant::now().checked_add(delay) {
        Some(wake) if wake < deadline => {
            tokio::time::sleep_until(wake).await;
            true
        }
        _ => {
            tokio::time::sleep_until(deadline).await;
            false
        }
    }
}

/// Time left before `deadline`, zero once passed.
pub fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}
