//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Harness call to the ledger:
//!     → timeouts.rs (every call bounded by the submission deadline)
//!     → On read failure: retries.rs (is it transient?) → backoff.rs (wait, then poll again)
//!     → On submission failure: never retried, classified instead
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for reads (blockhash, status); submission happens once
//! - Status polling backs off exponentially up to a ceiling

pub mod backoff;
pub mod retries;
pub mod timeouts;
