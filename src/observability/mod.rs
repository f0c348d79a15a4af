//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Harness and connection produce:
//!     → logging.rs (structured log events, one span per submission)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured fields (signature, slot, commitment) on every event
//! - Submission ID flows through the submission span
//! - Metrics are cheap (atomic increments) and no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
