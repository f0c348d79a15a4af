//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every pending `cancelled()` future resolves
//!             → in-flight confirmation waits end with a Timeout outcome
//! ```
//!
//! # Design Decisions
//! - Cancellation stops waiting, never an already-sent submission
//! - Late subscribers still observe a trigger that already happened

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
