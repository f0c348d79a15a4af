//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → HarnessConfig (validated, immutable)
//!     → handed to the connection and harness constructors
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Only the binary reads config; library types take it as arguments

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, override_rpc_url, parse_config, ConfigError};
pub use schema::{ConfirmationConfig, HarnessConfig, ObservabilityConfig, ProgramConfig, RpcConfig};
pub use validation::ValidationError;
