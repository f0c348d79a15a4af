//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and value ranges (timeouts > 0, poll bounds ordered)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HarnessConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::HarnessConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// One day.
const MAX_TIMEOUT_SECS: u64 = 86_400;

/// One minute.
const MAX_POLL_INTERVAL_MS: u64 = 60_000;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}' ({reason})")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("{field} ({value}) exceeds the maximum of {max}")]
    TooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("confirmation.poll_interval_ms ({poll_ms}) exceeds max_poll_interval_ms ({max_ms})")]
    PollIntervalOrder { poll_ms: u64, max_ms: u64 },

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("observability.log_level '{0}' is not one of trace, debug, info, warn, error")]
    LogLevel(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &HarnessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("rpc.url", &config.rpc.url, &mut errors);
    for url in &config.rpc.failover_urls {
        check_url("rpc.failover_urls", url, &mut errors);
    }

    if config.rpc.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero("rpc.request_timeout_secs"));
    }
    check_max("rpc.request_timeout_secs", config.rpc.request_timeout_secs, MAX_TIMEOUT_SECS, &mut errors);

    let confirmation = &config.confirmation;
    if confirmation.timeout_secs == 0 {
        errors.push(ValidationError::Zero("confirmation.timeout_secs"));
    }
    if confirmation.poll_interval_ms == 0 {
        errors.push(ValidationError::Zero("confirmation.poll_interval_ms"));
    }
    check_max("confirmation.timeout_secs", confirmation.timeout_secs, MAX_TIMEOUT_SECS, &mut errors);
    check_max(
        "confirmation.max_poll_interval_ms",
        confirmation.max_poll_interval_ms,
        MAX_POLL_INTERVAL_MS,
        &mut errors,
    );
    if confirmation.poll_interval_ms > confirmation.max_poll_interval_ms {
        errors.push(ValidationError::PollIntervalOrder {
            poll_ms: confirmation.poll_interval_ms,
            max_ms: confirmation.max_poll_interval_ms,
        });
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            observability.metrics_address.clone(),
        ));
    }
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::LogLevel(observability.log_level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_max(field: &'static str, value: u64, max: u64, errors: &mut Vec<ValidationError>) {
    if value > max {
        errors.push(ValidationError::TooLarge { field, value, max });
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match url::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
