//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer size > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: TrackerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::TrackerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("listener.bind_address {0:?} is not an IP address")]
    InvalidBindAddress(String),

    #[error("listener.read_buffer_size must be greater than zero")]
    ZeroReadBuffer,

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error, off")]
    InvalidLogLevel(String),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &TrackerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let listener = &config.listener;

    if listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    } else if listener.socket_addr().is_err() {
        errors.push(ValidationError::InvalidBindAddress(listener.bind_address.clone()));
    }

    if listener.read_buffer_size == 0 {
        errors.push(ValidationError::ZeroReadBuffer);
    }

    let observability = &config.observability;
    if observability.log_level.parse::<LevelFilter>().is_err() {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }

    // Only checked when the exporter would actually bind it.
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(validate_config(&TrackerConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_problem() {
        let mut config = TrackerConfig::default();
        config.listener.bind_address = "not-an-ip".into();
        config.listener.read_buffer_size = 0;
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("not-an-ip".into()),
                ValidationError::ZeroReadBuffer,
                ValidationError::InvalidLogLevel("loud".into()),
            ]
        );
    }

    #[test]
    fn empty_bind_address_is_distinct_from_invalid() {
        let mut config = TrackerConfig::default();
        config.listener.bind_address = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::EmptyBindAddress]);
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = TrackerConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::InvalidMetricsAddress("nowhere".into())]);
    }

    #[test]
    fn log_level_is_case_insensitive() {
        let mut config = TrackerConfig::default();
        config.observability.log_level = "DEBUG".into();
        assert!(validate_config(&config).is_ok());
    }
}
