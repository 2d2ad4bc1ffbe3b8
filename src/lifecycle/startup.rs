//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Bind the listener and build the tracker
//! - Install signal handlers wired to the tracker's shutdown handle
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Whatever was opened before a failure is dropped (closed) on return

use thiserror::Error;

use crate::config::TrackerConfig;
use crate::lifecycle::signals::spawn_signal_bridge;
use crate::observability::metrics;
use crate::tracker::{Tracker, TrackerError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to start metrics exporter: {0}")]
    Metrics(String),

    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error("Failed to install signal handlers: {0}")]
    Signals(#[source] std::io::Error),
}

/// Bring the tracker up from a validated configuration.
pub fn start(config: &TrackerConfig) -> Result<Tracker, StartupError> {
    let observability = &config.observability;
    if observability.metrics_enabled {
        let addr = observability
            .metrics_address
            .parse()
            .map_err(|e| StartupError::Metrics(format!("{e}")))?;
        metrics::init_metrics(addr).map_err(|e| StartupError::Metrics(e.to_string()))?;
    }

    let tracker = Tracker::bind(&config.listener)?;

    // The bridge thread is detached; it lives until a signal arrives or the process exits.
    spawn_signal_bridge(tracker.shutdown_handle()).map_err(StartupError::Signals)?;

    Ok(tracker)
}
