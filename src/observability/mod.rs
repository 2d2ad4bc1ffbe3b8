//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Tracker loop produces:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → Operator console
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Payload text goes to stdout, log lines to stderr
//! - Connection id and peer address flow through every connection event
//! - Metrics are no-ops unless the exporter is installed

pub mod logging;
pub mod metrics;
