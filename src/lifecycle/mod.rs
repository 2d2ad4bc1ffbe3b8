//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Metrics exporter → Bind listener → Signal bridge
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Wake poller → Close clients → Close listener → Exit 0
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a bind failure exits non-zero with nothing left open
//! - The signal bridge runs on its own thread and never touches loop state
//! - Shutdown is a flag plus a poller wake-up, observed between iterations

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, WAKE_TOKEN};
pub use startup::{start, StartupError};
