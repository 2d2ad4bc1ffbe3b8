//! Readiness-multiplexed connection tracker.
//!
//! # Data Flow
//! ```text
//! poll (blocks, readable interest only)
//!     → LISTENER_TOKEN: accept until drained → register → ConnectionSet
//!     → client token: read chunks until drained
//!         → bytes: decode, print to console
//!         → zero bytes / error: deregister, close, remove
//!     → WAKE_TOKEN: shutdown requested → close everything, return
//! ```
//!
//! # Design Decisions
//! - One thread owns the poller, the listener and every client endpoint
//! - Events are handled in the order the OS returns them
//! - Read errors close the connection just like an orderly peer shutdown
//! - No framing: each chunk is printed as it arrives

pub mod console;
pub mod event_loop;

pub use console::Console;
pub use event_loop::{LoopStatus, Tracker, TrackerError};
