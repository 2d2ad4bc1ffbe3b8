//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, non-blocking accept)
//!     → connection.rs (identity, lifecycle, connection set)
//!     → Hand off to the tracker loop for reads
//!
//! Connection States:
//!     Open → Closed
//! ```
//!
//! # Design Decisions
//! - The listening endpoint is a separate type and can never enter the connection set
//! - Each connection gets a monotonic id that doubles as its poll token
//! - Closing a connection deregisters it before the socket is dropped

pub mod connection;
pub mod listener;

pub use connection::{
    ClientEndpoint, CloseReason, ConnectionId, ConnectionSet, ConnectionState, ReadOutcome,
};
pub use listener::{AcceptOutcome, ListenerError, ListeningEndpoint, LISTENER_TOKEN};
