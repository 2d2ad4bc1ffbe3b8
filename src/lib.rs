//! Readiness-multiplexed TCP connection tracker.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                 TRACKER LOOP                  │
//!                      │                                               │
//!   TCP connect        │  ┌───────────┐        ┌──────────────────┐    │
//!   ───────────────────┼─▶│ listener  │──────▶│  ConnectionSet   │    │
//!                      │  │ (token 0) │ accept │ (conn-1 .. n)    │    │
//!                      │  └─────┬─────┘        └────────┬─────────┘    │
//!                      │        │ readable              │ readable     │
//!                      │        ▼                       ▼              │
//!                      │  ┌──────────────────────────────────────┐     │
//!                      │  │      mio::Poll (epoll / kqueue)      │     │
//!                      │  └──────────────────────────────────────┘     │
//!                      │        │                       │              │
//!                      │        ▼                       ▼              │
//!   payload text       │  ┌───────────┐         ┌──────────────┐       │
//!   ◀──────────────────┼──│  console  │◀────────│ read chunks  │       │
//!   (stdout)           │  └───────────┘         └──────────────┘       │
//!                      │                                               │
//!                      │  config · lifecycle · observability           │
//!                      └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod tracker;

pub use config::TrackerConfig;
pub use lifecycle::Shutdown;
pub use tracker::{Console, Tracker, TrackerError};
