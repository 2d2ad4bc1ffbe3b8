//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides (bind address/port, buffer size, log level)
//!     → validation.rs (semantic checks)
//!     → TrackerConfig (validated, immutable)
//!     → handed to the tracker at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once the tracker is bound
//! - All fields have defaults so an empty file reproduces 0.0.0.0:5555
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, TrackerConfig};
pub use validation::{validate_config, ValidationError};
