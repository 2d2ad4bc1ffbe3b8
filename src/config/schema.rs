//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::net::{IpAddr, SocketAddr};

use serde::{Deserialize, Serialize};

/// Root configuration for the connection tracker.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Listening endpoint and read settings.
    pub listener: ListenerConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to listen on (e.g., "0.0.0.0").
    pub bind_address: String,

    /// TCP port to listen on.
    pub bind_port: u16,

    /// Maximum bytes taken from a client socket per read.
    pub read_buffer_size: usize,
}

impl ListenerConfig {
    /// Resolve the configured interface and port into a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        let ip: IpAddr = self.bind_address.trim().parse()?;
        Ok(SocketAddr::new(ip, self.bind_port))
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            bind_port: 5555,
            read_buffer_size: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
