//! `conn-tracker` binary: accepts TCP clients and prints whatever they send.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use conn_tracker::config::{self, ConfigError, TrackerConfig};
use conn_tracker::lifecycle;
use conn_tracker::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "conn-tracker")]
#[command(about = "Readiness-multiplexed TCP connection tracker", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Interface to listen on.
    #[arg(long)]
    bind_address: Option<String>,

    /// Port to listen on.
    #[arg(short = 'p', long)]
    bind_port: Option<u16>,

    /// Maximum bytes per client read.
    #[arg(long)]
    read_buffer_size: Option<usize>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Load the file (if any), then layer command-line overrides on top.
    fn resolve_config(&self) -> Result<TrackerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => config::load_config(path)?,
            None => TrackerConfig::default(),
        };

        if let Some(address) = &self.bind_address {
            config.listener.bind_address = address.clone();
        }
        if let Some(port) = self.bind_port {
            config.listener.bind_port = port;
        }
        if let Some(size) = self.read_buffer_size {
            config.listener.read_buffer_size = size;
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }

        config::validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging depends on the config, so config errors go straight to stderr.
    let config = match cli.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("conn-tracker: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability);

    tracing::info!("conn-tracker v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        bind_port = config.listener.bind_port,
        read_buffer_size = config.listener.read_buffer_size,
        "Configuration loaded"
    );

    let tracker = match lifecycle::start(&config) {
        Ok(tracker) => tracker,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    match tracker.run() {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Tracker failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "conn-tracker",
            "--bind-address",
            "127.0.0.1",
            "-p",
            "6001",
            "--read-buffer-size",
            "64",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1");
        assert_eq!(config.listener.bind_port, 6001);
        assert_eq!(config.listener.read_buffer_size, 64);
    }

    #[test]
    fn invalid_override_fails_validation() {
        let cli = Cli::parse_from(["conn-tracker", "--read-buffer-size", "0"]);
        assert!(matches!(cli.resolve_config(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn no_flags_reproduce_reference_listener() {
        let cli = Cli::parse_from(["conn-tracker"]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.listener.socket_addr().unwrap().to_string(), "0.0.0.0:5555");
    }
}
