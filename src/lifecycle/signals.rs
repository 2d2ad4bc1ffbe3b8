//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate the first signal into a [`Shutdown`] trigger
//! - Force the process down on a second signal
//!
//! # Design Decisions
//! - Uses Tokio's signal handling on a current-thread runtime
//! - Handlers are installed before this returns, so a signal that arrives
//!   once the tracker is running is never lost to the default disposition

use std::io;
use std::thread::JoinHandle;

use tokio::runtime::{Builder, Runtime};

use crate::lifecycle::shutdown::Shutdown;

/// Install signal handlers and spawn the thread that waits on them.
pub fn spawn_signal_bridge(shutdown: Shutdown) -> io::Result<JoinHandle<()>> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    let listener = SignalListener::install(&runtime)?;

    std::thread::Builder::new()
        .name("signal-bridge".into())
        .spawn(move || {
            runtime.block_on(async move {
                let mut listener = listener;
                let mut received = 0usize;
                loop {
                    let name = listener.recv().await;
                    received += 1;
                    match SignalAction::for_count(received) {
                        SignalAction::Shutdown => {
                            tracing::info!(signal = name, "Shutdown signal received");
                            shutdown.trigger();
                        }
                        SignalAction::ForceExit => {
                            tracing::error!(signal = name, "Second signal received, exiting immediately");
                            std::process::exit(FORCED_EXIT_CODE);
                        }
                    }
                }
            })
        })
}

/// Exit status when shutdown is cut short by a repeated signal.
pub const FORCED_EXIT_CODE: i32 = 1;

/// What a received signal does, by how many have arrived so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    /// Ask the tracker to stop and close everything.
    Shutdown,
    /// Shutdown is already underway and the operator insists.
    ForceExit,
}

impl SignalAction {
    pub fn for_count(received: usize) -> Self {
        if received <= 1 {
            SignalAction::Shutdown
        } else {
            SignalAction::ForceExit
        }
    }
}

#[cfg(unix)]
struct SignalListener {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl SignalListener {
    fn install(runtime: &Runtime) -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        let _guard = runtime.enter();
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct SignalListener;

#[cfg(not(unix))]
impl SignalListener {
    fn install(_runtime: &Runtime) -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "ctrl-c",
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                std::future::pending().await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_signal_requests_shutdown() {
        assert_eq!(SignalAction::for_count(1), SignalAction::Shutdown);
    }

    #[test]
    fn repeated_signals_force_exit() {
        assert_eq!(SignalAction::for_count(2), SignalAction::ForceExit);
        assert_eq!(SignalAction::for_count(5), SignalAction::ForceExit);
    }
}
