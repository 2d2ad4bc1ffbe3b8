//! Shutdown coordination for the tracker loop.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mio::{Registry, Token, Waker};

/// Poll token reserved for shutdown wake-ups.
pub const WAKE_TOKEN: Token = Token(usize::MAX - 1);

/// Handle that asks a running tracker to stop.
///
/// Cloneable and `Send`; any thread may trigger it. The loop observes the
/// request the next time the readiness query returns.
#[derive(Debug, Clone)]
pub struct Shutdown {
    waker: Arc<Waker>,
    requested: Arc<AtomicBool>,
}

impl Shutdown {
    /// Create a shutdown handle bound to the given poller.
    pub fn new(registry: &Registry) -> io::Result<Self> {
        Ok(Self {
            waker: Arc::new(Waker::new(registry, WAKE_TOKEN)?),
            requested: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        if self.requested.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.waker.wake() {
            tracing::warn!(error = %e, "Failed to wake tracker loop");
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_triggered(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
