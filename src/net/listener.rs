//! TCP listening endpoint.
//!
//! # Responsibilities
//! - Bind to the configured interface and port
//! - Accept incoming TCP connections without blocking
//! - Classify accept errors (drained vs. transient)

use std::io;
use std::net::SocketAddr;

use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Registry, Token};
use thiserror::Error;

use crate::config::ListenerConfig;

/// Poll token reserved for the listening endpoint.
///
/// Client tokens come from [`ConnectionId`](crate::net::ConnectionId) and start at 1.
pub const LISTENER_TOKEN: Token = Token(0);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured interface could not be parsed.
    #[error("Invalid bind address {0:?}")]
    Address(String),

    /// Failed to bind to address.
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// Failed to register the listener with the poller.
    #[error("Failed to register listener: {0}")]
    Register(#[source] io::Error),
}

/// Result of a single non-blocking accept attempt.
#[derive(Debug)]
pub enum AcceptOutcome {
    /// A new peer connected.
    Accepted(TcpStream, SocketAddr),
    /// No more pending connections for this readiness event.
    Drained,
    /// One pending connection failed (aborted or refused); others may still be queued.
    Rejected(io::Error),
    /// Accept failed for a reason that will persist for now, such as
    /// descriptor exhaustion. The listener itself is still usable.
    Failed(io::Error),
}

/// Bound, listening TCP socket owned by the tracker loop.
#[derive(Debug)]
pub struct ListeningEndpoint {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl ListeningEndpoint {
    /// Bind to the configured address and start listening.
    ///
    /// Any failure here is fatal to startup; nothing is left open on error.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr = config
            .socket_addr()
            .map_err(|_| ListenerError::Address(config.bind_address.clone()))?;

        let inner = TcpListener::bind(addr).map_err(|source| ListenerError::Bind { addr, source })?;
        let local_addr = inner
            .local_addr()
            .map_err(|source| ListenerError::Bind { addr, source })?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self { inner, local_addr })
    }

    /// Register for readable events under [`LISTENER_TOKEN`].
    pub fn register(&mut self, registry: &Registry) -> Result<(), ListenerError> {
        registry
            .register(&mut self.inner, LISTENER_TOKEN, Interest::READABLE)
            .map_err(ListenerError::Register)
    }

    /// Remove the listener from the poller.
    pub fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.inner)
    }

    /// Attempt to accept one pending connection.
    pub fn accept(&self) -> AcceptOutcome {
        loop {
            match self.inner.accept() {
                Ok((stream, addr)) => return AcceptOutcome::Accepted(stream, addr),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return AcceptOutcome::Drained,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return classify_accept_error(e),
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

/// Split accept errors into per-connection failures and listener-wide ones.
fn classify_accept_error(e: io::Error) -> AcceptOutcome {
    match e.kind() {
        io::ErrorKind::ConnectionAborted
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::PermissionDenied => AcceptOutcome::Rejected(e),
        _ => AcceptOutcome::Failed(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback(port: u16) -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1".into(),
            bind_port: port,
            ..Default::default()
        }
    }

    #[test]
    fn binds_ephemeral_port() {
        let endpoint = ListeningEndpoint::bind(&loopback(0)).unwrap();
        assert_ne!(endpoint.local_addr().port(), 0);
    }

    #[test]
    fn port_in_use_is_bind_error() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let err = ListeningEndpoint::bind(&loopback(port)).unwrap_err();
        match err {
            ListenerError::Bind { source, .. } => {
                assert_eq!(source.kind(), io::ErrorKind::AddrInUse);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unparsable_address_is_rejected() {
        let config = ListenerConfig {
            bind_address: "example.invalid".into(),
            ..Default::default()
        };
        assert!(matches!(
            ListeningEndpoint::bind(&config),
            Err(ListenerError::Address(_))
        ));
    }

    #[test]
    fn per_connection_accept_errors_are_rejections() {
        for kind in [
            io::ErrorKind::ConnectionAborted,
            io::ErrorKind::ConnectionReset,
            io::ErrorKind::PermissionDenied,
        ] {
            assert!(matches!(
                classify_accept_error(io::Error::from(kind)),
                AcceptOutcome::Rejected(_)
            ));
        }
    }

    #[test]
    fn exhaustion_ends_the_accept_burst() {
        // EMFILE surfaces with an uncategorized kind.
        assert!(matches!(
            classify_accept_error(io::Error::from_raw_os_error(24)),
            AcceptOutcome::Failed(_)
        ));
        assert!(matches!(
            classify_accept_error(io::Error::from(io::ErrorKind::OutOfMemory)),
            AcceptOutcome::Failed(_)
        ));
    }

    #[test]
    fn accept_without_pending_peer_is_drained() {
        let endpoint = ListeningEndpoint::bind(&loopback(0)).unwrap();
        assert!(matches!(endpoint.accept(), AcceptOutcome::Drained));
    }
}
