//! Connection identity, client endpoints and the connection set.
//!
//! # Responsibilities
//! - Generate unique connection IDs that double as poll tokens
//! - Track client endpoint state (Open → Closed)
//! - Own the set of currently open client endpoints

use std::collections::BTreeMap;
use std::io::{self, Read};
use std::net::{Shutdown, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use mio::net::TcpStream;
use mio::{Interest, Registry, Token};

/// Global atomic counter for connection IDs.
/// Starts at 1 so that token 0 stays reserved for the listener.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Poll token this connection is registered under.
    pub fn token(&self) -> Token {
        Token(self.0 as usize)
    }

    /// Map a poll token back to a connection ID.
    ///
    /// Returns `None` for the listener token.
    pub fn from_token(token: Token) -> Option<Self> {
        match token.0 {
            0 => None,
            raw => Some(Self(raw as u64)),
        }
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Registered with the poller and readable.
    Open,
    /// Terminal.
    Closed,
}

/// Why a client endpoint was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Read returned zero bytes.
    PeerClosed,
    /// Read failed with something other than `WouldBlock`/`Interrupted`.
    ReadError(io::ErrorKind),
    /// The tracker is stopping.
    Shutdown,
}

impl CloseReason {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::ReadError(_) => "read_error",
            CloseReason::Shutdown => "shutdown",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::ReadError(kind) => write!(f, "read_error ({kind})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Result of a single read on a client endpoint.
#[derive(Debug)]
pub enum ReadOutcome {
    /// This many bytes were placed at the start of the buffer.
    Data(usize),
    /// Orderly shutdown by the peer.
    PeerClosed,
    /// Nothing left to read until the next readiness event.
    WouldBlock,
    /// The read failed.
    Failed(io::Error),
}

/// An accepted connection.
#[derive(Debug)]
pub struct ClientEndpoint {
    id: ConnectionId,
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ConnectionState,
    accepted_at: Instant,
    bytes_received: u64,
}

impl ClientEndpoint {
    /// Wrap a freshly accepted stream.
    pub fn new(stream: TcpStream, peer_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            stream,
            peer_addr,
            state: ConnectionState::Open,
            accepted_at: Instant::now(),
            bytes_received: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }

    /// Time since the connection was accepted.
    pub fn age(&self) -> Duration {
        self.accepted_at.elapsed()
    }

    /// Register for readable events under this connection's token.
    pub fn register(&mut self, registry: &Registry) -> io::Result<()> {
        registry.register(&mut self.stream, self.id.token(), Interest::READABLE)
    }

    /// Read up to `buf.len()` bytes.
    pub fn read_chunk(&mut self, buf: &mut [u8]) -> ReadOutcome {
        loop {
            match self.stream.read(buf) {
                Ok(0) => return ReadOutcome::PeerClosed,
                Ok(n) => {
                    self.bytes_received += n as u64;
                    return ReadOutcome::Data(n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return ReadOutcome::WouldBlock,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return ReadOutcome::Failed(e),
            }
        }
    }

    /// Deregister and shut the socket down. The descriptor is released on drop.
    pub fn close(&mut self, registry: &Registry) {
        if self.state == ConnectionState::Closed {
            return;
        }
        if let Err(e) = registry.deregister(&mut self.stream) {
            tracing::debug!(connection_id = %self.id, error = %e, "Deregister failed");
        }
        // The peer may already be gone; NotConnected is expected here.
        let _ = self.stream.shutdown(Shutdown::Both);
        self.state = ConnectionState::Closed;
    }
}

/// The currently open client endpoints, iterated in acceptance order.
#[derive(Debug, Default)]
pub struct ConnectionSet {
    inner: BTreeMap<ConnectionId, ClientEndpoint>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an endpoint. Returns its id.
    pub fn insert(&mut self, endpoint: ClientEndpoint) -> ConnectionId {
        let id = endpoint.id();
        self.inner.insert(id, endpoint);
        id
    }

    pub fn remove(&mut self, id: ConnectionId) -> Option<ClientEndpoint> {
        self.inner.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&ClientEndpoint> {
        self.inner.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut ClientEndpoint> {
        self.inner.get_mut(&id)
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientEndpoint> {
        self.inner.values()
    }

    /// Remote addresses of all open endpoints, in acceptance order.
    pub fn peer_addrs(&self) -> Vec<SocketAddr> {
        self.iter().map(ClientEndpoint::peer_addr).collect()
    }

    /// Remove and return every endpoint, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = ClientEndpoint> {
        std::mem::take(&mut self.inner).into_values()
    }
}
