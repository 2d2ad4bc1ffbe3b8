//! The tracker's control loop.
//!
//! # Responsibilities
//! - Own the poller, the listening endpoint and the connection set
//! - Accept new clients and read from ready ones
//! - Close everything on every exit path

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mio::net::TcpStream;
use mio::{Events, Poll, Token};
use thiserror::Error;

use crate::config::ListenerConfig;
use crate::lifecycle::shutdown::{Shutdown, WAKE_TOKEN};
use crate::net::{
    AcceptOutcome, ClientEndpoint, CloseReason, ConnectionId, ConnectionSet, ListenerError,
    ListeningEndpoint, ReadOutcome, LISTENER_TOKEN,
};
use crate::observability::metrics;
use crate::tracker::console::Console;

/// Readiness events taken from the OS per poll.
const EVENT_CAPACITY: usize = 1024;

/// Reads taken from one client per pass before moving to the next ready endpoint.
const READS_PER_PASS: usize = 1;

/// Accepts taken per pass before moving to the next ready endpoint.
const ACCEPTS_PER_PASS: usize = 64;

/// Error type for the tracker loop.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("Readiness poll failed: {0}")]
    Poll(#[source] io::Error),

    #[error("Failed to create shutdown waker: {0}")]
    Waker(#[source] io::Error),
}

/// What the loop should do after an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    Running,
    ShutdownRequested,
}

/// Single-threaded readiness loop over one listener and its accepted clients.
#[derive(Debug)]
pub struct Tracker {
    poll: Poll,
    events: Events,
    ready: Vec<Token>,
    /// Clients whose read budget ran out before the socket drained.
    carry_over: Vec<ConnectionId>,
    /// The listener's accept budget ran out before the backlog drained.
    accept_carry_over: bool,
    listener: ListeningEndpoint,
    connections: ConnectionSet,
    buffer: Vec<u8>,
    console: Console,
    shutdown: Shutdown,
    closed: bool,
}

impl Tracker {
    /// Bind the listening endpoint and prepare the poller.
    pub fn bind(config: &ListenerConfig) -> Result<Self, TrackerError> {
        let poll = Poll::new().map_err(TrackerError::Poll)?;
        let mut listener = ListeningEndpoint::bind(config)?;
        listener.register(poll.registry())?;
        let shutdown = Shutdown::new(poll.registry()).map_err(TrackerError::Waker)?;

        Ok(Self {
            poll,
            events: Events::with_capacity(EVENT_CAPACITY),
            ready: Vec::with_capacity(EVENT_CAPACITY),
            carry_over: Vec::new(),
            accept_carry_over: false,
            listener,
            connections: ConnectionSet::new(),
            buffer: vec![0; config.read_buffer_size.max(1)],
            console: Console::stdout(),
            shutdown,
            closed: false,
        })
    }

    /// Print payloads somewhere other than stdout.
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }

    /// Handle for stopping [`run`](Self::run) from another thread.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Currently open client endpoints.
    pub fn connections(&self) -> &ConnectionSet {
        &self.connections
    }

    /// Run until shutdown is requested or the poller fails.
    ///
    /// All endpoints are closed before this returns, whichever way it returns.
    pub fn run(mut self) -> Result<(), TrackerError> {
        tracing::info!(address = %self.local_addr(), "Tracker running");

        let result = loop {
            match self.poll_once(None) {
                Ok(LoopStatus::Running) => continue,
                Ok(LoopStatus::ShutdownRequested) => break Ok(()),
                Err(e) => break Err(e),
            }
        };

        self.close_all();
        result
    }

    /// Wait for readiness once and service every ready endpoint.
    ///
    /// `None` blocks indefinitely. Endpoints left with unread data by the
    /// previous pass are serviced again without waiting for a new edge, so
    /// the query does not block while any are outstanding.
    pub fn poll_once(&mut self, timeout: Option<Duration>) -> Result<LoopStatus, TrackerError> {
        if self.shutdown.is_triggered() {
            return Ok(LoopStatus::ShutdownRequested);
        }

        let timeout = if self.has_carry_over() {
            Some(Duration::ZERO)
        } else {
            timeout
        };

        match self.poll.poll(&mut self.events, timeout) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Ok(LoopStatus::Running),
            Err(e) => return Err(TrackerError::Poll(e)),
        }

        let mut ready = std::mem::take(&mut self.ready);
        ready.clear();
        ready.extend(self.events.iter().map(|event| event.token()));

        let carried = std::mem::take(&mut self.carry_over);
        let accept_again = std::mem::replace(&mut self.accept_carry_over, false);

        if accept_again {
            self.accept_pending();
        }
        for &id in &carried {
            self.service_client(id);
        }

        for &token in &ready {
            match token {
                LISTENER_TOKEN if accept_again => {}
                LISTENER_TOKEN => self.accept_pending(),
                WAKE_TOKEN => {}
                token => match ConnectionId::from_token(token) {
                    Some(id) if carried.contains(&id) => {}
                    Some(id) => self.service_client(id),
                    None => {}
                },
            }
        }
        self.ready = ready;

        if self.shutdown.is_triggered() {
            Ok(LoopStatus::ShutdownRequested)
        } else {
            Ok(LoopStatus::Running)
        }
    }

    /// Whether the previous pass left work that no new readiness edge will announce.
    fn has_carry_over(&self) -> bool {
        self.accept_carry_over || !self.carry_over.is_empty()
    }

    fn accept_pending(&mut self) {
        for _ in 0..ACCEPTS_PER_PASS {
            match self.listener.accept() {
                AcceptOutcome::Accepted(stream, peer_addr) => self.admit(stream, peer_addr),
                AcceptOutcome::Drained => return,
                AcceptOutcome::Rejected(e) => {
                    metrics::record_accept_error();
                    tracing::warn!(error = %e, "Accept rejected a pending connection");
                }
                AcceptOutcome::Failed(e) => {
                    // Resource exhaustion; retrying now would spin.
                    metrics::record_accept_error();
                    tracing::warn!(error = %e, "Accept failed");
                    return;
                }
            }
        }
        self.accept_carry_over = true;
    }

    fn admit(&mut self, stream: TcpStream, peer_addr: SocketAddr) {
        let mut endpoint = ClientEndpoint::new(stream, peer_addr);
        if let Err(e) = endpoint.register(self.poll.registry()) {
            tracing::warn!(peer_addr = %peer_addr, error = %e, "Failed to register client, dropping");
            return;
        }

        let id = self.connections.insert(endpoint);
        metrics::record_accepted(self.connections.len());
        tracing::info!(
            peer_addr = %peer_addr,
            connection_id = %id,
            active_connections = self.connections.len(),
            "Client connected"
        );
    }

    /// Read at most [`READS_PER_PASS`] chunks. Readiness is edge-triggered, so
    /// a client that still has data after its budget is carried over to the
    /// next pass instead of waiting for the peer to write again.
    fn service_client(&mut self, id: ConnectionId) {
        for _ in 0..READS_PER_PASS {
            // Closed earlier in this batch.
            let Some(endpoint) = self.connections.get_mut(id) else {
                return;
            };

            match endpoint.read_chunk(&mut self.buffer) {
                ReadOutcome::Data(n) => {
                    metrics::record_bytes_received(n);
                    tracing::debug!(connection_id = %id, bytes = n, "Data from client");
                    if let Err(e) = self.console.print_payload(&self.buffer[..n]) {
                        tracing::warn!(connection_id = %id, error = %e, "Console write failed");
                    }
                }
                ReadOutcome::WouldBlock => return,
                ReadOutcome::PeerClosed => {
                    self.close_connection(id, CloseReason::PeerClosed);
                    return;
                }
                ReadOutcome::Failed(e) => {
                    tracing::warn!(connection_id = %id, error = %e, "Read failed, closing connection");
                    self.close_connection(id, CloseReason::ReadError(e.kind()));
                    return;
                }
            }
        }

        if !self.carry_over.contains(&id) {
            self.carry_over.push(id);
        }
    }

    fn close_connection(&mut self, id: ConnectionId, reason: CloseReason) {
        let Some(mut endpoint) = self.connections.remove(id) else {
            return;
        };
        endpoint.close(self.poll.registry());
        metrics::record_closed(reason, self.connections.len());

        tracing::info!(
            peer_addr = %endpoint.peer_addr(),
            connection_id = %id,
            reason = %reason,
            bytes = endpoint.bytes_received(),
            age_ms = endpoint.age().as_millis() as u64,
            active_connections = self.connections.len(),
            "Client closed the connection"
        );
    }

    fn close_all(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.carry_over.clear();
        let registry = self.poll.registry();
        let mut count = 0usize;
        for mut endpoint in self.connections.drain() {
            endpoint.close(registry);
            metrics::record_closed(CloseReason::Shutdown, 0);
            tracing::debug!(
                peer_addr = %endpoint.peer_addr(),
                connection_id = %endpoint.id(),
                "Connection closed on shutdown"
            );
            count += 1;
        }

        if let Err(e) = self.listener.deregister(registry) {
            tracing::debug!(error = %e, "Listener deregister failed");
        }
        tracing::info!(closed_connections = count, "Tracker stopped");
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.close_all();
    }
}
