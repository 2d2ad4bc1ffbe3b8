//! Shared utilities for tracker integration tests.

#![allow(dead_code)]

use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use conn_tracker::config::ListenerConfig;
use conn_tracker::{Console, Tracker};

/// Console sink that keeps everything written to it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn loopback_config(read_buffer_size: usize) -> ListenerConfig {
    ListenerConfig {
        bind_address: "127.0.0.1".into(),
        bind_port: 0,
        read_buffer_size,
    }
}

/// Bind a tracker on an ephemeral loopback port with captured console output.
pub fn start_tracker() -> (Tracker, SharedBuffer) {
    start_tracker_with(loopback_config(1024))
}

pub fn start_tracker_with(config: ListenerConfig) -> (Tracker, SharedBuffer) {
    let output = SharedBuffer::default();
    let tracker = Tracker::bind(&config)
        .unwrap()
        .with_console(Console::new(output.clone()));
    (tracker, output)
}

pub fn connect(addr: SocketAddr) -> TcpStream {
    TcpStream::connect(addr).unwrap()
}

/// Drive the loop until `done` holds, giving up after five seconds.
pub fn pump_until(tracker: &mut Tracker, mut done: impl FnMut(&Tracker) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done(tracker) {
            return true;
        }
        tracker.poll_once(Some(Duration::from_millis(20))).unwrap();
    }
    done(tracker)
}
