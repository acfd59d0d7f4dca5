//! Keep-alive tracker for chat clients.
//!
//! Each client periodically sends a `PING` datagram from the same UDP socket it receives
//! deliveries on, so the monitor is keyed by that socket address. A client counts as
//! reachable while its last ping is younger than the configured timeout.
//!
//! The monitor is not synchronized; the transport shares it behind a `Mutex`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Tracks client keep-alive pings and determines reachability based on a timeout.
pub struct PingMonitor {
    /// Last ping time per client address.
    clients: HashMap<SocketAddr, Instant>,
    /// Threshold after which a client is considered unreachable.
    timeout: Duration,
}

impl PingMonitor {
    /// Create a monitor with the given keep-alive timeout.
    pub fn new(timeout: Duration) -> Self {
        Self {
            clients: HashMap::new(),
            timeout,
        }
    }

    /// Record a fresh ping (or a registration) for `addr`.
    pub fn update_ping(&mut self, addr: SocketAddr) {
        self.record_at(addr, Instant::now());
    }

    fn record_at(&mut self, addr: SocketAddr, at: Instant) {
        self.clients.insert(addr, at);
    }

    /// Whether `addr` pinged within the timeout.
    pub fn is_client_active(&self, addr: &SocketAddr) -> bool {
        self.clients
            .get(addr)
            .is_some_and(|last| last.elapsed() <= self.timeout)
    }

    /// Stop tracking `addr`.
    pub fn forget(&mut self, addr: &SocketAddr) {
        self.clients.remove(addr);
    }
}
