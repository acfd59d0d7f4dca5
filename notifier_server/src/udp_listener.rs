use crate::model::ping_monitor::PingMonitor;
use crossbeam_channel::Receiver;
use log::{debug, error, info};
use notifier_common::net::PING;
use std::io::ErrorKind;
use std::net::UdpSocket;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long a single `recv_from` may block before the shutdown signal is rechecked.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Lightweight UDP listener that receives PING datagrams from chat clients
/// and refreshes their keep-alive in the shared `PingMonitor`.
pub struct UdpPingListener;

impl UdpPingListener {
    /// Spawn a background thread reading `socket` until `shutdown` disconnects.
    pub fn start(
        socket: Arc<UdpSocket>,
        ping_monitor: Arc<Mutex<PingMonitor>>,
        shutdown: Receiver<()>,
    ) -> std::io::Result<JoinHandle<()>> {
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        Ok(thread::spawn(move || {
            let mut buf = [0u8; 128];
            while shutdown.try_recv() == Err(crossbeam_channel::TryRecvError::Empty) {
                match socket.recv_from(&mut buf) {
                    Ok((size, addr)) if buf[..size].starts_with(PING) => {
                        debug!("Received ping from {}", addr);
                        match ping_monitor.lock() {
                            Ok(mut monitor) => monitor.update_ping(addr),
                            Err(e) => {
                                error!("Ping monitor lock poisoned: {}", e);
                                break;
                            }
                        }
                    }
                    Ok((size, addr)) => debug!("Ignoring {} byte datagram from {}", size, addr),
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                    Err(e) => debug!("Ping socket error: {}", e),
                }
            }
            info!("Ping listener stopping...");
        }))
    }
}
