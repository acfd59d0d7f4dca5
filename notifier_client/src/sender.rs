//! Sending chat lines to the notifier server.
//!
//! Commands go over the TCP connection as JSON lines. A background thread keeps the
//! UDP delivery address alive with periodic `PING`s.
use log::{debug, error, info};
use notifier_common::message::ChatMessage;
use notifier_common::net::PING;
use notifier_common::Result;
use std::io::{ErrorKind, Write};
use std::net::{TcpStream, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

/// PING interval in milliseconds used by the background thread.
const INTERVAL_MS: u64 = 2000;

/// Helper type for talking to the server.
pub struct CommandSender;

impl CommandSender {
    /// Write one chat message to the command stream.
    pub fn send_message(stream: &mut TcpStream, message: &ChatMessage) -> Result<()> {
        debug!("Sending {:?} as {}", message.text, message.handle);
        stream.write_all(&message.to_json_line()?)?;
        stream.flush()?;
        Ok(())
    }

    /// Send `PING` from `socket` to `target_addr` until `shutdown` is set.
    pub fn start_ping_thread(socket: Arc<UdpSocket>, target_addr: String, shutdown: Arc<AtomicBool>) {
        info!("Ping thread started. Target: {}", target_addr);
        thread::spawn(move || {
            let interval = Duration::from_millis(INTERVAL_MS);
            while !shutdown.load(Ordering::Relaxed) {
                match socket.send_to(PING, &target_addr) {
                    Ok(_) => debug!("PING sent to {}", target_addr),
                    Err(ref e) if e.kind() == ErrorKind::ConnectionReset => {}
                    Err(e) => error!("Failed to send PING: {}", e),
                }
                thread::sleep(interval);
            }
            info!("Ping thread stopping...");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notifier_common::SubscriberId;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    #[test]
    fn sends_one_json_line_per_message() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let mut client = TcpStream::connect(listener.local_addr().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();

        let first = ChatMessage::new(SubscriberId::new("alice"), "/start", 40000);
        let second = ChatMessage::new(SubscriberId::new("alice"), "/eth_y 2", 40000);
        CommandSender::send_message(&mut client, &first).unwrap();
        CommandSender::send_message(&mut client, &second).unwrap();

        let mut lines = BufReader::new(server).lines();
        let got = ChatMessage::from_json(&lines.next().unwrap().unwrap()).unwrap();
        assert_eq!(got, first);
        let got = ChatMessage::from_json(&lines.next().unwrap().unwrap()).unwrap();
        assert_eq!(got, second);
    }

    #[test]
    fn ping_thread_sends_ping_datagrams() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        server.set_read_timeout(Some(Duration::from_secs(2))).unwrap();
        let client = Arc::new(UdpSocket::bind("127.0.0.1:0").unwrap());
        let shutdown = Arc::new(AtomicBool::new(false));

        CommandSender::start_ping_thread(
            client,
            server.local_addr().unwrap().to_string(),
            Arc::clone(&shutdown),
        );

        let mut buf = [0u8; 16];
        let size = server.recv(&mut buf).unwrap();
        shutdown.store(true, Ordering::SeqCst);
        assert_eq!(&buf[..size], PING);
    }
}
