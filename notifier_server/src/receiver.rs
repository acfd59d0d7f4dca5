use crate::model::ping_monitor::PingMonitor;
use crate::transport::{InboundEvent, RouteTable};
use crossbeam_channel::Sender;
use log::{debug, error, info, warn};
use notifier_common::message::ChatMessage;
use notifier_common::Result;
use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

/// TCP receiver for chat commands.
///
/// Each client keeps one connection open and writes one JSON `ChatMessage` per line. For
/// every accepted line the receiver records where the handle wants deliveries, refreshes
/// its keep-alive, and forwards an `InboundEvent` to the dispatcher. A malformed line or a
/// broken connection only affects that client.
pub struct ChatReceiver {
    socket: TcpListener,
    routes: Arc<Mutex<RouteTable>>,
    ping_monitor: Arc<Mutex<PingMonitor>>,
}

impl ChatReceiver {
    /// Bind a new TCP receiver to `bind_addr` (e.g., `0.0.0.0:8080`).
    pub fn new(
        bind_addr: &str,
        routes: Arc<Mutex<RouteTable>>,
        ping_monitor: Arc<Mutex<PingMonitor>>,
    ) -> Result<Self> {
        let socket = TcpListener::bind(bind_addr)?;
        Ok(Self {
            socket,
            routes,
            ping_monitor,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Blocking accept loop; spawns one reader thread per connection.
    pub fn receive_loop(self, tx: Sender<InboundEvent>) -> Result<()> {
        info!("Chat command server is started on {}", self.local_addr()?);

        for stream in self.socket.incoming() {
            match stream {
                Ok(stream) => {
                    let routes = Arc::clone(&self.routes);
                    let ping_monitor = Arc::clone(&self.ping_monitor);
                    let tx = tx.clone();
                    thread::spawn(move || {
                        if let Err(e) = handle_connection(stream, routes, ping_monitor, tx) {
                            warn!("Chat connection closed with error: {}", e);
                        }
                    });
                }
                Err(e) => error!("TCP connection error: {}", e),
            }
        }
        Ok(())
    }
}

fn handle_connection(
    stream: TcpStream,
    routes: Arc<Mutex<RouteTable>>,
    ping_monitor: Arc<Mutex<PingMonitor>>,
    tx: Sender<InboundEvent>,
) -> Result<()> {
    let peer = stream.peer_addr()?;
    debug!("Chat client connected from {}", peer);

    for line in BufReader::new(stream).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let msg = match ChatMessage::from_json(&line) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Ignoring malformed chat line from {}: {}", peer, e);
                continue;
            }
        };

        let reply_addr = SocketAddr::new(peer.ip(), msg.port);
        if !routes.lock()?.accept(&msg.handle, &msg.text, reply_addr) {
            debug!("Ignoring {:?} from stopped handle {}", msg.text, msg.handle);
            continue;
        }
        ping_monitor.lock()?.update_ping(reply_addr);

        let Some(event) = InboundEvent::from_chat_line(msg.handle, &msg.text) else {
            continue;
        };
        info!("Received command {:?} from {}", event.command, event.subscriber);
        if tx.send(event).is_err() {
            debug!("Dispatcher gone, closing connection from {}", peer);
            break;
        }
    }
    debug!("Chat client {} disconnected", peer);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use notifier_common::SubscriberId;
    use std::io::Write;
    use std::time::Duration;

    fn start_receiver() -> (SocketAddr, Arc<Mutex<RouteTable>>, crossbeam_channel::Receiver<InboundEvent>) {
        let routes = Arc::new(Mutex::new(RouteTable::new()));
        let monitor = Arc::new(Mutex::new(PingMonitor::new(Duration::from_secs(5))));
        let receiver = ChatReceiver::new("127.0.0.1:0", Arc::clone(&routes), monitor).unwrap();
        let addr = receiver.local_addr().unwrap();
        let (tx, rx) = unbounded();
        thread::spawn(move || receiver.receive_loop(tx));
        (addr, routes, rx)
    }

    fn write_line(stream: &mut TcpStream, msg: &ChatMessage) {
        stream.write_all(&msg.to_json_line().unwrap()).unwrap();
    }

    #[test]
    fn forwards_chat_lines_as_events() {
        let (addr, routes, rx) = start_receiver();
        let mut stream = TcpStream::connect(addr).unwrap();

        write_line(&mut stream, &ChatMessage::new(SubscriberId::new("7"), "/btc 5", 40000));
        stream.write_all(b"garbage\n").unwrap();
        write_line(&mut stream, &ChatMessage::new(SubscriberId::new("7"), "/eth", 40000));

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(first, InboundEvent::new("7", "/btc", Some("5")));
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(second, InboundEvent::new("7", "/eth", None));

        let route = routes.lock().unwrap().route(&SubscriberId::new("7")).unwrap();
        assert_eq!(route.port(), 40000);
    }

    #[test]
    fn drops_commands_from_stopped_handles() {
        let (addr, routes, rx) = start_receiver();
        routes.lock().unwrap().mute(&SubscriberId::new("9"));
        let mut stream = TcpStream::connect(addr).unwrap();

        write_line(&mut stream, &ChatMessage::new(SubscriberId::new("9"), "/btc", 40001));
        write_line(&mut stream, &ChatMessage::new(SubscriberId::new("9"), "/start", 40001));

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event, InboundEvent::new("9", "/start", None));
    }
}
