//! Chat client for the crypto price notifier.
//!
//! Connects to the server's command port over TCP and subscribes with `/start`, then
//! forwards every line typed on stdin (`/btc`, `/eth_y 5`, `/stop`, ...) as a chat
//! message. Notifications arrive over UDP on the local listen port and are printed to
//! stdout. A background thread keeps the UDP address alive with periodic `PING`s.
//!
//! Usage example (CLI):
//! ```bash
//! notifier_client --server-ip 127.0.0.1 --listen-port 55555 --handle alice
//! notifier_client --server-ip 10.0.0.2 --command-port 9090 --data-port 9091 --handle bob
//! ```
#![warn(missing_docs)]
mod args;
mod sender;

use crate::args::Args;
use crate::sender::CommandSender;
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use log::{debug, error, info, warn};
use notifier_common::message::{ChatMessage, Delivery};
use notifier_common::net::addr;
use notifier_common::{NotifierError, Result, SubscriberId};
use std::io::{self, BufRead, ErrorKind};
use std::net::{TcpStream, UdpSocket};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

/// Render a delivery for the terminal, stamped with local time.
fn format_delivery(delivery: &Delivery) -> String {
    let stamp = i64::try_from(delivery.timestamp)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    format!("[{}] {}", stamp, delivery.text)
}

/// Receive deliveries from `socket` and print them until `shutdown` is set.
fn start_receiver_loop(socket: Arc<UdpSocket>, shutdown: Arc<AtomicBool>) -> Result<()> {
    info!("Notification receiver running on: {}", socket.local_addr()?);
    let mut buf = [0u8; 4096];

    while !shutdown.load(Ordering::Relaxed) {
        match socket.recv(&mut buf) {
            Ok(size) => match serde_json::from_slice::<Delivery>(&buf[..size]) {
                Ok(delivery) => println!("{}", format_delivery(&delivery)),
                Err(_) => debug!(
                    "Received non-JSON message: {}",
                    String::from_utf8_lossy(&buf[..size])
                ),
            },
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => {
                error!("Receive data error: {}", e);
                return Err(NotifierError::Io(e));
            }
        }
    }
    info!("Receiver loop stopping...");
    Ok(())
}

/// Forward stdin lines to the server until EOF, a write error or shutdown.
fn start_input_thread(
    mut stream: TcpStream,
    handle: SubscriberId,
    port: u16,
    shutdown: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            let message = ChatMessage::new(handle.clone(), line.trim(), port);
            if let Err(e) = CommandSender::send_message(&mut stream, &message) {
                error!("Server connection lost: {}", e);
                break;
            }
        }
        info!("Input closed. Shutting down client...");
        shutdown.store(true, Ordering::SeqCst);
    });
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = Arc::clone(&shutdown);
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down client...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .map_err(|e| NotifierError::Format(format!("failed to install Ctrl-C handler: {}", e)))?;
    }

    let server_ip = args.server_ip.trim().replace('"', "");
    let server_command_address = addr(&server_ip, args.command_port);
    let server_udp_address = addr(&server_ip, args.data_port);
    let mut listen_port = args.listen_port;
    if listen_port != 0 && listen_port == args.data_port {
        warn!(
            "--listen-port={} matches the server data port. A free local port will be selected.",
            listen_port
        );
        listen_port = 0;
    }

    let client_udp_socket = Arc::new(UdpSocket::bind(addr("0.0.0.0", listen_port))?);
    client_udp_socket.set_read_timeout(Some(Duration::from_secs(1)))?;
    let local_port = client_udp_socket.local_addr()?.port();
    info!("UDP client listening on port {}", local_port);

    info!("Connecting to TCP server at {}", server_command_address);
    let mut tcp_stream = TcpStream::connect(&server_command_address)
        .map_err(|e| NotifierError::Format(format!("Failed to connect to server: {}", e)))?;

    let handle = SubscriberId::new(args.handle.trim());
    CommandSender::send_message(
        &mut tcp_stream,
        &ChatMessage::new(handle.clone(), "/start", local_port),
    )?;
    info!("Subscribed as {}", handle);

    CommandSender::start_ping_thread(
        Arc::clone(&client_udp_socket),
        server_udp_address,
        Arc::clone(&shutdown),
    );
    start_input_thread(tcp_stream, handle, local_port, Arc::clone(&shutdown));

    info!("Client is running. Type /btc, /eth, /btc_y, /eth_y or /stop. Press Ctrl+C to exit.");
    start_receiver_loop(client_udp_socket, shutdown)
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
