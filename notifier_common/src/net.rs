//! Shared networking constants and helpers used by client and server.

/// TCP port for the chat command channel (client -> server).
pub const COMMAND_PORT: u16 = 8080;
/// UDP port for deliveries and keep-alive pings (server <-> client).
pub const DATA_PORT: u16 = 8081;
/// Keep-alive datagram payload.
pub const PING: &[u8] = b"PING";

/// Helper to format an address with a port like "ip:port".
pub fn addr(ip: &str, port: u16) -> String {
    format!("{}:{}", ip, port)
}
