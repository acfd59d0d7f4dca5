//! Transport boundary between the dispatcher and chat clients.
//!
//! Inbound, the [`ChatReceiver`](crate::receiver::ChatReceiver) turns client chat lines
//! into [`InboundEvent`]s on a crossbeam channel. Outbound, the dispatcher talks to a
//! [`Transport`]: `send` pushes one rendered message, `stop_receiving` mutes a handle
//! after it issued `stop`.
//!
//! [`ChatTransport`] is the UDP implementation. It looks up the address a handle last
//! wrote from in the shared [`RouteTable`] and refuses to send when the client's
//! keep-alive has expired, so an unreachable client surfaces as a delivery error.
use crate::model::ping_monitor::PingMonitor;
use log::{debug, error};
use notifier_common::command::split_command_line;
use notifier_common::message::Delivery;
use notifier_common::{Command, NotifierError, Result, SubscriberId};
use std::collections::{HashMap, HashSet};
use std::net::{SocketAddr, UdpSocket};
use std::sync::{Arc, Mutex};

/// One command received from a subscriber.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    /// Who sent it.
    pub subscriber: SubscriberId,
    /// Command token, e.g. `/btc`.
    pub command: String,
    /// Text after the token, if any.
    pub argument: Option<String>,
}

impl InboundEvent {
    /// Build an event from explicit parts.
    #[cfg(test)]
    pub fn new(subscriber: impl Into<SubscriberId>, command: &str, argument: Option<&str>) -> Self {
        InboundEvent {
            subscriber: subscriber.into(),
            command: command.to_string(),
            argument: argument.map(str::to_string),
        }
    }

    /// Split a chat line into an event. Blank lines yield `None`.
    pub fn from_chat_line(subscriber: SubscriberId, line: &str) -> Option<Self> {
        let (token, argument) = split_command_line(line)?;
        Some(InboundEvent {
            subscriber,
            command: token.to_string(),
            argument: argument.map(str::to_string),
        })
    }
}

/// Outbound side of the chat transport.
pub trait Transport {
    /// Deliver `text` to `id`. Any error means the subscriber is unreachable.
    fn send(&mut self, id: &SubscriberId, text: &str) -> Result<()>;

    /// Stop receiving updates from and sending updates to `id`.
    fn stop_receiving(&mut self, id: &SubscriberId);
}

/// Where each handle is reachable, and which handles asked to stop.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<SubscriberId, SocketAddr>,
    muted: HashSet<SubscriberId>,
}

impl RouteTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `id` wrote `text` and wants deliveries at `addr`.
    ///
    /// Returns `false` when the handle is muted and the text is not a `start` command;
    /// such messages must be dropped. `start` lifts the mute.
    pub fn accept(&mut self, id: &SubscriberId, text: &str, addr: SocketAddr) -> bool {
        if self.muted.contains(id) {
            let is_start = split_command_line(text)
                .is_some_and(|(token, _)| Command::from_token(token) == Command::Start);
            if !is_start {
                return false;
            }
            self.muted.remove(id);
        }
        self.routes.insert(id.clone(), addr);
        true
    }

    /// Delivery address of `id`.
    pub fn route(&self, id: &SubscriberId) -> Option<SocketAddr> {
        self.routes.get(id).copied()
    }

    /// Drop the route of `id` and ignore it until it sends `start`.
    pub fn mute(&mut self, id: &SubscriberId) -> Option<SocketAddr> {
        self.muted.insert(id.clone());
        self.routes.remove(id)
    }

    /// Whether `id` is muted.
    #[cfg(test)]
    pub fn is_muted(&self, id: &SubscriberId) -> bool {
        self.muted.contains(id)
    }
}

/// UDP delivery to chat clients.
pub struct ChatTransport {
    socket: Arc<UdpSocket>,
    routes: Arc<Mutex<RouteTable>>,
    ping_monitor: Arc<Mutex<PingMonitor>>,
}

impl ChatTransport {
    /// Deliver through `socket` using the shared route table and keep-alive monitor.
    pub fn new(
        socket: Arc<UdpSocket>,
        routes: Arc<Mutex<RouteTable>>,
        ping_monitor: Arc<Mutex<PingMonitor>>,
    ) -> Self {
        Self {
            socket,
            routes,
            ping_monitor,
        }
    }

    fn mute(&self, id: &SubscriberId) -> Result<()> {
        let addr = self.routes.lock()?.mute(id);
        if let Some(addr) = addr {
            self.ping_monitor.lock()?.forget(&addr);
        }
        Ok(())
    }
}

impl Transport for ChatTransport {
    fn send(&mut self, id: &SubscriberId, text: &str) -> Result<()> {
        let addr = self
            .routes
            .lock()?
            .route(id)
            .ok_or_else(|| NotifierError::delivery(id, "no route"))?;
        if !self.ping_monitor.lock()?.is_client_active(&addr) {
            return Err(NotifierError::delivery(id, "keep-alive expired"));
        }

        let data = Delivery::new(id.clone(), text).to_json_bytes()?;
        self.socket
            .send_to(&data, addr)
            .map_err(|e| NotifierError::delivery(id, e.to_string()))?;
        debug!("Delivered {} bytes to {} at {}", data.len(), id, addr);
        Ok(())
    }

    fn stop_receiving(&mut self, id: &SubscriberId) {
        if let Err(e) = self.mute(id) {
            error!("Failed to stop receiving from {}: {}", id, e);
        }
    }
}
