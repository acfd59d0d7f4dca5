//! Wire messages exchanged between the chat client and the notifier server.
//!
//! Both directions are JSON. Client commands travel over TCP, one `ChatMessage` per line;
//! notifications travel back over UDP, one `Delivery` per datagram.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::NotifierError;

/// Opaque chat handle identifying a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
#[serde(transparent)]
pub struct SubscriberId(String);

impl SubscriberId {
    /// Wrap a handle.
    pub fn new(handle: impl Into<String>) -> Self {
        SubscriberId(handle.into())
    }

    /// The raw handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubscriberId {
    fn from(handle: &str) -> Self {
        SubscriberId::new(handle)
    }
}

/// A line of chat text sent by a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Sender's chat handle.
    pub handle: SubscriberId,
    /// Raw text, e.g. `/btc 5`.
    pub text: String,
    /// UDP port the client receives deliveries on.
    pub port: u16,
}

impl ChatMessage {
    /// Build a new chat message.
    pub fn new(handle: SubscriberId, text: &str, port: u16) -> Self {
        ChatMessage {
            handle,
            text: text.to_string(),
            port,
        }
    }

    /// Encode as a single JSON line terminated by `\n`.
    pub fn to_json_line(&self) -> Result<Vec<u8>, NotifierError> {
        let mut line = serde_json::to_vec(self)?;
        line.push(b'\n');
        Ok(line)
    }

    /// Decode from a JSON line.
    pub fn from_json(line: &str) -> Result<Self, NotifierError> {
        Ok(serde_json::from_str(line.trim())?)
    }
}

/// A rendered notification pushed to a subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Delivery {
    /// Recipient handle.
    pub handle: SubscriberId,
    /// Rendered text.
    pub text: String,
    /// UTC timestamp in milliseconds since Unix epoch.
    pub timestamp: u64,
}

impl Delivery {
    /// Stamp a new delivery with the current time.
    pub fn new(handle: SubscriberId, text: &str) -> Self {
        Delivery {
            handle,
            text: text.to_string(),
            timestamp: Utc::now().timestamp_millis() as u64,
        }
    }

    /// Encode the delivery to JSON bytes.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, NotifierError> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_message_is_newline_terminated_json() {
        let msg = ChatMessage::new(SubscriberId::new("42"), "/btc 5", 55555);
        let line = msg.to_json_line().unwrap();
        assert_eq!(line.last(), Some(&b'\n'));
        let text = String::from_utf8(line).unwrap();
        assert!(text.contains(r#""handle":"42""#));
        assert_eq!(ChatMessage::from_json(&text).unwrap(), msg);
    }

    #[test]
    fn rejects_malformed_chat_line() {
        assert!(matches!(
            ChatMessage::from_json("{not json"),
            Err(NotifierError::SerdeJson(_))
        ));
    }
}
