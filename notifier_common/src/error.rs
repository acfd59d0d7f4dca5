//! Error types shared between client and server.
//!
//! The `NotifierError` enum unifies I/O, serialization, lock poisoning and the
//! notifier's domain failures, allowing crates to propagate a single error type.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

use crate::asset::Asset;
use crate::command::Day;

/// Unified error type shared by client and server.
#[derive(Error, Debug)]
pub enum NotifierError {
    /// I/O error originating from the standard library or sockets/files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Generic formatting/validation error with a human-readable message.
    #[error("Format error: {0}")]
    Format(String),

    /// A command argument that is not a non-negative number of minutes.
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Aggregates for the requested day could not be produced.
    #[error("Data unavailable for {day}: {reason}")]
    DataUnavailable {
        /// Day that was requested.
        day: Day,
        /// Short description of the cause.
        reason: String,
    },

    /// The snapshot had no figures for the requested asset.
    #[error("Asset not found in snapshot: {0}")]
    AssetNotFound(Asset),

    /// Sending a message to a subscriber failed.
    #[error("Delivery to {handle} failed: {reason}")]
    Delivery {
        /// Recipient handle.
        handle: String,
        /// Short description of the cause.
        reason: String,
    },

    /// The market data provider could not be reached or answered with an error.
    #[error("Price fetch failed: {0}")]
    Fetch(String),

    /// Failure while decoding with `bincode` (invalid or truncated payloads, etc.).
    #[error("Bincode serialization/deserialization error: {0}")]
    BincodeDecode(#[from] bincode::error::DecodeError),

    /// Failure while encoding with `bincode` (I/O or serialization issues).
    #[error("Bincode serialization/deserialization error: {0}")]
    BincodeEncode(#[from] bincode::error::EncodeError),

    /// Failure while encoding/decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),
}

impl NotifierError {
    /// Build a `Delivery` error for `handle`.
    pub fn delivery(handle: impl ToString, reason: impl Into<String>) -> Self {
        NotifierError::Delivery {
            handle: handle.to_string(),
            reason: reason.into(),
        }
    }

    /// Build a `DataUnavailable` error for `day`.
    pub fn data_unavailable(day: Day, reason: impl Into<String>) -> Self {
        NotifierError::DataUnavailable {
            day,
            reason: reason.into(),
        }
    }
}

impl<T> From<PoisonError<T>> for NotifierError {
    fn from(err: PoisonError<T>) -> Self {
        NotifierError::MutexLock(err.to_string())
    }
}
