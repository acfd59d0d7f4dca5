//! Common types and utilities shared by the notifier server and chat client.
//!
//! This crate aggregates:
//! - `error`: unified error type `NotifierError` used across the workspace.
//! - `result`: handy `Result<T, NotifierError>` alias.
//! - `asset`: the fixed set of tracked assets.
//! - `command`: subscriber commands and chat line parsing.
//! - `message`: JSON wire messages exchanged between client and server.
//! - `snapshot`: price samples and per-day aggregates.
//! - `net`: networking constants and small helpers.
#![warn(missing_docs)]
pub mod asset;
pub mod command;
pub mod error;
pub mod message;
pub mod net;
pub mod result;
pub mod snapshot;

pub use asset::Asset;
pub use command::{Command, Day};
pub use error::NotifierError;
pub use message::SubscriberId;
pub use result::Result;
