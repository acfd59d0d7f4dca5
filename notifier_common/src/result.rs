//! Result type alias shared across the workspace.
//!
//! Defaults the error type to the common `NotifierError`, so functions can simply
//! return `Result<T>`.
use crate::error::NotifierError;

/// Workspace-wide `Result` alias with `NotifierError` as the default error.
pub type Result<T, E = NotifierError> = std::result::Result<T, E>;
