//! Domain models and utilities for the notifier server.
//!
//! - `ping_monitor`: in-memory keep-alive tracker for chat clients.
//! - `price_history`: stored price samples, per-day aggregation and persistence.
//! - `feed`: price feeds polled by the ingestion job.
//! - `provider`: market data provider response format.

pub mod feed;
pub mod ping_monitor;
pub mod price_history;
pub mod provider;
