//! Core types, configuration, and utilities for the spoor SDK.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{Config, DEFAULT_ENDPOINT, DEFAULT_LOG_LEVEL, DEFAULT_SOURCE};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;

/// Generate a correlation id for a new event record.
///
/// Producers stamp every record with one of these before enqueueing it;
/// the delivery core treats the value as opaque.
pub fn correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
