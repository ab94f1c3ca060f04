//! Runtime errors for the production server.
//!
//! Client mistakes never surface here; the driver answers those with an
//! `error` event. These are the failures that stop a listener or a
//! connection task.

use thiserror::Error;

use crate::server_error::DriverError;

/// Failure while starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Bad bind address or inconsistent game rules. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Socket or WebSocket handshake failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The driver hit a state that should be unreachable.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl From<fadu_core::ConfigError> for ServerError {
    fn from(err: fadu_core::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
