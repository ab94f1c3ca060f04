//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while encoding or decoding protocol messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Message exceeds [`crate::MAX_MESSAGE_SIZE`].
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge {
        /// Actual size in bytes
        size: usize,
        /// Maximum allowed size
        max: usize,
    },

    /// JSON was malformed or did not match any known event.
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Room code failed validation.
    #[error("invalid room code {code:?}: {reason}")]
    InvalidRoomCode {
        /// The rejected input
        code: String,
        /// Why it was rejected
        reason: &'static str,
    },
}
