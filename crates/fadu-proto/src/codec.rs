//! JSON text encoding for [`ClientMessage`] and [`ServerMessage`].
//!
//! Every message travels as one WebSocket text frame. Inbound frames larger
//! than [`MAX_MESSAGE_SIZE`] are rejected before parsing.

use crate::{
    errors::{ProtocolError, Result},
    messages::{ClientMessage, ServerMessage},
};

/// Largest accepted message, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024;

fn check_size(len: usize) -> Result<()> {
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge { size: len, max: MAX_MESSAGE_SIZE });
    }
    Ok(())
}

impl ClientMessage {
    /// Parse a client frame.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge` if `text` exceeds [`MAX_MESSAGE_SIZE`]
    /// - `Malformed` if the JSON is invalid or names an unknown event
    pub fn decode(text: &str) -> Result<Self> {
        check_size(text.len())?;
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to a client frame.
    ///
    /// # Errors
    ///
    /// `Malformed` if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl ServerMessage {
    /// Serialize to a server frame.
    ///
    /// # Errors
    ///
    /// `Malformed` if serialization fails.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse a server frame. Used by clients and test harnesses.
    ///
    /// # Errors
    ///
    /// - `MessageTooLarge` if `text` exceeds [`MAX_MESSAGE_SIZE`]
    /// - `Malformed` if the JSON is invalid or names an unknown event
    pub fn decode(text: &str) -> Result<Self> {
        // Full-table game_state frames for an 8-seat room stay well under the
        // limit, so the same bound applies in both directions.
        check_size(text.len())?;
        Ok(serde_json::from_str(text)?)
    }
}
