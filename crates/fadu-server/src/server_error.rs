//! Driver error types.
//!
//! Every variant maps to a client-facing [`ErrorCode`]. The driver turns
//! request-level failures into an `error` event for the offending session
//! and leaves room state untouched.

use std::fmt;

use fadu_core::GameError;
use fadu_proto::{ErrorCode, ProtocolError, RoomCode};

use crate::room_manager::RoomError;

/// Errors that can occur while the driver processes an event.
#[derive(Debug)]
pub enum DriverError {
    /// Session not found in registry.
    ///
    /// The runtime delivered an event for a connection that was never
    /// accepted or has already closed.
    SessionNotFound(u64),

    /// Session already registered.
    ///
    /// Session IDs must be unique. Indicates a runtime bug.
    SessionAlreadyExists(u64),

    /// Room operation failed.
    ///
    /// Wraps game rule rejections and room lookup failures.
    Room(RoomError),

    /// Inbound text was not a valid client event.
    Protocol(String),

    /// Game action from a session that has not joined a room.
    NotSeated(u64),

    /// Session is already seated and tried to join again.
    AlreadySeated {
        /// Room the session is bound to
        room: RoomCode,
    },

    /// Request names a room other than the one the session is bound to.
    WrongRoom {
        /// Room the session is bound to
        bound: RoomCode,
        /// Room named in the request
        requested: RoomCode,
    },

    /// Request names a player other than the one bound to the session.
    PlayerMismatch {
        /// Player bound to the session
        expected: String,
        /// Player named in the request
        got: String,
    },
}

impl DriverError {
    /// Client-facing error category.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Room(err) => err.code(),
            Self::Protocol(_) | Self::PlayerMismatch { .. } | Self::WrongRoom { .. } => {
                ErrorCode::InvalidRequest
            },
            Self::NotSeated(_)
            | Self::AlreadySeated { .. }
            | Self::SessionNotFound(_)
            | Self::SessionAlreadyExists(_) => ErrorCode::InvalidState,
        }
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::SessionAlreadyExists(id) => write!(f, "session already exists: {id}"),
            Self::Room(err) => write!(f, "{err}"),
            Self::Protocol(msg) => write!(f, "invalid message: {msg}"),
            Self::NotSeated(id) => write!(f, "session {id} has not joined a room"),
            Self::AlreadySeated { room } => write!(f, "already joined room {room}"),
            Self::WrongRoom { bound, requested } => {
                write!(f, "joined room {bound}, request names {requested}")
            },
            Self::PlayerMismatch { expected, got } => {
                write!(f, "connection is bound to {expected}, request names {got}")
            },
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Room(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RoomError> for DriverError {
    fn from(err: RoomError) -> Self {
        Self::Room(err)
    }
}

impl From<GameError> for DriverError {
    fn from(err: GameError) -> Self {
        Self::Room(RoomError::Game(err))
    }
}

impl From<ProtocolError> for DriverError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err.to_string())
    }
}
