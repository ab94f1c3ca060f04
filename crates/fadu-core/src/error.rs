//! Error types for the Fadu game core.
//!
//! Every rule violation maps onto one client-facing [`ErrorCode`]. A rejected
//! action leaves the session unchanged.

use fadu_proto::ErrorCode;
use thiserror::Error;

use crate::rules::PlayViolation;

/// Errors returned by [`crate::GameSession`] operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Action not permitted in the current status or by this player
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Room is at capacity
    #[error("room is full ({max} players)")]
    RoomFull {
        /// Seat capacity
        max: usize,
    },

    /// Action from a player whose turn it is not
    #[error("it is {current}'s turn, not {player}'s")]
    NotYourTurn {
        /// Player who acted
        player: String,
        /// Player whose turn it is
        current: String,
    },

    /// Room is paused for disconnected players
    #[error("game paused, waiting for {}", missing.join(", "))]
    GamePaused {
        /// Players still disconnected
        missing: Vec<String>,
    },

    /// Card selection breaks the play rules
    #[error("illegal play: {0}")]
    IllegalPlay(#[from] PlayViolation),

    /// No cards left to draw
    #[error("deck is empty")]
    EmptyDeck,

    /// Room was forfeited after the grace period
    #[error("room was forfeited")]
    Forfeited,

    /// Malformed or inconsistent request
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl GameError {
    /// Client-facing error category.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidState(_) => ErrorCode::InvalidState,
            Self::RoomFull { .. } => ErrorCode::RoomFull,
            Self::NotYourTurn { .. } => ErrorCode::NotYourTurn,
            Self::GamePaused { .. } => ErrorCode::GamePaused,
            Self::IllegalPlay(_) => ErrorCode::IllegalPlay,
            Self::EmptyDeck => ErrorCode::EmptyDeck,
            Self::Forfeited => ErrorCode::Forfeited,
            Self::InvalidRequest(_) => ErrorCode::InvalidRequest,
        }
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }

    pub(crate) fn invalid_request(reason: impl Into<String>) -> Self {
        Self::InvalidRequest(reason.into())
    }
}
