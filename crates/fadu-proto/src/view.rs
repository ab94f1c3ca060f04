//! Read-only views of room state sent to clients.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    /// Room open, no cards dealt
    Waiting,
    /// Cards dealt, turns proceed
    Playing,
    /// A player disconnected mid-round; turns frozen
    Paused,
    /// Round resolved, waiting for the host to deal the next one
    Ended,
    /// All rounds complete (terminal)
    Final,
    /// A disconnected player never returned (terminal)
    Forfeited,
}

impl GameStatus {
    /// No further rounds can be played in this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Final | Self::Forfeited)
    }
}

/// Public view of one seat. Hands are never included; a player's own hand is
/// delivered separately via `hand_updated` or `game_state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    /// Display name (unique within the room)
    pub id: String,
    /// Whether the player currently has a live connection
    pub connected: bool,
    /// Whether the player is the room host
    pub is_host: bool,
    /// Number of cards in hand
    pub hand_count: usize,
    /// Cumulative score
    pub score: i32,
}

/// Whether the caller won their call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallOutcome {
    /// Caller had the lowest (or tied-lowest) hand
    Win,
    /// Someone held a strictly lower hand
    Lose,
}
