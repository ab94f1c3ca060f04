//! Game rule configuration.

use std::time::Duration;

use thiserror::Error;

use crate::deck::DECK_SIZE;

/// Smallest room that can start a game.
pub const DEFAULT_MIN_PLAYERS: usize = 2;

/// Largest room.
pub const DEFAULT_MAX_PLAYERS: usize = 8;

/// Cards dealt to each seat at the start of a round.
pub const DEFAULT_HAND_SIZE: usize = 5;

/// Points for winning a round by calling.
pub const DEFAULT_CALL_BONUS: i32 = 2;

/// Points for winning a round by emptying your hand.
pub const DEFAULT_HAND_EMPTY_BONUS: i32 = 4;

/// Upper bound on `total_rounds` accepted by `start_game`.
pub const DEFAULT_MAX_ROUNDS: u32 = 99;

/// How long a paused room waits for disconnected players.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(120);

/// Allowed hand sizes.
pub const HAND_SIZE_RANGE: std::ops::RangeInclusive<usize> = 4..=7;

/// Rule parameters for every room on a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Seats required to start
    pub min_players: usize,
    /// Seat capacity
    pub max_players: usize,
    /// Cards per hand at deal time
    pub hand_size: usize,
    /// Points awarded to the winner of a call
    pub call_bonus: i32,
    /// Points awarded for emptying your hand
    pub hand_empty_bonus: i32,
    /// Most rounds a host may request
    pub max_rounds: u32,
    /// Time a paused room waits before forfeiting
    pub grace_period: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: DEFAULT_MIN_PLAYERS,
            max_players: DEFAULT_MAX_PLAYERS,
            hand_size: DEFAULT_HAND_SIZE,
            call_bonus: DEFAULT_CALL_BONUS,
            hand_empty_bonus: DEFAULT_HAND_EMPTY_BONUS,
            max_rounds: DEFAULT_MAX_ROUNDS,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }
}

/// Inconsistent [`GameConfig`] values.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Player bounds are out of order or outside 2..=8
    #[error("invalid player range {min}..={max} (must be within 2..=8)")]
    InvalidPlayerRange {
        /// Configured minimum
        min: usize,
        /// Configured maximum
        max: usize,
    },

    /// Hand size outside [`HAND_SIZE_RANGE`]
    #[error("hand size {0} outside 4..=7")]
    InvalidHandSize(usize),

    /// A full room would leave no draw pile
    #[error("{players} hands of {hand_size} need {needed} cards, deck has 52")]
    DeckTooSmall {
        /// Seat capacity
        players: usize,
        /// Cards per hand
        hand_size: usize,
        /// Cards needed for the deal
        needed: usize,
    },

    /// `max_rounds` is zero
    #[error("max_rounds must be at least 1")]
    NoRounds,

    /// Grace period is zero
    #[error("grace period must be non-zero")]
    ZeroGracePeriod,
}

impl GameConfig {
    /// Check that the values describe a playable game.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_players < DEFAULT_MIN_PLAYERS
            || self.max_players > DEFAULT_MAX_PLAYERS
            || self.min_players > self.max_players
        {
            return Err(ConfigError::InvalidPlayerRange {
                min: self.min_players,
                max: self.max_players,
            });
        }

        if !HAND_SIZE_RANGE.contains(&self.hand_size) {
            return Err(ConfigError::InvalidHandSize(self.hand_size));
        }

        let needed = self.max_players * self.hand_size;
        if needed >= DECK_SIZE {
            return Err(ConfigError::DeckTooSmall {
                players: self.max_players,
                hand_size: self.hand_size,
                needed,
            });
        }

        if self.max_rounds == 0 {
            return Err(ConfigError::NoRounds);
        }

        if self.grace_period.is_zero() {
            return Err(ConfigError::ZeroGracePeriod);
        }

        Ok(())
    }
}
