//! Observable state snapshots for invariant checking.
//!
//! Snapshots capture server-side room state at a point in time. Invariants
//! operate on snapshots rather than live state to ensure consistent, atomic
//! checks.

use std::{ops::Sub, time::Duration};

use fadu_core::GameSession;
use fadu_proto::{Card, GameStatus, RoomCode};

/// Snapshot of every live room.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemSnapshot {
    /// Per-room state, in room code order.
    pub rooms: Vec<RoomSnapshot>,
}

impl SystemSnapshot {
    /// Create an empty snapshot (no rooms).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Snapshot a set of sessions.
    pub fn from_sessions<'a, I>(sessions: impl IntoIterator<Item = &'a GameSession<I>>) -> Self
    where
        I: Copy + Ord + Send + Sync + Sub<Output = Duration> + 'a,
    {
        Self { rooms: sessions.into_iter().map(RoomSnapshot::from_session).collect() }
    }
}

/// Snapshot of one seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSnapshot {
    /// Player name.
    pub name: String,
    /// Whether a live connection holds the seat.
    pub connected: bool,
    /// Cards in hand.
    pub hand: Vec<Card>,
    /// Cumulative score.
    pub score: i32,
    /// Points per completed round.
    pub round_points: Vec<i32>,
}

/// Snapshot of a room's observable state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    /// Room code.
    pub code: RoomCode,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Seats in turn order.
    pub seats: Vec<SeatSnapshot>,
    /// Played cards, top last.
    pub table: Vec<Card>,
    /// Draw pile, top last.
    pub deck: Vec<Card>,
    /// Seat whose turn it is, while a round is live.
    pub current_turn: Option<usize>,
    /// Host name.
    pub host: Option<String>,
    /// Current round number.
    pub current_round: u32,
    /// Configured number of rounds.
    pub total_rounds: u32,
}

impl RoomSnapshot {
    /// Capture a session.
    pub fn from_session<I>(session: &GameSession<I>) -> Self
    where
        I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
    {
        Self {
            code: session.code().clone(),
            status: session.status(),
            seats: session
                .seats()
                .iter()
                .map(|seat| SeatSnapshot {
                    name: seat.name().to_string(),
                    connected: seat.is_connected(),
                    hand: seat.hand().to_vec(),
                    score: seat.score(),
                    round_points: seat.round_points().to_vec(),
                })
                .collect(),
            table: session.table().to_vec(),
            deck: session.deck().cards().to_vec(),
            current_turn: session.current_turn(),
            host: session.host().map(str::to_string),
            current_round: session.current_round(),
            total_rounds: session.total_rounds(),
        }
    }

    /// Every card in hands, on the table and in the deck.
    pub fn all_cards(&self) -> impl Iterator<Item = &Card> {
        self.seats.iter().flat_map(|s| s.hand.iter()).chain(&self.table).chain(&self.deck)
    }
}
