//! Game rules and session state machine for Fadu.
//!
//! Everything here is pure: no I/O, no clocks, no global RNG. Time is passed
//! in as an instant and randomness comes from an injected [`Environment`], so
//! the same seed replays the same shuffles.
//!
//! - [`deck`]: 52-card deck, shuffle, deal, draw
//! - [`rules`]: play legality
//! - [`scoring`]: hand sums, call resolution, final standings
//! - [`session`]: one room's state machine
//!
//! # Invariants
//!
//! - Card conservation: during a round, hands + table + deck hold exactly the
//!   52 cards of one deck
//! - While `playing`, the turn pointer indexes a connected seat
//! - Cumulative scores equal the sum of per-round points

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod deck;
pub mod env;
pub mod error;
pub mod rules;
pub mod scoring;
pub mod session;

pub use config::{ConfigError, GameConfig};
pub use env::Environment;
pub use error::GameError;
pub use session::{GameEvent, GameSession, JoinOutcome, Seat};
