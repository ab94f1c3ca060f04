//! Deterministic simulation harness for Fadu server testing.
//!
//! A seeded [`SimEnv`] replaces wall-clock time and OS randomness, so every
//! deal, token and grace-period expiry is reproducible from a seed.
//!
//! # In-process testing
//!
//! [`SimServer`] drives the real `ServerDriver` directly and records what
//! each session receives. [`Scenario`] layers player-indexed [`Operation`]s
//! on top for property tests and fuzzing.
//!
//! # Network testing
//!
//! [`SimNetworkServer`] serves the same driver over WebSocket on turmoil's
//! simulated TCP.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths, not
//! specific scenarios. Use [`InvariantRegistry::standard()`] for the game
//! invariants.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod operation;
pub mod sim_env;
pub mod sim_network;
pub mod sim_server;

pub use invariants::{
    CardConservation, Invariant, InvariantRegistry, InvariantResult, RoomSnapshot, ScoreLedger,
    SeatSnapshot, SingleConnectedHost, SystemSnapshot, TurnOnConnectedSeat, Violation,
};
pub use operation::{Operation, PLAYER_NAMES, PlayerId, SCENARIO_ROOM, Scenario, name};
pub use sim_env::{SimEnv, SimInstant};
pub use sim_network::{SIM_PORT, SimNetworkServer};
pub use sim_server::{SimServer, stacked_deck};
