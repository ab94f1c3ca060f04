//! Wire protocol for the Fadu session engine.
//!
//! Clients and the server exchange JSON events over a persistent
//! bidirectional channel. Every message is an object of the form
//! `{"event": <name>, "data": {...}}`:
//!
//! - [`ClientMessage`]: inbound actions (join, start, draw, play, call, ...)
//! - [`ServerMessage`]: outbound state updates, broadcast to a room or
//!   unicast to one player
//!
//! The protocol crate knows nothing about game rules. It defines the shared
//! vocabulary ([`Card`], [`RoomCode`], [`GameStatus`], [`PlayerView`]) and the
//! encode/decode boundary, enforcing a maximum message size so a hostile peer
//! cannot make the server buffer arbitrarily large payloads.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod card;
mod codec;
pub mod errors;
pub mod messages;
mod room_code;
mod view;

pub use card::{Card, Suit};
pub use codec::MAX_MESSAGE_SIZE;
pub use errors::{ProtocolError, Result};
pub use messages::{ClientMessage, ErrorCode, ServerMessage};
pub use room_code::{ROOM_CODE_ALPHABET, ROOM_CODE_LEN, RoomCode};
pub use view::{CallOutcome, GameStatus, PlayerView};
