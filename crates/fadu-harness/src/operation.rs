//! Operations for randomized testing.
//!
//! Operations are small, player-indexed actions against a single room. They
//! are generated by proptest or the fuzzer and applied through a
//! [`Scenario`], which owns the [`SimServer`] and tracks which player holds
//! which connection. Invalid operations are expected: the server must reject
//! them without breaking any invariant.

use std::time::Duration;

use arbitrary::Arbitrary;
use fadu_proto::{ClientMessage, RoomCode};
use fadu_server::DriverError;

use crate::SimServer;

/// Player identifier (index into [`PLAYER_NAMES`], taken modulo its length).
pub type PlayerId = u8;

/// Names used by generated players.
pub const PLAYER_NAMES: [&str; 4] = ["alice", "bob", "carol", "dave"];

/// Room every scenario plays in.
pub const SCENARIO_ROOM: &str = "FADU00";

/// Actions a scenario can take.
#[derive(Debug, Clone, Arbitrary)]
pub enum Operation {
    /// Player connects (if needed) and joins, presenting any token it holds.
    Join {
        /// Joining player
        player: PlayerId,
    },

    /// Player asks to start the game.
    Start {
        /// Requesting player
        player: PlayerId,
        /// Requested rounds
        rounds: u8,
    },

    /// Player draws.
    Draw {
        /// Acting player
        player: PlayerId,
    },

    /// Player plays cards by hand position.
    Play {
        /// Acting player
        player: PlayerId,
        /// Hand positions
        indices: Vec<u8>,
    },

    /// Player plays the first legal single card, if any.
    PlayLegal {
        /// Acting player
        player: PlayerId,
    },

    /// Player calls.
    Call {
        /// Acting player
        player: PlayerId,
    },

    /// Player asks for the next round.
    NextRound {
        /// Requesting player
        player: PlayerId,
    },

    /// Player asks to reset a finished room.
    Reset {
        /// Requesting player
        player: PlayerId,
    },

    /// Player leaves explicitly.
    Leave {
        /// Leaving player
        player: PlayerId,
    },

    /// Player's connection drops.
    Disconnect {
        /// Disconnecting player
        player: PlayerId,
    },

    /// Virtual time passes, then the server ticks.
    Advance {
        /// Seconds to advance
        secs: u8,
    },

    /// Player sends arbitrary text.
    Garbage {
        /// Sending player
        player: PlayerId,
        /// Raw frame
        text: String,
    },
}

/// Per-player client state.
#[derive(Debug, Clone, Default)]
struct PlayerSlot {
    session: Option<u64>,
    token: Option<String>,
}

/// A single-room scenario over a [`SimServer`].
pub struct Scenario {
    server: SimServer,
    room: RoomCode,
    players: [PlayerSlot; PLAYER_NAMES.len()],
}

impl Scenario {
    /// Scenario with default server config and the given seed.
    pub fn new(seed: u64) -> Result<Self, DriverError> {
        Self::with_server(SimServer::with_seed(seed))
    }

    /// Scenario over an existing server.
    pub fn with_server(server: SimServer) -> Result<Self, DriverError> {
        let room = RoomCode::parse(SCENARIO_ROOM)?;
        Ok(Self { server, room, players: Default::default() })
    }

    /// Apply one operation.
    ///
    /// Rejections by the server are not errors; `Err` means the driver itself
    /// failed, which is always a bug.
    pub fn apply(&mut self, op: &Operation) -> Result<(), DriverError> {
        match op {
            Operation::Join { player } => self.join(*player),

            Operation::Start { player, rounds } => self.send(*player, |room, _| {
                ClientMessage::StartGame { room_id: room, total_rounds: u32::from(*rounds % 4) }
            }),

            Operation::Draw { player } => {
                self.send(*player, |_, name| ClientMessage::DrawCard { player_id: name })
            },

            Operation::Play { player, indices } => self.send(*player, |_, name| {
                ClientMessage::PlayCards {
                    player_id: name,
                    card_indices: indices.iter().map(|&i| usize::from(i % 8)).collect(),
                }
            }),

            Operation::PlayLegal { player } => self.play_legal(*player),

            Operation::Call { player } => {
                self.send(*player, |_, name| ClientMessage::Call { player_id: name })
            },

            Operation::NextRound { player } => {
                self.send(*player, |room, _| ClientMessage::NextRound { room_id: room })
            },

            Operation::Reset { player } => {
                self.send(*player, |room, _| ClientMessage::ResetRoom { room_id: room })
            },

            Operation::Leave { player } => {
                self.send(*player, |room, _| ClientMessage::LeaveRoom { room_id: room })
            },

            Operation::Disconnect { player } => {
                let Some(session) = self.slot_mut(*player).session.take() else {
                    return Ok(());
                };
                self.server.disconnect(session)
            },

            Operation::Advance { secs } => {
                self.server.advance(Duration::from_secs(u64::from(*secs)))
            },

            Operation::Garbage { player, text } => match self.slot(*player).session {
                Some(session) => self.server.send_raw(session, text),
                None => Ok(()),
            },
        }
    }

    fn join(&mut self, player: PlayerId) -> Result<(), DriverError> {
        let session = match self.slot(player).session {
            Some(session) => session,
            None => {
                let session = self.server.connect()?;
                self.slot_mut(player).session = Some(session);
                session
            },
        };

        let message = ClientMessage::JoinRoom {
            room_id: self.room.clone(),
            player_id: name(player).to_string(),
            token: self.slot(player).token.clone(),
        };
        self.server.send(session, &message)?;

        if let Some(token) = self.server.token(session).map(str::to_string) {
            self.slot_mut(player).token = Some(token);
        }
        Ok(())
    }

    fn play_legal(&mut self, player: PlayerId) -> Result<(), DriverError> {
        let Some(session) = self.slot(player).session else {
            return Ok(());
        };
        let Some(room) = self.server.driver().room(&self.room) else {
            return Ok(());
        };
        let Some(seat) = room.seat(name(player)) else {
            return Ok(());
        };

        let top = room.table().last().copied();
        let index = seat
            .hand()
            .iter()
            .position(|card| top.is_none_or(|top| top.value == card.value))
            .unwrap_or(0);

        self.server.send(session, &ClientMessage::PlayCards {
            player_id: name(player).to_string(),
            card_indices: vec![index],
        })
    }

    fn send(
        &mut self,
        player: PlayerId,
        build: impl FnOnce(RoomCode, String) -> ClientMessage,
    ) -> Result<(), DriverError> {
        let Some(session) = self.slot(player).session else {
            return Ok(());
        };
        let message = build(self.room.clone(), name(player).to_string());
        self.server.send(session, &message)
    }

    fn slot(&self, player: PlayerId) -> &PlayerSlot {
        &self.players[usize::from(player) % PLAYER_NAMES.len()]
    }

    fn slot_mut(&mut self, player: PlayerId) -> &mut PlayerSlot {
        &mut self.players[usize::from(player) % PLAYER_NAMES.len()]
    }

    /// Room every operation targets.
    pub fn room(&self) -> &RoomCode {
        &self.room
    }

    /// Session currently held by a player.
    pub fn session(&self, player: PlayerId) -> Option<u64> {
        self.slot(player).session
    }

    /// Underlying server.
    pub fn server(&self) -> &SimServer {
        &self.server
    }

    /// Mutable underlying server.
    pub fn server_mut(&mut self) -> &mut SimServer {
        &mut self.server
    }
}

/// Display name for a generated player.
pub fn name(player: PlayerId) -> &'static str {
    PLAYER_NAMES[usize::from(player) % PLAYER_NAMES.len()]
}

#[cfg(test)]
mod tests {
    use fadu_proto::ServerMessage;

    use super::*;

    #[test]
    fn join_records_token() {
        let mut scenario = Scenario::new(1).unwrap();
        scenario.apply(&Operation::Join { player: 0 }).unwrap();

        let session = scenario.session(0).unwrap();
        assert!(scenario.server().token(session).is_some());
        assert!(scenario.server().driver().has_room(scenario.room()));
    }

    #[test]
    fn disconnect_then_join_reclaims_seat() {
        let mut scenario = Scenario::new(2).unwrap();
        for op in [
            Operation::Join { player: 0 },
            Operation::Join { player: 1 },
            Operation::Start { player: 0, rounds: 1 },
            Operation::Disconnect { player: 1 },
            Operation::Join { player: 1 },
        ] {
            scenario.apply(&op).unwrap();
        }

        let session = scenario.session(1).unwrap();
        assert!(matches!(
            scenario.server().last_event(session, "room_joined"),
            Some(ServerMessage::RoomJoined { reattached: true, .. })
        ));
    }
}
