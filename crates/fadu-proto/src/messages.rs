//! Client and server events.
//!
//! Both enums are adjacently tagged: the variant name (snake_case) goes in
//! `event`, the fields in `data`. Unknown fields inside `data` are ignored so
//! older clients that send extra keys (for example `room_id` on `call`) keep
//! working.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Card, CallOutcome, GameStatus, PlayerView, RoomCode};

/// Events sent by clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join (or create) the room with the given code.
    JoinRoom {
        /// Room to join
        room_id: RoomCode,
        /// Display name, unique within the room
        player_id: String,
        /// Reconnect token issued by an earlier `room_joined`
        #[serde(default, skip_serializing_if = "Option::is_none")]
        token: Option<String>,
    },

    /// Create a room with a server-generated code and join it as host.
    CreateRoom {
        /// Display name of the host
        player_id: String,
    },

    /// Host starts the game.
    StartGame {
        /// Room to start
        room_id: RoomCode,
        /// Number of rounds to play
        total_rounds: u32,
    },

    /// Draw the top card of the deck; ends the turn.
    DrawCard {
        /// Acting player
        player_id: String,
    },

    /// Play one or more cards of equal value from hand.
    PlayCards {
        /// Acting player
        player_id: String,
        /// Positions in the player's hand, in the order to be stacked
        card_indices: Vec<usize>,
    },

    /// End the round by comparing hand sums.
    Call {
        /// Acting player
        player_id: String,
    },

    /// Host deals the next round after a round has ended.
    NextRound {
        /// Room to advance
        room_id: RoomCode,
    },

    /// Leave the room. Mid-game this behaves like a disconnect.
    LeaveRoom {
        /// Room to leave
        room_id: RoomCode,
    },

    /// Host returns a finished room to the lobby.
    ResetRoom {
        /// Room to reset
        room_id: RoomCode,
    },
}

/// Error categories reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Action not valid for the room's current status
    InvalidState,
    /// Room is at capacity
    RoomFull,
    /// Action from a player whose turn it is not
    NotYourTurn,
    /// Room is paused waiting for a reconnect
    GamePaused,
    /// Card selection violates the play rules
    IllegalPlay,
    /// Draw attempted with no cards left
    EmptyDeck,
    /// Room ended because a player never returned
    Forfeited,
    /// Malformed or inconsistent request
    InvalidRequest,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidState => "invalid_state",
            Self::RoomFull => "room_full",
            Self::NotYourTurn => "not_your_turn",
            Self::GamePaused => "game_paused",
            Self::IllegalPlay => "illegal_play",
            Self::EmptyDeck => "empty_deck",
            Self::Forfeited => "forfeited",
            Self::InvalidRequest => "invalid_request",
        };
        f.write_str(name)
    }
}

/// Events sent by the server.
///
/// Unless noted, events are broadcast to every connected player in the room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Join accepted (unicast). Carries the reconnect token for this seat.
    RoomJoined {
        /// Room joined
        room_id: RoomCode,
        /// Seat name
        player_id: String,
        /// Token required to reclaim this seat after a disconnect
        token: String,
        /// Whether this player hosts the room
        is_host: bool,
        /// Whether an existing seat was reclaimed
        reattached: bool,
    },

    /// Full resync (unicast), sent on join.
    GameState {
        /// Room code
        room_id: RoomCode,
        /// Seats in turn order
        players: Vec<PlayerView>,
        /// Player whose turn it is, if a round is in progress
        current_turn: Option<String>,
        /// Played cards, last is the top
        table_cards: Vec<Card>,
        /// Cards left in the draw pile
        deck_count: usize,
        /// Room status
        game_status: GameStatus,
        /// Current round (0 before the game starts)
        current_round: u32,
        /// Configured number of rounds
        total_rounds: u32,
        /// Host name
        host_id: Option<String>,
        /// The recipient's own hand
        hand: Vec<Card>,
    },

    /// Membership changed.
    PlayerJoined {
        /// Seats in turn order
        players: Vec<PlayerView>,
        /// Host name
        host_id: Option<String>,
    },

    /// Round one was dealt.
    GameStarted {
        /// Seats in turn order
        players: Vec<PlayerView>,
        /// First player to act
        current_turn: Option<String>,
        /// Cards left in the draw pile
        deck_count: usize,
        /// Always 1
        current_round: u32,
        /// Configured number of rounds
        total_rounds: u32,
    },

    /// The recipient's hand changed (unicast).
    HandUpdated {
        /// Full hand
        hand: Vec<Card>,
        /// Cards left in the draw pile
        deck_count: usize,
    },

    /// A play was accepted.
    CardsPlayed {
        /// Who played
        player_id: String,
        /// Cards played, in stacking order
        cards: Vec<Card>,
        /// Whole table after the play
        table_cards: Vec<Card>,
        /// Next player to act
        current_turn: Option<String>,
        /// Cards left in the draw pile
        deck_count: usize,
    },

    /// A player drew a card. The card itself goes only to the drawer.
    CardDrawn {
        /// Who drew
        player_id: String,
        /// Next player to act
        current_turn: Option<String>,
        /// Cards left in the draw pile
        deck_count: usize,
    },

    /// A call was resolved.
    CallResult {
        /// Who called
        caller: String,
        /// Whether the caller won
        result: CallOutcome,
        /// Round winner
        winner: String,
        /// Hand sum per player at the moment of the call
        player_sums: BTreeMap<String, u32>,
        /// Points awarded this round
        round_points: BTreeMap<String, i32>,
        /// Cumulative scores
        scores: BTreeMap<String, i32>,
    },

    /// A player emptied their hand and took the round.
    RoundWon {
        /// Round winner
        player_id: String,
        /// Points awarded
        bonus: i32,
        /// Cumulative scores
        scores: BTreeMap<String, i32>,
    },

    /// Next round was dealt.
    NextRound {
        /// Always empty at the start of a round
        table_cards: Vec<Card>,
        /// First player to act
        current_turn: Option<String>,
        /// Cards left in the draw pile
        deck_count: usize,
        /// Round number
        current_round: u32,
        /// Seats in turn order
        players: Vec<PlayerView>,
    },

    /// All rounds complete.
    FinalResult {
        /// Cumulative scores
        scores: BTreeMap<String, i32>,
        /// Every player holding the maximum score
        winners: Vec<String>,
    },

    /// A player's connection dropped.
    PlayerDisconnected {
        /// Who dropped
        player_id: String,
    },

    /// A player reclaimed their seat.
    PlayerReconnected {
        /// Who returned
        player_id: String,
    },

    /// Turns are frozen until the listed players return.
    GamePaused {
        /// Disconnected players
        missing: Vec<String>,
    },

    /// Everyone is back; turns continue.
    GameResumed {
        /// Player whose turn it is
        current_turn: Option<String>,
    },

    /// The reconnect grace period ran out.
    GameForfeited {
        /// Players who never returned
        missing: Vec<String>,
    },

    /// Host returned the room to the lobby.
    RoomReset {
        /// Remaining seats
        players: Vec<PlayerView>,
        /// Host name
        host_id: Option<String>,
    },

    /// Request rejected (unicast). Room state is unchanged.
    Error {
        /// Error category
        code: ErrorCode,
        /// Human-readable description
        message: String,
    },
}

impl ServerMessage {
    /// Build an error event.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Error { code, message: message.into() }
    }

    /// Wire name of the event, for logging.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::RoomJoined { .. } => "room_joined",
            Self::GameState { .. } => "game_state",
            Self::PlayerJoined { .. } => "player_joined",
            Self::GameStarted { .. } => "game_started",
            Self::HandUpdated { .. } => "hand_updated",
            Self::CardsPlayed { .. } => "cards_played",
            Self::CardDrawn { .. } => "card_drawn",
            Self::CallResult { .. } => "call_result",
            Self::RoundWon { .. } => "round_won",
            Self::NextRound { .. } => "next_round",
            Self::FinalResult { .. } => "final_result",
            Self::PlayerDisconnected { .. } => "player_disconnected",
            Self::PlayerReconnected { .. } => "player_reconnected",
            Self::GamePaused { .. } => "game_paused",
            Self::GameResumed { .. } => "game_resumed",
            Self::GameForfeited { .. } => "game_forfeited",
            Self::RoomReset { .. } => "room_reset",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Suit;

    #[test]
    fn join_room_accepts_lowercase_code_without_token() {
        let msg = ClientMessage::decode(
            r#"{"event":"join_room","data":{"room_id":"abc123","player_id":"alice"}}"#,
        )
        .unwrap();

        assert_eq!(msg, ClientMessage::JoinRoom {
            room_id: RoomCode::parse("ABC123").unwrap(),
            player_id: "alice".to_string(),
            token: None,
        });
    }

    #[test]
    fn call_ignores_extra_fields() {
        let msg = ClientMessage::decode(
            r#"{"event":"call","data":{"player_id":"bob","room_id":"ABC123"}}"#,
        )
        .unwrap();

        assert_eq!(msg, ClientMessage::Call { player_id: "bob".to_string() });
    }

    #[test]
    fn unknown_event_is_rejected() {
        let result = ClientMessage::decode(r#"{"event":"cheat","data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn invalid_room_code_is_rejected() {
        let result = ClientMessage::decode(
            r#"{"event":"join_room","data":{"room_id":"AB","player_id":"alice"}}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn error_event_wire_format() {
        let msg = ServerMessage::error(ErrorCode::NotYourTurn, "it is not bob's turn");
        insta::assert_snapshot!(
            msg.encode().unwrap(),
            @r#"{"event":"error","data":{"code":"not_your_turn","message":"it is not bob's turn"}}"#
        );
    }

    #[test]
    fn hand_updated_wire_format() {
        let msg = ServerMessage::HandUpdated {
            hand: vec![Card::new(Suit::Hearts, 7), Card::new(Suit::Spades, 13)],
            deck_count: 41,
        };
        insta::assert_snapshot!(
            msg.encode().unwrap(),
            @r#"{"event":"hand_updated","data":{"hand":[{"suit":"hearts","value":7},{"suit":"spades","value":13}],"deck_count":41}}"#
        );
    }

    #[test]
    fn event_name_matches_serialized_tag() {
        let msg = ServerMessage::GameResumed { current_turn: Some("alice".to_string()) };
        let json: serde_json::Value = serde_json::from_str(&msg.encode().unwrap()).unwrap();
        assert_eq!(json["event"], msg.event_name());
    }
}
