//! Event dispatcher.
//!
//! Turns the [`GameEvent`]s of a session transition into outbound
//! [`ServerMessage`]s. Events are read together with the post-transition
//! session state, so every broadcast carries the authoritative view.
//! Hands only ever travel to their owner.

use std::{collections::BTreeMap, ops::Sub, time::Duration};

use fadu_core::{GameEvent, GameSession, JoinOutcome};
use fadu_proto::{PlayerView, RoomCode, ServerMessage};

/// Where an outbound message goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Every connected player in the room
    Broadcast(ServerMessage),
    /// One player, if connected
    ToPlayer {
        /// Recipient seat
        player: String,
        /// Message to deliver
        message: ServerMessage,
    },
}

/// Public seat list in turn order.
pub fn player_views<I>(session: &GameSession<I>) -> Vec<PlayerView>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let host = session.host_index();
    session
        .seats()
        .iter()
        .enumerate()
        .map(|(i, seat)| PlayerView {
            id: seat.name().to_string(),
            connected: seat.is_connected(),
            is_host: host == Some(i),
            hand_count: seat.hand().len(),
            score: seat.score(),
        })
        .collect()
}

/// Full resync for one player, including their own hand.
pub fn game_state_for<I>(session: &GameSession<I>, player: &str) -> ServerMessage
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    ServerMessage::GameState {
        room_id: session.code().clone(),
        players: player_views(session),
        current_turn: current_turn(session),
        table_cards: session.table().to_vec(),
        deck_count: session.deck_count(),
        game_status: session.status(),
        current_round: session.current_round(),
        total_rounds: session.total_rounds(),
        host_id: session.host().map(str::to_string),
        hand: session.seat(player).map(|s| s.hand().to_vec()).unwrap_or_default(),
    }
}

/// Unicast confirmation of a join.
pub fn room_joined(room: &RoomCode, outcome: &JoinOutcome) -> ServerMessage {
    ServerMessage::RoomJoined {
        room_id: room.clone(),
        player_id: outcome.player.clone(),
        token: outcome.token.clone(),
        is_host: outcome.is_host,
        reattached: outcome.reattached,
    }
}

/// Map transition events to outbound messages, in event order.
pub fn dispatch<I>(session: &GameSession<I>, events: &[GameEvent]) -> Vec<Outbound>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let mut out = Vec::new();

    for event in events {
        match event {
            GameEvent::MembershipChanged => {
                out.push(Outbound::Broadcast(ServerMessage::PlayerJoined {
                    players: player_views(session),
                    host_id: session.host().map(str::to_string),
                }));
            },

            GameEvent::GameStarted => {
                out.push(Outbound::Broadcast(ServerMessage::GameStarted {
                    players: player_views(session),
                    current_turn: current_turn(session),
                    deck_count: session.deck_count(),
                    current_round: session.current_round(),
                    total_rounds: session.total_rounds(),
                }));
                out.extend(hands_for_everyone(session));
            },

            GameEvent::CardsPlayed { player, cards } => {
                out.push(Outbound::Broadcast(ServerMessage::CardsPlayed {
                    player_id: player.clone(),
                    cards: cards.clone(),
                    table_cards: session.table().to_vec(),
                    current_turn: current_turn(session),
                    deck_count: session.deck_count(),
                }));
                out.extend(hand_for(session, player));
            },

            GameEvent::CardDrawn { player } => {
                out.push(Outbound::Broadcast(ServerMessage::CardDrawn {
                    player_id: player.clone(),
                    current_turn: current_turn(session),
                    deck_count: session.deck_count(),
                }));
                out.extend(hand_for(session, player));
            },

            GameEvent::CallResolved { caller, outcome, winner, sums, round_points } => {
                out.push(Outbound::Broadcast(ServerMessage::CallResult {
                    caller: caller.clone(),
                    result: *outcome,
                    winner: winner.clone(),
                    player_sums: sums.iter().cloned().collect(),
                    round_points: round_points.iter().cloned().collect(),
                    scores: scores(session),
                }));
            },

            GameEvent::RoundWon { player, bonus } => {
                out.push(Outbound::Broadcast(ServerMessage::RoundWon {
                    player_id: player.clone(),
                    bonus: *bonus,
                    scores: scores(session),
                }));
            },

            GameEvent::RoundStarted => {
                out.push(Outbound::Broadcast(ServerMessage::NextRound {
                    table_cards: session.table().to_vec(),
                    current_turn: current_turn(session),
                    deck_count: session.deck_count(),
                    current_round: session.current_round(),
                    players: player_views(session),
                }));
                out.extend(hands_for_everyone(session));
            },

            GameEvent::GameFinished { winners } => {
                out.push(Outbound::Broadcast(ServerMessage::FinalResult {
                    scores: scores(session),
                    winners: winners.clone(),
                }));
            },

            GameEvent::PlayerDisconnected { player } => {
                out.push(Outbound::Broadcast(ServerMessage::PlayerDisconnected {
                    player_id: player.clone(),
                }));
            },

            GameEvent::PlayerReconnected { player } => {
                out.push(Outbound::Broadcast(ServerMessage::PlayerReconnected {
                    player_id: player.clone(),
                }));
            },

            GameEvent::Paused { missing } => {
                out.push(Outbound::Broadcast(ServerMessage::GamePaused { missing: missing.clone() }));
            },

            GameEvent::Resumed => {
                out.push(Outbound::Broadcast(ServerMessage::GameResumed {
                    current_turn: current_turn(session),
                }));
            },

            GameEvent::Forfeited { missing } => {
                out.push(Outbound::Broadcast(ServerMessage::GameForfeited {
                    missing: missing.clone(),
                }));
            },

            GameEvent::Reset => {
                out.push(Outbound::Broadcast(ServerMessage::RoomReset {
                    players: player_views(session),
                    host_id: session.host().map(str::to_string),
                }));
            },
        }
    }

    out
}

fn current_turn<I>(session: &GameSession<I>) -> Option<String>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    session.current_player().map(str::to_string)
}

fn scores<I>(session: &GameSession<I>) -> BTreeMap<String, i32>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    session.scores().into_iter().collect()
}

fn hand_for<I>(session: &GameSession<I>, player: &str) -> Option<Outbound>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    let seat = session.seat(player)?;
    Some(Outbound::ToPlayer {
        player: player.to_string(),
        message: ServerMessage::HandUpdated {
            hand: seat.hand().to_vec(),
            deck_count: session.deck_count(),
        },
    })
}

fn hands_for_everyone<I>(session: &GameSession<I>) -> Vec<Outbound>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    session
        .seats()
        .iter()
        .filter(|seat| seat.is_connected())
        .filter_map(|seat| hand_for(session, seat.name()))
        .collect()
}
