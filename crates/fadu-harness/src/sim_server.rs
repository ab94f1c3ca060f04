//! In-process simulation server.
//!
//! `SimServer` wraps `ServerDriver` with a [`SimEnv`] and plays the role of
//! the runtime: it assigns session IDs, executes actions, and records what
//! each session would have received. Every outbound message is encoded to
//! JSON and decoded again, so tests observe exactly what goes over the wire.
//!
//! Tests drive the server explicitly; nothing runs in the background.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use fadu_core::deck::DECK_SIZE;
use fadu_proto::{Card, ClientMessage, ErrorCode, RoomCode, ServerMessage};
use fadu_server::{DriverConfig, DriverError, LogLevel, ServerAction, ServerDriver, ServerEvent};

use crate::{SimEnv, SimInstant, invariants::SystemSnapshot};

/// Simulation server for deterministic tests.
pub struct SimServer {
    /// The action-based server driver
    driver: ServerDriver<SimEnv>,
    /// Shared handle to the driver's clock
    env: SimEnv,
    /// Messages received per session, oldest first
    inboxes: BTreeMap<u64, Vec<ServerMessage>>,
    /// Sessions the server closed
    closed: BTreeSet<u64>,
    /// Next connection ID
    next_session_id: u64,
}

impl Default for SimServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimServer {
    /// Server with default config and seed 0.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    /// Server with default config and the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(DriverConfig::default(), seed)
    }

    /// Server with custom config.
    pub fn with_config(config: DriverConfig, seed: u64) -> Self {
        let env = SimEnv::with_seed(seed);
        let driver = ServerDriver::new(env.clone(), config);
        Self {
            driver,
            env,
            inboxes: BTreeMap::new(),
            closed: BTreeSet::new(),
            next_session_id: 1,
        }
    }

    /// Open a connection and return its ID.
    ///
    /// A connection refused at capacity is returned too; it shows up as
    /// closed.
    pub fn connect(&mut self) -> Result<u64, DriverError> {
        let session_id = self.next_session_id;
        self.next_session_id += 1;
        self.inboxes.insert(session_id, Vec::new());

        let actions = self.driver.process_event(ServerEvent::ConnectionAccepted { session_id })?;
        self.execute_actions(actions)?;

        Ok(session_id)
    }

    /// Send a client event from a session.
    pub fn send(&mut self, session_id: u64, message: &ClientMessage) -> Result<(), DriverError> {
        let text = message.encode()?;
        self.send_raw(session_id, &text)
    }

    /// Send raw text from a session, bypassing client-side encoding.
    pub fn send_raw(&mut self, session_id: u64, text: &str) -> Result<(), DriverError> {
        let actions = self.driver.process_event(ServerEvent::MessageReceived {
            session_id,
            text: text.to_string(),
        })?;
        self.execute_actions(actions)
    }

    /// Drop a connection from the client side.
    pub fn disconnect(&mut self, session_id: u64) -> Result<(), DriverError> {
        self.closed.insert(session_id);
        let actions = self.driver.process_event(ServerEvent::ConnectionClosed {
            session_id,
            reason: "client disconnect".to_string(),
        })?;
        self.execute_actions(actions)
    }

    /// Process a tick event for grace-period handling.
    pub fn tick(&mut self) -> Result<(), DriverError> {
        let actions = self.driver.process_event(ServerEvent::Tick)?;
        self.execute_actions(actions)
    }

    /// Move the virtual clock forward, then tick.
    pub fn advance(&mut self, duration: Duration) -> Result<(), DriverError> {
        self.env.advance(duration);
        self.tick()
    }

    /// Execute server actions.
    fn execute_actions(&mut self, actions: Vec<ServerAction<SimInstant>>) -> Result<(), DriverError> {
        for action in actions {
            match action {
                ServerAction::SendToSession { session_id, message } => {
                    self.deliver(session_id, &message)?;
                },

                ServerAction::BroadcastToRoom { room, message, exclude_session } => {
                    let mut sessions: Vec<u64> = self.driver.sessions_in_room(&room).collect();
                    sessions.sort_unstable();
                    for session_id in sessions {
                        if Some(session_id) != exclude_session {
                            self.deliver(session_id, &message)?;
                        }
                    }
                },

                ServerAction::CloseConnection { session_id, reason } => {
                    tracing::debug!("server closed session {}: {}", session_id, reason);
                    self.closed.insert(session_id);
                },

                ServerAction::Log { level, message, timestamp } => {
                    self.log(level, timestamp, &message);
                },
            }
        }

        Ok(())
    }

    /// Record a message as received, via a wire round trip.
    fn deliver(&mut self, session_id: u64, message: &ServerMessage) -> Result<(), DriverError> {
        if self.closed.contains(&session_id) {
            return Ok(());
        }
        let text = message.encode()?;
        let received = ServerMessage::decode(&text)?;
        self.inboxes.entry(session_id).or_default().push(received);
        Ok(())
    }

    fn log(&self, level: LogLevel, at: SimInstant, message: &str) {
        let at = at.elapsed_since_start().as_millis() as u64;
        match level {
            LogLevel::Debug => tracing::debug!(at, "{}", message),
            LogLevel::Info => tracing::info!(at, "{}", message),
            LogLevel::Warn => tracing::warn!(at, "{}", message),
            LogLevel::Error => tracing::error!(at, "{}", message),
        }
    }

    /// Everything a session has received and not drained.
    pub fn inbox(&self, session_id: u64) -> &[ServerMessage] {
        self.inboxes.get(&session_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Take a session's received messages.
    pub fn drain(&mut self, session_id: u64) -> Vec<ServerMessage> {
        self.inboxes.get_mut(&session_id).map(std::mem::take).unwrap_or_default()
    }

    /// Event names in a session's inbox, oldest first.
    pub fn event_names(&self, session_id: u64) -> Vec<&'static str> {
        self.inbox(session_id).iter().map(ServerMessage::event_name).collect()
    }

    /// Most recent message with the given event name.
    pub fn last_event(&self, session_id: u64, event: &str) -> Option<&ServerMessage> {
        self.inbox(session_id).iter().rev().find(|m| m.event_name() == event)
    }

    /// Most recent error a session received.
    pub fn last_error(&self, session_id: u64) -> Option<(ErrorCode, &str)> {
        self.inbox(session_id).iter().rev().find_map(|m| match m {
            ServerMessage::Error { code, message } => Some((*code, message.as_str())),
            _ => None,
        })
    }

    /// Latest hand a session was told about.
    pub fn hand(&self, session_id: u64) -> Option<&[Card]> {
        self.inbox(session_id).iter().rev().find_map(|m| match m {
            ServerMessage::HandUpdated { hand, .. } | ServerMessage::GameState { hand, .. } => {
                Some(hand.as_slice())
            },
            _ => None,
        })
    }

    /// Reconnect token issued to a session.
    pub fn token(&self, session_id: u64) -> Option<&str> {
        self.inbox(session_id).iter().rev().find_map(|m| match m {
            ServerMessage::RoomJoined { token, .. } => Some(token.as_str()),
            _ => None,
        })
    }

    /// Whether the server closed the session or the client dropped it.
    pub fn is_closed(&self, session_id: u64) -> bool {
        self.closed.contains(&session_id)
    }

    /// Put `cards` on top of the room's next deal.
    ///
    /// The rest of the standard deck follows in its natural order. Returns
    /// `false` if the room does not exist.
    pub fn stack_deck(&mut self, room: &RoomCode, top: &[Card]) -> bool {
        match self.driver.room_mut(room) {
            Some(session) => {
                session.stack_next_deal(stacked_deck(top));
                true
            },
            None => false,
        }
    }

    /// Snapshot every live room for invariant checks.
    pub fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_sessions(self.driver.rooms())
    }

    /// Number of active connections.
    pub fn connection_count(&self) -> usize {
        self.driver.connection_count()
    }

    /// Simulation clock.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Underlying driver for test assertions.
    pub fn driver(&self) -> &ServerDriver<SimEnv> {
        &self.driver
    }

    /// Mutable underlying driver for test manipulation.
    pub fn driver_mut(&mut self) -> &mut ServerDriver<SimEnv> {
        &mut self.driver
    }
}

/// Full deck with `top` drawn first, then the remaining cards in
/// [`Card::standard_deck`] order.
pub fn stacked_deck(top: &[Card]) -> Vec<Card> {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    cards.extend_from_slice(top);
    cards.extend(Card::standard_deck().into_iter().filter(|c| !top.contains(c)));
    cards
}

#[cfg(test)]
mod tests {
    use fadu_proto::Suit;

    use super::*;

    #[test]
    fn stacked_deck_is_a_full_deck() {
        let top = [Card::new(Suit::Spades, 13), Card::new(Suit::Hearts, 1)];
        let deck = stacked_deck(&top);

        assert_eq!(deck.len(), DECK_SIZE);
        assert_eq!(&deck[..2], &top);

        let mut sorted = deck.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), DECK_SIZE);
    }

    #[test]
    fn sim_server_round_trips_join() {
        let mut server = SimServer::new();
        let s = server.connect().unwrap();

        server
            .send(s, &ClientMessage::JoinRoom {
                room_id: RoomCode::parse("ABC123").unwrap(),
                player_id: "alice".to_string(),
                token: None,
            })
            .unwrap();

        assert_eq!(server.event_names(s), vec!["room_joined", "game_state", "player_joined"]);
        assert_eq!(server.token(s).map(str::len), Some(32));
    }

    #[test]
    fn drained_inbox_is_empty() {
        let mut server = SimServer::new();
        let s = server.connect().unwrap();
        server.send_raw(s, "nonsense").unwrap();

        assert_eq!(server.last_error(s).map(|(code, _)| code), Some(ErrorCode::InvalidRequest));
        assert_eq!(server.drain(s).len(), 1);
        assert!(server.inbox(s).is_empty());
    }
}
