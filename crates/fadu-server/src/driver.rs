//! Server driver.
//!
//! Ties together the ConnectionRegistry (session-to-seat mapping), the
//! RoomManager (one game session per room code) and the dispatcher that turns
//! game events into outbound messages. Pure logic: the runtime feeds
//! [`ServerEvent`]s in and executes the returned [`ServerAction`]s.

use std::time::Instant;

use fadu_core::{Environment, GameConfig, GameEvent, GameSession};
use fadu_proto::{ClientMessage, RoomCode, ServerMessage};

use crate::{
    dispatcher::{self, Outbound},
    registry::{ConnectionRegistry, SeatBinding},
    room_manager::{Joined, RoomManager},
    server_error::DriverError,
};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Rules applied to every room
    pub game: GameConfig,
    /// Maximum concurrent connections
    pub max_connections: usize,
    /// Maximum live rooms
    pub max_rooms: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { game: GameConfig::default(), max_connections: 10_000, max_rooms: 1_000 }
    }
}

/// Events that the server driver processes.
///
/// These are produced by the external runtime (simulation or production).
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new connection was accepted
    ConnectionAccepted {
        /// Unique connection ID assigned by the runtime
        session_id: u64,
    },

    /// A text frame was received from a connection
    MessageReceived {
        /// Connection that sent the frame
        session_id: u64,
        /// Raw JSON text
        text: String,
    },

    /// A connection was closed (by peer or error)
    ConnectionClosed {
        /// Connection that was closed
        session_id: u64,
        /// Reason for closure
        reason: String,
    },

    /// Periodic tick for grace-period checks
    Tick,
}

/// Actions that the server driver produces.
///
/// These are executed by runtime-specific code (production or simulation).
#[derive(Debug, Clone)]
pub enum ServerAction<I = Instant> {
    /// Send a message to a specific session
    SendToSession {
        /// Target session ID
        session_id: u64,
        /// Message to send
        message: ServerMessage,
    },

    /// Broadcast a message to every session seated in a room
    BroadcastToRoom {
        /// Target room
        room: RoomCode,
        /// Message to broadcast
        message: ServerMessage,
        /// Optional session to exclude from broadcast
        exclude_session: Option<u64>,
    },

    /// Close a connection
    CloseConnection {
        /// Session to close
        session_id: u64,
        /// Reason for closure
        reason: String,
    },

    /// Log a message (for debugging/monitoring)
    Log {
        /// Log level
        level: LogLevel,
        /// Message to log
        message: String,
        /// When the event occurred
        timestamp: I,
    },
}

/// Log levels for server actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational message
    Info,
    /// Warning
    Warn,
    /// Error
    Error,
}

/// Action-based server driver.
///
/// Orchestrates connection management, room operations, and message routing.
pub struct ServerDriver<E>
where
    E: Environment,
{
    /// Session/seat registry
    registry: ConnectionRegistry,
    /// Live rooms
    rooms: RoomManager<E::Instant>,
    /// Environment (time, RNG)
    env: E,
    /// Server configuration
    config: ServerConfig,
}

impl<E> ServerDriver<E>
where
    E: Environment,
{
    /// Create a new server driver.
    pub fn new(env: E, config: ServerConfig) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            rooms: RoomManager::new(config.game.clone(), config.max_rooms),
            env,
            config,
        }
    }

    /// Process a server event and return actions to execute.
    ///
    /// This is the main entry point for the server driver. Rejected client
    /// requests are not errors here: they come back as an `error` message for
    /// the sender. `Err` is reserved for events the runtime should never
    /// produce, such as a message from an unknown session.
    pub fn process_event(
        &mut self,
        event: ServerEvent,
    ) -> Result<Vec<ServerAction<E::Instant>>, DriverError> {
        match event {
            ServerEvent::ConnectionAccepted { session_id } => {
                self.handle_connection_accepted(session_id)
            },
            ServerEvent::MessageReceived { session_id, text } => {
                self.handle_message_received(session_id, &text)
            },
            ServerEvent::ConnectionClosed { session_id, reason } => {
                self.handle_connection_closed(session_id, &reason)
            },
            ServerEvent::Tick => Ok(self.handle_tick()),
        }
    }

    /// Handle a new connection being accepted.
    fn handle_connection_accepted(
        &mut self,
        session_id: u64,
    ) -> Result<Vec<ServerAction<E::Instant>>, DriverError> {
        let now = self.env.now();

        if self.registry.session_count() >= self.config.max_connections {
            return Ok(vec![ServerAction::CloseConnection {
                session_id,
                reason: "max connections exceeded".to_string(),
            }]);
        }

        if !self.registry.register_session(session_id) {
            return Err(DriverError::SessionAlreadyExists(session_id));
        }

        Ok(vec![ServerAction::Log {
            level: LogLevel::Debug,
            message: format!("connection {session_id} accepted"),
            timestamp: now,
        }])
    }

    /// Handle a text frame received from a connection.
    fn handle_message_received(
        &mut self,
        session_id: u64,
        text: &str,
    ) -> Result<Vec<ServerAction<E::Instant>>, DriverError> {
        if !self.registry.has_session(session_id) {
            return Err(DriverError::SessionNotFound(session_id));
        }

        let result = ClientMessage::decode(text)
            .map_err(DriverError::from)
            .and_then(|message| self.handle_client_message(session_id, message));

        Ok(match result {
            Ok(actions) => actions,
            Err(e) => self.make_error_response(session_id, &e),
        })
    }

    fn handle_client_message(
        &mut self,
        session_id: u64,
        message: ClientMessage,
    ) -> Result<Vec<ServerAction<E::Instant>>, DriverError> {
        let now = self.env.now();

        match message {
            ClientMessage::JoinRoom { room_id, player_id, token } => {
                self.require_unseated(session_id)?;
                let joined =
                    self.rooms.create_or_join(&room_id, &player_id, token.as_deref(), &self.env)?;
                Ok(self.seat_session(session_id, joined))
            },

            ClientMessage::CreateRoom { player_id } => {
                self.require_unseated(session_id)?;
                let joined = self.rooms.create_room(&player_id, &self.env)?;
                Ok(self.seat_session(session_id, joined))
            },

            ClientMessage::StartGame { room_id, total_rounds } => {
                let seat = self.seat_in_room(session_id, &room_id)?;
                let events = self.rooms.room_mut(&seat.room)?.start_game(
                    &seat.player,
                    total_rounds,
                    &self.env,
                )?;
                let mut actions = vec![ServerAction::Log {
                    level: LogLevel::Info,
                    message: format!(
                        "room {} started by {}, {total_rounds} rounds",
                        seat.room, seat.player
                    ),
                    timestamp: now,
                }];
                actions.extend(self.room_actions(&seat.room, &events));
                Ok(actions)
            },

            ClientMessage::DrawCard { player_id } => {
                let seat = self.seat_as_player(session_id, &player_id)?;
                let events = self.rooms.room_mut(&seat.room)?.draw(&seat.player)?;
                Ok(self.room_actions(&seat.room, &events))
            },

            ClientMessage::PlayCards { player_id, card_indices } => {
                let seat = self.seat_as_player(session_id, &player_id)?;
                let events =
                    self.rooms.room_mut(&seat.room)?.play(&seat.player, &card_indices)?;
                Ok(self.room_actions(&seat.room, &events))
            },

            ClientMessage::Call { player_id } => {
                let seat = self.seat_as_player(session_id, &player_id)?;
                let events = self.rooms.room_mut(&seat.room)?.call(&seat.player)?;
                Ok(self.room_actions(&seat.room, &events))
            },

            ClientMessage::NextRound { room_id } => {
                let seat = self.seat_in_room(session_id, &room_id)?;
                let events =
                    self.rooms.room_mut(&seat.room)?.next_round(&seat.player, now, &self.env)?;
                Ok(self.room_actions(&seat.room, &events))
            },

            ClientMessage::LeaveRoom { room_id } => {
                let seat = self.seat_in_room(session_id, &room_id)?;
                let events = self.rooms.leave(&seat.room, &seat.player, now)?;
                self.registry.unbind(session_id);

                let mut actions = vec![ServerAction::Log {
                    level: LogLevel::Info,
                    message: format!("{} left room {}", seat.player, seat.room),
                    timestamp: now,
                }];
                actions.extend(self.room_actions(&seat.room, &events));
                actions.extend(self.collect_garbage());
                Ok(actions)
            },

            ClientMessage::ResetRoom { room_id } => {
                let seat = self.seat_in_room(session_id, &room_id)?;
                let events = self.rooms.room_mut(&seat.room)?.reset(&seat.player)?;
                Ok(self.room_actions(&seat.room, &events))
            },
        }
    }

    /// Bind a session to the seat it just joined and greet it.
    ///
    /// The joiner gets `room_joined` and a full `game_state` before the
    /// room-wide events, so its view is complete when the broadcasts land.
    fn seat_session(&mut self, session_id: u64, joined: Joined) -> Vec<ServerAction<E::Instant>> {
        let now = self.env.now();
        let Joined { room, outcome, events, created } = joined;

        self.registry.bind(session_id, SeatBinding {
            room: room.clone(),
            player: outcome.player.clone(),
        });

        let verb = match (created, outcome.reattached) {
            (true, _) => "created",
            (false, true) => "reclaimed a seat in",
            (false, false) => "joined",
        };

        let mut actions = vec![
            ServerAction::Log {
                level: LogLevel::Info,
                message: format!("{} (session {session_id}) {verb} room {room}", outcome.player),
                timestamp: now,
            },
            ServerAction::SendToSession {
                session_id,
                message: dispatcher::room_joined(&room, &outcome),
            },
        ];

        if let Some(session) = self.rooms.room(&room) {
            actions.push(ServerAction::SendToSession {
                session_id,
                message: dispatcher::game_state_for(session, &outcome.player),
            });
        }

        actions.extend(self.room_actions(&room, &events));
        actions
    }

    /// Route dispatched events: broadcasts to the room, hands to their owner.
    fn room_actions(&self, room: &RoomCode, events: &[GameEvent]) -> Vec<ServerAction<E::Instant>> {
        let Some(session) = self.rooms.room(room) else {
            return Vec::new();
        };

        dispatcher::dispatch(session, events)
            .into_iter()
            .filter_map(|outbound| match outbound {
                Outbound::Broadcast(message) => Some(ServerAction::BroadcastToRoom {
                    room: room.clone(),
                    message,
                    exclude_session: None,
                }),
                Outbound::ToPlayer { player, message } => self
                    .registry
                    .session_for_player(room, &player)
                    .map(|session_id| ServerAction::SendToSession { session_id, message }),
            })
            .collect()
    }

    fn require_unseated(&self, session_id: u64) -> Result<(), DriverError> {
        match self.registry.seat(session_id) {
            Some(seat) => Err(DriverError::AlreadySeated { room: seat.room.clone() }),
            None => Ok(()),
        }
    }

    /// Seat of a session, checked against the room a request names.
    fn seat_in_room(&self, session_id: u64, room: &RoomCode) -> Result<SeatBinding, DriverError> {
        let seat = self.registry.seat(session_id).ok_or(DriverError::NotSeated(session_id))?;
        if &seat.room != room {
            return Err(DriverError::WrongRoom { bound: seat.room.clone(), requested: room.clone() });
        }
        Ok(seat.clone())
    }

    /// Seat of a session, checked against the player a request names.
    fn seat_as_player(&self, session_id: u64, player: &str) -> Result<SeatBinding, DriverError> {
        let seat = self.registry.seat(session_id).ok_or(DriverError::NotSeated(session_id))?;
        if seat.player != player.trim() {
            return Err(DriverError::PlayerMismatch {
                expected: seat.player.clone(),
                got: player.to_string(),
            });
        }
        Ok(seat.clone())
    }

    fn make_error_response(
        &self,
        session_id: u64,
        error: &DriverError,
    ) -> Vec<ServerAction<E::Instant>> {
        vec![
            ServerAction::SendToSession {
                session_id,
                message: ServerMessage::error(error.code(), error.to_string()),
            },
            ServerAction::Log {
                level: LogLevel::Warn,
                message: format!("request from session {session_id} rejected: {error}"),
                timestamp: self.env.now(),
            },
        ]
    }

    /// Handle a connection being closed.
    ///
    /// A seated session's player is marked disconnected; mid-round that
    /// pauses the room and starts the grace period.
    fn handle_connection_closed(
        &mut self,
        session_id: u64,
        reason: &str,
    ) -> Result<Vec<ServerAction<E::Instant>>, DriverError> {
        let now = self.env.now();
        let mut actions = Vec::new();

        let seat = self.registry.unbind(session_id);
        if self.registry.unregister_session(session_id).is_none() {
            return Err(DriverError::SessionNotFound(session_id));
        }

        actions.push(ServerAction::Log {
            level: LogLevel::Info,
            message: format!("connection {session_id} closed: {reason}"),
            timestamp: now,
        });

        if let Some(seat) = seat {
            match self.rooms.leave(&seat.room, &seat.player, now) {
                Ok(events) => actions.extend(self.room_actions(&seat.room, &events)),
                Err(e) => actions.push(ServerAction::Log {
                    level: LogLevel::Warn,
                    message: format!("failed to release seat {} in {}: {e}", seat.player, seat.room),
                    timestamp: now,
                }),
            }
            actions.extend(self.collect_garbage());
        }

        Ok(actions)
    }

    /// Handle periodic tick: expire grace periods, then drop dead rooms.
    fn handle_tick(&mut self) -> Vec<ServerAction<E::Instant>> {
        let now = self.env.now();
        let mut actions = Vec::new();

        for (room, events) in self.rooms.tick(now) {
            actions.push(ServerAction::Log {
                level: LogLevel::Info,
                message: format!("room {room} forfeited after grace period"),
                timestamp: now,
            });
            actions.extend(self.room_actions(&room, &events));
        }

        actions.extend(self.collect_garbage());
        actions
    }

    fn collect_garbage(&mut self) -> Vec<ServerAction<E::Instant>> {
        let now = self.env.now();
        self.rooms
            .collect_garbage()
            .into_iter()
            .map(|(room, metadata)| {
                let creator = metadata.map(|m| m.creator).unwrap_or_default();
                ServerAction::Log {
                    level: LogLevel::Info,
                    message: format!("room {room} (created by {creator}) removed"),
                    timestamp: now,
                }
            })
            .collect()
    }

    /// Sessions seated in a room.
    pub fn sessions_in_room(&self, room: &RoomCode) -> impl Iterator<Item = u64> + '_ {
        self.registry.sessions_in_room(room)
    }

    /// Check if a session is registered.
    pub fn has_session(&self, session_id: u64) -> bool {
        self.registry.has_session(session_id)
    }

    /// Seat held by a session.
    pub fn seat_of(&self, session_id: u64) -> Option<&SeatBinding> {
        self.registry.seat(session_id)
    }

    /// Get the number of active connections.
    pub fn connection_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Check if a room exists.
    pub fn has_room(&self, room: &RoomCode) -> bool {
        self.rooms.has_room(room)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.room_count()
    }

    /// Room by code.
    pub fn room(&self, room: &RoomCode) -> Option<&GameSession<E::Instant>> {
        self.rooms.room(room)
    }

    /// Mutable room by code. Lets tests stack the deck before a deal.
    pub fn room_mut(&mut self, room: &RoomCode) -> Option<&mut GameSession<E::Instant>> {
        self.rooms.room_mut(room).ok()
    }

    /// All live rooms in code order.
    pub fn rooms(&self) -> impl Iterator<Item = &GameSession<E::Instant>> {
        self.rooms.rooms()
    }

    /// Environment handle.
    pub fn env(&self) -> &E {
        &self.env
    }
}

impl<E> std::fmt::Debug for ServerDriver<E>
where
    E: Environment,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerDriver")
            .field("session_count", &self.registry.session_count())
            .field("room_count", &self.rooms.room_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use fadu_proto::{ErrorCode, GameStatus};
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[derive(Clone)]
    struct TestEnv(Arc<Mutex<ChaCha8Rng>>);

    impl TestEnv {
        fn new() -> Self {
            Self(Arc::new(Mutex::new(ChaCha8Rng::seed_from_u64(11))))
        }
    }

    impl Environment for TestEnv {
        type Instant = std::time::Instant;

        fn now(&self) -> std::time::Instant {
            // Using real Instant for simplicity in unit tests
            std::time::Instant::now()
        }

        async fn sleep(&self, _duration: Duration) {}

        fn random_bytes(&self, buffer: &mut [u8]) {
            self.0.lock().unwrap().fill_bytes(buffer);
        }
    }

    fn driver() -> ServerDriver<TestEnv> {
        ServerDriver::new(TestEnv::new(), ServerConfig::default())
    }

    fn code() -> RoomCode {
        RoomCode::parse("ABC123").unwrap()
    }

    fn send(
        server: &mut ServerDriver<TestEnv>,
        session_id: u64,
        message: ClientMessage,
    ) -> Vec<ServerAction> {
        let text = message.encode().unwrap();
        server.process_event(ServerEvent::MessageReceived { session_id, text }).unwrap()
    }

    fn join(server: &mut ServerDriver<TestEnv>, session_id: u64, name: &str) -> Vec<ServerAction> {
        server.process_event(ServerEvent::ConnectionAccepted { session_id }).unwrap();
        send(server, session_id, ClientMessage::JoinRoom {
            room_id: code(),
            player_id: name.to_string(),
            token: None,
        })
    }

    fn unicasts(actions: &[ServerAction], session: u64) -> Vec<&ServerMessage> {
        actions
            .iter()
            .filter_map(|a| match a {
                ServerAction::SendToSession { session_id, message } if *session_id == session => {
                    Some(message)
                },
                _ => None,
            })
            .collect()
    }

    fn broadcasts(actions: &[ServerAction]) -> Vec<&ServerMessage> {
        actions
            .iter()
            .filter_map(|a| match a {
                ServerAction::BroadcastToRoom { message, .. } => Some(message),
                _ => None,
            })
            .collect()
    }

    fn error_code(actions: &[ServerAction], session: u64) -> Option<ErrorCode> {
        unicasts(actions, session).into_iter().find_map(|m| match m {
            ServerMessage::Error { code, .. } => Some(*code),
            _ => None,
        })
    }

    #[test]
    fn server_accepts_connection() {
        let mut server = driver();

        let actions =
            server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 }).unwrap();

        assert_eq!(server.connection_count(), 1);
        assert!(matches!(actions[0], ServerAction::Log { level: LogLevel::Debug, .. }));
    }

    #[test]
    fn server_rejects_when_max_connections_exceeded() {
        let config = ServerConfig { max_connections: 2, ..Default::default() };
        let mut server = ServerDriver::new(TestEnv::new(), config);

        server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 }).unwrap();
        server.process_event(ServerEvent::ConnectionAccepted { session_id: 2 }).unwrap();

        let actions =
            server.process_event(ServerEvent::ConnectionAccepted { session_id: 3 }).unwrap();

        assert_eq!(server.connection_count(), 2);
        assert!(matches!(actions[0], ServerAction::CloseConnection { session_id: 3, .. }));
    }

    #[test]
    fn duplicate_session_id_is_an_error() {
        let mut server = driver();
        server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 }).unwrap();

        let result = server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 });
        assert!(matches!(result, Err(DriverError::SessionAlreadyExists(1))));
    }

    #[test]
    fn message_from_unknown_session_is_an_error() {
        let mut server = driver();
        let result = server.process_event(ServerEvent::MessageReceived {
            session_id: 9,
            text: "{}".to_string(),
        });
        assert!(matches!(result, Err(DriverError::SessionNotFound(9))));
    }

    #[test]
    fn join_replies_with_room_joined_then_game_state() {
        let mut server = driver();
        let actions = join(&mut server, 1, "alice");

        let replies = unicasts(&actions, 1);
        assert!(matches!(replies[0], ServerMessage::RoomJoined { is_host: true, .. }));
        assert!(matches!(replies[1], ServerMessage::GameState {
            game_status: GameStatus::Waiting,
            ..
        }));

        let joined = broadcasts(&actions);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].event_name(), "player_joined");

        assert!(server.has_room(&code()));
        assert_eq!(server.sessions_in_room(&code()).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn create_room_generates_a_code() {
        let mut server = driver();
        server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 }).unwrap();

        let actions =
            send(&mut server, 1, ClientMessage::CreateRoom { player_id: "alice".to_string() });

        let replies = unicasts(&actions, 1);
        let ServerMessage::RoomJoined { room_id, is_host, .. } = replies[0] else {
            panic!("expected room_joined");
        };
        assert!(*is_host);
        assert!(server.has_room(room_id));
        assert_eq!(server.seat_of(1).unwrap().room, *room_id);
    }

    #[test]
    fn malformed_json_gets_invalid_request() {
        let mut server = driver();
        server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 }).unwrap();

        let actions = server
            .process_event(ServerEvent::MessageReceived {
                session_id: 1,
                text: "{\"event\":".to_string(),
            })
            .unwrap();

        assert_eq!(error_code(&actions, 1), Some(ErrorCode::InvalidRequest));
        assert_eq!(server.room_count(), 0);
    }

    #[test]
    fn game_action_before_join_is_invalid_state() {
        let mut server = driver();
        server.process_event(ServerEvent::ConnectionAccepted { session_id: 1 }).unwrap();

        let actions = send(&mut server, 1, ClientMessage::DrawCard { player_id: "alice".into() });
        assert_eq!(error_code(&actions, 1), Some(ErrorCode::InvalidState));
    }

    #[test]
    fn acting_as_someone_else_is_rejected() {
        let mut server = driver();
        join(&mut server, 1, "alice");
        join(&mut server, 2, "bob");
        send(&mut server, 1, ClientMessage::StartGame { room_id: code(), total_rounds: 1 });

        let actions = send(&mut server, 2, ClientMessage::DrawCard { player_id: "alice".into() });
        assert_eq!(error_code(&actions, 2), Some(ErrorCode::InvalidRequest));
        assert_eq!(server.room(&code()).unwrap().deck_count(), 42);
    }

    #[test]
    fn second_join_from_same_session_is_rejected() {
        let mut server = driver();
        join(&mut server, 1, "alice");

        let actions = send(&mut server, 1, ClientMessage::JoinRoom {
            room_id: RoomCode::parse("ZZZ999").unwrap(),
            player_id: "alice".into(),
            token: None,
        });

        assert_eq!(error_code(&actions, 1), Some(ErrorCode::InvalidState));
        assert_eq!(server.room_count(), 1);
    }

    #[test]
    fn start_deals_private_hands() {
        let mut server = driver();
        join(&mut server, 1, "alice");
        join(&mut server, 2, "bob");

        let actions =
            send(&mut server, 1, ClientMessage::StartGame { room_id: code(), total_rounds: 2 });

        assert_eq!(broadcasts(&actions)[0].event_name(), "game_started");
        for (session, name) in [(1, "alice"), (2, "bob")] {
            let hands: Vec<_> = unicasts(&actions, session)
                .into_iter()
                .filter_map(|m| match m {
                    ServerMessage::HandUpdated { hand, .. } => Some(hand.clone()),
                    _ => None,
                })
                .collect();
            assert_eq!(hands.len(), 1);
            assert_eq!(hands[0].as_slice(), server.room(&code()).unwrap().seat(name).unwrap().hand());
        }
    }

    #[test]
    fn non_host_cannot_start() {
        let mut server = driver();
        join(&mut server, 1, "alice");
        join(&mut server, 2, "bob");

        let actions =
            send(&mut server, 2, ClientMessage::StartGame { room_id: code(), total_rounds: 1 });
        assert_eq!(error_code(&actions, 2), Some(ErrorCode::InvalidState));
        assert_eq!(server.room(&code()).unwrap().status(), GameStatus::Waiting);
    }

    #[test]
    fn disconnect_in_lobby_frees_the_seat_and_room() {
        let mut server = driver();
        join(&mut server, 1, "alice");

        server
            .process_event(ServerEvent::ConnectionClosed { session_id: 1, reason: "eof".into() })
            .unwrap();

        assert_eq!(server.connection_count(), 0);
        assert!(!server.has_room(&code()));
    }

    #[test]
    fn disconnect_mid_round_pauses_the_room() {
        let mut server = driver();
        join(&mut server, 1, "alice");
        join(&mut server, 2, "bob");
        send(&mut server, 1, ClientMessage::StartGame { room_id: code(), total_rounds: 1 });

        let actions = server
            .process_event(ServerEvent::ConnectionClosed { session_id: 2, reason: "eof".into() })
            .unwrap();

        let names: Vec<_> = broadcasts(&actions).iter().map(|m| m.event_name()).collect();
        assert_eq!(names, vec!["player_disconnected", "player_joined", "game_paused"]);
        assert_eq!(server.room(&code()).unwrap().status(), GameStatus::Paused);

        let actions = send(&mut server, 1, ClientMessage::DrawCard { player_id: "alice".into() });
        assert_eq!(error_code(&actions, 1), Some(ErrorCode::GamePaused));
    }

    #[test]
    fn leave_room_unbinds_the_session() {
        let mut server = driver();
        join(&mut server, 1, "alice");
        join(&mut server, 2, "bob");

        send(&mut server, 2, ClientMessage::LeaveRoom { room_id: code() });

        assert!(server.seat_of(2).is_none());
        assert_eq!(server.room(&code()).unwrap().seats().len(), 1);
        assert_eq!(server.connection_count(), 2);
    }

    #[test]
    fn leave_with_wrong_room_is_rejected() {
        let mut server = driver();
        join(&mut server, 1, "alice");

        let actions = send(&mut server, 1, ClientMessage::LeaveRoom {
            room_id: RoomCode::parse("ZZZ999").unwrap(),
        });
        assert_eq!(error_code(&actions, 1), Some(ErrorCode::InvalidRequest));
        assert!(server.seat_of(1).is_some());
    }
}
