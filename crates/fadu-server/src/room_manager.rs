//! Room Manager
//!
//! Maps room codes to game sessions. Handles create-or-join, server-side code
//! generation, periodic grace checks, and garbage collection of rooms nobody
//! is connected to.
//!
//! Rooms are kept in a `BTreeMap` so ticks and collection visit them in a
//! stable order, which keeps simulated runs reproducible.

use std::{
    collections::{BTreeMap, HashMap},
    ops::Sub,
    time::{Duration, Instant},
};

use fadu_core::{Environment, GameConfig, GameError, GameEvent, GameSession, JoinOutcome};
use fadu_proto::{ErrorCode, RoomCode};

/// Attempts at generating an unused room code before giving up.
const CODE_GENERATION_ATTEMPTS: usize = 16;

/// Metadata about a room.
#[derive(Debug, Clone)]
pub struct RoomMetadata<I> {
    /// Player who created the room
    pub creator: String,
    /// When the room was created
    pub created_at: I,
}

/// Errors from RoomManager operations
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// Game rule rejected the action
    #[error(transparent)]
    Game(#[from] GameError),

    /// Room does not exist
    #[error("room not found: {0}")]
    RoomNotFound(RoomCode),

    /// Server-wide room limit reached
    #[error("server room limit reached ({max})")]
    TooManyRooms {
        /// Configured limit
        max: usize,
    },

    /// Could not find an unused room code
    #[error("no free room code after 16 attempts")]
    CodeSpaceExhausted,
}

impl RoomError {
    /// Client-facing error category.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Game(err) => err.code(),
            Self::RoomNotFound(_) | Self::TooManyRooms { .. } | Self::CodeSpaceExhausted => {
                ErrorCode::InvalidState
            },
        }
    }
}

/// Successful join, with the events it produced.
#[derive(Debug, Clone)]
pub struct Joined {
    /// Room joined
    pub room: RoomCode,
    /// Seat details
    pub outcome: JoinOutcome,
    /// Events to dispatch to the room
    pub events: Vec<GameEvent>,
    /// Whether the room was created by this join
    pub created: bool,
}

/// Owns every live room.
///
/// Generic over `I` (Instant type) to support virtual time in tests.
pub struct RoomManager<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    rooms: BTreeMap<RoomCode, GameSession<I>>,
    room_metadata: HashMap<RoomCode, RoomMetadata<I>>,
    config: GameConfig,
    max_rooms: usize,
}

impl<I> RoomManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a manager that applies `config` to every room.
    pub fn new(config: GameConfig, max_rooms: usize) -> Self {
        Self { rooms: BTreeMap::new(), room_metadata: HashMap::new(), config, max_rooms }
    }

    /// Check if a room exists
    pub fn has_room(&self, code: &RoomCode) -> bool {
        self.rooms.contains_key(code)
    }

    /// Room by code.
    pub fn room(&self, code: &RoomCode) -> Option<&GameSession<I>> {
        self.rooms.get(code)
    }

    /// Mutable room by code.
    pub fn room_mut(&mut self, code: &RoomCode) -> Result<&mut GameSession<I>, RoomError> {
        self.rooms.get_mut(code).ok_or_else(|| RoomError::RoomNotFound(code.clone()))
    }

    /// Room metadata by code.
    pub fn metadata(&self, code: &RoomCode) -> Option<&RoomMetadata<I>> {
        self.room_metadata.get(code)
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// All live rooms in code order.
    pub fn rooms(&self) -> impl Iterator<Item = &GameSession<I>> {
        self.rooms.values()
    }

    /// Join the room with `code`, creating it if it does not exist.
    ///
    /// A room created here is dropped again if the join itself fails, so a
    /// rejected name never leaves an empty room behind.
    pub fn create_or_join<E: Environment<Instant = I>>(
        &mut self,
        code: &RoomCode,
        name: &str,
        token: Option<&str>,
        env: &E,
    ) -> Result<Joined, RoomError> {
        let created = !self.has_room(code);
        if created {
            self.insert_room(code.clone(), name, env)?;
        }

        let result = self.room_mut(code)?.join(name, token, env);
        match result {
            Ok((outcome, events)) => Ok(Joined { room: code.clone(), outcome, events, created }),
            Err(err) => {
                if created {
                    self.remove_room(code);
                }
                Err(err.into())
            },
        }
    }

    /// Create a room under a fresh random code and seat `name` as host.
    pub fn create_room<E: Environment<Instant = I>>(
        &mut self,
        name: &str,
        env: &E,
    ) -> Result<Joined, RoomError> {
        let code = (0..CODE_GENERATION_ATTEMPTS)
            .map(|_| RoomCode::from_entropy(env.random_u64()))
            .find(|code| !self.has_room(code))
            .ok_or(RoomError::CodeSpaceExhausted)?;

        self.create_or_join(&code, name, None, env)
    }

    /// Mark a player as gone. See [`GameSession::leave`].
    pub fn leave(&mut self, code: &RoomCode, name: &str, now: I) -> Result<Vec<GameEvent>, RoomError> {
        Ok(self.room_mut(code)?.leave(name, now)?)
    }

    /// Run grace checks on every paused room.
    ///
    /// Returns the events of each room that changed.
    pub fn tick(&mut self, now: I) -> Vec<(RoomCode, Vec<GameEvent>)> {
        self.rooms
            .iter_mut()
            .filter_map(|(code, session)| {
                let events = session.check_grace(now);
                (!events.is_empty()).then(|| (code.clone(), events))
            })
            .collect()
    }

    /// Remove rooms with no connected players and no live round.
    ///
    /// Returns the removed codes with their metadata.
    pub fn collect_garbage(&mut self) -> Vec<(RoomCode, Option<RoomMetadata<I>>)> {
        let dead: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, session)| session.is_collectable())
            .map(|(code, _)| code.clone())
            .collect();

        dead.into_iter()
            .map(|code| {
                let metadata = self.remove_room(&code);
                (code, metadata)
            })
            .collect()
    }

    fn insert_room<E: Environment<Instant = I>>(
        &mut self,
        code: RoomCode,
        creator: &str,
        env: &E,
    ) -> Result<(), RoomError> {
        if self.rooms.len() >= self.max_rooms {
            return Err(RoomError::TooManyRooms { max: self.max_rooms });
        }

        let metadata = RoomMetadata { creator: creator.trim().to_string(), created_at: env.now() };
        self.room_metadata.insert(code.clone(), metadata);
        self.rooms.insert(code.clone(), GameSession::new(code, self.config.clone()));
        Ok(())
    }

    fn remove_room(&mut self, code: &RoomCode) -> Option<RoomMetadata<I>> {
        self.rooms.remove(code);
        self.room_metadata.remove(code)
    }
}

impl<I> std::fmt::Debug for RoomManager<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomManager")
            .field("room_count", &self.rooms.len())
            .field("max_rooms", &self.max_rooms)
            .finish()
    }
}
