//! Connection registry for session and seat tracking.
//!
//! The registry maintains bidirectional mappings: room → sessions (for
//! broadcast) and session → seat (for routing actions and cleanup on
//! disconnect). A session occupies at most one seat, and a seat is held by at
//! most one session.

use std::collections::{HashMap, HashSet};

use fadu_proto::RoomCode;

/// Seat a session is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeatBinding {
    /// Room the seat belongs to
    pub room: RoomCode,
    /// Player name of the seat
    pub player: String,
}

/// Information about a registered session.
#[derive(Debug, Clone, Default)]
pub struct SessionInfo {
    /// Seat held by this session, once it has joined a room
    pub seat: Option<SeatBinding>,
}

impl SessionInfo {
    /// Create info for a fresh connection with no seat.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Registry for tracking sessions and their seats.
///
/// Maintains bidirectional mappings for efficient lookups:
/// - All sessions in a room (for broadcast)
/// - The seat a session holds (for action routing)
/// - The session holding a seat (for unicast to a player)
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Session ID → session info
    sessions: HashMap<u64, SessionInfo>,
    /// Room code → sessions seated in it
    room_sessions: HashMap<RoomCode, HashSet<u64>>,
    /// Seat → session ID (reverse index). Enforces one session per seat
    seat_sessions: HashMap<SeatBinding, u64>,
}

impl ConnectionRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new session. Returns `false` if it already exists.
    pub fn register_session(&mut self, session_id: u64) -> bool {
        if self.sessions.contains_key(&session_id) {
            return false;
        }
        self.sessions.insert(session_id, SessionInfo::new());
        true
    }

    /// Unregister a session, releasing its seat.
    ///
    /// Returns the session info if it existed.
    pub fn unregister_session(&mut self, session_id: u64) -> Option<SessionInfo> {
        self.unbind(session_id);
        self.sessions.remove(&session_id)
    }

    /// Session metadata. `None` if session doesn't exist.
    pub fn session(&self, session_id: u64) -> Option<&SessionInfo> {
        self.sessions.get(&session_id)
    }

    /// Check if a session is registered.
    pub fn has_session(&self, session_id: u64) -> bool {
        self.sessions.contains_key(&session_id)
    }

    /// Seat held by a session.
    pub fn seat(&self, session_id: u64) -> Option<&SeatBinding> {
        self.sessions.get(&session_id).and_then(|info| info.seat.as_ref())
    }

    /// Bind a session to a seat, releasing any seat it held before.
    ///
    /// Returns `false` if the session is not registered or another session
    /// already holds the seat.
    pub fn bind(&mut self, session_id: u64, seat: SeatBinding) -> bool {
        if !self.sessions.contains_key(&session_id) {
            return false;
        }
        if self.seat_sessions.get(&seat).is_some_and(|&holder| holder != session_id) {
            return false;
        }

        self.unbind(session_id);

        self.room_sessions.entry(seat.room.clone()).or_default().insert(session_id);
        self.seat_sessions.insert(seat.clone(), session_id);
        if let Some(info) = self.sessions.get_mut(&session_id) {
            info.seat = Some(seat);
        }
        true
    }

    /// Release a session's seat. Returns the seat it held.
    pub fn unbind(&mut self, session_id: u64) -> Option<SeatBinding> {
        let seat = self.sessions.get_mut(&session_id)?.seat.take()?;

        self.seat_sessions.remove(&seat);
        if let Some(sessions) = self.room_sessions.get_mut(&seat.room) {
            sessions.remove(&session_id);
            if sessions.is_empty() {
                self.room_sessions.remove(&seat.room);
            }
        }

        Some(seat)
    }

    /// Session holding a player's seat.
    pub fn session_for_player(&self, room: &RoomCode, player: &str) -> Option<u64> {
        let key = SeatBinding { room: room.clone(), player: player.to_string() };
        self.seat_sessions.get(&key).copied()
    }

    /// All sessions seated in a room.
    pub fn sessions_in_room(&self, room: &RoomCode) -> impl Iterator<Item = u64> + '_ {
        self.room_sessions.get(room).into_iter().flat_map(|s| s.iter().copied())
    }

    /// Total number of registered sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Number of sessions seated in a room.
    pub fn room_session_count(&self, room: &RoomCode) -> usize {
        self.room_sessions.get(room).map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seat(room: &str, player: &str) -> SeatBinding {
        SeatBinding { room: RoomCode::parse(room).unwrap(), player: player.to_string() }
    }

    #[test]
    fn register_duplicate_session_fails() {
        let mut registry = ConnectionRegistry::new();

        assert!(registry.register_session(1));
        assert!(!registry.register_session(1));
        assert!(registry.has_session(1));
        assert!(registry.seat(1).is_none());
    }

    #[test]
    fn bind_indexes_both_directions() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1);

        assert!(registry.bind(1, seat("ABC123", "alice")));

        let room = RoomCode::parse("ABC123").unwrap();
        assert_eq!(registry.seat(1), Some(&seat("ABC123", "alice")));
        assert_eq!(registry.session_for_player(&room, "alice"), Some(1));
        assert_eq!(registry.sessions_in_room(&room).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn seat_held_by_one_session() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1);
        registry.register_session(2);

        assert!(registry.bind(1, seat("ABC123", "alice")));
        assert!(!registry.bind(2, seat("ABC123", "alice")));
        assert!(registry.bind(1, seat("ABC123", "alice")));
    }

    #[test]
    fn bind_unknown_session_fails() {
        let mut registry = ConnectionRegistry::new();
        assert!(!registry.bind(9, seat("ABC123", "alice")));
    }

    #[test]
    fn rebinding_moves_session_between_rooms() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1);

        registry.bind(1, seat("ABC123", "alice"));
        registry.bind(1, seat("XYZ789", "alice"));

        let old = RoomCode::parse("ABC123").unwrap();
        let new = RoomCode::parse("XYZ789").unwrap();
        assert_eq!(registry.room_session_count(&old), 0);
        assert_eq!(registry.room_session_count(&new), 1);
        assert_eq!(registry.session_for_player(&old, "alice"), None);
    }

    #[test]
    fn unregister_releases_seat() {
        let mut registry = ConnectionRegistry::new();
        registry.register_session(1);
        registry.bind(1, seat("ABC123", "alice"));

        let info = registry.unregister_session(1).unwrap();
        assert!(info.seat.is_none());

        let room = RoomCode::parse("ABC123").unwrap();
        assert_eq!(registry.session_for_player(&room, "alice"), None);
        assert_eq!(registry.room_session_count(&room), 0);
        assert_eq!(registry.session_count(), 0);
    }
}
