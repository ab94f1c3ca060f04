//! Session state machine for a single room.
//!
//! Uses the action pattern: methods take time and randomness as input and
//! return [`GameEvent`]s for the server to fan out. All mutation funnels
//! through validated transitions; a rejected action leaves the session
//! untouched.
//!
//! # State Machine
//!
//! ```text
//! ┌─────────┐ start ┌─────────┐ call / empty hand ┌───────┐ last round ┌───────┐
//! │ Waiting │──────>│ Playing │──────────────────>│ Ended │───────────>│ Final │
//! └─────────┘       └─────────┘<──────────────────└───────┘            └───────┘
//!      ^             │      ^       next_round                             │
//!      │  disconnect │      │ all back                                     │
//!      │             v      │                                              │
//!      │            ┌────────┐  grace expired  ┌───────────┐               │
//!      │            │ Paused │────────────────>│ Forfeited │               │
//!      │            └────────┘                 └───────────┘               │
//!      └──────────────────────── reset ──────────────┴─────────────────────┘
//! ```

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use fadu_proto::{CallOutcome, Card, GameStatus, RoomCode};

use crate::{
    config::GameConfig,
    deck::{self, Deck},
    env::Environment,
    error::GameError,
    rules, scoring,
};

/// Longest accepted player name, in characters, after trimming.
pub const MAX_NAME_LEN: usize = 24;

/// Domain events produced by session transitions.
///
/// Events carry only what cannot be read back from the session afterwards;
/// the dispatcher combines them with the post-transition state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// Seat list or connection flags changed
    MembershipChanged,

    /// Round one dealt
    GameStarted,

    /// Cards moved from a hand to the table
    CardsPlayed {
        /// Who played
        player: String,
        /// Cards in stacking order
        cards: Vec<Card>,
    },

    /// A player drew the top card
    CardDrawn {
        /// Who drew
        player: String,
    },

    /// A call ended the round
    CallResolved {
        /// Who called
        caller: String,
        /// Whether the caller won
        outcome: CallOutcome,
        /// Round winner
        winner: String,
        /// Hand sum per player, seat order
        sums: Vec<(String, u32)>,
        /// Points awarded this round, seat order
        round_points: Vec<(String, i32)>,
    },

    /// A player emptied their hand and took the round
    RoundWon {
        /// Round winner
        player: String,
        /// Points awarded
        bonus: i32,
    },

    /// A later round was dealt
    RoundStarted,

    /// Last round resolved
    GameFinished {
        /// Every player holding the top score
        winners: Vec<String>,
    },

    /// A seat lost its connection
    PlayerDisconnected {
        /// Who dropped
        player: String,
    },

    /// A disconnected seat was reclaimed
    PlayerReconnected {
        /// Who returned
        player: String,
    },

    /// Turns frozen
    Paused {
        /// Disconnected players
        missing: Vec<String>,
    },

    /// Turns continue
    Resumed,

    /// Grace period expired
    Forfeited {
        /// Players who never returned
        missing: Vec<String>,
    },

    /// Room returned to the lobby
    Reset,
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// Trimmed player name bound to the seat
    pub player: String,
    /// Seat index
    pub seat: usize,
    /// Whether the joiner hosts the room
    pub is_host: bool,
    /// Reconnect token for this seat
    pub token: String,
    /// Whether an existing seat was reclaimed
    pub reattached: bool,
}

/// One player's place at the table.
#[derive(Debug, Clone)]
pub struct Seat<I> {
    name: String,
    hand: Vec<Card>,
    connected: bool,
    score: i32,
    round_points: Vec<i32>,
    token: String,
    disconnected_at: Option<I>,
}

impl<I: Copy> Seat<I> {
    fn new(name: String, token: String) -> Self {
        Self {
            name,
            hand: Vec::new(),
            connected: true,
            score: 0,
            round_points: Vec::new(),
            token,
            disconnected_at: None,
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current hand, in deal/draw order.
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    /// Whether a connection is bound to this seat.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Cumulative score.
    pub fn score(&self) -> i32 {
        self.score
    }

    /// Points awarded per completed round.
    pub fn round_points(&self) -> &[i32] {
        &self.round_points
    }

    /// Reconnect token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// When the seat lost its connection.
    pub fn disconnected_at(&self) -> Option<I> {
        self.disconnected_at
    }
}

/// Authoritative state of one room.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct GameSession<I = Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    code: RoomCode,
    config: GameConfig,
    seats: Vec<Seat<I>>,
    status: GameStatus,
    current_turn: usize,
    current_round: u32,
    total_rounds: u32,
    table: Vec<Card>,
    deck: Deck,
    paused_since: Option<I>,
    winners: Vec<String>,
    #[cfg(any(test, feature = "test-util"))]
    stacked_deck: Option<Vec<Card>>,
}

impl<I> GameSession<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create an empty room in [`GameStatus::Waiting`].
    pub fn new(code: RoomCode, config: GameConfig) -> Self {
        Self {
            code,
            config,
            seats: Vec::new(),
            status: GameStatus::Waiting,
            current_turn: 0,
            current_round: 0,
            total_rounds: 0,
            table: Vec::new(),
            deck: Deck::default(),
            paused_since: None,
            winners: Vec::new(),
            #[cfg(any(test, feature = "test-util"))]
            stacked_deck: None,
        }
    }

    /// Room code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Rule parameters.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Current status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Seats in turn order.
    pub fn seats(&self) -> &[Seat<I>] {
        &self.seats
    }

    /// Seat by player name.
    pub fn seat(&self, name: &str) -> Option<&Seat<I>> {
        self.seats.iter().find(|s| s.name == name)
    }

    /// Seat index by player name.
    pub fn seat_index(&self, name: &str) -> Option<usize> {
        self.seats.iter().position(|s| s.name == name)
    }

    /// Round in progress (1-based), or 0 before the first deal.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Rounds requested at start.
    pub fn total_rounds(&self) -> u32 {
        self.total_rounds
    }

    /// Played cards; the last is the top.
    pub fn table(&self) -> &[Card] {
        &self.table
    }

    /// Undealt cards.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Cards left in the draw pile.
    pub fn deck_count(&self) -> usize {
        self.deck.len()
    }

    /// When the room was paused.
    pub fn paused_since(&self) -> Option<I> {
        self.paused_since
    }

    /// Winners after the game is final.
    pub fn winners(&self) -> &[String] {
        &self.winners
    }

    /// Seat index whose turn it is while a round is live.
    pub fn current_turn(&self) -> Option<usize> {
        match self.status {
            GameStatus::Playing | GameStatus::Paused => Some(self.current_turn),
            _ => None,
        }
    }

    /// Name of the player whose turn it is while a round is live.
    pub fn current_player(&self) -> Option<&str> {
        self.current_turn().and_then(|i| self.seats.get(i)).map(|s| s.name.as_str())
    }

    /// Host seat: the first connected seat, or seat 0 if nobody is connected.
    pub fn host_index(&self) -> Option<usize> {
        if self.seats.is_empty() {
            return None;
        }
        Some(self.seats.iter().position(|s| s.connected).unwrap_or(0))
    }

    /// Host name.
    pub fn host(&self) -> Option<&str> {
        self.host_index().map(|i| self.seats[i].name.as_str())
    }

    /// Whether `name` hosts the room.
    pub fn is_host(&self, name: &str) -> bool {
        self.host().is_some_and(|h| h == name)
    }

    /// Seats with a live connection.
    pub fn connected_count(&self) -> usize {
        self.seats.iter().filter(|s| s.connected).count()
    }

    /// Names of disconnected seats, in seat order.
    pub fn missing_players(&self) -> Vec<String> {
        self.seats.iter().filter(|s| !s.connected).map(|s| s.name.clone()).collect()
    }

    /// Cumulative scores in seat order.
    pub fn scores(&self) -> Vec<(String, i32)> {
        self.seats.iter().map(|s| (s.name.clone(), s.score)).collect()
    }

    /// Nobody is connected and no live round would be lost by dropping the
    /// room.
    pub fn is_collectable(&self) -> bool {
        self.connected_count() == 0
            && matches!(
                self.status,
                GameStatus::Waiting | GameStatus::Ended | GameStatus::Final | GameStatus::Forfeited
            )
    }

    /// Use `cards` (top first) instead of a shuffle for the next deal.
    #[cfg(any(test, feature = "test-util"))]
    pub fn stack_next_deal(&mut self, cards: Vec<Card>) {
        self.stacked_deck = Some(cards);
    }

    /// Take a seat, or reclaim a disconnected one with its token.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest` if the name is empty or too long
    /// - `Forfeited` if the room was forfeited
    /// - `InvalidState` if the name is held by a connected seat, the token
    ///   does not match, or the game already started
    /// - `RoomFull` if every seat is taken
    pub fn join<E: Environment>(
        &mut self,
        name: &str,
        token: Option<&str>,
        env: &E,
    ) -> Result<(JoinOutcome, Vec<GameEvent>), GameError> {
        let name = name.trim();
        let len = name.chars().count();
        if len == 0 || len > MAX_NAME_LEN {
            return Err(GameError::invalid_request(format!(
                "player name must be 1-{MAX_NAME_LEN} characters"
            )));
        }

        if self.status == GameStatus::Forfeited {
            return Err(GameError::Forfeited);
        }

        if let Some(index) = self.seat_index(name) {
            return self.reattach(index, token);
        }

        if self.status != GameStatus::Waiting {
            return Err(GameError::invalid_state("game already in progress"));
        }

        if self.seats.len() >= self.config.max_players {
            return Err(GameError::RoomFull { max: self.config.max_players });
        }

        let token = format!("{:016x}{:016x}", env.random_u64(), env.random_u64());
        self.seats.push(Seat::new(name.to_string(), token.clone()));
        let seat = self.seats.len() - 1;

        let outcome = JoinOutcome {
            player: name.to_string(),
            seat,
            is_host: self.host_index() == Some(seat),
            token,
            reattached: false,
        };
        Ok((outcome, vec![GameEvent::MembershipChanged]))
    }

    fn reattach(
        &mut self,
        index: usize,
        token: Option<&str>,
    ) -> Result<(JoinOutcome, Vec<GameEvent>), GameError> {
        let seat = &self.seats[index];
        if seat.connected {
            return Err(GameError::invalid_state(format!("name {} is already taken", seat.name)));
        }
        if token != Some(seat.token.as_str()) {
            return Err(GameError::invalid_state(format!(
                "seat {} is held for a disconnected player; reconnect token required",
                seat.name
            )));
        }

        let seat = &mut self.seats[index];
        seat.connected = true;
        seat.disconnected_at = None;
        let player = seat.name.clone();
        let token = seat.token.clone();

        let mut events = vec![
            GameEvent::PlayerReconnected { player: player.clone() },
            GameEvent::MembershipChanged,
        ];

        if self.status == GameStatus::Paused && self.connected_count() == self.seats.len() {
            self.status = GameStatus::Playing;
            self.paused_since = None;
            events.push(GameEvent::Resumed);
        }

        let outcome = JoinOutcome {
            player,
            seat: index,
            is_host: self.host_index() == Some(index),
            token,
            reattached: true,
        };
        Ok((outcome, events))
    }

    /// Explicit leave. Identical to a dropped connection.
    pub fn leave(&mut self, name: &str, now: I) -> Result<Vec<GameEvent>, GameError> {
        self.disconnect(name, now)
    }

    /// Mark a seat disconnected.
    ///
    /// Before the game starts the seat is removed outright. A disconnect
    /// during a live round pauses the room. Seats are never removed mid game.
    pub fn disconnect(&mut self, name: &str, now: I) -> Result<Vec<GameEvent>, GameError> {
        let index = self
            .seat_index(name)
            .ok_or_else(|| GameError::invalid_request(format!("unknown player {name}")))?;

        if !self.seats[index].connected {
            return Ok(Vec::new());
        }

        if self.status == GameStatus::Waiting {
            self.seats.remove(index);
            return Ok(vec![GameEvent::MembershipChanged]);
        }

        let seat = &mut self.seats[index];
        seat.connected = false;
        seat.disconnected_at = Some(now);

        let mut events = vec![
            GameEvent::PlayerDisconnected { player: name.to_string() },
            GameEvent::MembershipChanged,
        ];

        match self.status {
            GameStatus::Playing => {
                self.status = GameStatus::Paused;
                self.paused_since = Some(now);
                events.push(GameEvent::Paused { missing: self.missing_players() });
            },
            GameStatus::Paused => {
                events.push(GameEvent::Paused { missing: self.missing_players() });
            },
            _ => {},
        }

        Ok(events)
    }

    /// Forfeit a paused room once any missing player has used up their grace
    /// period.
    ///
    /// Each missing seat is timed from the later of its own disconnect and the
    /// start of the pause, so a seat that drops late gets the full period.
    /// `missing` names only the seats whose time ran out.
    pub fn check_grace(&mut self, now: I) -> Vec<GameEvent> {
        let Some(paused_since) = self.paused_since else {
            return Vec::new();
        };
        if self.status != GameStatus::Paused {
            return Vec::new();
        }

        let grace = self.config.grace_period;
        let expired: Vec<String> = self
            .seats
            .iter()
            .filter(|seat| !seat.connected)
            .filter(|seat| {
                let since = seat.disconnected_at.map_or(paused_since, |at| at.max(paused_since));
                now - since >= grace
            })
            .map(|seat| seat.name.clone())
            .collect();
        if expired.is_empty() {
            return Vec::new();
        }

        self.status = GameStatus::Forfeited;
        self.paused_since = None;
        vec![GameEvent::Forfeited { missing: expired }]
    }

    /// Host deals round one.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `by` is not the host, the game already started, or
    ///   there are too few players
    /// - `InvalidRequest` if `total_rounds` is 0 or above the configured
    ///   maximum
    pub fn start_game<E: Environment>(
        &mut self,
        by: &str,
        total_rounds: u32,
        env: &E,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.require_host(by, "start the game")?;

        if self.status != GameStatus::Waiting {
            return Err(GameError::invalid_state("game already started"));
        }

        if self.seats.len() < self.config.min_players {
            return Err(GameError::invalid_state(format!(
                "need at least {} players to start",
                self.config.min_players
            )));
        }

        if total_rounds == 0 || total_rounds > self.config.max_rounds {
            return Err(GameError::invalid_request(format!(
                "total_rounds must be 1-{}",
                self.config.max_rounds
            )));
        }

        self.total_rounds = total_rounds;
        self.current_round = 1;
        self.deal(env);
        self.current_turn = 0;
        self.status = GameStatus::Playing;

        Ok(vec![GameEvent::GameStarted])
    }

    /// Host deals the next round after one has ended.
    ///
    /// Round `r` opens at seat `(r - 1) mod n`, skipping disconnected seats.
    /// If anyone is disconnected the round opens paused.
    pub fn next_round<E: Environment>(
        &mut self,
        by: &str,
        now: I,
        env: &E,
    ) -> Result<Vec<GameEvent>, GameError> {
        self.require_host(by, "deal the next round")?;

        if self.status != GameStatus::Ended {
            return Err(GameError::invalid_state("current round has not ended"));
        }

        self.current_round += 1;
        self.deal(env);

        let n = self.seats.len();
        let start = (self.current_round as usize - 1) % n;
        self.current_turn = (0..n)
            .map(|offset| (start + offset) % n)
            .find(|&i| self.seats[i].connected)
            .unwrap_or(start);

        let mut events = vec![GameEvent::RoundStarted];
        let missing = self.missing_players();
        if missing.is_empty() {
            self.status = GameStatus::Playing;
        } else {
            self.status = GameStatus::Paused;
            self.paused_since = Some(now);
            events.push(GameEvent::Paused { missing });
        }

        Ok(events)
    }

    /// Draw the top card. Drawing ends the turn.
    pub fn draw(&mut self, player: &str) -> Result<Vec<GameEvent>, GameError> {
        let index = self.check_turn(player)?;
        let card = self.deck.draw().ok_or(GameError::EmptyDeck)?;

        self.seats[index].hand.push(card);
        self.advance_turn();

        Ok(vec![GameEvent::CardDrawn { player: player.to_string() }])
    }

    /// Play cards by hand position, stacked on the table in the given order.
    ///
    /// Emptying the hand wins the round with the hand-empty bonus.
    pub fn play(&mut self, player: &str, indices: &[usize]) -> Result<Vec<GameEvent>, GameError> {
        let index = self.check_turn(player)?;
        rules::validate_play(&self.seats[index].hand, indices, self.table.last())?;

        let cards = deck::take_cards(&mut self.seats[index].hand, indices);
        self.table.extend_from_slice(&cards);

        let mut events = vec![GameEvent::CardsPlayed { player: player.to_string(), cards }];

        if self.seats[index].hand.is_empty() {
            let bonus = self.config.hand_empty_bonus;
            self.end_round(index, bonus);
            events.push(GameEvent::RoundWon { player: player.to_string(), bonus });
            events.extend(self.finish_if_last_round());
        } else {
            self.advance_turn();
        }

        Ok(events)
    }

    /// Call: compare hand sums and end the round.
    pub fn call(&mut self, player: &str) -> Result<Vec<GameEvent>, GameError> {
        let index = self.check_turn(player)?;

        let sums = self.seats.iter().map(|s| scoring::hand_value(&s.hand)).collect();
        let resolution = scoring::resolve_call(sums, index);
        self.end_round(resolution.winner, self.config.call_bonus);

        let sums = self.seats.iter().zip(&resolution.sums).map(|(s, &v)| (s.name.clone(), v)).collect();
        let round_points = self
            .seats
            .iter()
            .map(|s| (s.name.clone(), s.round_points.last().copied().unwrap_or(0)))
            .collect();

        let mut events = vec![GameEvent::CallResolved {
            caller: player.to_string(),
            outcome: resolution.outcome,
            winner: self.seats[resolution.winner].name.clone(),
            sums,
            round_points,
        }];
        events.extend(self.finish_if_last_round());

        Ok(events)
    }

    /// Host returns a finished or forfeited room to the lobby.
    ///
    /// Scores, hands and disconnected seats are cleared.
    pub fn reset(&mut self, by: &str) -> Result<Vec<GameEvent>, GameError> {
        self.require_host(by, "reset the room")?;

        if !self.status.is_terminal() {
            return Err(GameError::invalid_state("room can only be reset after the game is over"));
        }

        self.seats.retain(|s| s.connected);
        for seat in &mut self.seats {
            seat.hand.clear();
            seat.score = 0;
            seat.round_points.clear();
        }
        self.status = GameStatus::Waiting;
        self.current_turn = 0;
        self.current_round = 0;
        self.total_rounds = 0;
        self.table.clear();
        self.deck = Deck::default();
        self.paused_since = None;
        self.winners.clear();

        Ok(vec![GameEvent::Reset])
    }

    fn require_host(&self, by: &str, action: &str) -> Result<(), GameError> {
        if self.seat_index(by).is_none() {
            return Err(GameError::invalid_request(format!("unknown player {by}")));
        }
        if !self.is_host(by) {
            return Err(GameError::invalid_state(format!("only the host can {action}")));
        }
        Ok(())
    }

    /// Gate shared by draw, play and call. Pause is checked first.
    fn check_turn(&self, player: &str) -> Result<usize, GameError> {
        let index = self
            .seat_index(player)
            .ok_or_else(|| GameError::invalid_request(format!("unknown player {player}")))?;

        match self.status {
            GameStatus::Paused => {
                return Err(GameError::GamePaused { missing: self.missing_players() });
            },
            GameStatus::Forfeited => return Err(GameError::Forfeited),
            GameStatus::Playing => {},
            _ => return Err(GameError::invalid_state("no round in progress")),
        }

        if index != self.current_turn {
            return Err(GameError::NotYourTurn {
                player: player.to_string(),
                current: self.seats[self.current_turn].name.clone(),
            });
        }

        Ok(index)
    }

    /// Next connected seat after the current one, wrapping.
    fn advance_turn(&mut self) {
        let n = self.seats.len();
        if let Some(next) =
            (1..=n).map(|offset| (self.current_turn + offset) % n).find(|&i| self.seats[i].connected)
        {
            self.current_turn = next;
        }
    }

    fn deal<E: Environment>(&mut self, env: &E) {
        #[cfg(any(test, feature = "test-util"))]
        let stacked = self.stacked_deck.take();
        #[cfg(not(any(test, feature = "test-util")))]
        let stacked: Option<Vec<Card>> = None;

        self.deck = match stacked {
            Some(cards) => Deck::from_top(cards),
            None => Deck::shuffled(env),
        };

        let hands = self.deck.deal_hands(self.seats.len(), self.config.hand_size);
        for (seat, hand) in self.seats.iter_mut().zip(hands) {
            seat.hand = hand;
        }
        self.table.clear();
    }

    fn end_round(&mut self, winner: usize, bonus: i32) {
        for (i, seat) in self.seats.iter_mut().enumerate() {
            let delta = if i == winner { bonus } else { 0 };
            seat.score += delta;
            seat.round_points.push(delta);
        }
        self.status = GameStatus::Ended;
    }

    fn finish_if_last_round(&mut self) -> Option<GameEvent> {
        if self.current_round < self.total_rounds {
            return None;
        }
        Some(self.finalize())
    }

    fn finalize(&mut self) -> GameEvent {
        let scores: Vec<i32> = self.seats.iter().map(|s| s.score).collect();
        self.winners =
            scoring::winners(&scores).into_iter().map(|i| self.seats[i].name.clone()).collect();
        self.status = GameStatus::Final;
        GameEvent::GameFinished { winners: self.winners.clone() }
    }
}
