//! Property tests for the session state machine.
//!
//! Random action sequences are applied straight to a `GameSession` on a
//! virtual clock. Rejected actions are fine; what matters is that no action,
//! accepted or rejected, breaks card conservation, turn placement or the
//! score ledger.

use std::time::Duration;

use fadu_core::{Environment, GameConfig, GameError, GameSession};
use fadu_harness::{InvariantRegistry, SimEnv, SimInstant, SystemSnapshot};
use fadu_proto::{GameStatus, RoomCode};
use proptest::prelude::*;

const NAMES: [&str; 4] = ["ann", "ben", "cat", "dan"];

#[derive(Debug, Clone)]
enum Action {
    Join(usize),
    Rejoin(usize),
    Leave(usize),
    Start(usize, u32),
    Draw(usize),
    Play(usize, Vec<usize>),
    Call(usize),
    NextRound(usize),
    Reset(usize),
    Wait(u64),
}

fn action_strategy() -> impl Strategy<Value = Action> {
    let who = 0..NAMES.len();
    prop_oneof![
        3 => who.clone().prop_map(Action::Join),
        1 => who.clone().prop_map(Action::Rejoin),
        1 => who.clone().prop_map(Action::Leave),
        2 => (who.clone(), 0..4u32).prop_map(|(p, r)| Action::Start(p, r)),
        4 => who.clone().prop_map(Action::Draw),
        4 => (who.clone(), prop::collection::vec(0..8usize, 1..3))
            .prop_map(|(p, idx)| Action::Play(p, idx)),
        2 => who.clone().prop_map(Action::Call),
        2 => who.clone().prop_map(Action::NextRound),
        1 => who.prop_map(Action::Reset),
        1 => (0..200u64).prop_map(Action::Wait),
    ]
}

struct Table {
    env: SimEnv,
    session: GameSession<SimInstant>,
    tokens: [Option<String>; NAMES.len()],
}

impl Table {
    fn new(seed: u64) -> Self {
        Self {
            env: SimEnv::with_seed(seed),
            session: GameSession::new(RoomCode::parse("PROP01").unwrap(), GameConfig::default()),
            tokens: Default::default(),
        }
    }

    fn apply(&mut self, action: &Action) -> Result<(), GameError> {
        let now = self.env.now();
        match action {
            Action::Join(p) => {
                let (outcome, _) = self.session.join(NAMES[*p], None, &self.env)?;
                self.tokens[*p] = Some(outcome.token);
            },
            Action::Rejoin(p) => {
                self.session.join(NAMES[*p], self.tokens[*p].as_deref(), &self.env)?;
            },
            Action::Leave(p) => {
                self.session.leave(NAMES[*p], now)?;
            },
            Action::Start(p, rounds) => {
                self.session.start_game(NAMES[*p], *rounds, &self.env)?;
            },
            Action::Draw(p) => {
                self.session.draw(NAMES[*p])?;
            },
            Action::Play(p, indices) => {
                self.session.play(NAMES[*p], indices)?;
            },
            Action::Call(p) => {
                self.session.call(NAMES[*p])?;
            },
            Action::NextRound(p) => {
                self.session.next_round(NAMES[*p], now, &self.env)?;
            },
            Action::Reset(p) => {
                self.session.reset(NAMES[*p])?;
            },
            Action::Wait(secs) => {
                self.env.advance(Duration::from_secs(*secs));
                self.session.check_grace(self.env.now());
            },
        }
        Ok(())
    }

    fn snapshot(&self) -> SystemSnapshot {
        SystemSnapshot::from_sessions([&self.session])
    }
}

proptest! {
    #[test]
    fn prop_session_invariants(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 0..150)
    ) {
        let invariants = InvariantRegistry::standard();
        let mut table = Table::new(seed);

        for (i, action) in actions.iter().enumerate() {
            let _ = table.apply(action);
            let checked = invariants.check_all(&table.snapshot());
            prop_assert!(checked.is_ok(), "after action {} ({:?}): {:?}", i, action, checked);
        }
    }

    /// A rejected action leaves the session exactly as it was.
    #[test]
    fn prop_rejection_changes_nothing(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 0..100)
    ) {
        let mut table = Table::new(seed);

        for action in &actions {
            if matches!(action, Action::Wait(_)) {
                let _ = table.apply(action);
                continue;
            }
            let before = table.snapshot();
            if table.apply(action).is_err() {
                prop_assert_eq!(before, table.snapshot(), "{:?} was rejected but changed state", action);
            }
        }
    }

    /// Terminal rooms reject every turn action.
    #[test]
    fn prop_terminal_rooms_are_frozen(
        seed in any::<u64>(),
        actions in prop::collection::vec(action_strategy(), 0..150)
    ) {
        let mut table = Table::new(seed);

        for action in &actions {
            let _ = table.apply(action);
            if table.session.status().is_terminal() {
                for &name in &NAMES {
                    prop_assert!(table.session.draw(name).is_err());
                    prop_assert!(table.session.call(name).is_err());
                }
            }
        }

        if table.session.status() == GameStatus::Final {
            prop_assert!(!table.session.winners().is_empty());
        }
    }
}
