//! Room invariants for simulation testing.
//!
//! Each check looks at a [`SystemSnapshot`] of every live room and reports a
//! [`Violation`] if the room is in a state the rules can never produce: cards
//! appearing or vanishing, two hosts, a turn parked on an empty chair, or a
//! score that disagrees with the rounds it came from.
//!
//! ```ignore
//! let invariants = InvariantRegistry::standard();
//! invariants.assert_all(&server.snapshot(), "after draw");
//! ```

mod checks;
mod snapshot;

use std::fmt;

pub use checks::{CardConservation, ScoreLedger, SingleConnectedHost, TurnOnConnectedSeat};
pub use snapshot::{RoomSnapshot, SeatSnapshot, SystemSnapshot};

/// Outcome of one invariant check.
pub type InvariantResult = Result<(), Violation>;

/// A broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Which invariant
    pub invariant: &'static str,
    /// Room and detail
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.invariant, self.message)
    }
}

impl std::error::Error for Violation {}

/// A property every snapshot must satisfy.
pub trait Invariant: Send + Sync {
    /// Stable name, used as the prefix of violation messages.
    fn name(&self) -> &'static str;

    /// Check every room in `state`.
    fn check(&self, state: &SystemSnapshot) -> InvariantResult;
}

/// Set of invariants run together.
#[derive(Default)]
pub struct InvariantRegistry {
    invariants: Vec<Box<dyn Invariant>>,
}

impl InvariantRegistry {
    /// Registry with no checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// The four game invariants: [`CardConservation`],
    /// [`SingleConnectedHost`], [`TurnOnConnectedSeat`] and [`ScoreLedger`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.add(CardConservation);
        registry.add(SingleConnectedHost);
        registry.add(TurnOnConnectedSeat);
        registry.add(ScoreLedger);
        registry
    }

    /// Register another check.
    pub fn add<I: Invariant + 'static>(&mut self, invariant: I) {
        self.invariants.push(Box::new(invariant));
    }

    /// Run every check, collecting all violations.
    pub fn check_all(&self, state: &SystemSnapshot) -> Result<(), Vec<Violation>> {
        let violations: Vec<Violation> =
            self.invariants.iter().filter_map(|invariant| invariant.check(state).err()).collect();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }

    /// Run every check and panic with all violations if any fail.
    #[allow(clippy::panic)]
    pub fn assert_all(&self, state: &SystemSnapshot, context: &str) {
        if let Err(violations) = self.check_all(state) {
            let lines: Vec<String> = violations.iter().map(ToString::to_string).collect();
            panic!("invariants broken {context}:\n  {}", lines.join("\n  "));
        }
    }

    /// Number of registered checks.
    pub fn len(&self) -> usize {
        self.invariants.len()
    }

    /// No checks registered.
    pub fn is_empty(&self) -> bool {
        self.invariants.is_empty()
    }
}
