//! Hand values, call resolution, and final standings.

use fadu_proto::{Card, CallOutcome};

/// Sum of face values in a hand.
pub fn hand_value(hand: &[Card]) -> u32 {
    hand.iter().map(|c| u32::from(c.value)).sum()
}

/// Result of resolving a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResolution {
    /// Whether the caller won
    pub outcome: CallOutcome,
    /// Seat index of the round winner
    pub winner: usize,
    /// Hand sum per seat, in seat order
    pub sums: Vec<u32>,
}

/// Decide a call made by seat `caller`.
///
/// The caller wins when no other seat has a strictly lower sum. Otherwise the
/// lowest sum wins, and among tied seats the first one after the caller in
/// turn order takes it.
pub fn resolve_call(sums: Vec<u32>, caller: usize) -> CallResolution {
    let n = sums.len();
    let caller_sum = sums.get(caller).copied().unwrap_or(u32::MAX);

    let mut winner = caller;
    let mut best = caller_sum;
    for offset in 1..n {
        let seat = (caller + offset) % n;
        if sums[seat] < best {
            best = sums[seat];
            winner = seat;
        }
    }

    let outcome = if winner == caller { CallOutcome::Win } else { CallOutcome::Lose };
    CallResolution { outcome, winner, sums }
}

/// Indices of every entry holding the maximum score, in seat order.
pub fn winners(scores: &[i32]) -> Vec<usize> {
    let Some(&max) = scores.iter().max() else {
        return Vec::new();
    };
    scores.iter().enumerate().filter(|&(_, &s)| s == max).map(|(i, _)| i).collect()
}
