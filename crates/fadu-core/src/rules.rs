//! Card-play legality.
//!
//! A play is a non-empty set of cards from one hand, all of the same value.
//! On an empty table any such set opens; otherwise its value must match the
//! top card.

use fadu_proto::Card;
use thiserror::Error;

/// Reasons a card selection is not a legal play.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlayViolation {
    /// No cards selected
    #[error("no cards selected")]
    Empty,

    /// Index past the end of the hand
    #[error("card index {index} out of range (hand has {hand_len} cards)")]
    OutOfRange {
        /// Offending index
        index: usize,
        /// Size of the hand
        hand_len: usize,
    },

    /// Same index selected twice
    #[error("card index {0} selected more than once")]
    Duplicate(usize),

    /// Selected cards differ in value
    #[error("selected cards must all share one value")]
    MixedValues,

    /// Value differs from the card on top of the table
    #[error("played value {played} does not match top card value {top}")]
    TopMismatch {
        /// Value of the selected cards
        played: u8,
        /// Value on top of the table
        top: u8,
    },
}

/// Check a selection against a hand and the current top of the table.
///
/// Returns the common value of the selected cards.
pub fn validate_play(hand: &[Card], indices: &[usize], top: Option<&Card>) -> Result<u8, PlayViolation> {
    let Some(&first) = indices.first() else {
        return Err(PlayViolation::Empty);
    };

    let mut seen = Vec::with_capacity(indices.len());
    for &index in indices {
        if index >= hand.len() {
            return Err(PlayViolation::OutOfRange { index, hand_len: hand.len() });
        }
        if seen.contains(&index) {
            return Err(PlayViolation::Duplicate(index));
        }
        seen.push(index);
    }

    let value = hand[first].value;
    if indices.iter().any(|&i| hand[i].value != value) {
        return Err(PlayViolation::MixedValues);
    }

    if let Some(top) = top {
        if top.value != value {
            return Err(PlayViolation::TopMismatch { played: value, top: top.value });
        }
    }

    Ok(value)
}
