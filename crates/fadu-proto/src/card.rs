//! Playing cards.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Card suit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    /// Clubs
    Clubs,
    /// Diamonds
    Diamonds,
    /// Hearts
    Hearts,
    /// Spades
    Spades,
}

impl Suit {
    /// All four suits in canonical order.
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Clubs => "clubs",
            Self::Diamonds => "diamonds",
            Self::Hearts => "hearts",
            Self::Spades => "spades",
        };
        f.write_str(name)
    }
}

/// A single playing card.
///
/// `value` is 1 (ace) through 13 (king). Jack, queen and king score their
/// numeral (11, 12, 13); there is no special face-card value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    /// Suit of the card
    pub suit: Suit,
    /// Face value, 1..=13
    pub value: u8,
}

impl Card {
    /// Lowest face value (ace).
    pub const MIN_VALUE: u8 = 1;
    /// Highest face value (king).
    pub const MAX_VALUE: u8 = 13;

    /// Create a card. Values outside `1..=13` are a caller bug.
    #[must_use]
    pub const fn new(suit: Suit, value: u8) -> Self {
        debug_assert!(value >= Self::MIN_VALUE && value <= Self::MAX_VALUE);
        Self { suit, value }
    }

    /// Every card of a standard 52-card deck, suit-major.
    pub fn standard_deck() -> Vec<Card> {
        Suit::ALL
            .iter()
            .flat_map(|&suit| (Self::MIN_VALUE..=Self::MAX_VALUE).map(move |v| Card::new(suit, v)))
            .collect()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            1 => write!(f, "ace of {}", self.suit),
            11 => write!(f, "jack of {}", self.suit),
            12 => write!(f, "queen of {}", self.suit),
            13 => write!(f, "king of {}", self.suit),
            v => write!(f, "{v} of {}", self.suit),
        }
    }
}
