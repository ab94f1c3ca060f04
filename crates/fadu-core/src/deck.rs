//! Deck management: shuffle, deal, draw, and hand mutation.

use fadu_proto::Card;

use crate::env::Environment;

/// Cards in a standard deck.
pub const DECK_SIZE: usize = 52;

/// Undealt cards for the current round. The last element is the top.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Full 52-card deck in uniformly random order.
    pub fn shuffled<E: Environment>(env: &E) -> Self {
        let mut cards = Card::standard_deck();
        env.shuffle(&mut cards);
        Self { cards }
    }

    /// Deck whose draw order is `cards` front to back (`cards[0]` is drawn
    /// first).
    pub fn from_top(mut cards: Vec<Card>) -> Self {
        cards.reverse();
        Self { cards }
    }

    /// Cards remaining.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// No cards remaining.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Remove and return the top card.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Deal `hand_size` cards to each of `seats` hands, one hand at a time
    /// from the top. Hands come up short only if the deck runs out.
    pub fn deal_hands(&mut self, seats: usize, hand_size: usize) -> Vec<Vec<Card>> {
        (0..seats).map(|_| (0..hand_size).filter_map(|_| self.draw()).collect()).collect()
    }

    /// Remaining cards, top last.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

/// Remove the cards at `indices` from `hand` and return them in the order
/// given.
///
/// `indices` must be in range and unique; [`crate::rules::validate_play`]
/// checks both. Invalid indices are skipped rather than panicking.
pub fn take_cards(hand: &mut Vec<Card>, indices: &[usize]) -> Vec<Card> {
    let taken: Vec<Card> = indices.iter().filter_map(|&i| hand.get(i).copied()).collect();

    let mut sorted: Vec<usize> = indices.iter().copied().filter(|&i| i < hand.len()).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.dedup();
    for i in sorted {
        hand.remove(i);
    }

    taken
}

#[cfg(test)]
mod tests {
    use fadu_proto::Suit;

    use super::*;
    use crate::env::test_env::TestEnv;

    fn c(value: u8) -> Card {
        Card::new(Suit::Hearts, value)
    }

    #[test]
    fn deal_two_hands_of_five_leaves_forty_two() {
        let mut deck = Deck::shuffled(&TestEnv::with_seed(1));
        let hands = deck.deal_hands(2, 5);

        assert_eq!(hands.len(), 2);
        assert!(hands.iter().all(|h| h.len() == 5));
        assert_eq!(deck.len(), 42);
    }

    #[test]
    fn from_top_draws_in_order() {
        let mut deck = Deck::from_top(vec![c(1), c(2), c(3)]);
        assert_eq!(deck.draw(), Some(c(1)));
        assert_eq!(deck.draw(), Some(c(2)));
        assert_eq!(deck.draw(), Some(c(3)));
        assert_eq!(deck.draw(), None);
        assert!(deck.is_empty());
    }

    #[test]
    fn deal_is_sequential_per_seat() {
        let mut deck = Deck::from_top((1..=6).map(c).collect());
        let hands = deck.deal_hands(2, 3);
        assert_eq!(hands[0], vec![c(1), c(2), c(3)]);
        assert_eq!(hands[1], vec![c(4), c(5), c(6)]);
    }

    #[test]
    fn take_cards_preserves_caller_order() {
        let mut hand = vec![c(1), c(2), c(3), c(4)];
        let taken = take_cards(&mut hand, &[3, 0]);

        assert_eq!(taken, vec![c(4), c(1)]);
        assert_eq!(hand, vec![c(2), c(3)]);
    }

    #[test]
    fn take_cards_skips_invalid_indices() {
        let mut hand = vec![c(1), c(2)];
        let taken = take_cards(&mut hand, &[5]);
        assert!(taken.is_empty());
        assert_eq!(hand.len(), 2);
    }
}
