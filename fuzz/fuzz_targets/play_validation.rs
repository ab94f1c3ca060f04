//! Fuzz target for card-play legality
//!
//! # Invariants
//!
//! - Accepted plays select distinct, in-range cards of a single value
//! - On a non-empty table the accepted value equals the top card's value
//! - Taking an accepted selection removes exactly those cards from the hand

#![no_main]

use arbitrary::Arbitrary;
use fadu_core::{deck, rules};
use fadu_proto::{Card, Suit};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    hand: Vec<(u8, u8)>,
    indices: Vec<u8>,
    top: Option<(u8, u8)>,
}

fn card((suit, value): (u8, u8)) -> Card {
    Card::new(Suit::ALL[usize::from(suit) % Suit::ALL.len()], value % Card::MAX_VALUE + 1)
}

fuzz_target!(|input: Input| {
    let mut hand: Vec<Card> = input.hand.into_iter().take(16).map(card).collect();
    let indices: Vec<usize> = input.indices.into_iter().take(8).map(|i| usize::from(i % 20)).collect();
    let top = input.top.map(card);

    let Ok(value) = rules::validate_play(&hand, &indices, top.as_ref()) else {
        return;
    };

    if let Some(top) = top {
        assert_eq!(top.value, value);
    }

    let before = hand.len();
    let taken = deck::take_cards(&mut hand, &indices);
    assert_eq!(taken.len(), indices.len());
    assert_eq!(hand.len(), before - indices.len());
    assert!(taken.iter().all(|c| c.value == value));
});
