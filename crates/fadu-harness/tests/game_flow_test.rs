//! Full games driven through the simulation server.
//!
//! Decks are stacked so every hand, draw and call is known in advance.

use fadu_core::GameConfig;
use fadu_harness::{InvariantRegistry, SimServer};
use fadu_proto::{
    CallOutcome, Card, ClientMessage, ErrorCode, GameStatus, RoomCode, ServerMessage, Suit,
};
use fadu_server::DriverConfig;

fn room() -> RoomCode {
    RoomCode::parse("ABC123").unwrap()
}

fn join(server: &mut SimServer, name: &str) -> u64 {
    let session = server.connect().unwrap();
    server
        .send(session, &ClientMessage::JoinRoom {
            room_id: room(),
            player_id: name.to_string(),
            token: None,
        })
        .unwrap();
    session
}

fn c(suit: Suit, value: u8) -> Card {
    Card::new(suit, value)
}

/// Alice: 7, 7, A, 2, 3. Bob: K, K, Q, Q, J. Bob's draw: K.
fn two_player_deck() -> Vec<Card> {
    vec![
        c(Suit::Hearts, 7),
        c(Suit::Spades, 7),
        c(Suit::Clubs, 1),
        c(Suit::Diamonds, 2),
        c(Suit::Hearts, 3),
        c(Suit::Spades, 13),
        c(Suit::Hearts, 13),
        c(Suit::Diamonds, 12),
        c(Suit::Clubs, 12),
        c(Suit::Spades, 11),
        c(Suit::Diamonds, 13),
    ]
}

#[test]
fn two_player_game_to_final_result() {
    let invariants = InvariantRegistry::standard();
    let mut server = SimServer::with_seed(7);

    let alice = join(&mut server, "alice");
    let bob = join(&mut server, "bob");
    assert!(server.stack_deck(&room(), &two_player_deck()));

    server.send(alice, &ClientMessage::StartGame { room_id: room(), total_rounds: 1 }).unwrap();
    invariants.assert_all(&server.snapshot(), "after start");

    for session in [alice, bob] {
        match server.last_event(session, "game_started") {
            Some(ServerMessage::GameStarted { current_turn, deck_count, .. }) => {
                assert_eq!(current_turn.as_deref(), Some("alice"));
                assert_eq!(*deck_count, 42);
            },
            other => panic!("expected game_started, got {other:?}"),
        }
        assert_eq!(server.hand(session).map(<[Card]>::len), Some(5));
    }
    assert_eq!(server.hand(alice).unwrap()[..2], [c(Suit::Hearts, 7), c(Suit::Spades, 7)]);

    server
        .send(alice, &ClientMessage::PlayCards {
            player_id: "alice".to_string(),
            card_indices: vec![0, 1],
        })
        .unwrap();
    match server.last_event(bob, "cards_played") {
        Some(ServerMessage::CardsPlayed { player_id, table_cards, current_turn, .. }) => {
            assert_eq!(player_id, "alice");
            assert_eq!(table_cards, &[c(Suit::Hearts, 7), c(Suit::Spades, 7)]);
            assert_eq!(current_turn.as_deref(), Some("bob"));
        },
        other => panic!("expected cards_played, got {other:?}"),
    }
    assert_eq!(server.hand(alice).map(<[Card]>::len), Some(3));

    server.send(bob, &ClientMessage::DrawCard { player_id: "bob".to_string() }).unwrap();
    match server.last_event(alice, "card_drawn") {
        Some(ServerMessage::CardDrawn { player_id, current_turn, deck_count }) => {
            assert_eq!(player_id, "bob");
            assert_eq!(current_turn.as_deref(), Some("alice"));
            assert_eq!(*deck_count, 41);
        },
        other => panic!("expected card_drawn, got {other:?}"),
    }
    assert!(server.hand(bob).unwrap().contains(&c(Suit::Diamonds, 13)));
    invariants.assert_all(&server.snapshot(), "after draw");

    server.send(alice, &ClientMessage::Call { player_id: "alice".to_string() }).unwrap();
    invariants.assert_all(&server.snapshot(), "after call");

    for session in [alice, bob] {
        match server.last_event(session, "call_result") {
            Some(ServerMessage::CallResult { caller, result, winner, player_sums, scores, .. }) => {
                assert_eq!(caller, "alice");
                assert_eq!(*result, CallOutcome::Win);
                assert_eq!(winner, "alice");
                assert_eq!(player_sums["alice"], 6);
                assert_eq!(player_sums["bob"], 74);
                assert_eq!(scores["alice"], 2);
                assert_eq!(scores["bob"], 0);
            },
            other => panic!("expected call_result, got {other:?}"),
        }
        match server.last_event(session, "final_result") {
            Some(ServerMessage::FinalResult { winners, .. }) => {
                assert_eq!(winners, &["alice".to_string()]);
            },
            other => panic!("expected final_result, got {other:?}"),
        }
    }

    let status = server.driver().room(&room()).map(|r| r.status());
    assert_eq!(status, Some(GameStatus::Final));
}

#[test]
fn emptying_hand_wins_round_with_bonus() {
    let config = DriverConfig {
        game: GameConfig { hand_size: 4, ..GameConfig::default() },
        ..DriverConfig::default()
    };
    let mut server = SimServer::with_config(config, 3);
    let alice = join(&mut server, "alice");
    let bob = join(&mut server, "bob");

    let nines = [c(Suit::Hearts, 9), c(Suit::Spades, 9), c(Suit::Clubs, 9), c(Suit::Diamonds, 9)];
    assert!(server.stack_deck(&room(), &nines));

    server.send(alice, &ClientMessage::StartGame { room_id: room(), total_rounds: 2 }).unwrap();
    server
        .send(alice, &ClientMessage::PlayCards {
            player_id: "alice".to_string(),
            card_indices: vec![3, 2, 1, 0],
        })
        .unwrap();

    match server.last_event(bob, "round_won") {
        Some(ServerMessage::RoundWon { player_id, bonus, scores }) => {
            assert_eq!(player_id, "alice");
            assert_eq!(*bonus, 4);
            assert_eq!(scores["alice"], 4);
            assert_eq!(scores["bob"], 0);
        },
        other => panic!("expected round_won, got {other:?}"),
    }
    assert_eq!(server.hand(alice).map(<[Card]>::len), Some(0));
    assert!(server.last_event(alice, "final_result").is_none());

    let status = server.driver().room(&room()).map(|r| r.status());
    assert_eq!(status, Some(GameStatus::Ended));

    server.send(bob, &ClientMessage::DrawCard { player_id: "bob".to_string() }).unwrap();
    assert_eq!(server.last_error(bob).map(|(code, _)| code), Some(ErrorCode::InvalidState));
}

#[test]
fn play_must_match_table_top() {
    let mut server = SimServer::with_seed(8);
    let alice = join(&mut server, "alice");
    let bob = join(&mut server, "bob");
    assert!(server.stack_deck(&room(), &two_player_deck()));

    server.send(alice, &ClientMessage::StartGame { room_id: room(), total_rounds: 1 }).unwrap();
    server
        .send(alice, &ClientMessage::PlayCards {
            player_id: "alice".to_string(),
            card_indices: vec![0, 1],
        })
        .unwrap();

    server
        .send(bob, &ClientMessage::PlayCards { player_id: "bob".to_string(), card_indices: vec![0] })
        .unwrap();
    assert_eq!(server.last_error(bob).map(|(code, _)| code), Some(ErrorCode::IllegalPlay));

    let session = server.driver().room(&room()).unwrap();
    assert_eq!(session.current_player(), Some("bob"));
    assert_eq!(session.table().len(), 2);
    assert_eq!(session.seat("bob").unwrap().hand().len(), 5);
}

#[test]
fn next_round_rotates_opening_seat() {
    let invariants = InvariantRegistry::standard();
    let mut server = SimServer::with_seed(9);
    let alice = join(&mut server, "alice");
    let bob = join(&mut server, "bob");

    server.send(alice, &ClientMessage::StartGame { room_id: room(), total_rounds: 2 }).unwrap();
    server.send(alice, &ClientMessage::Call { player_id: "alice".to_string() }).unwrap();

    server.send(bob, &ClientMessage::NextRound { room_id: room() }).unwrap();
    assert_eq!(server.last_error(bob).map(|(code, _)| code), Some(ErrorCode::InvalidState));

    server.send(alice, &ClientMessage::NextRound { room_id: room() }).unwrap();
    invariants.assert_all(&server.snapshot(), "after next round");

    match server.last_event(bob, "next_round") {
        Some(ServerMessage::NextRound { current_turn, current_round, table_cards, deck_count, .. }) => {
            assert_eq!(current_turn.as_deref(), Some("bob"));
            assert_eq!(*current_round, 2);
            assert!(table_cards.is_empty());
            assert_eq!(*deck_count, 42);
        },
        other => panic!("expected next_round, got {other:?}"),
    }
    assert_eq!(server.hand(bob).map(<[Card]>::len), Some(5));

    server.send(bob, &ClientMessage::Call { player_id: "bob".to_string() }).unwrap();
    assert!(server.last_event(alice, "final_result").is_some());
    invariants.assert_all(&server.snapshot(), "after final call");
}

#[test]
fn reset_returns_room_to_lobby() {
    let mut server = SimServer::with_seed(4);
    let alice = join(&mut server, "alice");
    let bob = join(&mut server, "bob");

    server.send(alice, &ClientMessage::StartGame { room_id: room(), total_rounds: 1 }).unwrap();

    server.send(alice, &ClientMessage::ResetRoom { room_id: room() }).unwrap();
    assert_eq!(server.last_error(alice).map(|(code, _)| code), Some(ErrorCode::InvalidState));

    server.send(alice, &ClientMessage::Call { player_id: "alice".to_string() }).unwrap();
    server.send(alice, &ClientMessage::ResetRoom { room_id: room() }).unwrap();

    match server.last_event(bob, "room_reset") {
        Some(ServerMessage::RoomReset { players, host_id }) => {
            assert_eq!(host_id.as_deref(), Some("alice"));
            assert!(players.iter().all(|p| p.score == 0 && p.hand_count == 0));
        },
        other => panic!("expected room_reset, got {other:?}"),
    }

    let session = server.driver().room(&room()).unwrap();
    assert_eq!(session.status(), GameStatus::Waiting);
    assert_eq!(session.deck_count(), 0);
    assert!(session.table().is_empty());
}

#[test]
fn turn_order_is_enforced() {
    let mut server = SimServer::with_seed(5);
    let alice = join(&mut server, "alice");
    let bob = join(&mut server, "bob");

    server.send(alice, &ClientMessage::StartGame { room_id: room(), total_rounds: 1 }).unwrap();
    server.send(bob, &ClientMessage::DrawCard { player_id: "bob".to_string() }).unwrap();

    assert_eq!(server.last_error(bob).map(|(code, _)| code), Some(ErrorCode::NotYourTurn));
    assert_eq!(server.driver().room(&room()).unwrap().deck_count(), 42);
}
