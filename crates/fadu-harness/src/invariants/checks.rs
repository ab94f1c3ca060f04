//! Standard invariant implementations.

use std::collections::HashSet;

use fadu_core::deck::DECK_SIZE;
use fadu_proto::GameStatus;

use super::{Invariant, InvariantResult, Violation, snapshot::SystemSnapshot};

/// Once dealt, hands, table and deck hold exactly one full deck.
///
/// Before the first deal (and after a reset) no cards exist at all.
pub struct CardConservation;

impl Invariant for CardConservation {
    fn name(&self) -> &'static str {
        "card_conservation"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for room in &state.rooms {
            let total = room.all_cards().count();

            if room.status == GameStatus::Waiting {
                if total != 0 {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!("room {} is waiting but holds {total} cards", room.code),
                    });
                }
                continue;
            }

            let distinct: HashSet<_> = room.all_cards().collect();
            if total != DECK_SIZE || distinct.len() != DECK_SIZE {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {} holds {total} cards ({} distinct), expected {DECK_SIZE}",
                        room.code,
                        distinct.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A non-empty room has a host, and the host is connected whenever anyone is.
pub struct SingleConnectedHost;

impl Invariant for SingleConnectedHost {
    fn name(&self) -> &'static str {
        "single_connected_host"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for room in &state.rooms {
            let Some(host) = &room.host else {
                if room.seats.is_empty() {
                    continue;
                }
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {} has seats but no host", room.code),
                });
            };

            let Some(seat) = room.seats.iter().find(|s| &s.name == host) else {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!("room {} host {host} has no seat", room.code),
                });
            };

            if !seat.connected && room.seats.iter().any(|s| s.connected) {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {} host {host} is disconnected while others are present",
                        room.code
                    ),
                });
            }
        }
        Ok(())
    }
}

/// A playing room has everyone connected and the turn on a real seat.
/// A paused room is missing someone.
pub struct TurnOnConnectedSeat;

impl Invariant for TurnOnConnectedSeat {
    fn name(&self) -> &'static str {
        "turn_on_connected_seat"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for room in &state.rooms {
            match room.status {
                GameStatus::Playing => {
                    if room.current_turn.is_none_or(|i| i >= room.seats.len()) {
                        return Err(Violation {
                            invariant: self.name(),
                            message: format!("room {} is playing with no valid turn", room.code),
                        });
                    }

                    if let Some(missing) = room.seats.iter().find(|s| !s.connected) {
                        return Err(Violation {
                            invariant: self.name(),
                            message: format!(
                                "room {} is playing while {} is disconnected",
                                room.code, missing.name
                            ),
                        });
                    }
                },
                GameStatus::Paused => {
                    if room.seats.iter().all(|s| s.connected) {
                        return Err(Violation {
                            invariant: self.name(),
                            message: format!("room {} is paused with nobody missing", room.code),
                        });
                    }
                },
                _ => {},
            }
        }
        Ok(())
    }
}

/// Cumulative scores equal the sum of per-round points, and every seat has
/// one entry per completed round.
pub struct ScoreLedger;

impl Invariant for ScoreLedger {
    fn name(&self) -> &'static str {
        "score_ledger"
    }

    fn check(&self, state: &SystemSnapshot) -> InvariantResult {
        for room in &state.rooms {
            let rounds = room.seats.first().map_or(0, |s| s.round_points.len());

            for seat in &room.seats {
                let sum: i32 = seat.round_points.iter().sum();
                if sum != seat.score {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "room {} seat {} scores {} but rounds sum to {sum}",
                            room.code, seat.name, seat.score
                        ),
                    });
                }
                if seat.round_points.len() != rounds {
                    return Err(Violation {
                        invariant: self.name(),
                        message: format!(
                            "room {} seat {} has {} round entries, expected {rounds}",
                            room.code,
                            seat.name,
                            seat.round_points.len()
                        ),
                    });
                }
            }

            if rounds as u32 > room.current_round {
                return Err(Violation {
                    invariant: self.name(),
                    message: format!(
                        "room {} recorded {rounds} rounds but is on round {}",
                        room.code, room.current_round
                    ),
                });
            }
        }
        Ok(())
    }
}
