//! Wall-clock time and OS randomness for the production server.

use std::time::{Duration, Instant};

use fadu_core::Environment;

/// Production environment.
///
/// Time comes from [`Instant`], sleeping from tokio, and every random byte
/// (deck shuffles, room codes, reconnect tokens, connection IDs) from the OS
/// CSPRNG via getrandom. Nothing here is reproducible between runs; tests use
/// a seeded environment instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create the environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }

    /// # Panics
    ///
    /// If the OS RNG fails. Dealing from a predictable deck or issuing a
    /// guessable token is worse than stopping.
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_moves_forward() {
        let env = SystemEnv::new();
        let before = env.now();
        std::thread::sleep(Duration::from_millis(5));
        assert!(env.now() > before);
    }

    #[test]
    fn tokens_do_not_repeat() {
        let env = SystemEnv::new();
        let tokens: Vec<u64> = (0..16).map(|_| env.random_u64()).collect();

        let mut unique = tokens.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), tokens.len());
    }

    #[test]
    fn shuffle_keeps_every_card() {
        let env = SystemEnv::new();

        let mut deck: Vec<u8> = (0..52).collect();
        env.shuffle(&mut deck);
        deck.sort_unstable();

        assert_eq!(deck, (0..52).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn sleep_waits() {
        let env = SystemEnv::new();
        let start = env.now();
        env.sleep(Duration::from_millis(20)).await;
        assert!(env.now() - start >= Duration::from_millis(20));
    }
}
