//! Guess-the-number sessions.
//!
//! A session is ephemeral: it lives in a [`GameStateStore`] keyed like the
//! user record, is replaced by a new `start`, and is deleted when the player
//! wins or gives up. Points and counters are handled by the caller; this
//! module only tracks the game itself and computes the score.

use std::collections::HashMap;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::config::GuessConfig;
use crate::games::errors::GameError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuessGame {
    pub target_number: u32,
    pub attempts: u32,
    /// Epoch milliseconds
    pub start_time: i64,
    pub max_number: u32,
}

/// Keyed registry of running games.
#[async_trait]
pub trait GameStateStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<GuessGame>;
    async fn set(&self, key: &str, game: GuessGame);
    async fn delete(&self, key: &str);
}

#[derive(Default)]
pub struct MemoryGameStore {
    games: RwLock<HashMap<String, GuessGame>>,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameStateStore for MemoryGameStore {
    async fn get(&self, key: &str) -> Option<GuessGame> {
        self.games.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, game: GuessGame) {
        self.games.write().await.insert(key.to_string(), game);
    }

    async fn delete(&self, key: &str) {
        self.games.write().await.remove(key);
    }
}

/// Distance band reported with a wrong guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Proximity {
    /// More than 30 away
    Far,
    /// 11 to 30 away
    Warm,
    /// 10 or less away
    Close,
}

impl Proximity {
    pub fn from_distance(distance: u32) -> Self {
        if distance > 30 {
            Proximity::Far
        } else if distance > 10 {
            Proximity::Warm
        } else {
            Proximity::Close
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Proximity::Far => "Way off!",
            Proximity::Warm => "Getting warmer.",
            Proximity::Close => "Very close!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuessResult {
    Correct {
        target: u32,
        attempts: u32,
        elapsed_secs: i64,
    },
    TooLow {
        attempts: u32,
        proximity: Proximity,
    },
    TooHigh {
        attempts: u32,
        proximity: Proximity,
    },
}

/// Points awarded for a win.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub base: u64,
    pub time_bonus: u64,
    pub exp_bonus: u64,
}

impl Score {
    pub fn total(&self) -> u64 {
        self.base + self.time_bonus + self.exp_bonus
    }
}

/// Score a win. Fewer attempts and a faster finish both pay more; each part
/// bottoms out at one unit rather than zero.
pub fn score(cfg: &GuessConfig, attempts: u32, elapsed_secs: i64, exp_card: bool) -> Score {
    let attempt_units = cfg.max_attempt_score.saturating_sub(attempts).max(1) as u64;
    let time_units = (cfg.time_window_secs - elapsed_secs.max(0)).max(1) as u64;
    let base = attempt_units * cfg.base_points;
    let time_bonus = time_units * cfg.time_bonus_rate;
    let exp_bonus = if exp_card {
        (base + time_bonus) * cfg.exp_card_bonus_percent / 100
    } else {
        0
    };
    Score {
        base,
        time_bonus,
        exp_bonus,
    }
}

/// Parse a guess, rejecting anything that is not an integer.
pub fn parse_guess(text: &str) -> Result<i64, GameError> {
    text.trim()
        .parse::<i64>()
        .map_err(|_| GameError::InvalidNumber(text.to_string()))
}

/// Game operations over an injected [`GameStateStore`].
pub struct GuessSessions<'a> {
    store: &'a dyn GameStateStore,
}

impl<'a> GuessSessions<'a> {
    pub fn new(store: &'a dyn GameStateStore) -> Self {
        Self { store }
    }

    /// Begin a new game, replacing any game already running under `key`.
    pub async fn start<R: Rng>(
        &self,
        key: &str,
        max_number: u32,
        rng: &mut R,
        now_ms: i64,
    ) -> GuessGame {
        let max_number = max_number.max(1);
        let game = GuessGame {
            target_number: rng.gen_range(1..=max_number),
            attempts: 0,
            start_time: now_ms,
            max_number,
        };
        self.store.set(key, game.clone()).await;
        game
    }

    pub async fn active(&self, key: &str) -> Option<GuessGame> {
        self.store.get(key).await
    }

    pub async fn guess(&self, key: &str, value: i64, now_ms: i64) -> Result<GuessResult, GameError> {
        let mut game = self.store.get(key).await.ok_or(GameError::NoActiveGame)?;
        if value < 1 || value > game.max_number as i64 {
            return Err(GameError::OutOfRange {
                value,
                max: game.max_number,
            });
        }
        game.attempts += 1;
        let target = game.target_number as i64;

        if value == target {
            self.store.delete(key).await;
            return Ok(GuessResult::Correct {
                target: game.target_number,
                attempts: game.attempts,
                elapsed_secs: (now_ms - game.start_time).max(0) / 1000,
            });
        }

        let proximity = Proximity::from_distance((value - target).unsigned_abs() as u32);
        let attempts = game.attempts;
        self.store.set(key, game).await;
        if value < target {
            Ok(GuessResult::TooLow { attempts, proximity })
        } else {
            Ok(GuessResult::TooHigh { attempts, proximity })
        }
    }

    /// Range of width `max/10` either side of the target, clamped to the board.
    pub async fn hint(&self, key: &str) -> Result<(u32, u32), GameError> {
        let game = self.store.get(key).await.ok_or(GameError::NoActiveGame)?;
        let spread = game.max_number / 10;
        let low = game.target_number.saturating_sub(spread).max(1);
        let high = game.target_number.saturating_add(spread).min(game.max_number);
        Ok((low, high))
    }

    /// End the game and reveal the target.
    pub async fn give_up(&self, key: &str) -> Result<u32, GameError> {
        let game = self.store.get(key).await.ok_or(GameError::NoActiveGame)?;
        self.store.delete(key).await;
        Ok(game.target_number)
    }
}
