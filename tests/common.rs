//! Test utilities & fixtures shared by the integration tests.

use std::path::Path;
use std::sync::Arc;

use chatgames::config::Config;
use chatgames::games::clock::ManualClock;
use chatgames::games::guess::MemoryGameStore;
use chatgames::games::GameService;
use chatgames::storage::{KvStore, MemoryKvStore, SledKvStore};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Long enough to clear the default command cooldown.
#[allow(dead_code)]
pub const COOLDOWN_MS: i64 = 5_000;

#[allow(dead_code)]
pub const PLATFORM: &str = "test";

pub fn start_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

/// Everything a test needs to drive and inspect a service.
#[allow(dead_code)]
pub struct Harness {
    pub service: GameService,
    pub clock: Arc<ManualClock>,
    pub kv: Arc<dyn KvStore>,
    pub games: Arc<MemoryGameStore>,
}

#[allow(dead_code)]
impl Harness {
    /// Let the cooldown run out before the next rate-limited command.
    pub fn wait_cooldown(&self) {
        self.clock.advance_ms(COOLDOWN_MS);
    }
}

fn build(config: Config, kv: Arc<dyn KvStore>, seed: u64) -> Harness {
    let clock = Arc::new(ManualClock::at_noon(start_day()));
    let games = Arc::new(MemoryGameStore::new());
    let service = GameService::with_parts(
        config,
        kv.clone(),
        games.clone(),
        clock.clone(),
        StdRng::seed_from_u64(seed),
    )
    .expect("valid config");
    Harness {
        service,
        clock,
        kv,
        games,
    }
}

/// In-memory service with default configuration.
#[allow(dead_code)]
pub fn harness() -> Harness {
    build(Config::default(), Arc::new(MemoryKvStore::new()), 42)
}

#[allow(dead_code)]
pub fn harness_with(config: Config) -> Harness {
    build(config, Arc::new(MemoryKvStore::new()), 42)
}

/// Service backed by a sled database under `dir`.
#[allow(dead_code)]
pub fn sled_harness(dir: &Path) -> Harness {
    let kv = SledKvStore::open(dir).expect("open sled");
    build(Config::default(), Arc::new(kv), 42)
}
