//! # Configuration Management Module
//!
//! Centralized, TOML-backed configuration for the minigame service. Every
//! section and field has a default, so an empty file (or no file at all) yields
//! the stock economy: 100 starting points, 50 commands per day, a 5 second
//! cooldown, and the default shop and wheel.
//!
//! ## Configuration Structure
//!
//! - [`LoggingConfig`] - log level and optional log file
//! - [`StorageConfig`] - where the sled database lives
//! - [`LimitsConfig`] - daily quota, cooldown, and which commands they apply to
//! - [`PointsConfig`] - starting balance for new users
//! - [`SignConfig`], [`LotteryConfig`], [`GuessConfig`], [`SpinConfig`],
//!   [`CowConfig`], [`ShopConfig`] - per-game tuning
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chatgames::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     config.validate()?;
//!     println!("Daily limit: {}", config.limits.daily_command_limit);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [limits]
//! daily_command_limit = 50
//! command_cooldown_ms = 5000
//! rate_limited_commands = ["guess", "sign", "lottery", "use"]
//!
//! [shop.price_overrides]
//! coffee = 60
//!
//! [[spin.prizes]]
//! name = "Grand Prize"
//! probability = 0.5
//! points = 500
//! description = "500 points"
//! ```
//!
//! Wheel prize probabilities must sum to 1.0; [`Config::validate`] refuses to
//! start otherwise.

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::fs;

use crate::games::catalog::{self, default_spin_prizes, validate_spin_prizes, ShopItem, SpinPrize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub points: PointsConfig,
    #[serde(default)]
    pub sign: SignConfig,
    #[serde(default)]
    pub lottery: LotteryConfig,
    #[serde(default)]
    pub guess: GuessConfig,
    #[serde(default)]
    pub spin: SpinConfig,
    #[serde(default)]
    pub cow: CowConfig,
    #[serde(default)]
    pub shop: ShopConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some("chatgames.log".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
    /// Optional override for the sled database path; defaults to `<data_dir>/records`.
    #[serde(default)]
    pub db_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
            db_path: None,
        }
    }
}

impl StorageConfig {
    pub fn records_path(&self) -> PathBuf {
        match &self.db_path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(&self.data_dir).join("records"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub daily_command_limit: u32,
    pub command_cooldown_ms: i64,
    /// Command tokens that count against the quota and cooldown.
    pub rate_limited_commands: Vec<String>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            daily_command_limit: 50,
            command_cooldown_ms: 5000,
            rate_limited_commands: ["guess", "sign", "lottery", "use"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl LimitsConfig {
    pub fn is_rate_limited(&self, command: &str) -> bool {
        self.rate_limited_commands
            .iter()
            .any(|c| c.eq_ignore_ascii_case(command))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub initial_points: u64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self { initial_points: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignConfig {
    pub base_reward: u64,
    /// Bonus points per day of streak
    pub consecutive_bonus: u64,
    pub max_consecutive_bonus: u64,
    pub week_bonus: u64,
    /// Streak length that earns `week_bonus`
    pub week_length: u32,
}

impl Default for SignConfig {
    fn default() -> Self {
        Self {
            base_reward: 10,
            consecutive_bonus: 2,
            max_consecutive_bonus: 100,
            week_bonus: 50,
            week_length: 7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LotteryConfig {
    pub cost: u64,
    pub ssr_rate: f64,
    pub sr_rate: f64,
    pub r_rate: f64,
    pub ssr_reward: u64,
    pub sr_reward: u64,
    pub r_reward: u64,
    /// Multiplier applied to every threshold while a lucky charm is active
    pub lucky_charm_boost: f64,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            cost: 10,
            ssr_rate: 0.05,
            sr_rate: 0.10,
            r_rate: 0.25,
            ssr_reward: 100,
            sr_reward: 30,
            r_reward: 10,
            lucky_charm_boost: 1.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GuessConfig {
    pub max_number: u32,
    pub base_points: u64,
    pub time_bonus_rate: u64,
    /// Attempts at or beyond this score the minimum base of one unit
    pub max_attempt_score: u32,
    /// Seconds after which the time bonus bottoms out
    pub time_window_secs: i64,
    pub exp_card_bonus_percent: u64,
}

impl Default for GuessConfig {
    fn default() -> Self {
        Self {
            max_number: 100,
            base_points: 5,
            time_bonus_rate: 2,
            max_attempt_score: 10,
            time_window_secs: 60,
            exp_card_bonus_percent: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    pub cost: u64,
    /// Free spins topped up on the first spin of each day
    pub daily_free: u32,
    /// Paid spins allowed per day (0 = unlimited)
    pub paid_limit: u32,
    #[serde(default = "default_spin_prizes")]
    pub prizes: Vec<SpinPrize>,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            cost: 50,
            daily_free: 1,
            paid_limit: 3,
            prizes: default_spin_prizes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CowConfig {
    pub feed_cost: u64,
    pub play_cost: u64,
    pub feed_restore: u8,
    pub play_restore: u8,
    pub feed_favor: u64,
    pub feed_exp: u64,
    pub play_favor: u64,
    pub play_exp: u64,
    pub pet_favor: u64,
    pub pet_exp: u64,
    /// Hunger and mood lost per full hour without care
    pub decay_per_hour: u8,
}

impl Default for CowConfig {
    fn default() -> Self {
        Self {
            feed_cost: 10,
            play_cost: 5,
            feed_restore: 30,
            play_restore: 30,
            feed_favor: 5,
            feed_exp: 10,
            play_favor: 8,
            play_exp: 15,
            pet_favor: 3,
            pet_exp: 5,
            decay_per_hour: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Price overrides keyed by item id
    #[serde(default)]
    pub price_overrides: BTreeMap<String, u64>,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;

        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;

        Ok(())
    }

    /// Shop stock with configured price overrides applied.
    pub fn shop_catalog(&self) -> Vec<ShopItem> {
        catalog::shop_catalog(&self.shop.price_overrides)
    }

    /// Check values that would make the games misbehave.
    pub fn validate(&self) -> Result<()> {
        validate_spin_prizes(&self.spin.prizes).map_err(|e| anyhow!(e))?;
        if self.guess.max_number == 0 {
            return Err(anyhow!("guess.max_number must be at least 1"));
        }
        if self.limits.command_cooldown_ms < 0 {
            return Err(anyhow!("limits.command_cooldown_ms must not be negative"));
        }
        let l = &self.lottery;
        if l.ssr_rate < 0.0 || l.sr_rate < 0.0 || l.r_rate < 0.0 {
            return Err(anyhow!("lottery rates must not be negative"));
        }
        if l.ssr_rate + l.sr_rate + l.r_rate > 1.0 {
            return Err(anyhow!("lottery rates must not exceed 1 in total"));
        }
        Ok(())
    }
}
