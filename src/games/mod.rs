//! # Minigames
//!
//! The user economy behind the chat minigames: guess-the-number, daily
//! sign-in, lottery, shop and inventory, a virtual pet cow, a prize wheel and
//! achievements.
//!
//! Layout:
//! - [`types`] - the persisted [`UserRecord`] and its inventory helpers
//! - [`catalog`] - static shop, lottery, wheel and cow-level tables
//! - [`economy`], [`cow`], [`guess`] - pure rules over a record
//! - [`achievement`] - unlock registry evaluated after every event
//! - [`rate_limit`] - daily quota and cooldown
//! - [`store`] - record persistence and per-user locking
//! - [`service`] - [`GameService`], one async handler per command
//!
//! Rules never touch storage or randomness directly, so they are tested in
//! isolation; the service wires them to a [`crate::storage::KvStore`], a
//! [`clock::Clock`] and a seeded RNG.

pub mod achievement;
pub mod catalog;
pub mod clock;
pub mod cow;
pub mod economy;
pub mod errors;
pub mod guess;
pub mod rate_limit;
pub mod service;
pub mod store;
pub mod types;

pub use errors::{ErrorKind, GameError};
pub use service::GameService;
pub use types::{user_key, CowRecord, InventoryItem, UserRecord};
