//! # chatgames - Minigame Economy for Chat Bots
//!
//! chatgames implements the command handlers behind a set of chat-bot
//! minigames. Every command reads and updates a per-user record (points,
//! streaks, inventory, achievements) kept in a host-supplied key-value store
//! and answers with a line of text.
//!
//! ## Features
//!
//! - **Guess the number**: timed rounds with attempt and speed scoring, paid hints
//! - **Daily sign-in**: streak bonuses, weekly bonus, double cards
//! - **Lottery**: SSR/SR/R/N draws, free tickets and lucky charms
//! - **Shop & inventory**: immediate-effect and storable items
//! - **Cow**: a virtual pet that levels up through feeding, play and petting
//! - **Prize wheel**: daily free spin, capped paid spins, configurable prize table
//! - **Achievements**: threshold unlocks with point rewards
//! - **Rate limiting**: daily quota and per-command cooldown
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use chatgames::bot::{dispatch, TextEvent};
//! use chatgames::config::Config;
//! use chatgames::games::GameService;
//! use chatgames::storage::MemoryKvStore;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = GameService::new(Config::default(), Arc::new(MemoryKvStore::new()))?;
//!     let mut event = TextEvent::new("alice", "discord");
//!     dispatch(&service, &mut event, "sign").await;
//!     println!("{}", event.take_reply().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`games`] - records, rules, achievements and the [`games::GameService`]
//! - [`bot`] - message-event seam and text command dispatch
//! - [`storage`] - key-value store trait with sled and in-memory backends
//! - [`config`] - TOML configuration and validation
//! - [`logutil`] - helpers for single-line logging of user text

pub mod bot;
pub mod config;
pub mod games;
pub mod logutil;
pub mod storage;
