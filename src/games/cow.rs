//! Virtual pet ("cow") rules.
//!
//! A user adopts at most one cow. Feeding and playing cost points and restore
//! hunger or mood; petting is free. Every interaction grants exp and favor,
//! and the cow climbs one level at a time through [`COW_LEVELS`] once both
//! thresholds of the next level are met.
//!
//! Hunger and mood wear down with time. [`decay`] applies the loss lazily from
//! `last_decay_time`, so the service calls it before any cow command.

use log::info;

use crate::config::CowConfig;
use crate::games::catalog::{cow_level, next_cow_level, CowLevel, COW_LEVELS};
use crate::games::errors::GameError;
use crate::games::types::{CowRecord, UserRecord};
use crate::logutil::escape_log;

const HOUR_MS: i64 = 60 * 60 * 1000;
const STAT_MAX: u8 = 100;

/// Longest nickname accepted by adopt and rename.
pub const MAX_NAME_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CareOutcome {
    pub cow_name: String,
    pub cost: u64,
    pub exp_gained: u64,
    pub favor_gained: u64,
    /// Hunger after feeding or mood after playing; `None` for petting
    pub stat_after: Option<u8>,
    pub level_up: Option<&'static CowLevel>,
}

fn clean_name(name: &str) -> Result<String, GameError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(GameError::MissingArgument("nickname"));
    }
    Ok(name.chars().take(MAX_NAME_LEN).collect())
}

fn cow_mut(record: &mut UserRecord) -> Result<&mut CowRecord, GameError> {
    record.cow.as_mut().ok_or(GameError::NoPet)
}

/// Apply hunger and mood loss for every whole hour since the last decay.
/// Returns true when the cow changed.
pub fn decay(record: &mut UserRecord, cfg: &CowConfig, now_ms: i64) -> bool {
    let Some(cow) = record.cow.as_mut() else {
        return false;
    };
    let hours = (now_ms - cow.last_decay_time) / HOUR_MS;
    if hours <= 0 {
        return false;
    }
    let loss = (hours as u64 * cfg.decay_per_hour as u64).min(STAT_MAX as u64) as u8;
    cow.hunger = cow.hunger.saturating_sub(loss);
    cow.mood = cow.mood.saturating_sub(loss);
    cow.last_decay_time += hours * HOUR_MS;
    true
}

pub fn adopt<'a>(
    record: &'a mut UserRecord,
    name: &str,
    now_ms: i64,
) -> Result<&'a CowRecord, GameError> {
    if let Some(cow) = &record.cow {
        return Err(GameError::PetAlreadyAdopted(cow.name.clone()));
    }
    let name = clean_name(name)?;
    info!(
        "{} adopted a cow named {}",
        escape_log(&record.key()),
        escape_log(&name)
    );
    Ok(record.cow.insert(CowRecord::new(&name, now_ms)))
}

/// Returns the previous name.
pub fn rename(record: &mut UserRecord, name: &str) -> Result<String, GameError> {
    let cow = cow_mut(record)?;
    let name = clean_name(name)?;
    Ok(std::mem::replace(&mut cow.name, name))
}

/// Advance at most one level if the next level's exp and favor are both met.
pub fn check_level_up(cow: &mut CowRecord) -> Option<&'static CowLevel> {
    let next = next_cow_level(cow.level)?;
    if cow.exp >= next.exp_needed && cow.favor >= next.favor_needed {
        cow.level = next.level;
        Some(next)
    } else {
        None
    }
}

fn grant(cow: &mut CowRecord, exp: u64, favor: u64) -> Option<&'static CowLevel> {
    cow.exp = cow.exp.saturating_add(exp);
    cow.favor = cow.favor.saturating_add(favor);
    let level = check_level_up(cow);
    if let Some(level) = level {
        info!("Cow {} reached level {} ({})", escape_log(&cow.name), level.level, level.name);
    }
    level
}

pub fn feed(record: &mut UserRecord, cfg: &CowConfig, now_ms: i64) -> Result<CareOutcome, GameError> {
    let cow = record.cow.as_ref().ok_or(GameError::NoPet)?;
    if cow.hunger >= STAT_MAX {
        return Err(GameError::StatAlreadyFull {
            name: cow.name.clone(),
            stat: "hunger",
        });
    }
    record.spend_points(cfg.feed_cost)?;

    let cow = cow_mut(record)?;
    cow.hunger = cow.hunger.saturating_add(cfg.feed_restore).min(STAT_MAX);
    cow.last_feed_time = now_ms;
    let level_up = grant(cow, cfg.feed_exp, cfg.feed_favor);
    Ok(CareOutcome {
        cow_name: cow.name.clone(),
        cost: cfg.feed_cost,
        exp_gained: cfg.feed_exp,
        favor_gained: cfg.feed_favor,
        stat_after: Some(cow.hunger),
        level_up,
    })
}

pub fn play(record: &mut UserRecord, cfg: &CowConfig, now_ms: i64) -> Result<CareOutcome, GameError> {
    let cow = record.cow.as_ref().ok_or(GameError::NoPet)?;
    if cow.mood >= STAT_MAX {
        return Err(GameError::StatAlreadyFull {
            name: cow.name.clone(),
            stat: "mood",
        });
    }
    record.spend_points(cfg.play_cost)?;

    let cow = cow_mut(record)?;
    cow.mood = cow.mood.saturating_add(cfg.play_restore).min(STAT_MAX);
    cow.last_play_time = now_ms;
    let level_up = grant(cow, cfg.play_exp, cfg.play_favor);
    Ok(CareOutcome {
        cow_name: cow.name.clone(),
        cost: cfg.play_cost,
        exp_gained: cfg.play_exp,
        favor_gained: cfg.play_favor,
        stat_after: Some(cow.mood),
        level_up,
    })
}

pub fn pet(record: &mut UserRecord, cfg: &CowConfig) -> Result<CareOutcome, GameError> {
    let cow = cow_mut(record)?;
    let level_up = grant(cow, cfg.pet_exp, cfg.pet_favor);
    Ok(CareOutcome {
        cow_name: cow.name.clone(),
        cost: 0,
        exp_gained: cfg.pet_exp,
        favor_gained: cfg.pet_favor,
        stat_after: None,
        level_up,
    })
}

/// Multi-line status card for the user's cow.
pub fn status_text(cow: &CowRecord) -> String {
    let level = cow_level(cow.level);
    let mut out = format!(
        "🐮 {} - Lv.{} {}\nHealth {}/100 | Mood {}/100 | Hunger {}/100\nExp {} | Favor {}",
        cow.name, level.level, level.name, cow.health, cow.mood, cow.hunger, cow.exp, cow.favor
    );
    match next_cow_level(cow.level) {
        Some(next) => out.push_str(&format!(
            "\nNext: Lv.{} {} at {} exp / {} favor",
            next.level, next.name, next.exp_needed, next.favor_needed
        )),
        None => out.push_str(&format!("\nMax level reached ({} levels).", COW_LEVELS.len())),
    }
    out
}
