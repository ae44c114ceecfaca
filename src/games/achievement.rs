//! Achievement registry and unlock evaluation.
//!
//! Achievements are threshold predicates over a [`UserRecord`]. They are
//! evaluated after every economic event; each one unlocks at most once and
//! pays its reward on unlock.

use log::info;

use crate::games::types::UserRecord;
use crate::logutil::escape_log;

#[derive(Debug, Clone, Copy)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub reward: u64,
    pub predicate: fn(&UserRecord) -> bool,
}

/// An achievement unlocked by the latest [`check`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockedAchievement {
    pub id: &'static str,
    pub name: &'static str,
    pub reward: u64,
}

impl UnlockedAchievement {
    pub fn display_line(&self) -> String {
        format!("🏆 Achievement unlocked: {} (+{} points)", self.name, self.reward)
    }
}

pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement {
        id: "first_blood",
        name: "First Blood",
        description: "Win your first guessing game",
        reward: 50,
        predicate: |u| u.games_won >= 1,
    },
    Achievement {
        id: "sign_master",
        name: "Sign-in Master",
        description: "Sign in 7 days in a row",
        reward: 100,
        predicate: |u| u.consecutive_days >= 7,
    },
    Achievement {
        id: "millionaire",
        name: "Millionaire",
        description: "Hold 500 points at once",
        reward: 200,
        predicate: |u| u.points >= 500,
    },
    Achievement {
        id: "game_addict",
        name: "Game Addict",
        description: "Play 20 guessing games",
        reward: 150,
        predicate: |u| u.games_played >= 20,
    },
    Achievement {
        id: "lottery_king",
        name: "Lottery King",
        description: "Pull SSR 5 times",
        reward: 300,
        predicate: |u| u.ssr_count >= 5,
    },
    Achievement {
        id: "shopper",
        name: "Big Spender",
        description: "Spend 1000 points in total",
        reward: 250,
        predicate: |u| u.total_spent >= 1000,
    },
    Achievement {
        id: "spin_beginner",
        name: "First Spin",
        description: "Spin the prize wheel once",
        reward: 20,
        predicate: |u| u.wheel.total_spins >= 1,
    },
    Achievement {
        id: "spin_regular",
        name: "Wheel Regular",
        description: "Spin the prize wheel 10 times",
        reward: 100,
        predicate: |u| u.wheel.total_spins >= 10,
    },
    Achievement {
        id: "spin_master",
        name: "Wheel Master",
        description: "Spin the wheel 7 days in a row",
        reward: 200,
        predicate: |u| u.wheel.spin_streak >= 7,
    },
    Achievement {
        id: "lucky_star",
        name: "Lucky Star",
        description: "Hit the wheel's grand prize",
        reward: 300,
        predicate: |u| u.wheel.top_tier_hits >= 1,
    },
];

pub fn find(id: &str) -> Option<&'static Achievement> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

/// Unlock every achievement whose predicate now holds, in catalog order.
///
/// Rewards are credited before the next predicate is evaluated, so a reward
/// can carry the record over another threshold (e.g. `millionaire`) in the
/// same pass. The caller persists the record when the result is non-empty.
pub fn check(record: &mut UserRecord) -> Vec<UnlockedAchievement> {
    let mut unlocked = Vec::new();
    for achievement in ACHIEVEMENTS {
        if record.has_achievement(achievement.id) || !(achievement.predicate)(record) {
            continue;
        }
        record.achievements.push(achievement.id.to_string());
        record.add_points(achievement.reward);
        info!(
            "Achievement {} unlocked for {}",
            achievement.id,
            escape_log(&record.key())
        );
        unlocked.push(UnlockedAchievement {
            id: achievement.id,
            name: achievement.name,
            reward: achievement.reward,
        });
    }
    unlocked
}
