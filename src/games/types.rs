use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const USER_SCHEMA_VERSION: u8 = 1;

/// Hard cap on the stack size of a single inventory entry.
pub const MAX_ITEM_COUNT: u32 = 999;

/// Build the key under which a user's record (and active guess game) is stored.
pub fn user_key(user_id: &str, platform: &str) -> String {
    format!("{}:{}", platform, user_id)
}

/// One stack of items in a user's inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub count: u32,
}

/// Virtual pet owned by a user. Created once by `cow adopt`, never removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CowRecord {
    pub name: String,
    pub level: u32,
    pub exp: u64,
    pub favor: u64,
    pub health: u8,
    pub mood: u8,
    pub hunger: u8,
    #[serde(default)]
    pub last_feed_time: i64,
    #[serde(default)]
    pub last_play_time: i64,
    /// Last instant hunger/mood decay was applied (epoch ms)
    #[serde(default)]
    pub last_decay_time: i64,
    pub created_at: i64,
}

impl CowRecord {
    pub fn new(name: &str, now_ms: i64) -> Self {
        Self {
            name: name.to_string(),
            level: 1,
            exp: 0,
            favor: 0,
            health: 100,
            mood: 100,
            hunger: 100,
            last_feed_time: 0,
            last_play_time: 0,
            last_decay_time: now_ms,
            created_at: now_ms,
        }
    }
}

/// Counters kept for the prize wheel and its achievements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelStats {
    #[serde(default)]
    pub total_spins: u32,
    #[serde(default)]
    pub paid_spins_today: u32,
    #[serde(default)]
    pub last_spin_date: Option<NaiveDate>,
    /// Consecutive calendar days with at least one spin
    #[serde(default)]
    pub spin_streak: u32,
    #[serde(default)]
    pub top_tier_hits: u32,
}

/// Durable per-user economic state, keyed by `platform:user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub platform: String,
    pub points: u64,
    #[serde(default)]
    pub last_sign_date: Option<NaiveDate>,
    #[serde(default)]
    pub consecutive_days: u32,
    #[serde(default)]
    pub total_sign_days: u32,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub games_won: u32,
    #[serde(default)]
    pub total_spent: u64,
    #[serde(default)]
    pub ssr_count: u32,
    #[serde(default)]
    pub has_double_card: bool,
    #[serde(default)]
    pub free_lottery_count: u32,
    #[serde(default)]
    pub hint_tokens: u32,
    #[serde(default)]
    pub lucky_charm_count: u32,
    #[serde(default)]
    pub free_spin_count: u32,
    /// Set by using an experience card; consumed by the next guess-game win
    #[serde(default)]
    pub exp_card_active: bool,
    #[serde(default)]
    pub last_command_time: i64,
    #[serde(default)]
    pub daily_command_count: u32,
    #[serde(default)]
    pub last_command_date: Option<NaiveDate>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub cow: Option<CowRecord>,
    #[serde(default)]
    pub wheel: WheelStats,
    #[serde(default)]
    pub schema_version: u8,
}

impl UserRecord {
    /// Defaults granted to a user on first contact.
    pub fn new(user_id: &str, platform: &str, initial_points: u64, today: NaiveDate) -> Self {
        Self {
            user_id: user_id.to_string(),
            platform: platform.to_string(),
            points: initial_points,
            last_sign_date: None,
            consecutive_days: 0,
            total_sign_days: 0,
            games_played: 0,
            games_won: 0,
            total_spent: 0,
            ssr_count: 0,
            has_double_card: false,
            free_lottery_count: 0,
            hint_tokens: 0,
            lucky_charm_count: 0,
            free_spin_count: 1,
            exp_card_active: false,
            last_command_time: 0,
            daily_command_count: 0,
            last_command_date: Some(today),
            achievements: Vec::new(),
            inventory: Vec::new(),
            cow: None,
            wheel: WheelStats::default(),
            schema_version: USER_SCHEMA_VERSION,
        }
    }

    pub fn key(&self) -> String {
        user_key(&self.user_id, &self.platform)
    }

    pub fn add_points(&mut self, amount: u64) {
        self.points = self.points.saturating_add(amount);
    }

    /// Deduct `amount`, failing without mutation when the balance is short.
    pub fn spend_points(&mut self, amount: u64) -> Result<(), crate::games::GameError> {
        if self.points < amount {
            return Err(crate::games::GameError::InsufficientPoints {
                needed: amount,
                available: self.points,
            });
        }
        self.points -= amount;
        self.total_spent = self.total_spent.saturating_add(amount);
        Ok(())
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a == id)
    }

    /// Find an inventory stack by id or by display name.
    pub fn find_item(&self, id_or_name: &str) -> Option<&InventoryItem> {
        self.inventory
            .iter()
            .find(|item| item.id == id_or_name || item.name == id_or_name)
    }

    /// Add one of `item` to the inventory. Returns `false` when the stack was
    /// already at [`MAX_ITEM_COUNT`] and the count was clamped.
    pub fn add_item(&mut self, id: &str, name: &str, description: &str) -> bool {
        if let Some(stack) = self.inventory.iter_mut().find(|s| s.id == id) {
            if stack.count >= MAX_ITEM_COUNT {
                stack.count = MAX_ITEM_COUNT;
                return false;
            }
            stack.count += 1;
            return true;
        }
        self.inventory.push(InventoryItem {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            count: 1,
        });
        true
    }

    /// Remove one of the item with `id`, dropping the stack when it empties.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let Some(index) = self.inventory.iter().position(|s| s.id == id) else {
            return false;
        };
        let stack = &mut self.inventory[index];
        if stack.count > 1 {
            stack.count -= 1;
        } else {
            self.inventory.remove(index);
        }
        true
    }
}
