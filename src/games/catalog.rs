//! Static game catalogs: shop items, lottery tiers, wheel prizes and cow levels.
//!
//! The catalogs are read-only once a [`crate::games::GameService`] is built.
//! Shop prices and wheel prizes can be overridden from configuration; the
//! wheel is validated on load because a distribution that does not sum to one
//! would silently skew every draw.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::games::errors::GameError;

/// Allowed drift when summing wheel probabilities.
pub const PROBABILITY_TOLERANCE: f64 = 1e-4;

/// An item sold in the points shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: u64,
    /// Storable items go to the inventory; others take effect on purchase
    pub storable: bool,
}

impl ShopItem {
    fn new(id: &str, name: &str, description: &str, price: u64, storable: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            price,
            storable,
        }
    }
}

/// Default shop stock, in listing order.
pub fn default_shop_items() -> Vec<ShopItem> {
    vec![
        ShopItem::new("double_card", "Double Card", "Doubles the base reward of your next sign-in", 50, false),
        ShopItem::new("lottery_ticket", "Lottery Ticket", "One free lottery draw", 40, false),
        ShopItem::new("hint_token", "Hint Token", "Reveals a range in the guessing game", 30, false),
        ShopItem::new("lucky_charm", "Lucky Charm", "Raises lottery odds by 20% for one draw", 100, false),
        ShopItem::new("coffee", "Coffee", "Restores 5 of today's command uses", 80, true),
        ShopItem::new("exp_card", "Experience Card", "+20% points on your next guessing-game win", 120, true),
    ]
}

/// Build the shop catalog, applying any configured price overrides.
pub fn shop_catalog(price_overrides: &BTreeMap<String, u64>) -> Vec<ShopItem> {
    let mut items = default_shop_items();
    for item in &mut items {
        if let Some(price) = price_overrides.get(&item.id) {
            item.price = *price;
        }
    }
    items
}

/// Lottery outcome bracket, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LotteryTier {
    Ssr,
    Sr,
    R,
    N,
}

impl LotteryTier {
    pub fn label(&self) -> &'static str {
        match self {
            LotteryTier::Ssr => "SSR",
            LotteryTier::Sr => "SR",
            LotteryTier::R => "R",
            LotteryTier::N => "N",
        }
    }
}

/// Item granted alongside a wheel prize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeItem {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// One slice of the prize wheel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpinPrize {
    pub name: String,
    pub probability: f64,
    pub points: u64,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<PrizeItem>,
}

impl SpinPrize {
    fn points(name: &str, probability: f64, points: u64, description: &str) -> Self {
        Self {
            name: name.to_string(),
            probability,
            points,
            description: description.to_string(),
            item: None,
        }
    }

    /// A slice that pays nothing at all.
    pub fn is_blank(&self) -> bool {
        self.points == 0 && self.item.is_none()
    }
}

/// Default wheel, top prize first.
pub fn default_spin_prizes() -> Vec<SpinPrize> {
    vec![
        SpinPrize::points("Grand Prize", 0.01, 500, "500 points jackpot"),
        SpinPrize::points("First Prize", 0.05, 200, "200 points"),
        SpinPrize::points("Second Prize", 0.10, 100, "100 points"),
        SpinPrize::points("Third Prize", 0.15, 50, "50 points"),
        SpinPrize::points("Fourth Prize", 0.20, 20, "20 points"),
        SpinPrize::points("Fifth Prize", 0.25, 10, "10 points"),
        SpinPrize::points("Better luck next time", 0.24, 0, "No prize this time"),
    ]
}

/// Reject wheels whose odds do not form a distribution.
pub fn validate_spin_prizes(prizes: &[SpinPrize]) -> Result<(), GameError> {
    if prizes.is_empty() {
        return Err(GameError::InvalidConfig("spin wheel has no prizes".into()));
    }
    if let Some(bad) = prizes
        .iter()
        .find(|p| !(p.probability > 0.0 && p.probability <= 1.0))
    {
        return Err(GameError::InvalidConfig(format!(
            "spin prize '{}' has probability {} outside (0, 1]",
            bad.name, bad.probability
        )));
    }
    let total: f64 = prizes.iter().map(|p| p.probability).sum();
    if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(GameError::InvalidConfig(format!(
            "spin wheel probabilities must sum to 1, got {:.6}",
            total
        )));
    }
    Ok(())
}

/// Requirements and title for one cow level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CowLevel {
    pub level: u32,
    pub name: &'static str,
    pub exp_needed: u64,
    pub favor_needed: u64,
}

pub const COW_LEVELS: [CowLevel; 8] = [
    CowLevel { level: 1, name: "Calf", exp_needed: 0, favor_needed: 0 },
    CowLevel { level: 2, name: "Yearling", exp_needed: 100, favor_needed: 50 },
    CowLevel { level: 3, name: "Sturdy Cow", exp_needed: 300, favor_needed: 150 },
    CowLevel { level: 4, name: "Grown Cow", exp_needed: 600, favor_needed: 300 },
    CowLevel { level: 5, name: "Elite Cow", exp_needed: 1000, favor_needed: 500 },
    CowLevel { level: 6, name: "Legendary Cow", exp_needed: 1500, favor_needed: 800 },
    CowLevel { level: 7, name: "Divine Cow", exp_needed: 2500, favor_needed: 1200 },
    CowLevel { level: 8, name: "Bull Demon King", exp_needed: 4000, favor_needed: 1800 },
];

pub const COW_NICKNAMES: [&str; 12] = [
    "Daisy", "Buttercup", "Patches", "Moo", "Clover", "Bessie", "Pebbles", "Maple", "Biscuit",
    "Mochi", "Peanut", "Cocoa",
];

pub fn cow_level(level: u32) -> &'static CowLevel {
    COW_LEVELS
        .iter()
        .find(|l| l.level == level)
        .unwrap_or(&COW_LEVELS[COW_LEVELS.len() - 1])
}

pub fn next_cow_level(level: u32) -> Option<&'static CowLevel> {
    COW_LEVELS.iter().find(|l| l.level == level + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_wheel_is_a_distribution() {
        assert!(validate_spin_prizes(&default_spin_prizes()).is_ok());
    }

    #[test]
    fn skewed_wheel_is_rejected() {
        let mut prizes = default_spin_prizes();
        prizes[0].probability = 0.2;
        let err = validate_spin_prizes(&prizes).unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(_)));
    }

    #[test]
    fn price_overrides_apply_by_id() {
        let mut overrides = BTreeMap::new();
        overrides.insert("coffee".to_string(), 5);
        let items = shop_catalog(&overrides);
        let coffee = items.iter().find(|i| i.id == "coffee").unwrap();
        assert_eq!(coffee.price, 5);
        let charm = items.iter().find(|i| i.id == "lucky_charm").unwrap();
        assert_eq!(charm.price, 100);
    }

    #[test]
    fn cow_levels_are_monotonic() {
        for pair in COW_LEVELS.windows(2) {
            assert_eq!(pair[1].level, pair[0].level + 1);
            assert!(pair[1].exp_needed > pair[0].exp_needed);
            assert!(pair[1].favor_needed > pair[0].favor_needed);
        }
        assert!(next_cow_level(8).is_none());
        assert_eq!(cow_level(3).name, "Sturdy Cow");
    }
}
