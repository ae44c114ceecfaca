//! Economy rules: sign-in, lottery, prize wheel, shop and item use.
//!
//! Every function here is a pure transform over a [`UserRecord`]. None of them
//! touch storage, read the clock or roll dice; callers pass `today` and any
//! random `roll` in `[0, 1)` explicitly. A function that returns `Err` leaves
//! the record exactly as it found it.

use chrono::NaiveDate;
use log::warn;

use crate::config::{LotteryConfig, SignConfig, SpinConfig};
use crate::games::catalog::{LotteryTier, ShopItem, SpinPrize};
use crate::games::errors::GameError;
use crate::games::types::UserRecord;
use crate::logutil::escape_log;

/// Restored daily command uses per coffee.
pub const COFFEE_RESTORE: u32 = 5;

fn is_day_after(previous: Option<NaiveDate>, today: NaiveDate) -> bool {
    previous.and_then(|d| d.succ_opt()) == Some(today)
}

// ---------------------------------------------------------------------------
// Sign-in
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub base_reward: u64,
    pub streak_bonus: u64,
    /// Flat bonus paid on every full week of streak, 0 otherwise
    pub week_bonus: u64,
    pub doubled: bool,
    pub consecutive_days: u32,
}

impl SignInOutcome {
    pub fn total(&self) -> u64 {
        self.base_reward + self.streak_bonus + self.week_bonus
    }
}

pub fn sign_in(
    record: &mut UserRecord,
    cfg: &SignConfig,
    today: NaiveDate,
) -> Result<SignInOutcome, GameError> {
    if record.last_sign_date == Some(today) {
        return Err(GameError::AlreadySignedToday);
    }

    record.consecutive_days = if is_day_after(record.last_sign_date, today) {
        record.consecutive_days + 1
    } else {
        1
    };
    record.total_sign_days += 1;
    record.last_sign_date = Some(today);

    let doubled = record.has_double_card;
    let base_reward = if doubled {
        record.has_double_card = false;
        cfg.base_reward * 2
    } else {
        cfg.base_reward
    };
    let streak_bonus =
        (record.consecutive_days as u64 * cfg.consecutive_bonus).min(cfg.max_consecutive_bonus);
    record.add_points(base_reward + streak_bonus);

    let week_bonus = if cfg.week_length > 0 && record.consecutive_days % cfg.week_length == 0 {
        record.add_points(cfg.week_bonus);
        cfg.week_bonus
    } else {
        0
    };

    Ok(SignInOutcome {
        base_reward,
        streak_bonus,
        week_bonus,
        doubled,
        consecutive_days: record.consecutive_days,
    })
}

// ---------------------------------------------------------------------------
// Lottery
// ---------------------------------------------------------------------------

/// A paid-for lottery draw whose odds are fixed before the dice are rolled.
#[derive(Debug, Clone, PartialEq)]
pub struct LotteryTicket {
    pub used_free_ticket: bool,
    pub cost: u64,
    pub used_charm: bool,
    /// Cumulative upper bounds for SSR, SR and R
    pub thresholds: [f64; 3],
}

impl LotteryTicket {
    pub fn draw(&self, roll: f64) -> LotteryTier {
        let [ssr, sr, r] = self.thresholds;
        if roll < ssr {
            LotteryTier::Ssr
        } else if roll < sr {
            LotteryTier::Sr
        } else if roll < r {
            LotteryTier::R
        } else {
            LotteryTier::N
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LotteryOutcome {
    pub tier: LotteryTier,
    pub reward: u64,
    pub ticket: LotteryTicket,
}

/// Pay for a draw (free ticket first) and consume a lucky charm if one is held.
pub fn prepare_lottery(
    record: &mut UserRecord,
    cfg: &LotteryConfig,
) -> Result<LotteryTicket, GameError> {
    let used_free_ticket = record.free_lottery_count > 0;
    let cost = if used_free_ticket {
        record.free_lottery_count -= 1;
        0
    } else {
        record.spend_points(cfg.cost)?;
        cfg.cost
    };

    let mut thresholds = [
        cfg.ssr_rate,
        cfg.ssr_rate + cfg.sr_rate,
        cfg.ssr_rate + cfg.sr_rate + cfg.r_rate,
    ];
    let used_charm = record.lucky_charm_count > 0;
    if used_charm {
        record.lucky_charm_count -= 1;
        for t in &mut thresholds {
            *t *= cfg.lucky_charm_boost;
        }
    }

    Ok(LotteryTicket {
        used_free_ticket,
        cost,
        used_charm,
        thresholds,
    })
}

/// Draw with `roll` and credit the tier's reward.
pub fn resolve_lottery(
    record: &mut UserRecord,
    cfg: &LotteryConfig,
    ticket: LotteryTicket,
    roll: f64,
) -> LotteryOutcome {
    let tier = ticket.draw(roll);
    let reward = match tier {
        LotteryTier::Ssr => {
            record.ssr_count += 1;
            cfg.ssr_reward
        }
        LotteryTier::Sr => cfg.sr_reward,
        LotteryTier::R => cfg.r_reward,
        LotteryTier::N => 0,
    };
    record.add_points(reward);
    LotteryOutcome {
        tier,
        reward,
        ticket,
    }
}

// ---------------------------------------------------------------------------
// Prize wheel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinPayment {
    Free,
    Paid(u64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpinOutcome {
    pub prize: SpinPrize,
    pub payment: SpinPayment,
    pub top_tier: bool,
    /// False when an item prize was clamped at the stack cap
    pub item_stored: bool,
}

/// Settle payment for one spin and update the wheel counters.
///
/// The first spin of a day tops the free spins up to `daily_free` and resets
/// the paid-spin counter. A free spin is used unless `pay` is set.
pub fn prepare_spin(
    record: &mut UserRecord,
    cfg: &SpinConfig,
    today: NaiveDate,
    pay: bool,
) -> Result<SpinPayment, GameError> {
    let new_day = record.wheel.last_spin_date != Some(today);
    let free_available = if new_day {
        record.free_spin_count.max(cfg.daily_free)
    } else {
        record.free_spin_count
    };
    let use_free = !pay && free_available > 0;

    if !use_free {
        let paid_today = if new_day { 0 } else { record.wheel.paid_spins_today };
        if cfg.paid_limit > 0 && paid_today >= cfg.paid_limit {
            return Err(GameError::PaidSpinLimitReached {
                limit: cfg.paid_limit,
            });
        }
        if record.points < cfg.cost {
            return Err(GameError::InsufficientPoints {
                needed: cfg.cost,
                available: record.points,
            });
        }
    }

    if new_day {
        record.wheel.spin_streak = if is_day_after(record.wheel.last_spin_date, today) {
            record.wheel.spin_streak + 1
        } else {
            1
        };
        record.wheel.last_spin_date = Some(today);
        record.wheel.paid_spins_today = 0;
        record.free_spin_count = free_available;
    }

    let payment = if use_free {
        record.free_spin_count -= 1;
        SpinPayment::Free
    } else {
        record.spend_points(cfg.cost)?;
        record.wheel.paid_spins_today += 1;
        SpinPayment::Paid(cfg.cost)
    };
    record.wheel.total_spins += 1;
    Ok(payment)
}

/// Index of the first prize whose running probability sum exceeds `roll`.
/// Rounding drift past the final bound lands on the last prize.
pub fn pick_spin_prize(prizes: &[SpinPrize], roll: f64) -> usize {
    let mut cumulative = 0.0;
    for (index, prize) in prizes.iter().enumerate() {
        cumulative += prize.probability;
        if roll < cumulative {
            return index;
        }
    }
    prizes.len().saturating_sub(1)
}

/// Credit the prize at `index`. Index 0 is the top tier.
pub fn apply_spin_prize(
    record: &mut UserRecord,
    prizes: &[SpinPrize],
    index: usize,
    payment: SpinPayment,
) -> Option<SpinOutcome> {
    let prize = prizes.get(index)?.clone();
    record.add_points(prize.points);
    let top_tier = index == 0;
    if top_tier {
        record.wheel.top_tier_hits += 1;
    }
    let item_stored = match &prize.item {
        Some(item) => {
            let stored = record.add_item(&item.id, &item.name, &item.description);
            if !stored {
                warn!(
                    "Inventory stack for {} full on {}, wheel item clamped",
                    escape_log(&item.id),
                    escape_log(&record.key())
                );
            }
            stored
        }
        None => true,
    };
    Some(SpinOutcome {
        prize,
        payment,
        top_tier,
        item_stored,
    })
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseOutcome {
    pub item: ShopItem,
    /// False when a storable item hit the stack cap
    pub stored: bool,
}

/// Look an item up by id or display name, ignoring case.
pub fn find_shop_item<'a>(catalog: &'a [ShopItem], id_or_name: &str) -> Option<&'a ShopItem> {
    catalog.iter().find(|item| {
        item.id.eq_ignore_ascii_case(id_or_name) || item.name.eq_ignore_ascii_case(id_or_name)
    })
}

pub fn purchase(
    record: &mut UserRecord,
    catalog: &[ShopItem],
    item_id: &str,
) -> Result<PurchaseOutcome, GameError> {
    let item = find_shop_item(catalog, item_id)
        .ok_or_else(|| GameError::UnknownItem(item_id.to_string()))?
        .clone();
    record.spend_points(item.price)?;

    let stored = if item.storable {
        let stored = record.add_item(&item.id, &item.name, &item.description);
        if !stored {
            warn!(
                "Inventory stack for {} full on {}, purchase clamped",
                item.id,
                escape_log(&record.key())
            );
        }
        stored
    } else {
        match item.id.as_str() {
            "double_card" => record.has_double_card = true,
            "lottery_ticket" => record.free_lottery_count += 1,
            "hint_token" => record.hint_tokens += 1,
            "lucky_charm" => record.lucky_charm_count += 1,
            other => warn!("Shop item {} has no immediate effect", escape_log(other)),
        }
        true
    };

    Ok(PurchaseOutcome { item, stored })
}

// ---------------------------------------------------------------------------
// Item use
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEffect {
    /// Daily command uses given back
    CommandsRestored(u32),
    ExpCardArmed,
    /// No mechanical effect
    Flavour,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseOutcome {
    pub item_name: String,
    pub effect: ItemEffect,
    pub remaining: u32,
}

pub fn use_item(record: &mut UserRecord, id_or_name: &str) -> Result<UseOutcome, GameError> {
    let (id, item_name) = match record.find_item(id_or_name) {
        Some(item) => (item.id.clone(), item.name.clone()),
        None => return Err(GameError::ItemNotOwned(id_or_name.to_string())),
    };

    let effect = match id.as_str() {
        "coffee" => {
            let restored = COFFEE_RESTORE.min(record.daily_command_count);
            record.daily_command_count -= restored;
            ItemEffect::CommandsRestored(restored)
        }
        "exp_card" => {
            record.exp_card_active = true;
            ItemEffect::ExpCardArmed
        }
        _ => ItemEffect::Flavour,
    };
    record.remove_item(&id);
    let remaining = record.find_item(&id).map(|i| i.count).unwrap_or(0);

    Ok(UseOutcome {
        item_name,
        effect,
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::games::catalog::{default_shop_items, default_spin_prizes};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, d).unwrap()
    }

    fn user(points: u64) -> UserRecord {
        UserRecord::new("u1", "test", points, day(1))
    }

    #[test]
    fn seven_day_streak_reaches_276_points() {
        let cfg = SignConfig::default();
        let mut u = user(100);
        for d in 1..=7 {
            sign_in(&mut u, &cfg, day(d)).unwrap();
        }
        assert_eq!(u.points, 276);
        assert_eq!(u.consecutive_days, 7);
        assert_eq!(u.total_sign_days, 7);
    }

    #[test]
    fn second_sign_in_same_day_is_rejected_without_change() {
        let cfg = SignConfig::default();
        let mut u = user(100);
        sign_in(&mut u, &cfg, day(3)).unwrap();
        let before = u.clone();
        let err = sign_in(&mut u, &cfg, day(3)).unwrap_err();
        assert!(matches!(err, GameError::AlreadySignedToday));
        assert_eq!(u, before);
    }

    #[test]
    fn gap_resets_streak() {
        let cfg = SignConfig::default();
        let mut u = user(0);
        sign_in(&mut u, &cfg, day(1)).unwrap();
        sign_in(&mut u, &cfg, day(2)).unwrap();
        assert_eq!(u.consecutive_days, 2);
        let out = sign_in(&mut u, &cfg, day(4)).unwrap();
        assert_eq!(out.consecutive_days, 1);
        assert_eq!(u.total_sign_days, 3);
    }

    #[test]
    fn double_card_doubles_base_once() {
        let cfg = SignConfig::default();
        let mut u = user(0);
        u.has_double_card = true;
        let out = sign_in(&mut u, &cfg, day(1)).unwrap();
        assert!(out.doubled);
        assert_eq!(out.total(), 22);
        assert!(!u.has_double_card);
    }

    #[test]
    fn streak_bonus_is_capped() {
        let cfg = SignConfig::default();
        let mut u = user(0);
        u.last_sign_date = Some(day(1));
        u.consecutive_days = 69;
        let out = sign_in(&mut u, &cfg, day(2)).unwrap();
        assert_eq!(out.streak_bonus, 100);
        assert_eq!(out.week_bonus, 50);
    }

    #[test]
    fn lottery_without_points_fails_cleanly() {
        let cfg = LotteryConfig::default();
        let mut u = user(0);
        u.lucky_charm_count = 1;
        let before = u.clone();
        let err = prepare_lottery(&mut u, &cfg).unwrap_err();
        assert!(matches!(err, GameError::InsufficientPoints { needed: 10, available: 0 }));
        assert_eq!(u, before);
    }

    #[test]
    fn lottery_prefers_free_ticket_and_consumes_charm() {
        let cfg = LotteryConfig::default();
        let mut u = user(100);
        u.free_lottery_count = 1;
        u.lucky_charm_count = 2;
        let ticket = prepare_lottery(&mut u, &cfg).unwrap();
        assert!(ticket.used_free_ticket);
        assert!(ticket.used_charm);
        assert_eq!(u.points, 100);
        assert_eq!(u.free_lottery_count, 0);
        assert_eq!(u.lucky_charm_count, 1);
        assert!((ticket.thresholds[0] - 0.06).abs() < 1e-9);
        assert!((ticket.thresholds[2] - 0.48).abs() < 1e-9);
    }

    #[test]
    fn lottery_rates_match_configuration() {
        let cfg = LotteryConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut u = user(u64::MAX / 2);
        let mut counts = [0u32; 4];
        let draws = 100_000;
        for _ in 0..draws {
            let ticket = prepare_lottery(&mut u, &cfg).unwrap();
            let out = resolve_lottery(&mut u, &cfg, ticket, rng.gen::<f64>());
            let slot = match out.tier {
                LotteryTier::Ssr => 0,
                LotteryTier::Sr => 1,
                LotteryTier::R => 2,
                LotteryTier::N => 3,
            };
            counts[slot] += 1;
        }
        let expected = [0.05, 0.10, 0.25, 0.60];
        for (count, p) in counts.iter().zip(expected) {
            let observed = *count as f64 / draws as f64;
            assert!((observed - p).abs() < 0.005, "observed {} expected {}", observed, p);
        }
        assert_eq!(u.ssr_count, counts[0]);
    }

    #[test]
    fn ssr_pays_and_counts() {
        let cfg = LotteryConfig::default();
        let mut u = user(10);
        let ticket = prepare_lottery(&mut u, &cfg).unwrap();
        let out = resolve_lottery(&mut u, &cfg, ticket, 0.0);
        assert_eq!(out.tier, LotteryTier::Ssr);
        assert_eq!(u.points, 100);
        assert_eq!(u.ssr_count, 1);
        assert_eq!(u.total_spent, 10);
    }

    #[test]
    fn wheel_selects_every_tier_including_last() {
        let prizes = default_spin_prizes();
        assert_eq!(pick_spin_prize(&prizes, 0.0), 0);
        assert_eq!(pick_spin_prize(&prizes, 0.009), 0);
        assert_eq!(pick_spin_prize(&prizes, 0.01), 1);
        assert_eq!(pick_spin_prize(&prizes, 0.03), 1);
        assert_eq!(pick_spin_prize(&prizes, 0.10), 2);
        assert_eq!(pick_spin_prize(&prizes, 0.20), 3);
        assert_eq!(pick_spin_prize(&prizes, 0.40), 4);
        assert_eq!(pick_spin_prize(&prizes, 0.60), 5);
        assert_eq!(pick_spin_prize(&prizes, 0.7599), 5);
        assert_eq!(pick_spin_prize(&prizes, 0.76), 6);
        assert_eq!(pick_spin_prize(&prizes, 0.80), 6);
        assert_eq!(pick_spin_prize(&prizes, 0.999_999_9), 6);
        assert_eq!(pick_spin_prize(&prizes, 1.5), 6);
    }

    #[test]
    fn free_spin_then_paid_then_cap() {
        let cfg = SpinConfig::default();
        let mut u = user(1_000);
        assert_eq!(prepare_spin(&mut u, &cfg, day(1), false).unwrap(), SpinPayment::Free);
        assert_eq!(u.free_spin_count, 0);
        for _ in 0..3 {
            assert_eq!(
                prepare_spin(&mut u, &cfg, day(1), false).unwrap(),
                SpinPayment::Paid(50)
            );
        }
        let before = u.clone();
        let err = prepare_spin(&mut u, &cfg, day(1), false).unwrap_err();
        assert!(matches!(err, GameError::PaidSpinLimitReached { limit: 3 }));
        assert_eq!(u, before);
        assert_eq!(u.points, 850);
        assert_eq!(u.wheel.total_spins, 4);

        // Next day: free spin granted again and the streak grows.
        assert_eq!(prepare_spin(&mut u, &cfg, day(2), false).unwrap(), SpinPayment::Free);
        assert_eq!(u.wheel.spin_streak, 2);
        assert_eq!(u.wheel.paid_spins_today, 0);
    }

    #[test]
    fn unaffordable_paid_spin_does_not_mutate() {
        let cfg = SpinConfig::default();
        let mut u = user(10);
        u.wheel.last_spin_date = Some(day(5));
        u.free_spin_count = 0;
        let before = u.clone();
        let err = prepare_spin(&mut u, &cfg, day(5), true).unwrap_err();
        assert!(matches!(err, GameError::InsufficientPoints { needed: 50, .. }));
        assert_eq!(u, before);
    }

    #[test]
    fn top_tier_counts_and_blank_pays_nothing() {
        let prizes = default_spin_prizes();
        let mut u = user(0);
        let out = apply_spin_prize(&mut u, &prizes, 0, SpinPayment::Free).unwrap();
        assert!(out.top_tier);
        assert_eq!(u.points, 500);
        assert_eq!(u.wheel.top_tier_hits, 1);

        let out = apply_spin_prize(&mut u, &prizes, 6, SpinPayment::Free).unwrap();
        assert!(out.prize.is_blank());
        assert_eq!(u.points, 500);
    }

    #[test]
    fn failed_purchase_never_mutates() {
        let catalog = default_shop_items();
        let mut u = user(20);
        let before = u.clone();
        assert!(matches!(
            purchase(&mut u, &catalog, "lucky_charm").unwrap_err(),
            GameError::InsufficientPoints { needed: 100, available: 20 }
        ));
        assert!(matches!(
            purchase(&mut u, &catalog, "golden_cow").unwrap_err(),
            GameError::UnknownItem(_)
        ));
        assert_eq!(u, before);
    }

    #[test]
    fn purchases_apply_effects() {
        let catalog = Config::default().shop_catalog();
        let mut u = user(1_000);
        purchase(&mut u, &catalog, "double_card").unwrap();
        purchase(&mut u, &catalog, "lottery_ticket").unwrap();
        purchase(&mut u, &catalog, "hint_token").unwrap();
        purchase(&mut u, &catalog, "lucky_charm").unwrap();
        purchase(&mut u, &catalog, "Coffee").unwrap();
        assert!(u.has_double_card);
        assert_eq!(u.free_lottery_count, 1);
        assert_eq!(u.hint_tokens, 1);
        assert_eq!(u.lucky_charm_count, 1);
        assert_eq!(u.find_item("coffee").map(|i| i.count), Some(1));
        assert_eq!(u.points, 1_000 - 50 - 40 - 30 - 100 - 80);
        assert_eq!(u.total_spent, 300);
    }

    #[test]
    fn coffee_restores_at_most_what_was_used() {
        let mut u = user(0);
        u.add_item("coffee", "Coffee", "");
        u.add_item("coffee", "Coffee", "");
        u.daily_command_count = 3;
        let out = use_item(&mut u, "Coffee").unwrap();
        assert_eq!(out.effect, ItemEffect::CommandsRestored(3));
        assert_eq!(u.daily_command_count, 0);
        assert_eq!(out.remaining, 1);
    }

    #[test]
    fn using_unowned_item_fails() {
        let mut u = user(0);
        assert!(matches!(
            use_item(&mut u, "exp_card").unwrap_err(),
            GameError::ItemNotOwned(_)
        ));
    }

    #[test]
    fn exp_card_arms_flag_and_leaves_inventory() {
        let mut u = user(0);
        u.add_item("exp_card", "Experience Card", "");
        let out = use_item(&mut u, "exp_card").unwrap();
        assert_eq!(out.effect, ItemEffect::ExpCardArmed);
        assert!(u.exp_card_active);
        assert!(u.inventory.is_empty());
    }
}
