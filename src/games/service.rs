//! Command handlers tying the minigame rules to storage.
//!
//! [`GameService`] owns the configuration, the record store, the guess-game
//! registry, the clock and the random source. Each public handler:
//!
//! 1. takes the per-user lock for its whole run
//! 2. loads (or creates) the user's record
//! 3. applies the rate limiter when the command is rate-limited
//! 4. runs the pure rule from [`crate::games::economy`], [`crate::games::cow`]
//!    or [`crate::games::guess`]
//! 5. evaluates achievements and persists the record
//! 6. returns the reply text
//!
//! Errors are returned as [`GameError`]; turning them into chat text is the
//! dispatcher's job.

use std::fmt::Write as _;
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::games::achievement::{self, UnlockedAchievement, ACHIEVEMENTS};
use crate::games::catalog::{validate_spin_prizes, LotteryTier, ShopItem, COW_NICKNAMES};
use crate::games::clock::{Clock, SystemClock};
use crate::games::cow;
use crate::games::economy::{self, ItemEffect, SpinPayment};
use crate::games::errors::GameError;
use crate::games::guess::{self, GameStateStore, GuessResult, GuessSessions, MemoryGameStore};
use crate::games::rate_limit::RateLimiter;
use crate::games::store::UserRecordStore;
use crate::games::types::{user_key, UserRecord};
use crate::logutil::escape_log;
use crate::storage::KvStore;

const GUESS_USAGE: &str = "Usage: guess start | guess <number> | guess hint | guess quit";
const SHOP_USAGE: &str = "Usage: shop list | shop buy <item>";
const COW_USAGE: &str =
    "Usage: cow [status] | cow adopt <name> | cow feed | cow play | cow pet | cow rename <name>";
const SPIN_USAGE: &str = "Usage: spin | spin pay | spin info | spin help";

pub struct GameService {
    config: Config,
    records: UserRecordStore,
    games: Arc<dyn GameStateStore>,
    clock: Arc<dyn Clock>,
    rng: Mutex<StdRng>,
    limiter: RateLimiter,
    shop: Vec<ShopItem>,
}

impl GameService {
    /// Service on the wall clock with an in-memory guess registry.
    pub fn new(config: Config, kv: Arc<dyn KvStore>) -> Result<Self, GameError> {
        Self::with_parts(
            config,
            kv,
            Arc::new(MemoryGameStore::new()),
            Arc::new(SystemClock),
            StdRng::from_entropy(),
        )
    }

    /// Fully injected constructor. Fails when the wheel configuration is unusable.
    pub fn with_parts(
        config: Config,
        kv: Arc<dyn KvStore>,
        games: Arc<dyn GameStateStore>,
        clock: Arc<dyn Clock>,
        rng: StdRng,
    ) -> Result<Self, GameError> {
        validate_spin_prizes(&config.spin.prizes)?;
        let records = UserRecordStore::new(kv, clock.clone(), config.points.initial_points);
        let limiter = RateLimiter::new(&config.limits);
        let shop = config.shop_catalog();
        Ok(Self {
            config,
            records,
            games,
            clock,
            rng: Mutex::new(rng),
            limiter,
            shop,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records(&self) -> &UserRecordStore {
        &self.records
    }

    async fn roll(&self) -> f64 {
        self.rng.lock().await.gen::<f64>()
    }

    /// Apply the rate limiter if `command` is configured as rate-limited and
    /// persist the counted command.
    async fn gate(&self, command: &str, record: &mut UserRecord) -> Result<(), GameError> {
        if !self.config.limits.is_rate_limited(command) {
            return Ok(());
        }
        if let Err(reason) =
            self.limiter
                .check_and_record(record, self.clock.now_ms(), self.clock.today())
        {
            debug!(
                "Rate limited '{}' for {}: {}",
                command,
                escape_log(&record.key()),
                reason
            );
            return Err(reason.into());
        }
        self.records.put(record).await
    }

    /// Run achievements, persist, and append any unlock lines to `reply`.
    async fn finish(&self, record: &mut UserRecord, reply: &mut String) -> Result<(), GameError> {
        let unlocked = achievement::check(record);
        self.records.put(record).await?;
        append_unlocks(reply, &unlocked);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Guess
    // -----------------------------------------------------------------------

    pub async fn guess(
        &self,
        user_id: &str,
        platform: &str,
        action: &str,
    ) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        let key = user_key(user_id, platform);
        let sessions = GuessSessions::new(self.games.as_ref());
        let now = self.clock.now_ms();

        match action.trim().to_lowercase().as_str() {
            "" => Err(GameError::MissingArgument("number, or 'start' to begin")),
            "start" => {
                self.gate("guess", &mut record).await?;
                let max = self.config.guess.max_number;
                let game = {
                    let mut rng = self.rng.lock().await;
                    sessions.start(&key, max, &mut *rng, now).await
                };
                record.games_played += 1;
                debug!("{} started a guess game", escape_log(&key));
                let mut reply = format!(
                    "🎲 I'm thinking of a number between 1 and {}. Type 'guess <number>' to play!",
                    game.max_number
                );
                self.finish(&mut record, &mut reply).await?;
                Ok(reply)
            }
            "hint" => {
                let (low, high) = sessions.hint(&key).await?;
                if record.hint_tokens == 0 {
                    return Err(GameError::NoHintTokens);
                }
                record.hint_tokens -= 1;
                self.records.put(&record).await?;
                Ok(format!(
                    "💡 The number is between {} and {}. Hint tokens left: {}",
                    low, high, record.hint_tokens
                ))
            }
            "quit" | "giveup" | "give-up" => {
                let target = sessions.give_up(&key).await?;
                Ok(format!("Game over. The number was {}.", target))
            }
            other => {
                let value = guess::parse_guess(other)?;
                match sessions.guess(&key, value, now).await? {
                    GuessResult::TooLow { attempts, proximity } => Ok(format!(
                        "📈 Higher than {}. {} (attempt {})",
                        value,
                        proximity.describe(),
                        attempts
                    )),
                    GuessResult::TooHigh { attempts, proximity } => Ok(format!(
                        "📉 Lower than {}. {} (attempt {})",
                        value,
                        proximity.describe(),
                        attempts
                    )),
                    GuessResult::Correct {
                        target,
                        attempts,
                        elapsed_secs,
                    } => {
                        let score = guess::score(
                            &self.config.guess,
                            attempts,
                            elapsed_secs,
                            record.exp_card_active,
                        );
                        record.exp_card_active = false;
                        record.games_won += 1;
                        record.add_points(score.total());
                        info!(
                            "{} won a guess game in {} attempts (+{})",
                            escape_log(&key),
                            attempts,
                            score.total()
                        );
                        let mut reply = format!(
                            "🎉 Correct! The number was {}. {} attempts in {} s.\nBase {} + time bonus {}",
                            target, attempts, elapsed_secs, score.base, score.time_bonus
                        );
                        if score.exp_bonus > 0 {
                            let _ = write!(reply, " + experience card {}", score.exp_bonus);
                        }
                        let _ = write!(
                            reply,
                            " = {} points. Balance: {}",
                            score.total(),
                            record.points
                        );
                        self.finish(&mut record, &mut reply).await?;
                        Ok(reply)
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Sign-in and lottery
    // -----------------------------------------------------------------------

    pub async fn sign(&self, user_id: &str, platform: &str) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        self.gate("sign", &mut record).await?;

        let outcome = economy::sign_in(&mut record, &self.config.sign, self.clock.today())?;
        let mut reply = format!(
            "✅ Signed in! +{} points (base {}{} + streak {})",
            outcome.base_reward + outcome.streak_bonus,
            outcome.base_reward,
            if outcome.doubled { ", doubled" } else { "" },
            outcome.streak_bonus
        );
        if outcome.week_bonus > 0 {
            let _ = write!(
                reply,
                "\n🎁 {}-day streak bonus: +{}",
                outcome.consecutive_days, outcome.week_bonus
            );
        }
        let _ = write!(
            reply,
            "\nStreak: {} days | Total: {} days | Balance: {}",
            record.consecutive_days, record.total_sign_days, record.points
        );
        self.finish(&mut record, &mut reply).await?;
        Ok(reply)
    }

    pub async fn lottery(&self, user_id: &str, platform: &str) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        self.gate("lottery", &mut record).await?;

        let ticket = economy::prepare_lottery(&mut record, &self.config.lottery)?;
        self.records.put(&record).await?;

        let roll = self.roll().await;
        let outcome = economy::resolve_lottery(&mut record, &self.config.lottery, ticket, roll);
        if outcome.tier == LotteryTier::Ssr {
            info!("{} pulled SSR", escape_log(&record.key()));
        }

        let mut reply = String::new();
        if outcome.ticket.used_free_ticket {
            reply.push_str("🎟️ Used a free ticket. ");
        } else {
            let _ = write!(reply, "Paid {} points. ", outcome.ticket.cost);
        }
        if outcome.ticket.used_charm {
            reply.push_str("🍀 Lucky charm active! ");
        }
        match outcome.tier {
            LotteryTier::N => reply.push_str("\nN - nothing this time."),
            tier => {
                let _ = write!(reply, "\n✨ {}! +{} points", tier.label(), outcome.reward);
            }
        }
        let _ = write!(reply, "\nBalance: {}", record.points);
        self.finish(&mut record, &mut reply).await?;
        Ok(reply)
    }

    // -----------------------------------------------------------------------
    // Shop, items and inventory
    // -----------------------------------------------------------------------

    pub async fn shop(
        &self,
        user_id: &str,
        platform: &str,
        action: &str,
        item: &str,
    ) -> Result<String, GameError> {
        match action.trim().to_lowercase().as_str() {
            "" | "list" => Ok(self.shop_listing()),
            "buy" => self.buy(user_id, platform, item.trim()).await,
            other => Err(GameError::UnknownAction {
                action: other.to_string(),
                usage: SHOP_USAGE,
            }),
        }
    }

    fn shop_listing(&self) -> String {
        let mut out = String::from("🛒 Shop");
        for item in &self.shop {
            let _ = write!(
                out,
                "\n- {} ({}): {} points. {}",
                item.name, item.id, item.price, item.description
            );
        }
        out.push_str("\nBuy with 'shop buy <item>'.");
        out
    }

    async fn buy(&self, user_id: &str, platform: &str, item: &str) -> Result<String, GameError> {
        if item.is_empty() {
            return Err(GameError::MissingArgument("item id"));
        }
        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        self.gate("shop", &mut record).await?;

        let outcome = economy::purchase(&mut record, &self.shop, item).map_err(|e| {
            debug!(
                "Purchase of '{}' refused for {}: {}",
                escape_log(item),
                escape_log(&record.key()),
                e
            );
            e
        })?;
        info!(
            "{} bought {} for {}",
            escape_log(&record.key()),
            outcome.item.id,
            outcome.item.price
        );
        let mut reply = format!(
            "🛍️ Bought {} for {} points. Balance: {}",
            outcome.item.name, outcome.item.price, record.points
        );
        if outcome.item.storable {
            if outcome.stored {
                reply.push_str("\nIt's in your inventory. Use it with 'use <item>'.");
            } else {
                reply.push_str("\nYour inventory stack is full; the extra item was lost.");
            }
        }
        self.finish(&mut record, &mut reply).await?;
        Ok(reply)
    }

    pub async fn use_item(
        &self,
        user_id: &str,
        platform: &str,
        item: &str,
    ) -> Result<String, GameError> {
        let item = item.trim();
        if item.is_empty() {
            return Err(GameError::MissingArgument("item"));
        }
        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        self.gate("use", &mut record).await?;

        let outcome = economy::use_item(&mut record, item)?;
        let mut reply = match outcome.effect {
            ItemEffect::CommandsRestored(n) => format!(
                "☕ Used {}. {} command uses restored ({} used today).",
                outcome.item_name, n, record.daily_command_count
            ),
            ItemEffect::ExpCardArmed => format!(
                "📘 Used {}. Your next guessing-game win earns +{}%.",
                outcome.item_name, self.config.guess.exp_card_bonus_percent
            ),
            ItemEffect::Flavour => format!("✨ Used {}. Nice!", outcome.item_name),
        };
        let _ = write!(reply, " Remaining: {}", outcome.remaining);
        self.finish(&mut record, &mut reply).await?;
        Ok(reply)
    }

    pub async fn inventory(&self, user_id: &str, platform: &str) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let record = self.records.get(user_id, platform).await?;

        let mut out = String::from("🎒 Inventory");
        if record.inventory.is_empty() {
            out.push_str("\n(no items)");
        }
        for item in &record.inventory {
            let _ = write!(out, "\n- {} x{}: {}", item.name, item.count, item.description);
        }
        let _ = write!(
            out,
            "\nFree lottery tickets: {} | Hint tokens: {} | Lucky charms: {} | Free spins: {}",
            record.free_lottery_count,
            record.hint_tokens,
            record.lucky_charm_count,
            record.free_spin_count
        );
        if record.has_double_card {
            out.push_str("\nDouble card ready for your next sign-in.");
        }
        if record.exp_card_active {
            out.push_str("\nExperience card active.");
        }
        Ok(out)
    }

    pub async fn achievements(&self, user_id: &str, platform: &str) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let record = self.records.get(user_id, platform).await?;

        let unlocked = ACHIEVEMENTS
            .iter()
            .filter(|a| record.has_achievement(a.id))
            .count();
        let mut out = format!("🏆 Achievements ({}/{})", unlocked, ACHIEVEMENTS.len());
        for a in ACHIEVEMENTS {
            let mark = if record.has_achievement(a.id) { "✅" } else { "🔒" };
            let _ = write!(
                out,
                "\n{} {}: {} (+{})",
                mark, a.name, a.description, a.reward
            );
        }
        Ok(out)
    }

    pub async fn profile(&self, user_id: &str, platform: &str) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let record = self.records.get(user_id, platform).await?;

        let win_rate = if record.games_played > 0 {
            record.games_won as f64 * 100.0 / record.games_played as f64
        } else {
            0.0
        };
        let mut out = format!(
            "👤 {}\nPoints: {} | Spent: {}\nSign-in streak: {} days ({} total)\nGuess games: {} played, {} won ({:.1}%)\nSSR pulls: {} | Wheel spins: {}\nAchievements: {}/{}\nCommands today: {}/{}",
            record.user_id,
            record.points,
            record.total_spent,
            record.consecutive_days,
            record.total_sign_days,
            record.games_played,
            record.games_won,
            win_rate,
            record.ssr_count,
            record.wheel.total_spins,
            record.achievements.len(),
            ACHIEVEMENTS.len(),
            record.daily_command_count,
            self.config.limits.daily_command_limit
        );
        if let Some(c) = &record.cow {
            let _ = write!(out, "\nCow: {} (Lv.{})", c.name, c.level);
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Cow
    // -----------------------------------------------------------------------

    pub async fn cow(
        &self,
        user_id: &str,
        platform: &str,
        action: &str,
        arg: &str,
    ) -> Result<String, GameError> {
        let action = action.trim().to_lowercase();
        if action == "help" {
            return Ok(COW_USAGE.to_string());
        }

        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        let now = self.clock.now_ms();
        let cfg = &self.config.cow;
        let decayed = cow::decay(&mut record, cfg, now);

        let result = match action.as_str() {
            "" | "status" => match &record.cow {
                Some(c) => Ok(cow::status_text(c)),
                None => Err(GameError::NoPet),
            },
            "adopt" => {
                if let Some(existing) = &record.cow {
                    Err(GameError::PetAlreadyAdopted(existing.name.clone()))
                } else if arg.trim().is_empty() {
                    let suggestion = {
                        let mut rng = self.rng.lock().await;
                        COW_NICKNAMES[rng.gen_range(0..COW_NICKNAMES.len())]
                    };
                    Err(GameError::MissingNickname { suggestion })
                } else {
                    self.gate("cow", &mut record).await?;
                    let name = cow::adopt(&mut record, arg, now)?.name.clone();
                    let mut reply = format!(
                        "🐄 Welcome home, {}! Feed, play and pet to help it grow.",
                        name
                    );
                    self.finish(&mut record, &mut reply).await?;
                    return Ok(reply);
                }
            }
            "rename" => {
                let renamed = if record.cow.is_none() {
                    Err(GameError::NoPet)
                } else {
                    match self.gate("cow", &mut record).await {
                        Ok(()) => cow::rename(&mut record, arg),
                        Err(e) => Err(e),
                    }
                };
                match renamed {
                    Ok(old) => {
                        let new = record.cow.as_ref().map(|c| c.name.clone()).unwrap_or_default();
                        self.records.put(&record).await?;
                        return Ok(format!("{} is now called {}.", old, new));
                    }
                    Err(e) => Err(e),
                }
            }
            "feed" | "play" | "pet" => {
                self.gate("cow", &mut record).await?;
                let outcome = match action.as_str() {
                    "feed" => cow::feed(&mut record, cfg, now),
                    "play" => cow::play(&mut record, cfg, now),
                    _ => cow::pet(&mut record, cfg),
                };
                match outcome {
                    Ok(outcome) => {
                        let mut reply = match (action.as_str(), outcome.stat_after) {
                            ("feed", Some(h)) => format!(
                                "🌾 {} munches happily. Hunger {}/100.",
                                outcome.cow_name, h
                            ),
                            ("play", Some(m)) => {
                                format!("⚽ {} had fun! Mood {}/100.", outcome.cow_name, m)
                            }
                            _ => format!("🤚 {} nuzzles you.", outcome.cow_name),
                        };
                        let _ = write!(
                            reply,
                            " +{} exp, +{} favor",
                            outcome.exp_gained, outcome.favor_gained
                        );
                        if outcome.cost > 0 {
                            let _ = write!(reply, " (-{} points)", outcome.cost);
                        }
                        if let Some(level) = outcome.level_up {
                            let _ = write!(
                                reply,
                                "\n⬆️ Level up! {} is now Lv.{} {}.",
                                outcome.cow_name, level.level, level.name
                            );
                        }
                        self.finish(&mut record, &mut reply).await?;
                        return Ok(reply);
                    }
                    Err(e) => Err(e),
                }
            }
            other => Err(GameError::UnknownAction {
                action: other.to_string(),
                usage: COW_USAGE,
            }),
        };

        if decayed {
            self.records.put(&record).await?;
        }
        result
    }

    // -----------------------------------------------------------------------
    // Prize wheel
    // -----------------------------------------------------------------------

    pub async fn spin(&self, user_id: &str, platform: &str, action: &str) -> Result<String, GameError> {
        let action = action.trim().to_lowercase();
        match action.as_str() {
            "" | "pay" => {}
            "info" => return self.spin_info(user_id, platform).await,
            "help" => return Ok(self.spin_help()),
            other => {
                return Err(GameError::UnknownAction {
                    action: other.to_string(),
                    usage: SPIN_USAGE,
                })
            }
        }

        let _lock = self.records.lock(user_id, platform).await;
        let mut record = self.records.get(user_id, platform).await?;
        self.gate("spin", &mut record).await?;

        let payment =
            economy::prepare_spin(&mut record, &self.config.spin, self.clock.today(), action == "pay")?;
        let prizes = &self.config.spin.prizes;
        let index = economy::pick_spin_prize(prizes, self.roll().await);
        let outcome = economy::apply_spin_prize(&mut record, prizes, index, payment)
            .ok_or_else(|| GameError::InvalidConfig("spin wheel has no prizes".into()))?;

        let mut reply = match payment {
            SpinPayment::Free => String::from("🎡 Free spin! "),
            SpinPayment::Paid(cost) => format!("🎡 Spun for {} points. ", cost),
        };
        if outcome.prize.is_blank() {
            let _ = write!(reply, "{}. {}", outcome.prize.name, outcome.prize.description);
        } else {
            let _ = write!(reply, "🎉 {}: {}", outcome.prize.name, outcome.prize.description);
            if outcome.top_tier {
                info!("{} hit the top wheel prize", escape_log(&record.key()));
            }
            if let Some(item) = &outcome.prize.item {
                if outcome.item_stored {
                    let _ = write!(reply, "\nReceived {}.", item.name);
                } else {
                    let _ = write!(reply, "\n{} stack is full; item lost.", item.name);
                }
            }
        }
        let _ = write!(
            reply,
            "\nBalance: {} | Free spins: {} | Spin streak: {} days",
            record.points, record.free_spin_count, record.wheel.spin_streak
        );
        self.finish(&mut record, &mut reply).await?;
        Ok(reply)
    }

    async fn spin_info(&self, user_id: &str, platform: &str) -> Result<String, GameError> {
        let _lock = self.records.lock(user_id, platform).await;
        let record = self.records.get(user_id, platform).await?;
        let cfg = &self.config.spin;
        let today = self.clock.today();

        let new_day = record.wheel.last_spin_date != Some(today);
        let free = if new_day {
            record.free_spin_count.max(cfg.daily_free)
        } else {
            record.free_spin_count
        };
        let paid = if new_day { 0 } else { record.wheel.paid_spins_today };

        let mut out = format!(
            "🎡 Prize wheel - {} points per paid spin\nFree spins: {} | Paid today: {}",
            cfg.cost, free, paid
        );
        if cfg.paid_limit > 0 {
            let _ = write!(out, "/{}", cfg.paid_limit);
        }
        let _ = write!(
            out,
            "\nTotal spins: {} | Streak: {} days | Grand prizes: {}",
            record.wheel.total_spins, record.wheel.spin_streak, record.wheel.top_tier_hits
        );
        Ok(out)
    }

    fn spin_help(&self) -> String {
        let mut out = format!(
            "{}\nOne free spin per day; extra spins cost {} points.",
            SPIN_USAGE, self.config.spin.cost
        );
        for prize in &self.config.spin.prizes {
            let _ = write!(
                out,
                "\n- {} ({:.0}%): {}",
                prize.name,
                prize.probability * 100.0,
                prize.description
            );
        }
        out
    }

    pub fn help(&self) -> String {
        [
            "🎮 Minigames",
            GUESS_USAGE,
            "sign - daily sign-in",
            "lottery - draw for points",
            SHOP_USAGE,
            "use <item> | inventory | achievements | profile",
            COW_USAGE,
            SPIN_USAGE,
        ]
        .join("\n")
    }
}

fn append_unlocks(reply: &mut String, unlocked: &[UnlockedAchievement]) {
    for a in unlocked {
        reply.push('\n');
        reply.push_str(&a.display_line());
    }
}
