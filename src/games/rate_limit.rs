//! Per-user command throttling.
//!
//! Two limits apply to rate-limited commands:
//! - a daily quota that resets on the first command of a new calendar day
//! - a cooldown between consecutive commands
//!
//! State lives on the [`UserRecord`] itself, so it survives restarts and
//! follows the user across processes sharing one store.

use chrono::NaiveDate;

use crate::config::LimitsConfig;
use crate::games::errors::GameError;
use crate::games::types::UserRecord;

/// Reason a command was refused by the rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitReason {
    /// User already spent today's quota
    DailyLimitExceeded { limit: u32 },
    /// User must wait before issuing another command
    Cooldown { seconds_remaining: u64 },
}

impl std::fmt::Display for RateLimitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RateLimitReason::DailyLimitExceeded { limit } => {
                write!(f, "daily limit of {} commands reached", limit)
            }
            RateLimitReason::Cooldown { seconds_remaining } => {
                write!(f, "cooldown active for {} more seconds", seconds_remaining)
            }
        }
    }
}

impl From<RateLimitReason> for GameError {
    fn from(reason: RateLimitReason) -> Self {
        match reason {
            RateLimitReason::DailyLimitExceeded { limit } => GameError::DailyLimitExceeded { limit },
            RateLimitReason::Cooldown { seconds_remaining } => {
                GameError::Cooldown { seconds_remaining }
            }
        }
    }
}

/// Daily quota and cooldown gate.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    daily_limit: u32,
    cooldown_ms: i64,
}

impl RateLimiter {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self {
            daily_limit: limits.daily_command_limit,
            cooldown_ms: limits.command_cooldown_ms,
        }
    }

    /// Check the record against both limits and, when allowed, count the command.
    ///
    /// The day rollover is applied first and is kept even when the command is
    /// refused. A refusal never touches the counters.
    pub fn check_and_record(
        &self,
        record: &mut UserRecord,
        now_ms: i64,
        today: NaiveDate,
    ) -> Result<(), RateLimitReason> {
        if record.last_command_date != Some(today) {
            record.daily_command_count = 0;
            record.last_command_date = Some(today);
        }

        if record.daily_command_count >= self.daily_limit {
            return Err(RateLimitReason::DailyLimitExceeded {
                limit: self.daily_limit,
            });
        }

        let elapsed = now_ms - record.last_command_time;
        if elapsed < self.cooldown_ms {
            let remaining_ms = (self.cooldown_ms - elapsed) as u64;
            return Err(RateLimitReason::Cooldown {
                seconds_remaining: remaining_ms.div_ceil(1000),
            });
        }

        record.daily_command_count += 1;
        record.last_command_time = now_ms;
        Ok(())
    }
}
