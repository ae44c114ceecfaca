//! Time source for the minigames.
//!
//! Streaks, daily quotas and cooldowns all depend on "now" and "today".
//! Handlers read both through [`Clock`] so tests can pin or advance time.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Local, NaiveDate, TimeZone};

pub trait Clock: Send + Sync {
    /// Current instant in epoch milliseconds.
    fn now_ms(&self) -> i64;

    /// Calendar day (host local time) containing `now_ms`.
    fn today(&self) -> NaiveDate {
        date_of(self.now_ms())
    }
}

/// Convert epoch milliseconds into the local calendar day.
pub fn date_of(ms: i64) -> NaiveDate {
    match Local.timestamp_millis_opt(ms) {
        chrono::LocalResult::Single(dt) => dt.date_naive(),
        chrono::LocalResult::Ambiguous(dt, _) => dt.date_naive(),
        chrono::LocalResult::None => DateTime::from_timestamp_millis(ms)
            .map(|dt| dt.date_naive())
            .unwrap_or_default(),
    }
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Local::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    /// Start at local noon of the given day, well away from midnight rollovers.
    pub fn at_noon(day: NaiveDate) -> Self {
        let noon = day.and_hms_opt(12, 0, 0).unwrap_or_default();
        let ms = match Local.from_local_datetime(&noon) {
            chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => {
                dt.timestamp_millis()
            }
            chrono::LocalResult::None => noon.and_utc().timestamp_millis(),
        };
        Self::new(ms)
    }

    pub fn set_ms(&self, ms: i64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_ms(days * 24 * 60 * 60 * 1000);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances_calendar_days() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let clock = ManualClock::at_noon(day);
        assert_eq!(clock.today(), day);
        clock.advance_days(1);
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }
}
