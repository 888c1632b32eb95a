//! Match history time windows.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Length of a "month" when computing look-back windows.
const DAYS_PER_MONTH: i64 = 30;

/// Inclusive time window in epoch seconds, the unit match-v5 filters use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Window covering the last `months` (30-day) months up to `now`.
    ///
    /// Look-backs past the earliest representable date start there instead.
    pub fn last_months(months: u32, now: DateTime<Utc>) -> Self {
        let start = TimeDelta::try_days(DAYS_PER_MONTH * i64::from(months))
            .and_then(|span| now.checked_sub_signed(span))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        Self {
            start: start.timestamp(),
            end: now.timestamp(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, epoch_seconds: i64) -> bool {
        self.start <= epoch_seconds && epoch_seconds <= self.end
    }
}
