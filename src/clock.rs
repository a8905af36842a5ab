use chrono::{DateTime, Duration, Months, Utc};
use hourglass_rs::{SafeTimeProvider, TimeSource};
use std::fmt;

use crate::errors::{LedgerError, Result};
use crate::types::DateInterval;

/// source of the fund's current date
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

impl Clock for SafeTimeProvider {
    fn now(&self) -> DateTime<Utc> {
        SafeTimeProvider::now(self)
    }
}

/// System date of the fund.
///
/// Wraps a time provider and adds an administrative offset so the
/// administrator can move the fund's date forward ("advance date")
/// independently of wall-clock time.
pub struct FundClock {
    provider: SafeTimeProvider,
    offset: Duration,
}

impl FundClock {
    pub fn new(provider: SafeTimeProvider) -> Self {
        Self {
            provider,
            offset: Duration::zero(),
        }
    }

    /// clock following wall-clock time
    pub fn system() -> Self {
        Self::new(SafeTimeProvider::new(TimeSource::System))
    }

    /// clock frozen at `start` until advanced
    pub fn fixed(start: DateTime<Utc>) -> Self {
        Self::new(SafeTimeProvider::new(TimeSource::Test(start)))
    }

    /// total administrative advance applied so far
    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// date the clock would show after `interval`, without moving it
    pub fn preview(&self, interval: DateInterval) -> Result<DateTime<Utc>> {
        advance_date(self.now(), interval)
    }

    /// move the fund's date forward, returning the new date
    pub fn advance(&mut self, interval: DateInterval) -> Result<DateTime<Utc>> {
        let current = self.now();
        let target = advance_date(current, interval)?;
        self.offset = self.offset + (target - current);

        tracing::info!(
            from = %current.date_naive(),
            to = %target.date_naive(),
            "system date advanced"
        );

        Ok(target)
    }
}

impl Clock for FundClock {
    fn now(&self) -> DateTime<Utc> {
        self.provider.now() + self.offset
    }
}

impl fmt::Debug for FundClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FundClock")
            .field("now", &self.now())
            .field("offset", &self.offset)
            .finish()
    }
}

/// add a days / weeks / months interval to a date
pub fn advance_date(from: DateTime<Utc>, interval: DateInterval) -> Result<DateTime<Utc>> {
    let amount = interval.amount();
    if amount < 1 {
        return Err(LedgerError::InvalidDateInterval { amount });
    }

    let target = match interval {
        DateInterval::Days(n) => from.checked_add_signed(Duration::days(n as i64)),
        DateInterval::Weeks(n) => from.checked_add_signed(Duration::weeks(n as i64)),
        // clamps to the last day of shorter months
        DateInterval::Months(n) => from.checked_add_months(Months::new(n)),
    };

    target.ok_or_else(|| LedgerError::InvalidConfiguration {
        message: format!("date out of range advancing {} by {:?}", from, interval),
    })
}
