use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::MeetingSchedule;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::loan::{Loan, Payment};
use crate::types::MeetingId;

/// monthly gathering where payments are collected and loans handed out
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub date: NaiveDate,
    pub total_collected: Money,
    pub total_lent: Money,
    pub total_interest: Money,
    pub summary: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Meeting {
    pub fn new(date: NaiveDate, summary: Option<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            total_collected: Money::ZERO,
            total_lent: Money::ZERO,
            total_interest: Money::ZERO,
            summary,
            created_at,
        }
    }

    /// add one payment to the running totals
    pub fn record_payment(&mut self, payment: &Payment) {
        self.total_collected += payment.amount;
        self.total_interest += payment.interest_amount;
    }

    /// add one newly originated loan to the running totals
    pub fn record_loan(&mut self, loan: &Loan) {
        self.total_lent += loan.amount;
    }
}

/// Recompute a meeting's totals from scratch.
///
/// Only payments and loans attributed to this meeting count; anything else
/// in the slices is ignored.
pub fn attribute_to_meeting(meeting: &mut Meeting, payments: &[Payment], new_loans: &[Loan]) {
    let attributed = |id: Option<MeetingId>| id == Some(meeting.id);

    let (collected, interest) = payments
        .iter()
        .filter(|p| attributed(p.meeting_id))
        .fold((Money::ZERO, Money::ZERO), |(c, i), p| {
            (c + p.amount, i + p.interest_amount)
        });
    let lent: Money = new_loans
        .iter()
        .filter(|l| attributed(l.meeting_id))
        .map(|l| l.amount)
        .sum();

    meeting.total_collected = collected;
    meeting.total_interest = interest;
    meeting.total_lent = lent;
}

/// the `n`th (1-based) `weekday` of a month
pub fn nth_weekday_of_month(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    if n == 0 {
        return None;
    }

    let first_of_month = NaiveDate::from_ymd_opt(year, month, 1)?;
    let offset =
        (7 + weekday.num_days_from_sunday() - first_of_month.weekday().num_days_from_sunday()) % 7;
    let first = first_of_month + Duration::days(offset as i64);
    let date = first + Duration::weeks(n as i64 - 1);

    // the fifth occurrence may spill into the next month
    (date.month() == month).then_some(date)
}

/// second Saturday of a month
pub fn second_saturday(year: i32, month: u32) -> Option<NaiveDate> {
    nth_weekday_of_month(year, month, Weekday::Sat, 2)
}

/// This month's meeting day if it has not started yet, otherwise next month's.
///
/// A meeting day starts at midnight UTC, so any later instant on the day
/// itself already rolls over to the following month.
pub fn next_meeting_date(now: DateTime<Utc>, schedule: &MeetingSchedule) -> Option<NaiveDate> {
    let today = now.date_naive();
    let this_month = nth_weekday_of_month(
        today.year(),
        today.month(),
        schedule.weekday,
        schedule.week_of_month,
    )?;
    if Utc.from_utc_datetime(&this_month.and_time(NaiveTime::MIN)) >= now {
        return Some(this_month);
    }

    let next = today.with_day(1)?.checked_add_months(Months::new(1))?;
    nth_weekday_of_month(next.year(), next.month(), schedule.weekday, schedule.week_of_month)
}

/// all meetings of the fund
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeetingBook {
    meetings: HashMap<MeetingId, Meeting>,
}

impl MeetingBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.meetings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meetings.is_empty()
    }

    /// schedule a meeting; one meeting per date
    pub fn schedule(
        &mut self,
        date: NaiveDate,
        summary: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<&Meeting> {
        if self.on_date(date).is_some() {
            return Err(LedgerError::DuplicateMeeting { date });
        }

        let meeting = Meeting::new(date, summary, created_at);
        let id = meeting.id;
        Ok(&*self.meetings.entry(id).or_insert(meeting))
    }

    pub fn get(&self, id: MeetingId) -> Result<&Meeting> {
        self.meetings.get(&id).ok_or(LedgerError::MeetingNotFound { id })
    }

    pub fn get_mut(&mut self, id: MeetingId) -> Result<&mut Meeting> {
        self.meetings.get_mut(&id).ok_or(LedgerError::MeetingNotFound { id })
    }

    pub fn on_date(&self, date: NaiveDate) -> Option<&Meeting> {
        self.meetings.values().find(|m| m.date == date)
    }

    /// newest first
    pub fn list(&self) -> Vec<&Meeting> {
        let mut meetings: Vec<&Meeting> = self.meetings.values().collect();
        meetings.sort_by(|a, b| b.date.cmp(&a.date));
        meetings
    }

    /// latest meeting on or before `date`
    pub fn latest_before(&self, date: NaiveDate) -> Option<&Meeting> {
        self.meetings
            .values()
            .filter(|m| m.date <= date)
            .max_by_key(|m| m.date)
    }
}
