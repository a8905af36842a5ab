use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::amortization::{AmortizationSchedule, LoanQuote};
use crate::clock::{Clock, FundClock};
use crate::config::FundConfig;
use crate::decimal::Money;
use crate::errors::{LedgerError, Result};
use crate::events::{
    Activity, ActivityLog, ActivitySink, ActivityType, EntityType, PendingActivities,
};
use crate::loan::{LiquidationReceipt, Loan, LoanRequest, Payment, PaymentReceipt};
use crate::meetings::{self, Meeting, MeetingBook};
use crate::members::{Member, MemberDirectory, MemberRegistry};
use crate::types::{
    DateInterval, LoanId, LoanStatus, LoanTerm, MeetingId, MemberId, MemberStatus, RateClass,
};

/// dashboard figures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// cash on hand: opening capital - lent + collected
    pub fund_balance: Money,
    /// loans in `active` status only
    pub active_loans: usize,
    /// loans marked overdue; not counted in `active_loans` or `total_lent`
    pub overdue_loans: usize,
    /// principal of loans in `active` status
    pub total_lent: Money,
    /// balance still owed on every loan that is not liquidated, overdue included
    pub outstanding_balance: Money,
    /// interest collected in the current calendar month
    pub monthly_interest: Money,
    pub active_members: usize,
}

/// per-member figures for the member detail screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSummary {
    pub member: Member,
    pub active_loans: usize,
    pub liquidated_loans: usize,
    pub outstanding_balance: Money,
    pub total_borrowed: Money,
    pub credit_limit: Money,
    /// advisory; may go negative
    pub available_credit: Money,
}

/// totals over a set of payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentTotals {
    pub count: usize,
    pub collected: Money,
    pub principal: Money,
    pub interest: Money,
}

impl PaymentTotals {
    pub fn over<'a>(payments: impl IntoIterator<Item = &'a Payment>) -> Self {
        payments.into_iter().fold(Self::default(), |mut t, p| {
            t.count += 1;
            t.collected += p.amount;
            t.principal += p.principal_amount;
            t.interest += p.interest_amount;
            t
        })
    }
}

/// persisted state of a ledger, without its clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub config: FundConfig,
    pub members: MemberRegistry,
    pub loans: Vec<Loan>,
    pub payments: Vec<Payment>,
    pub meetings: MeetingBook,
    pub activities: ActivityLog,
}

/// The fund's books.
///
/// Every mutating operation takes `&mut self`, so at most one mutation is in
/// flight at a time. Operations validate everything they touch before
/// changing any state and only then append their activities, so a failed
/// call leaves balances, statuses and the log exactly as they were.
#[derive(Debug)]
pub struct Ledger {
    config: FundConfig,
    clock: FundClock,
    members: MemberRegistry,
    loans: HashMap<LoanId, Loan>,
    /// chronological
    payments: Vec<Payment>,
    meetings: MeetingBook,
    activities: ActivityLog,
}

impl Ledger {
    pub fn new(config: FundConfig, clock: FundClock) -> Result<Self> {
        config.validate()?;

        tracing::info!(fund = %config.fund_name, date = %clock.now().date_naive(), "ledger opened");

        Ok(Self {
            members: MemberRegistry::with_rates(config.rates),
            config,
            clock,
            loans: HashMap::new(),
            payments: Vec::new(),
            meetings: MeetingBook::new(),
            activities: ActivityLog::new(),
        })
    }

    pub fn config(&self) -> &FundConfig {
        &self.config
    }

    pub fn clock(&self) -> &FundClock {
        &self.clock
    }

    /// the fund's current system date
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// administrative "advance date"
    pub fn advance_date(&mut self, interval: DateInterval) -> Result<DateTime<Utc>> {
        self.clock.advance(interval)
    }

    // members

    pub fn register_member(&mut self, name: &str, rate_class: RateClass) -> Result<Member> {
        let now = self.clock.now();
        let member = self.members.register(name, rate_class, now)?.clone();

        self.activities.record(Activity::new(
            ActivityType::MemberAdded,
            format!("new {} member: {}", member.rate_class, member.name),
            member.id,
            EntityType::Member,
            now,
        ));
        tracing::info!(member = %member.id, class = %member.rate_class, "member registered");

        Ok(member)
    }

    pub fn set_member_status(&mut self, id: MemberId, status: MemberStatus) -> Result<Member> {
        let member = self.members.set_status(id, status)?.clone();
        tracing::info!(member = %id, %status, "member status changed");
        Ok(member)
    }

    pub fn member(&self, id: MemberId) -> Result<&Member> {
        self.members.lookup(id)
    }

    pub fn members(&self) -> Vec<&Member> {
        self.members.list()
    }

    pub fn member_loans(&self, id: MemberId) -> Vec<&Loan> {
        let mut loans: Vec<&Loan> = self.loans.values().filter(|l| l.member_id == id).collect();
        loans.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        loans
    }

    pub fn member_summary(&self, id: MemberId) -> Result<MemberSummary> {
        let member = self.members.lookup(id)?.clone();
        let loans = self.member_loans(id);

        let active: Vec<&&Loan> = loans.iter().filter(|l| l.is_active()).collect();
        let outstanding_balance: Money = active.iter().map(|l| l.remaining_balance).sum();
        let total_borrowed: Money = loans.iter().map(|l| l.amount).sum();
        let credit_limit = self.config.member_credit_limit;

        Ok(MemberSummary {
            active_loans: active.len(),
            liquidated_loans: loans.iter().filter(|l| l.status == LoanStatus::Liquidated).count(),
            outstanding_balance,
            total_borrowed,
            credit_limit,
            available_credit: credit_limit - outstanding_balance,
            member,
        })
    }

    // loans

    /// origination preview; changes nothing
    pub fn quote(
        &self,
        member_id: MemberId,
        principal: Money,
        term_months: u32,
    ) -> Result<LoanQuote> {
        let member = self.members.lookup(member_id)?;
        if !principal.is_positive() {
            return Err(LedgerError::InvalidPrincipal { amount: principal });
        }
        let term = LoanTerm::from_months(term_months)?;
        let rate = self.members.rate_for(member.rate_class);
        Ok(LoanQuote::new(principal, rate, term))
    }

    pub fn originate(
        &mut self,
        member_id: MemberId,
        principal: Money,
        term_months: u32,
    ) -> Result<Loan> {
        self.originate_loan(LoanRequest::new(member_id, principal, term_months))
    }

    /// originate a loan handed out at a meeting, counting it in the meeting's lent total
    pub fn originate_at_meeting(
        &mut self,
        member_id: MemberId,
        principal: Money,
        term_months: u32,
        meeting_id: MeetingId,
    ) -> Result<Loan> {
        let request = LoanRequest::new(member_id, principal, term_months).at_meeting(meeting_id);
        self.originate_loan(request)
    }

    fn originate_loan(&mut self, request: LoanRequest) -> Result<Loan> {
        if let Some(meeting_id) = request.meeting_id {
            self.meetings.get(meeting_id)?;
        }

        let mut pending = PendingActivities::new();
        let loan = Loan::originate(
            &request,
            &self.members,
            &self.config.loan_limits,
            &self.clock,
            &mut pending,
        )?;

        if let Some(meeting_id) = loan.meeting_id {
            self.meetings.get_mut(meeting_id)?.record_loan(&loan);
        }
        self.loans.insert(loan.id, loan.clone());
        pending.flush_into(&mut self.activities);

        Ok(loan)
    }

    pub fn apply_payment(
        &mut self,
        loan_id: LoanId,
        amount: Money,
        meeting_id: Option<MeetingId>,
    ) -> Result<PaymentReceipt> {
        if let Some(meeting_id) = meeting_id {
            self.meetings.get(meeting_id)?;
        }

        let mut pending = PendingActivities::new();
        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound { id: loan_id })?;
        let receipt = loan.apply_payment(amount, meeting_id, &self.clock, &mut pending)?;

        self.commit_payment(&receipt.payment)?;
        pending.flush_into(&mut self.activities);

        Ok(receipt)
    }

    /// pay off a loan; without an amount the remaining balance is charged
    pub fn liquidate(
        &mut self,
        loan_id: LoanId,
        amount: Option<Money>,
        meeting_id: Option<MeetingId>,
    ) -> Result<LiquidationReceipt> {
        if let Some(meeting_id) = meeting_id {
            self.meetings.get(meeting_id)?;
        }

        let mut pending = PendingActivities::new();
        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound { id: loan_id })?;
        let receipt = loan.liquidate(amount, meeting_id, &self.clock, &mut pending)?;

        self.commit_payment(&receipt.payment)?;
        pending.flush_into(&mut self.activities);

        Ok(receipt)
    }

    fn commit_payment(&mut self, payment: &Payment) -> Result<()> {
        if let Some(meeting_id) = payment.meeting_id {
            // existence was checked before the loan was touched
            self.meetings.get_mut(meeting_id)?.record_payment(payment);
        }
        self.payments.push(payment.clone());
        Ok(())
    }

    pub fn mark_overdue(&mut self, loan_id: LoanId) -> Result<&Loan> {
        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound { id: loan_id })?;
        loan.mark_overdue()?;
        Ok(&*loan)
    }

    pub fn clear_overdue(&mut self, loan_id: LoanId) -> Result<&Loan> {
        let loan = self
            .loans
            .get_mut(&loan_id)
            .ok_or(LedgerError::LoanNotFound { id: loan_id })?;
        loan.clear_overdue()?;
        Ok(&*loan)
    }

    /// Corrective removal of a loan entered by mistake.
    ///
    /// Only loans that are no longer active and have no payments qualify.
    pub fn delete_loan(&mut self, loan_id: LoanId) -> Result<Loan> {
        let loan = self.loan(loan_id)?;
        let payment_count = self.payments.iter().filter(|p| p.loan_id == loan_id).count();

        if loan.is_active() || payment_count > 0 {
            return Err(LedgerError::LoanNotDeletable {
                id: loan_id,
                status: loan.status,
                payment_count,
            });
        }

        let loan = self
            .loans
            .remove(&loan_id)
            .ok_or(LedgerError::LoanNotFound { id: loan_id })?;
        if let Some(meeting_id) = loan.meeting_id {
            if let Ok(meeting) = self.meetings.get_mut(meeting_id) {
                meeting.total_lent -= loan.amount;
            }
        }

        tracing::info!(loan = %loan_id, "loan deleted");
        Ok(loan)
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan> {
        self.loans.get(&id).ok_or(LedgerError::LoanNotFound { id })
    }

    /// newest first
    pub fn loans(&self) -> Vec<&Loan> {
        let mut loans: Vec<&Loan> = self.loans.values().collect();
        loans.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        loans
    }

    pub fn loans_with_status(&self, status: LoanStatus) -> Vec<&Loan> {
        self.loans().into_iter().filter(|l| l.status == status).collect()
    }

    /// a loan's payments, oldest first
    pub fn loan_payments(&self, id: LoanId) -> Vec<&Payment> {
        self.payments.iter().filter(|p| p.loan_id == id).collect()
    }

    pub fn loan_schedule(&self, id: LoanId) -> Result<AmortizationSchedule> {
        self.loan(id)?.schedule()
    }

    // meetings

    pub fn next_meeting_date(&self) -> Result<NaiveDate> {
        let now = self.clock.now();
        meetings::next_meeting_date(now, &self.config.meeting_schedule).ok_or_else(|| {
            LedgerError::InvalidConfiguration {
                message: format!("no meeting day after {}", now.date_naive()),
            }
        })
    }

    pub fn create_meeting(&mut self, date: NaiveDate, summary: Option<String>) -> Result<Meeting> {
        let now = self.clock.now();
        let meeting = self.meetings.schedule(date, summary, now)?.clone();

        self.activities.record(Activity::new(
            ActivityType::MeetingCreated,
            format!("meeting scheduled for {}", meeting.date),
            meeting.id,
            EntityType::Meeting,
            now,
        ));
        tracing::info!(meeting = %meeting.id, date = %meeting.date, "meeting created");

        Ok(meeting)
    }

    /// create the next recurring meeting
    pub fn auto_generate_meeting(&mut self) -> Result<Meeting> {
        let date = self.next_meeting_date()?;
        self.create_meeting(date, None)
    }

    pub fn meeting(&self, id: MeetingId) -> Result<&Meeting> {
        self.meetings.get(id)
    }

    /// newest first
    pub fn meetings(&self) -> Vec<&Meeting> {
        self.meetings.list()
    }

    pub fn meeting_payments(&self, id: MeetingId) -> Vec<&Payment> {
        self.payments.iter().filter(|p| p.meeting_id == Some(id)).collect()
    }

    pub fn meeting_loans(&self, id: MeetingId) -> Vec<&Loan> {
        self.loans().into_iter().filter(|l| l.meeting_id == Some(id)).collect()
    }

    /// rebuild a meeting's totals from the payments and loans attributed to it
    pub fn refresh_meeting_totals(&mut self, id: MeetingId) -> Result<&Meeting> {
        let new_loans: Vec<Loan> = self
            .loans
            .values()
            .filter(|l| l.meeting_id == Some(id))
            .cloned()
            .collect();
        let meeting = self.meetings.get_mut(id)?;
        meetings::attribute_to_meeting(meeting, &self.payments, &new_loans);

        tracing::debug!(
            meeting = %id,
            collected = %meeting.total_collected,
            lent = %meeting.total_lent,
            interest = %meeting.total_interest,
            "meeting totals recomputed"
        );
        Ok(&*meeting)
    }

    // reporting

    pub fn dashboard(&self) -> DashboardSummary {
        let now = self.clock.now();
        let lent_ever: Money = self.loans.values().map(|l| l.amount).sum();
        let collected: Money = self.payments.iter().map(|p| p.amount).sum();
        let active: Vec<&Loan> = self.loans.values().filter(|l| l.is_active()).collect();

        let monthly_interest = self
            .payments
            .iter()
            .filter(|p| {
                p.payment_date.year() == now.year() && p.payment_date.month() == now.month()
            })
            .map(|p| p.interest_amount)
            .sum();

        DashboardSummary {
            fund_balance: self.config.opening_capital - lent_ever + collected,
            active_loans: active.len(),
            overdue_loans: self
                .loans
                .values()
                .filter(|l| l.status == LoanStatus::Overdue)
                .count(),
            total_lent: active.iter().map(|l| l.amount).sum(),
            outstanding_balance: self
                .loans
                .values()
                .filter(|l| l.status != LoanStatus::Liquidated)
                .map(|l| l.remaining_balance)
                .sum(),
            monthly_interest,
            active_members: self.members.active().len(),
        }
    }

    pub fn activities(&self) -> &ActivityLog {
        &self.activities
    }

    /// newest first
    pub fn recent_activities(&self, limit: usize) -> Vec<&Activity> {
        self.activities.recent(limit)
    }

    /// case-insensitive filter on description or type, newest first
    pub fn search_activities(&self, text: &str) -> Vec<&Activity> {
        self.activities.search(text)
    }

    pub fn activity_counts(&self) -> BTreeMap<ActivityType, usize> {
        self.activities.counts_by_type()
    }

    /// every payment, oldest first
    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn payment_totals(&self) -> PaymentTotals {
        PaymentTotals::over(&self.payments)
    }

    // persistence

    pub fn snapshot(&self) -> LedgerSnapshot {
        let mut loans: Vec<Loan> = self.loans.values().cloned().collect();
        loans.sort_by(|a, b| a.start_date.cmp(&b.start_date).then_with(|| a.id.cmp(&b.id)));

        LedgerSnapshot {
            config: self.config.clone(),
            members: self.members.clone(),
            loans,
            payments: self.payments.clone(),
            meetings: self.meetings.clone(),
            activities: self.activities.clone(),
        }
    }

    pub fn restore(snapshot: LedgerSnapshot, clock: FundClock) -> Result<Self> {
        snapshot.config.validate()?;

        Ok(Self {
            config: snapshot.config,
            clock,
            members: snapshot.members,
            loans: snapshot.loans.into_iter().map(|l| (l.id, l)).collect(),
            payments: snapshot.payments,
            meetings: snapshot.meetings,
            activities: snapshot.activities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn ledger_at(y: i32, m: u32, d: u32) -> Ledger {
        let clock = FundClock::fixed(Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap());
        Ledger::new(FundConfig::default(), clock).unwrap()
    }

    fn ledger() -> Ledger {
        ledger_at(2024, 3, 9)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = FundConfig::default();
        config.meeting_schedule.week_of_month = 0;
        let clock = FundClock::fixed(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert!(Ledger::new(config, clock).is_err());
    }

    #[test]
    fn test_member_registration_logs_activity() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();

        assert_eq!(ledger.member(member.id).unwrap().name, "Ana");
        let recent = ledger.recent_activities(10);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].activity_type, ActivityType::MemberAdded);
        assert_eq!(recent[0].entity_id, Some(member.id));
    }

    #[test]
    fn test_quote_matches_origination() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();

        let quote = ledger.quote(member.id, Money::from_major(500_000), 6).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 6).unwrap();

        assert_eq!(quote.monthly_payment, loan.monthly_payment);
        assert_eq!(quote.rate, loan.interest_rate);
        assert_eq!(ledger.activities().len(), 2);

        assert!(ledger.quote(member.id, Money::from_major(500_000), 9).is_err());
    }

    #[test]
    fn test_origination_errors_leave_ledger_untouched() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();

        let err = ledger.originate(member.id, Money::from_major(500_000), 18).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = ledger.originate(Uuid::new_v4(), Money::from_major(500_000), 12).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        let err = ledger
            .originate_at_meeting(member.id, Money::from_major(500_000), 12, Uuid::new_v4())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        assert!(ledger.loans().is_empty());
        assert_eq!(ledger.activities().len(), 1);
    }

    #[test]
    fn test_payment_scenario_through_ledger() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 6).unwrap();

        let receipt = ledger.apply_payment(loan.id, Money::from_major(100_000), None).unwrap();
        assert_eq!(receipt.payment.interest_amount, Money::from_major(40_000));
        assert_eq!(receipt.payment.principal_amount, Money::from_major(60_000));

        let stored = ledger.loan(loan.id).unwrap();
        assert_eq!(stored.remaining_balance, Money::from_major(440_000));
        assert_eq!(stored.status, LoanStatus::Active);
        assert_eq!(ledger.loan_payments(loan.id).len(), 1);
    }

    #[test]
    fn test_unknown_loan() {
        let mut ledger = ledger();
        let id = Uuid::new_v4();

        assert_eq!(
            ledger.apply_payment(id, Money::from_major(1), None).unwrap_err(),
            LedgerError::LoanNotFound { id }
        );
        assert_eq!(ledger.liquidate(id, None, None).unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(ledger.mark_overdue(id).unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_failed_payment_is_atomic() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 6).unwrap();
        let activities_before = ledger.activities().len();

        // unknown meeting: rejected before the loan is touched
        let err = ledger
            .apply_payment(loan.id, Money::from_major(100_000), Some(Uuid::new_v4()))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        // below interest
        let err = ledger.apply_payment(loan.id, Money::from_major(1_000), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(ledger.loan(loan.id).unwrap(), &loan);
        assert!(ledger.payments().is_empty());
        assert_eq!(ledger.activities().len(), activities_before);
    }

    #[test]
    fn test_liquidation_is_terminal() {
        let mut ledger = ledger();
        let member = ledger.register_member("Pedro", RateClass::External).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(1_000_000), 12).unwrap();

        ledger.advance_date(DateInterval::Weeks(2)).unwrap();
        let receipt = ledger.liquidate(loan.id, None, None).unwrap();
        assert_eq!(receipt.payment.amount, Money::from_major(1_000_000));
        assert_eq!(receipt.payment.interest_amount, Money::from_major(120_000));
        assert_eq!(receipt.payment.principal_amount, Money::from_major(880_000));
        assert_eq!(receipt.waived, Money::from_major(120_000));
        assert_eq!(receipt.liquidated_at, ledger.now());

        let stored = ledger.loan(loan.id).unwrap().clone();
        assert_eq!(stored.status, LoanStatus::Liquidated);
        assert_eq!(stored.remaining_balance, Money::ZERO);
        assert_eq!(stored.liquidated_at, Some(ledger.now()));

        let activities_before = ledger.activities().len();
        let err = ledger.liquidate(loan.id, None, None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(ledger.loan(loan.id).unwrap(), &stored);
        assert_eq!(ledger.activities().len(), activities_before);

        let counts = ledger.activities().counts_by_type();
        assert_eq!(counts.get(&ActivityType::PaymentMade), Some(&1));
        assert_eq!(counts.get(&ActivityType::LoanLiquidated), Some(&1));
    }

    #[test]
    fn test_sum_invariant_across_mixed_payments() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(750_000), 12).unwrap();

        let amounts = ["99000.00", "60000.55", "120000", "87654.32", "250000", "300000", "200000"];
        for amount in amounts {
            let amount = Money::from_str_exact(amount).unwrap();
            if !ledger.loan(loan.id).unwrap().is_active() {
                break;
            }
            ledger.apply_payment(loan.id, amount, None).unwrap();
            ledger.advance_date(DateInterval::Months(1)).unwrap();

            let current = ledger.loan(loan.id).unwrap();
            let principal: Money =
                ledger.loan_payments(loan.id).iter().map(|p| p.principal_amount).sum();
            assert!((principal + current.remaining_balance - current.amount).abs() <= Money::CENT);
        }

        let current = ledger.loan(loan.id).unwrap();
        assert_eq!(current.status, LoanStatus::Liquidated);
        assert_eq!(current.remaining_balance, Money::ZERO);
    }

    #[test]
    fn test_overdue_override_and_deletion() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 12).unwrap();

        // active loans are never deleted
        let err = ledger.delete_loan(loan.id).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);

        assert_eq!(ledger.mark_overdue(loan.id).unwrap().status, LoanStatus::Overdue);
        let removed = ledger.delete_loan(loan.id).unwrap();
        assert_eq!(removed.id, loan.id);
        assert!(ledger.loan(loan.id).is_err());
    }

    #[test]
    fn test_loans_with_payments_are_kept() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 12).unwrap();
        ledger.apply_payment(loan.id, Money::from_major(100_000), None).unwrap();
        ledger.mark_overdue(loan.id).unwrap();

        assert!(matches!(
            ledger.delete_loan(loan.id),
            Err(LedgerError::LoanNotDeletable { payment_count: 1, .. })
        ));

        ledger.clear_overdue(loan.id).unwrap();
        ledger.liquidate(loan.id, None, None).unwrap();
        assert!(ledger.delete_loan(loan.id).is_err());
    }

    #[test]
    fn test_meeting_cycle_totals() {
        let mut ledger = ledger_at(2024, 6, 1);
        let ana = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let pedro = ledger.register_member("Pedro", RateClass::External).unwrap();

        let meeting = ledger.auto_generate_meeting().unwrap();
        assert_eq!(meeting.date, date(2024, 6, 8));

        ledger.advance_date(DateInterval::Days(7)).unwrap();
        let loan_a = ledger.originate(ana.id, Money::from_major(500_000), 6).unwrap();
        let loan_p = ledger
            .originate_at_meeting(pedro.id, Money::from_major(300_000), 12, meeting.id)
            .unwrap();

        ledger.apply_payment(loan_a.id, Money::from_major(100_000), Some(meeting.id)).unwrap();
        ledger.apply_payment(loan_p.id, Money::from_major(50_000), Some(meeting.id)).unwrap();
        ledger.apply_payment(loan_a.id, Money::from_major(80_000), None).unwrap();

        let stored = ledger.meeting(meeting.id).unwrap().clone();
        assert_eq!(stored.total_collected, Money::from_major(150_000));
        assert_eq!(stored.total_interest, Money::from_major(40_000 + 36_000));
        assert_eq!(stored.total_lent, Money::from_major(300_000));

        // recomputing from attributions agrees with the running totals
        let refreshed = ledger.refresh_meeting_totals(meeting.id).unwrap().clone();
        assert_eq!(refreshed, stored);

        assert_eq!(ledger.meeting_payments(meeting.id).len(), 2);
        assert_eq!(ledger.meeting_loans(meeting.id).len(), 1);
    }

    #[test]
    fn test_liquidation_at_meeting_counts_in_totals() {
        let mut ledger = ledger_at(2024, 6, 1);
        let ana = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let meeting = ledger.auto_generate_meeting().unwrap();
        let loan = ledger.originate(ana.id, Money::from_major(500_000), 6).unwrap();
        ledger.apply_payment(loan.id, Money::from_major(100_000), Some(meeting.id)).unwrap();

        // unknown meeting: rejected before the loan is touched
        let before = ledger.loan(loan.id).unwrap().clone();
        let err = ledger.liquidate(loan.id, None, Some(Uuid::new_v4())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(ledger.loan(loan.id).unwrap(), &before);

        let receipt = ledger.liquidate(loan.id, None, Some(meeting.id)).unwrap();
        assert_eq!(receipt.payment.amount, Money::from_major(440_000));
        assert_eq!(receipt.payment.meeting_id, Some(meeting.id));

        let stored = ledger.meeting(meeting.id).unwrap().clone();
        assert_eq!(stored.total_collected, Money::from_major(100_000 + 440_000));
        assert_eq!(stored.total_interest, Money::from_major(40_000 + 35_200));

        let refreshed = ledger.refresh_meeting_totals(meeting.id).unwrap().clone();
        assert_eq!(refreshed, stored);
        assert_eq!(ledger.meeting_payments(meeting.id).len(), 2);
    }

    #[test]
    fn test_auto_generate_after_meeting_day() {
        // 2026-10-16 is after the second saturday (10th)
        let mut ledger = ledger_at(2026, 10, 16);
        assert_eq!(ledger.next_meeting_date().unwrap(), date(2026, 11, 14));

        let meeting = ledger.auto_generate_meeting().unwrap();
        assert_eq!(meeting.date, date(2026, 11, 14));

        // same date again conflicts
        let err = ledger.auto_generate_meeting().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
        assert_eq!(ledger.meetings().len(), 1);

        let created = ledger.activities().of_type(ActivityType::MeetingCreated);
        assert_eq!(created.len(), 1);
    }

    #[test]
    fn test_meeting_day_itself_counts_as_passed() {
        // 10:00 on the second saturday of october
        let mut ledger = ledger_at(2026, 10, 10);
        assert_eq!(ledger.next_meeting_date().unwrap(), date(2026, 11, 14));

        let meeting = ledger.auto_generate_meeting().unwrap();
        assert_eq!(meeting.date, date(2026, 11, 14));
    }

    #[test]
    fn test_dashboard_and_member_summary() {
        let mut ledger = ledger_at(2024, 3, 2);
        let ana = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let pedro = ledger.register_member("Pedro", RateClass::External).unwrap();
        ledger.set_member_status(pedro.id, MemberStatus::Inactive).unwrap();

        let first = ledger.originate(ana.id, Money::from_major(500_000), 6).unwrap();
        let second = ledger.originate(ana.id, Money::from_major(200_000), 12).unwrap();
        ledger.apply_payment(first.id, Money::from_major(100_000), None).unwrap();
        ledger.liquidate(second.id, None, None).unwrap();

        let dashboard = ledger.dashboard();
        // 16M - 700k lent + 100k + 200k collected
        assert_eq!(dashboard.fund_balance, Money::from_major(15_600_000));
        assert_eq!(dashboard.active_loans, 1);
        assert_eq!(dashboard.overdue_loans, 0);
        assert_eq!(dashboard.total_lent, Money::from_major(500_000));
        assert_eq!(dashboard.outstanding_balance, Money::from_major(440_000));
        assert_eq!(dashboard.monthly_interest, Money::from_major(40_000 + 16_000));
        assert_eq!(dashboard.active_members, 1);

        // next month starts a fresh interest count
        ledger.advance_date(DateInterval::Months(1)).unwrap();
        assert_eq!(ledger.dashboard().monthly_interest, Money::ZERO);

        let summary = ledger.member_summary(ana.id).unwrap();
        assert_eq!(summary.active_loans, 1);
        assert_eq!(summary.liquidated_loans, 1);
        assert_eq!(summary.outstanding_balance, Money::from_major(440_000));
        assert_eq!(summary.total_borrowed, Money::from_major(700_000));
        assert_eq!(summary.available_credit, Money::from_major(1_560_000));

        // overdue loans leave the active figures but still count as owed
        ledger.mark_overdue(first.id).unwrap();
        let dashboard = ledger.dashboard();
        assert_eq!(dashboard.active_loans, 0);
        assert_eq!(dashboard.overdue_loans, 1);
        assert_eq!(dashboard.total_lent, Money::ZERO);
        assert_eq!(dashboard.outstanding_balance, Money::from_major(440_000));

        // inactive members keep their history but cannot borrow
        let err = ledger.originate(pedro.id, Money::from_major(100_000), 6).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateConflict);
    }

    #[test]
    fn test_payment_totals() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 6).unwrap();
        ledger.apply_payment(loan.id, Money::from_major(100_000), None).unwrap();
        ledger.apply_payment(loan.id, Money::from_major(100_000), None).unwrap();

        let totals = ledger.payment_totals();
        assert_eq!(totals.count, 2);
        assert_eq!(totals.collected, Money::from_major(200_000));
        assert_eq!(totals.interest, Money::from_major(40_000 + 35_200));
        assert_eq!(totals.principal, Money::from_major(60_000 + 64_800));
    }

    #[test]
    fn test_history_queries() {
        let mut ledger = ledger();
        let ana = ledger.register_member("Ana", RateClass::Standard).unwrap();
        ledger.register_member("Pedro", RateClass::External).unwrap();
        let loan = ledger.originate(ana.id, Money::from_major(500_000), 6).unwrap();
        ledger.apply_payment(loan.id, Money::from_major(100_000), None).unwrap();

        let recent = ledger.recent_activities(2);
        assert_eq!(recent[0].activity_type, ActivityType::PaymentMade);
        assert_eq!(recent[1].activity_type, ActivityType::LoanCreated);

        assert_eq!(ledger.search_activities("pedro").len(), 1);
        assert_eq!(ledger.search_activities("member_added").len(), 2);

        let counts = ledger.activity_counts();
        assert_eq!(counts.get(&ActivityType::MemberAdded), Some(&2));
        assert_eq!(counts.get(&ActivityType::LoanLiquidated), None);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut ledger = ledger();
        let member = ledger.register_member("Ana", RateClass::Standard).unwrap();
        let loan = ledger.originate(member.id, Money::from_major(500_000), 6).unwrap();
        ledger.apply_payment(loan.id, Money::from_major(100_000), None).unwrap();

        let json = serde_json::to_string(&ledger.snapshot()).unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&json).unwrap();
        let restored = Ledger::restore(snapshot, FundClock::fixed(ledger.now())).unwrap();

        assert_eq!(restored.loan(loan.id).unwrap(), ledger.loan(loan.id).unwrap());
        assert_eq!(restored.payments(), ledger.payments());
        assert_eq!(restored.activities().len(), ledger.activities().len());
        assert_eq!(restored.dashboard(), ledger.dashboard());
    }
}
