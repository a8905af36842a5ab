use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amortization::{self, AmortizationSchedule, PaymentSplit};
use crate::clock::Clock;
use crate::config::LoanLimits;
use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::events::{Activity, ActivitySink, ActivityType, EntityType};
use crate::members::MemberDirectory;
use crate::types::{LoanId, LoanStatus, LoanTerm, MeetingId, MemberId, PaymentId};

/// loan origination request
#[derive(Debug, Clone, PartialEq)]
pub struct LoanRequest {
    pub member_id: MemberId,
    pub principal: Money,
    pub term_months: u32,
    /// meeting at which the loan is handed out, if any
    pub meeting_id: Option<MeetingId>,
}

impl LoanRequest {
    pub fn new(member_id: MemberId, principal: Money, term_months: u32) -> Self {
        Self {
            member_id,
            principal,
            term_months,
            meeting_id: None,
        }
    }

    pub fn at_meeting(mut self, meeting_id: MeetingId) -> Self {
        self.meeting_id = Some(meeting_id);
        self
    }
}

/// amortized loan owned by a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub member_id: MemberId,
    pub amount: Money,
    pub remaining_balance: Money,
    pub term: LoanTerm,
    /// monthly rate
    pub interest_rate: Rate,
    pub monthly_payment: Money,
    pub status: LoanStatus,
    pub start_date: DateTime<Utc>,
    pub liquidated_at: Option<DateTime<Utc>>,
    pub meeting_id: Option<MeetingId>,
    /// balance cleared without payment when a short liquidation closed the loan
    pub waived_balance: Money,
}

/// single, immutable payment event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    /// amount applied, always principal plus interest
    pub amount: Money,
    pub principal_amount: Money,
    pub interest_amount: Money,
    pub payment_date: DateTime<Utc>,
    pub meeting_id: Option<MeetingId>,
}

/// outcome of a payment
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub payment: Payment,
    /// tendered beyond what the loan could absorb; returned to the payer
    pub excess: Money,
    /// payment closed the loan
    pub liquidated: bool,
}

/// outcome of a liquidation
#[derive(Debug, Clone, PartialEq)]
pub struct LiquidationReceipt {
    pub payment: Payment,
    pub excess: Money,
    /// residual balance forced to zero
    pub waived: Money,
    pub liquidated_at: DateTime<Utc>,
}

impl Loan {
    /// Originate a loan for a member.
    ///
    /// The rate comes from the directory's rate class table and the monthly
    /// payment from the annuity formula. Records `loan_created`.
    pub fn originate(
        request: &LoanRequest,
        directory: &dyn MemberDirectory,
        limits: &LoanLimits,
        clock: &dyn Clock,
        activities: &mut dyn ActivitySink,
    ) -> Result<Self> {
        let member = directory.lookup(request.member_id)?;
        if !member.is_active() {
            return Err(LedgerError::MemberNotActive {
                id: member.id,
                status: member.status,
            });
        }

        if !request.principal.is_positive() {
            return Err(LedgerError::InvalidPrincipal {
                amount: request.principal,
            });
        }
        let term = LoanTerm::from_months(request.term_months)?;
        limits.check(request.principal)?;

        let rate = directory.rate_for(member.rate_class);
        let monthly_payment = amortization::monthly_payment(request.principal, rate, term.months());
        let now = clock.now();

        let loan = Self {
            id: Uuid::new_v4(),
            member_id: member.id,
            amount: request.principal,
            remaining_balance: request.principal,
            term,
            interest_rate: rate,
            monthly_payment,
            status: LoanStatus::Active,
            start_date: now,
            liquidated_at: None,
            meeting_id: request.meeting_id,
            waived_balance: Money::ZERO,
        };

        activities.record(Activity::new(
            ActivityType::LoanCreated,
            format!(
                "loan of {} to {} over {} at {} monthly",
                loan.amount, member.name, term, rate
            ),
            loan.id,
            EntityType::Loan,
            now,
        ));

        tracing::info!(
            loan = %loan.id,
            member = %member.id,
            amount = %loan.amount,
            term = term.months(),
            rate = %rate,
            monthly_payment = %monthly_payment,
            "loan originated"
        );

        Ok(loan)
    }

    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// principal repaid so far
    pub fn principal_paid(&self) -> Money {
        self.amount - self.remaining_balance - self.waived_balance
    }

    /// amount that closes the loan today without waiving any balance
    pub fn payoff_amount(&self) -> Money {
        amortization::payoff_amount(self.remaining_balance, self.interest_rate)
    }

    /// projected repayment table from the start date
    pub fn schedule(&self) -> Result<AmortizationSchedule> {
        AmortizationSchedule::generate(
            self.amount,
            self.interest_rate,
            self.term.months(),
            self.start_date,
        )
    }

    /// Apply a payment: one period of interest on the current balance first,
    /// the rest against principal. Closing the balance liquidates the loan.
    ///
    /// Records `payment_made`, plus `loan_liquidated` when the payment closes the loan.
    pub fn apply_payment(
        &mut self,
        amount: Money,
        meeting_id: Option<MeetingId>,
        clock: &dyn Clock,
        activities: &mut dyn ActivitySink,
    ) -> Result<PaymentReceipt> {
        if !self.is_active() {
            tracing::warn!(loan = %self.id, status = %self.status, "payment rejected");
            return Err(LedgerError::LoanNotActive {
                id: self.id,
                status: self.status,
            });
        }

        let split =
            amortization::split_payment(self.remaining_balance, self.interest_rate, amount)?;
        let now = clock.now();
        let payment = self.book_payment(&split, meeting_id, now);

        activities.record(Activity::new(
            ActivityType::PaymentMade,
            format!(
                "payment of {} ({} principal, {} interest)",
                payment.amount, payment.principal_amount, payment.interest_amount
            ),
            self.id,
            EntityType::Loan,
            now,
        ));

        let liquidated = self.remaining_balance.is_zero();
        if liquidated {
            self.close(now, activities);
        }

        tracing::info!(
            loan = %self.id,
            payment = %payment.id,
            principal = %payment.principal_amount,
            interest = %payment.interest_amount,
            remaining = %self.remaining_balance,
            "payment applied"
        );

        Ok(PaymentReceipt {
            payment,
            excess: split.excess,
            liquidated,
        })
    }

    /// Pay the loan off in one event.
    ///
    /// Without an amount the remaining balance is charged and split like any
    /// other payment. Whatever balance the payment leaves is waived, so the
    /// loan always ends liquidated with a zero balance.
    pub fn liquidate(
        &mut self,
        amount: Option<Money>,
        meeting_id: Option<MeetingId>,
        clock: &dyn Clock,
        activities: &mut dyn ActivitySink,
    ) -> Result<LiquidationReceipt> {
        if !self.is_active() {
            tracing::warn!(loan = %self.id, status = %self.status, "liquidation rejected");
            return Err(LedgerError::NotLiquidatable {
                id: self.id,
                status: self.status,
            });
        }

        let amount = amount.unwrap_or(self.remaining_balance);
        let split =
            amortization::split_payment(self.remaining_balance, self.interest_rate, amount)?;
        let now = clock.now();
        let payment = self.book_payment(&split, meeting_id, now);

        activities.record(Activity::new(
            ActivityType::PaymentMade,
            format!("liquidation payment of {}", payment.amount),
            self.id,
            EntityType::Loan,
            now,
        ));

        let waived = self.remaining_balance;
        if waived.is_positive() {
            self.waived_balance += waived;
            self.remaining_balance = Money::ZERO;
        }
        self.close(now, activities);

        tracing::info!(
            loan = %self.id,
            payment = %payment.id,
            amount = %payment.amount,
            waived = %waived,
            "loan liquidated"
        );

        Ok(LiquidationReceipt {
            payment,
            excess: split.excess,
            waived,
            liquidated_at: now,
        })
    }

    /// administrative override: active -> overdue
    pub fn mark_overdue(&mut self) -> Result<()> {
        self.transition(LoanStatus::Active, LoanStatus::Overdue)
    }

    /// administrative override: overdue -> active
    pub fn clear_overdue(&mut self) -> Result<()> {
        self.transition(LoanStatus::Overdue, LoanStatus::Active)
    }

    fn transition(&mut self, from: LoanStatus, to: LoanStatus) -> Result<()> {
        if self.status != from {
            return Err(LedgerError::InvalidTransition {
                id: self.id,
                from: self.status,
                to,
            });
        }

        self.status = to;
        tracing::info!(loan = %self.id, %from, %to, "loan status overridden");
        Ok(())
    }

    fn book_payment(
        &mut self,
        split: &PaymentSplit,
        meeting_id: Option<MeetingId>,
        now: DateTime<Utc>,
    ) -> Payment {
        self.remaining_balance = (self.remaining_balance - split.principal).max(Money::ZERO);

        Payment {
            id: Uuid::new_v4(),
            loan_id: self.id,
            amount: split.applied(),
            principal_amount: split.principal,
            interest_amount: split.interest,
            payment_date: now,
            meeting_id,
        }
    }

    fn close(&mut self, now: DateTime<Utc>, activities: &mut dyn ActivitySink) {
        self.status = LoanStatus::Liquidated;
        self.liquidated_at = Some(now);

        activities.record(Activity::new(
            ActivityType::LoanLiquidated,
            format!("loan of {} liquidated", self.amount),
            self.id,
            EntityType::Loan,
            now,
        ));
    }
}
