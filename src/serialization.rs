/// serializable detail views over the ledger
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::ledger::{Ledger, PaymentTotals};
use crate::loan::{Loan, Payment};
use crate::members::Member;
use crate::types::{LoanId, LoanStatus, MeetingId, MemberId, MemberStatus, RateClass};

/// loan with its borrower and payment history
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanView {
    pub id: LoanId,
    pub member: MemberRef,
    pub status: LoanStatus,
    pub start_date: DateTime<Utc>,
    pub liquidated_at: Option<DateTime<Utc>>,
    pub financial: LoanFinancialView,
    pub totals: PaymentTotals,
    pub payments: Vec<Payment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MemberRef {
    pub id: MemberId,
    pub name: String,
    pub rate_class: RateClass,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoanFinancialView {
    pub amount: Money,
    pub remaining_balance: Money,
    pub principal_paid: Money,
    pub waived_balance: Money,
    pub interest_rate: Rate,
    pub term_months: u32,
    pub monthly_payment: Money,
    /// only while the loan is active
    pub payoff_amount: Option<Money>,
}

impl MemberRef {
    fn from_member(member: &Member) -> Self {
        MemberRef {
            id: member.id,
            name: member.name.clone(),
            rate_class: member.rate_class,
        }
    }
}

impl LoanView {
    pub fn from_loan(loan: &Loan, member: &Member, payments: &[&Payment]) -> Self {
        LoanView {
            id: loan.id,
            member: MemberRef::from_member(member),
            status: loan.status,
            start_date: loan.start_date,
            liquidated_at: loan.liquidated_at,
            financial: LoanFinancialView {
                amount: loan.amount,
                remaining_balance: loan.remaining_balance,
                principal_paid: loan.principal_paid(),
                waived_balance: loan.waived_balance,
                interest_rate: loan.interest_rate,
                term_months: loan.term.months(),
                monthly_payment: loan.monthly_payment,
                payoff_amount: loan.is_active().then(|| loan.payoff_amount()),
            },
            totals: PaymentTotals::over(payments.iter().copied()),
            payments: payments.iter().map(|p| (*p).clone()).collect(),
        }
    }

    pub fn load(ledger: &Ledger, id: LoanId) -> Result<Self> {
        let loan = ledger.loan(id)?;
        let member = ledger.member(loan.member_id)?;
        Ok(Self::from_loan(loan, member, &ledger.loan_payments(id)))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// member detail screen
#[derive(Debug, Serialize, Deserialize)]
pub struct MemberView {
    pub id: MemberId,
    pub name: String,
    pub rate_class: RateClass,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
    pub active_loans: usize,
    pub outstanding_balance: Money,
    pub total_borrowed: Money,
    pub available_credit: Money,
    pub loans: Vec<LoanLine>,
}

/// one row of a loan listing
#[derive(Debug, Serialize, Deserialize)]
pub struct LoanLine {
    pub id: LoanId,
    pub amount: Money,
    pub remaining_balance: Money,
    pub monthly_payment: Money,
    pub term_months: u32,
    pub status: LoanStatus,
    pub start_date: DateTime<Utc>,
}

impl LoanLine {
    fn from_loan(loan: &Loan) -> Self {
        LoanLine {
            id: loan.id,
            amount: loan.amount,
            remaining_balance: loan.remaining_balance,
            monthly_payment: loan.monthly_payment,
            term_months: loan.term.months(),
            status: loan.status,
            start_date: loan.start_date,
        }
    }
}

impl MemberView {
    pub fn load(ledger: &Ledger, id: MemberId) -> Result<Self> {
        let summary = ledger.member_summary(id)?;

        Ok(MemberView {
            id: summary.member.id,
            name: summary.member.name.clone(),
            rate_class: summary.member.rate_class,
            status: summary.member.status,
            created_at: summary.member.created_at,
            active_loans: summary.active_loans,
            outstanding_balance: summary.outstanding_balance,
            total_borrowed: summary.total_borrowed,
            available_credit: summary.available_credit,
            loans: ledger.member_loans(id).into_iter().map(LoanLine::from_loan).collect(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// meeting minutes: what was collected and lent
#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingView {
    pub id: MeetingId,
    pub date: NaiveDate,
    pub summary: Option<String>,
    pub total_collected: Money,
    pub total_lent: Money,
    pub total_interest: Money,
    pub payments: Vec<MeetingPaymentLine>,
    pub new_loans: Vec<LoanLine>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingPaymentLine {
    pub payment: Payment,
    /// borrower, when the loan still exists
    pub member_name: Option<String>,
}

impl MeetingView {
    pub fn load(ledger: &Ledger, id: MeetingId) -> Result<Self> {
        let meeting = ledger.meeting(id)?;

        let payments = ledger
            .meeting_payments(id)
            .into_iter()
            .map(|p| MeetingPaymentLine {
                payment: p.clone(),
                member_name: ledger
                    .loan(p.loan_id)
                    .and_then(|l| ledger.member(l.member_id))
                    .map(|m| m.name.clone())
                    .ok(),
            })
            .collect();

        Ok(MeetingView {
            id: meeting.id,
            date: meeting.date,
            summary: meeting.summary.clone(),
            total_collected: meeting.total_collected,
            total_lent: meeting.total_lent,
            total_interest: meeting.total_interest,
            payments,
            new_loans: ledger.meeting_loans(id).into_iter().map(LoanLine::from_loan).collect(),
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
