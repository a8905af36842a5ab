use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::LoanTerm;

/// Fixed monthly payment that fully amortizes `principal` over `months`
/// equal payments at the periodic `rate`.
///
/// `payment = P * r * (1 + r)^n / ((1 + r)^n - 1)`, falling back to
/// `P / n` when the rate is zero.
pub fn monthly_payment(principal: Money, rate: Rate, months: u32) -> Money {
    if months == 0 {
        return principal;
    }

    let r = rate.as_decimal();
    if r.is_zero() {
        return principal / Decimal::from(months);
    }

    // (1 + r)^n
    let base = Decimal::ONE + r;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound *= base;
    }

    let numerator = principal.as_decimal() * r * compound;
    let denominator = compound - Decimal::ONE;

    Money::from_decimal(numerator / denominator)
}

/// how one payment divides between interest and principal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSplit {
    /// one period of interest on the balance before the payment
    pub interest: Money,
    /// reduction of the balance, never more than the balance
    pub principal: Money,
    /// part of the tendered amount beyond interest plus the whole balance
    pub excess: Money,
}

impl PaymentSplit {
    /// amount actually applied to the loan
    pub fn applied(&self) -> Money {
        self.interest + self.principal
    }
}

/// split a tendered amount against the current balance
pub fn split_payment(balance: Money, rate: Rate, amount: Money) -> Result<PaymentSplit> {
    if !amount.is_positive() {
        return Err(LedgerError::InvalidPaymentAmount { amount });
    }

    let interest = balance.interest_at(rate);
    if amount < interest {
        return Err(LedgerError::PaymentBelowInterest {
            interest_due: interest,
            provided: amount,
        });
    }

    let principal = (amount - interest).min(balance);
    let excess = amount - interest - principal;

    Ok(PaymentSplit {
        interest,
        principal,
        excess,
    })
}

/// amount that closes a loan in a single payment: balance plus one period of interest
pub fn payoff_amount(balance: Money, rate: Rate) -> Money {
    balance + balance.interest_at(rate)
}

/// origination preview shown before a loan is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub principal: Money,
    pub term: LoanTerm,
    pub rate: Rate,
    pub monthly_payment: Money,
    pub total_payment: Money,
    pub total_interest: Money,
}

impl LoanQuote {
    pub fn new(principal: Money, rate: Rate, term: LoanTerm) -> Self {
        let monthly_payment = monthly_payment(principal, rate, term.months());
        let total_payment = monthly_payment * Decimal::from(term.months());

        Self {
            principal,
            term,
            rate,
            monthly_payment,
            total_payment,
            total_interest: total_payment - principal,
        }
    }
}

/// one projected month of a loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledPayment {
    pub payment_number: u32,
    pub due_date: DateTime<Utc>,
    pub beginning_balance: Money,
    pub payment_amount: Money,
    pub interest_portion: Money,
    pub principal_portion: Money,
    pub ending_balance: Money,
}

/// projected repayment table for a loan paid exactly on schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub rate: Rate,
    pub term_months: u32,
    pub payments: Vec<ScheduledPayment>,
    pub total_interest: Money,
    pub total_payment: Money,
}

impl AmortizationSchedule {
    /// generate the table; the final row absorbs rounding so the balance ends at zero
    pub fn generate(
        principal: Money,
        rate: Rate,
        term_months: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Self> {
        if !principal.is_positive() {
            return Err(LedgerError::InvalidPrincipal { amount: principal });
        }
        if term_months == 0 {
            return Err(LedgerError::UnsupportedTerm { months: 0 });
        }

        let installment = monthly_payment(principal, rate, term_months);
        let mut payments = Vec::with_capacity(term_months as usize);
        let mut balance = principal;

        for n in 1..=term_months {
            let due_date = start_date
                .checked_add_months(Months::new(n))
                .ok_or_else(|| LedgerError::InvalidConfiguration {
                    message: format!("due date out of range for payment {}", n),
                })?;

            let interest = balance.interest_at(rate);
            let principal_portion = if n == term_months {
                balance
            } else {
                (installment - interest).min(balance)
            };
            let ending_balance = balance - principal_portion;

            payments.push(ScheduledPayment {
                payment_number: n,
                due_date,
                beginning_balance: balance,
                payment_amount: interest + principal_portion,
                interest_portion: interest,
                principal_portion,
                ending_balance,
            });

            balance = ending_balance;
        }

        let total_interest = payments.iter().map(|p| p.interest_portion).sum();
        let total_payment = payments.iter().map(|p| p.payment_amount).sum();

        Ok(Self {
            principal,
            rate,
            term_months,
            payments,
            total_interest,
            total_payment,
        })
    }

    pub fn get_payment(&self, payment_number: u32) -> Option<&ScheduledPayment> {
        payment_number
            .checked_sub(1)
            .and_then(|i| self.payments.get(i as usize))
    }
}
