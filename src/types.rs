use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::{LedgerError, Result};

/// unique identifier for a member
pub type MemberId = Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a payment
pub type PaymentId = Uuid;

/// unique identifier for a meeting
pub type MeetingId = Uuid;

/// unique identifier for an activity record
pub type ActivityId = Uuid;

/// member rate class, decides the monthly rate of new loans
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateClass {
    /// fund member
    Standard,
    /// borrower from outside the fund
    External,
}

impl fmt::Display for RateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateClass::Standard => write!(f, "standard"),
            RateClass::External => write!(f, "external"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    Inactive,
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberStatus::Active => write!(f, "active"),
            MemberStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// performing, accepts payments
    Active,
    /// terminal, zero balance
    Liquidated,
    /// set only by administrative override
    Overdue,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanStatus::Active => write!(f, "active"),
            LoanStatus::Liquidated => write!(f, "liquidated"),
            LoanStatus::Overdue => write!(f, "overdue"),
        }
    }
}

/// the three terms the fund offers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum LoanTerm {
    SixMonths,
    TwelveMonths,
    TwentyFourMonths,
}

impl LoanTerm {
    pub fn months(&self) -> u32 {
        match self {
            LoanTerm::SixMonths => 6,
            LoanTerm::TwelveMonths => 12,
            LoanTerm::TwentyFourMonths => 24,
        }
    }

    pub fn from_months(months: u32) -> Result<Self> {
        match months {
            6 => Ok(LoanTerm::SixMonths),
            12 => Ok(LoanTerm::TwelveMonths),
            24 => Ok(LoanTerm::TwentyFourMonths),
            _ => Err(LedgerError::UnsupportedTerm { months }),
        }
    }
}

impl TryFrom<u32> for LoanTerm {
    type Error = LedgerError;

    fn try_from(months: u32) -> Result<Self> {
        LoanTerm::from_months(months)
    }
}

impl From<LoanTerm> for u32 {
    fn from(term: LoanTerm) -> u32 {
        term.months()
    }
}

impl fmt::Display for LoanTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} months", self.months())
    }
}

/// administrative clock advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateInterval {
    Days(u32),
    Weeks(u32),
    Months(u32),
}

impl DateInterval {
    pub fn amount(&self) -> u32 {
        match self {
            DateInterval::Days(n) | DateInterval::Weeks(n) | DateInterval::Months(n) => *n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_offered_terms() {
        assert_eq!(LoanTerm::from_months(6).unwrap(), LoanTerm::SixMonths);
        assert_eq!(LoanTerm::from_months(12).unwrap(), LoanTerm::TwelveMonths);
        assert_eq!(LoanTerm::from_months(24).unwrap(), LoanTerm::TwentyFourMonths);

        for months in [0, 1, 3, 7, 18, 36] {
            let err = LoanTerm::from_months(months).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_term_serializes_as_months() {
        let json = serde_json::to_string(&LoanTerm::TwelveMonths).unwrap();
        assert_eq!(json, "12");

        let term: LoanTerm = serde_json::from_str("24").unwrap();
        assert_eq!(term, LoanTerm::TwentyFourMonths);

        assert!(serde_json::from_str::<LoanTerm>("9").is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&LoanStatus::Liquidated).unwrap(), "\"liquidated\"");
        assert_eq!(serde_json::to_string(&RateClass::External).unwrap(), "\"external\"");
    }
}
