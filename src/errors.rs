use chrono::NaiveDate;
use thiserror::Error;

use crate::decimal::{Money, Rate};
use crate::types::{LoanId, LoanStatus, MeetingId, MemberId, MemberStatus};

/// error category exposed to callers at the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// malformed or out-of-range input, rejected before any mutation
    Validation,
    /// entity not in the status the operation requires
    StateConflict,
    /// referenced entity does not exist
    NotFound,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("unsupported loan term: {months} months (offered terms are 6, 12 and 24)")]
    UnsupportedTerm {
        months: u32,
    },

    #[error("invalid principal: {amount}")]
    InvalidPrincipal {
        amount: Money,
    },

    #[error("loan amount out of range: {amount} not within [{minimum}, {maximum}]")]
    LoanAmountOutOfRange {
        amount: Money,
        minimum: Money,
        maximum: Money,
    },

    #[error("invalid payment amount: {amount}")]
    InvalidPaymentAmount {
        amount: Money,
    },

    #[error("payment does not cover interest: interest due {interest_due}, provided {provided}")]
    PaymentBelowInterest {
        interest_due: Money,
        provided: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("missing required field: {field}")]
    MissingField {
        field: &'static str,
    },

    #[error("invalid date interval: {amount} (must be at least 1)")]
    InvalidDateInterval {
        amount: u32,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("loan {id} is not active: current status is {status}")]
    LoanNotActive {
        id: LoanId,
        status: LoanStatus,
    },

    #[error("loan {id} is not liquidatable: current status is {status}")]
    NotLiquidatable {
        id: LoanId,
        status: LoanStatus,
    },

    #[error("loan {id} cannot be deleted: status {status}, {payment_count} payments recorded")]
    LoanNotDeletable {
        id: LoanId,
        status: LoanStatus,
        payment_count: usize,
    },

    #[error("invalid status transition for loan {id}: {from} -> {to}")]
    InvalidTransition {
        id: LoanId,
        from: LoanStatus,
        to: LoanStatus,
    },

    #[error("member {id} is {status}")]
    MemberNotActive {
        id: MemberId,
        status: MemberStatus,
    },

    #[error("meeting already scheduled on {date}")]
    DuplicateMeeting {
        date: NaiveDate,
    },

    #[error("member not found: {id}")]
    MemberNotFound {
        id: MemberId,
    },

    #[error("loan not found: {id}")]
    LoanNotFound {
        id: LoanId,
    },

    #[error("meeting not found: {id}")]
    MeetingNotFound {
        id: MeetingId,
    },

    #[error("serialization error: {message}")]
    Serialization {
        message: String,
    },
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::UnsupportedTerm { .. }
            | LedgerError::InvalidPrincipal { .. }
            | LedgerError::LoanAmountOutOfRange { .. }
            | LedgerError::InvalidPaymentAmount { .. }
            | LedgerError::PaymentBelowInterest { .. }
            | LedgerError::InvalidInterestRate { .. }
            | LedgerError::MissingField { .. }
            | LedgerError::InvalidDateInterval { .. }
            | LedgerError::InvalidConfiguration { .. }
            | LedgerError::Serialization { .. } => ErrorKind::Validation,

            LedgerError::LoanNotActive { .. }
            | LedgerError::NotLiquidatable { .. }
            | LedgerError::LoanNotDeletable { .. }
            | LedgerError::InvalidTransition { .. }
            | LedgerError::MemberNotActive { .. }
            | LedgerError::DuplicateMeeting { .. } => ErrorKind::StateConflict,

            LedgerError::MemberNotFound { .. }
            | LedgerError::LoanNotFound { .. }
            | LedgerError::MeetingNotFound { .. } => ErrorKind::NotFound,
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Serialization {
            message: e.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
