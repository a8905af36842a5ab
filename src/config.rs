use chrono::Weekday;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LedgerError, Result};
use crate::types::RateClass;

/// fund configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundConfig {
    pub fund_name: String,
    pub admin_name: String,
    /// capital the fund started lending from
    pub opening_capital: Money,
    pub rates: RateTable,
    pub loan_limits: LoanLimits,
    /// advisory ceiling on a member's outstanding balance
    pub member_credit_limit: Money,
    pub meeting_schedule: MeetingSchedule,
}

/// monthly interest rate per member rate class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub standard: Rate,
    pub external: Rate,
}

impl RateTable {
    pub const STANDARD_RATE: Rate = Rate::percent(8);
    pub const EXTERNAL_RATE: Rate = Rate::percent(12);

    pub fn rate_for(&self, class: RateClass) -> Rate {
        match class {
            RateClass::Standard => self.standard,
            RateClass::External => self.external,
        }
    }
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            standard: Self::STANDARD_RATE,
            external: Self::EXTERNAL_RATE,
        }
    }
}

/// loan amount bounds shown on the settings screen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoanLimits {
    pub minimum: Option<Money>,
    pub maximum: Option<Money>,
    /// when false the bounds are advisory and origination ignores them
    pub enforce: bool,
}

impl LoanLimits {
    /// check a principal against the bounds, if enforcement is on
    pub fn check(&self, amount: Money) -> Result<()> {
        if !self.enforce {
            return Ok(());
        }

        let below = self.minimum.map(|min| amount < min).unwrap_or(false);
        let above = self.maximum.map(|max| amount > max).unwrap_or(false);

        if below || above {
            return Err(LedgerError::LoanAmountOutOfRange {
                amount,
                minimum: self.minimum.unwrap_or(Money::ZERO),
                maximum: self.maximum.unwrap_or(amount),
            });
        }

        Ok(())
    }
}

impl Default for LoanLimits {
    fn default() -> Self {
        Self {
            minimum: Some(Money::from_major(500_000)),
            maximum: Some(Money::from_major(2_000_000)),
            enforce: false,
        }
    }
}

/// recurring meeting day: the nth given weekday of each month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingSchedule {
    pub weekday: Weekday,
    /// 1 = first, 2 = second, ...
    pub week_of_month: u8,
}

impl Default for MeetingSchedule {
    fn default() -> Self {
        Self {
            weekday: Weekday::Sat,
            week_of_month: 2,
        }
    }
}

impl Default for FundConfig {
    fn default() -> Self {
        Self {
            fund_name: "Banco Solidario".to_string(),
            admin_name: "Administrador".to_string(),
            opening_capital: Money::from_major(16_000_000),
            rates: RateTable::default(),
            loan_limits: LoanLimits::default(),
            member_credit_limit: Money::from_major(2_000_000),
            meeting_schedule: MeetingSchedule::default(),
        }
    }
}

impl FundConfig {
    /// configuration with custom rates, everything else default
    pub fn with_rates(standard: Rate, external: Rate) -> Self {
        Self {
            rates: RateTable { standard, external },
            ..Self::default()
        }
    }

    /// turn on loan amount enforcement
    pub fn enforcing_limits(mut self) -> Self {
        self.loan_limits.enforce = true;
        self
    }

    pub fn validate(&self) -> Result<()> {
        for rate in [self.rates.standard, self.rates.external] {
            if rate.is_negative() || rate.as_decimal() >= dec!(1) {
                return Err(LedgerError::InvalidInterestRate { rate });
            }
        }

        if self.opening_capital.is_negative() {
            return Err(LedgerError::InvalidConfiguration {
                message: format!("opening capital is negative: {}", self.opening_capital),
            });
        }

        if let (Some(min), Some(max)) = (self.loan_limits.minimum, self.loan_limits.maximum) {
            if min > max {
                return Err(LedgerError::InvalidConfiguration {
                    message: format!("minimum loan {} exceeds maximum {}", min, max),
                });
            }
        }

        if !(1..=4).contains(&self.meeting_schedule.week_of_month) {
            return Err(LedgerError::InvalidConfiguration {
                message: format!(
                    "week of month must be 1-4, got {}",
                    self.meeting_schedule.week_of_month
                ),
            });
        }

        Ok(())
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: FundConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
