pub mod amortization;
pub mod clock;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod meetings;
pub mod members;
pub mod serialization;
pub mod types;

// re-export key types
pub use amortization::{monthly_payment, AmortizationSchedule, LoanQuote, PaymentSplit};
pub use clock::{advance_date, Clock, FundClock};
pub use config::{FundConfig, LoanLimits, MeetingSchedule, RateTable};
pub use decimal::{Money, Rate};
pub use errors::{ErrorKind, LedgerError, Result};
pub use events::{Activity, ActivityLog, ActivitySink, ActivityType, EntityType};
pub use ledger::{DashboardSummary, Ledger, LedgerSnapshot, MemberSummary, PaymentTotals};
pub use loan::{LiquidationReceipt, Loan, LoanRequest, Payment, PaymentReceipt};
pub use meetings::{next_meeting_date, second_saturday, Meeting, MeetingBook};
pub use members::{Member, MemberDirectory, MemberRegistry};
pub use serialization::{LoanView, MeetingView, MemberView};
pub use types::{
    ActivityId, DateInterval, LoanId, LoanStatus, LoanTerm, MeetingId, MemberId, MemberStatus,
    PaymentId, RateClass,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
