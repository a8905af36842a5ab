/// persist the ledger as json and load it back
use banco_solidario::chrono::{TimeZone, Utc};
use banco_solidario::{
    FundClock, FundConfig, Ledger, LedgerSnapshot, LoanView, MemberView, Money, RateClass,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let now = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let mut ledger = Ledger::new(FundConfig::default(), FundClock::fixed(now))?;

    let member = ledger.register_member("Rosa", RateClass::External)?;
    let loan = ledger.originate(member.id, Money::from_major(750_000), 24)?;
    ledger.apply_payment(loan.id, Money::from_major(120_000), None)?;

    println!("{}", LoanView::load(&ledger, loan.id)?.to_json_pretty()?);
    println!("{}", MemberView::load(&ledger, member.id)?.to_json_pretty()?);

    let json = serde_json::to_string_pretty(&ledger.snapshot())?;
    let snapshot: LedgerSnapshot = serde_json::from_str(&json)?;
    let restored = Ledger::restore(snapshot, FundClock::fixed(now))?;

    assert_eq!(restored.dashboard(), ledger.dashboard());
    println!(
        "restored {} loans, {} activities",
        restored.loans().len(),
        restored.activities().len()
    );

    Ok(())
}
