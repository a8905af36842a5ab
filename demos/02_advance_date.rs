/// administrative date control: move the fund's date and watch the calendar follow
use banco_solidario::chrono::{TimeZone, Utc};
use banco_solidario::{DateInterval, FundClock, FundConfig, Ledger, Money, RateClass};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let clock = FundClock::fixed(Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap());
    let mut ledger = Ledger::new(FundConfig::default(), clock)?;

    let member = ledger.register_member("Lucía", RateClass::Standard)?;
    let loan = ledger.originate(member.id, Money::from_major(1_000_000), 12)?;

    println!("today: {}  next meeting: {}", ledger.today(), ledger.next_meeting_date()?);

    // pay each installment a month apart
    for _ in 0..3 {
        ledger.apply_payment(loan.id, loan.monthly_payment, None)?;
        ledger.advance_date(DateInterval::Months(1))?;
        println!(
            "today: {}  balance: {}  next meeting: {}",
            ledger.today(),
            ledger.loan(loan.id)?.remaining_balance,
            ledger.next_meeting_date()?
        );
    }

    ledger.advance_date(DateInterval::Weeks(2))?;
    ledger.advance_date(DateInterval::Days(3))?;
    println!("today: {}", ledger.today());

    // zero-length intervals are rejected
    if let Err(e) = ledger.advance_date(DateInterval::Days(0)) {
        println!("rejected: {}", e);
    }

    let payoff = ledger.liquidate(loan.id, None, None)?;
    println!("liquidated on {} for {}", payoff.liquidated_at.date_naive(), payoff.payment.amount);

    Ok(())
}
