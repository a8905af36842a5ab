/// quick start - register a member, lend, collect one payment
use banco_solidario::{FundClock, FundConfig, Ledger, Money, RateClass};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut ledger = Ledger::new(FundConfig::default(), FundClock::system())?;

    // standard members borrow at 8% monthly
    let ana = ledger.register_member("Ana Gómez", RateClass::Standard)?;

    let quote = ledger.quote(ana.id, Money::from_major(500_000), 6)?;
    println!("monthly payment: {}", quote.monthly_payment);
    println!("total interest:  {}", quote.total_interest);

    let loan = ledger.originate(ana.id, Money::from_major(500_000), 6)?;

    // interest is taken first, the rest reduces the balance
    let receipt = ledger.apply_payment(loan.id, Money::from_major(100_000), None)?;
    println!(
        "paid {}: {} interest, {} principal",
        receipt.payment.amount, receipt.payment.interest_amount, receipt.payment.principal_amount
    );
    println!("remaining: {}", ledger.loan(loan.id)?.remaining_balance);

    Ok(())
}
