/// a month of fund activity around the second-saturday meeting
use banco_solidario::chrono::{TimeZone, Utc};
use banco_solidario::{FundClock, FundConfig, Ledger, MeetingView, Money, RateClass};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let clock = FundClock::fixed(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap());
    let mut ledger = Ledger::new(FundConfig::default(), clock)?;

    let ana = ledger.register_member("Ana", RateClass::Standard)?;
    let pedro = ledger.register_member("Pedro", RateClass::External)?;
    let first = ledger.originate(ana.id, Money::from_major(500_000), 6)?;

    // next meeting: second saturday of june
    let meeting = ledger.auto_generate_meeting()?;
    println!("meeting on {}", meeting.date);

    // payments collected and a loan handed out at the meeting
    ledger.apply_payment(first.id, Money::from_major(108_157), Some(meeting.id))?;
    let second = ledger.originate_at_meeting(pedro.id, Money::from_major(300_000), 12, meeting.id)?;
    println!("lent {} to Pedro at {}", second.amount, second.interest_rate);

    let minutes = MeetingView::load(&ledger, meeting.id)?;
    println!("{}", minutes.to_json_pretty()?);

    let dashboard = ledger.dashboard();
    println!("fund balance:     {}", dashboard.fund_balance);
    println!("active loans:     {}", dashboard.active_loans);
    println!("interest (month): {}", dashboard.monthly_interest);

    for activity in ledger.recent_activities(5) {
        println!("[{}] {}", activity.activity_type, activity.description);
    }

    Ok(())
}
