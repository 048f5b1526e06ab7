//! Household settlement example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use household_ledger::utils::MemoryStorage;
use household_ledger::{HouseholdId, HouseholdLedger, MemberId, MemberProfile, NewBill};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("🏠 Household Ledger - Settlement Example\n");

    let storage = MemoryStorage::new();
    let asha = MemberId::new("asha");
    let bilal = MemberId::new("bilal");
    let chen = MemberId::new("chen");

    storage.add_member(asha.clone(), MemberProfile::new("Asha", "asha@example.com"))?;
    storage.add_member(bilal.clone(), MemberProfile::new("Bilal", "bilal@example.com"))?;
    storage.add_member(chen.clone(), MemberProfile::new("Chen", "chen@example.com"))?;
    let household = storage.create_household(
        HouseholdId::new("flat-4b"),
        "Flat 4B".to_string(),
        asha.clone(),
        vec![bilal.clone(), chen.clone()],
    )?;
    println!("👥 Household '{}' with {} members\n", household.name, household.members.len());

    let mut ledger = HouseholdLedger::new(storage.clone(), storage);
    let everyone = vec![asha.clone(), bilal.clone(), chen.clone()];

    // 1. Record this month's bills
    println!("🧾 Recording bills...");
    let bills = [
        NewBill::new("Rent", BigDecimal::from(1800), asha.clone(), everyone.clone()),
        NewBill::new("Electricity", BigDecimal::from(100), bilal.clone(), everyone.clone()),
        NewBill::new("Groceries", BigDecimal::from(64), chen.clone(), vec![bilal.clone(), chen.clone()]),
        NewBill::new("Taxi", BigDecimal::from(25), bilal.clone(), vec![asha.clone()]),
    ];
    for draft in bills {
        let bill = ledger
            .record_bill(&asha, draft.on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
            .await?;
        println!("  ✓ {} - {} paid by {}", bill.title, bill.amount, bill.paid_by);
    }
    println!();

    // 2. Show balances
    println!("📊 Balances");
    let balances = ledger.balances(&asha).await?;
    for line in &balances.balances {
        println!("  {:<8} {:>10}", line.name, line.balance);
    }
    println!();

    // 3. Suggest settlements
    println!("💸 Suggested settlements");
    let summary = ledger.settlements(&asha).await?;
    for transfer in &summary.transfers {
        println!("  {} → {}: {}", transfer.from_name, transfer.to_name, transfer.amount);
    }
    if let Some(unbalanced) = &summary.unbalanced {
        println!("  ⚠ ledger does not balance (net {})", unbalanced.net_total);
    }
    println!();

    // 4. Everyone paid up
    let settled = ledger.settle_all(&chen).await?;
    println!("✅ Marked {settled} bills as settled");
    let remaining = ledger.settlements(&asha).await?;
    println!("   Remaining transfers: {}", remaining.transfers.len());

    Ok(())
}
