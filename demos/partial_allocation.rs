//! Partial allocation and reversal example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clubledger_core::{
    AllocationBuilder, Classification, FinanceLedger, MemoryStore, PayerRef, PaymentState,
    StatementLine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Clubledger Core - Partial Allocation Example\n");

    let mut ledger = FinanceLedger::new(MemoryStore::new());

    // A sponsorship movement worth more than the transfer that arrives
    ledger
        .create_movement(
            "mov-sponsor".to_string(),
            Some(PayerRef::Name("Padaria Central".to_string())),
            "Season kit sponsorship".to_string(),
            BigDecimal::from(500),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            "sponsorships".to_string(),
        )
        .await?;

    let entries = ledger
        .register_statement(
            vec![StatementLine::new(
                NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
                "TRF Padaria Central first installment".to_string(),
                BigDecimal::from(200),
            )],
            Some("main-account".to_string()),
            Some("statement-april.xlsx".to_string()),
            "general",
        )
        .await?;
    let entry_id = entries[0].id.clone();

    // 1. Allocate less than the movement's total
    println!("⚖️  Allocating €200 of a €500 sponsorship...");
    let allocation = AllocationBuilder::new()
        .movement("mov-sponsor".to_string(), BigDecimal::from(200))
        .build();
    let outcome = ledger
        .commit_reconciliation(&entry_id, Classification::Income, "sponsorships", Some(allocation))
        .await?;

    let movement = ledger.get_movement("mov-sponsor").await?.unwrap();
    println!("  ✓ Movement state: {:?}", movement.state);
    println!("  ✓ Entry reconciled: {}", outcome.entry.reconciled);
    println!("  ✓ Partial: {}\n", outcome.partial);

    // 2. The treasurer made a mistake: reverse it
    println!("↩️  Unreconciling...");
    let reversal = ledger.unreconcile(&entry_id).await?;
    println!(
        "  ✓ Removed {} financial entry(ies)",
        reversal.removed_financial_entry_ids.len()
    );
    for restored in &reversal.restored_targets {
        println!("  ✓ Restored {} to {:?}", restored.target, restored.state);
    }

    let movement = ledger.get_movement("mov-sponsor").await?.unwrap();
    assert_eq!(movement.state, PaymentState::Pending);
    let summary = ledger.reconciliation_summary().await?;
    println!(
        "\n📈 {} pending entry(ies), {} financial entry(ies) on the books",
        summary.pending_entries, summary.financial_entries
    );

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
