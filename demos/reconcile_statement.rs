//! Basic statement reconciliation example

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use clubledger_core::{
    AllocationBuilder, Candidate, Classification, FinanceLedger, MemoryStore, Payer,
    StatementLine,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🏦 Clubledger Core - Statement Reconciliation Example\n");

    // Create a new finance ledger with in-memory storage
    let store = MemoryStore::new();
    let mut ledger = FinanceLedger::new(store);

    // 1. Set up payers and outstanding receivables
    println!("👥 Registering payers and receivables...");
    ledger
        .register_payer(Payer::new(
            "u-ana".to_string(),
            "Ana Silva".to_string(),
            Some("S123".to_string()),
        ))
        .await?;

    ledger
        .create_invoice(
            "inv-2024-031".to_string(),
            "u-ana".to_string(),
            "April membership quota".to_string(),
            BigDecimal::from(60),
            NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            "memberships".to_string(),
        )
        .await?;
    println!("  ✓ Invoice inv-2024-031: €60 due 2024-04-01 (Ana Silva)");

    // Invoices past their due date become suggestion candidates
    let flipped = ledger
        .refresh_overdue(NaiveDate::from_ymd_opt(2024, 4, 15).unwrap())
        .await?;
    println!("  ✓ {} receivable(s) marked overdue\n", flipped);

    // 2. Import a bank statement
    println!("📄 Registering bank statement lines...");
    let entries = ledger
        .register_statement(
            vec![
                StatementLine::new(
                    NaiveDate::from_ymd_opt(2024, 4, 16).unwrap(),
                    "TRF Ana Silva S123 April quota".to_string(),
                    BigDecimal::from(60),
                ),
                StatementLine::new(
                    NaiveDate::from_ymd_opt(2024, 4, 17).unwrap(),
                    "Referee fees regional derby".to_string(),
                    BigDecimal::from(-80),
                ),
            ],
            Some("main-account".to_string()),
            Some("statement-april.xlsx".to_string()),
            "general",
        )
        .await?;
    println!("  ✓ {} entries registered, all pending\n", entries.len());

    // 3. Ask the suggestion engine about the credit entry
    println!("🔍 Suggestions for '{}':", entries[0].description);
    for suggestion in ledger.suggestions_for(&entries[0].id).await? {
        match &suggestion.candidate {
            Candidate::Invoice(invoice) => {
                println!("  [{}] invoice {} (€{})", suggestion.score, invoice.id, invoice.total)
            }
            Candidate::Payer(payer) => {
                println!("  [{}] payer {}", suggestion.score, payer.name)
            }
        }
    }
    println!();

    // 4. Reconcile the credit entry against the suggested invoice
    println!("⚖️  Committing allocations...");
    let allocation = AllocationBuilder::new()
        .invoice("inv-2024-031".to_string(), BigDecimal::from(60))
        .build();
    let outcome = ledger
        .commit_reconciliation(
            &entries[0].id,
            Classification::Income,
            "memberships",
            Some(allocation),
        )
        .await?;
    println!(
        "  ✓ Entry {} reconciled into {} financial entry(ies)",
        outcome.entry.id,
        outcome.financial_entries.len()
    );
    let invoice = ledger.get_invoice("inv-2024-031").await?.unwrap();
    println!("  ✓ Invoice inv-2024-031 is now {:?}", invoice.state);

    // The debit entry has no receivable behind it: direct reconciliation
    let outcome = ledger
        .commit_reconciliation(&entries[1].id, Classification::Expense, "competitions", None)
        .await?;
    println!(
        "  ✓ Entry {} booked directly as €{} expense\n",
        outcome.entry.id, outcome.financial_entries[0].amount
    );

    // 5. Summarize
    let summary = ledger.reconciliation_summary().await?;
    println!("📈 Reconciliation summary:");
    println!("  Pending entries:    {}", summary.pending_entries);
    println!("  Reconciled entries: {}", summary.reconciled_entries);
    println!("  Income total:       €{}", summary.total_income);
    println!("  Expense total:      €{}", summary.total_expense);
    println!("  Net:                €{}", summary.net);

    println!("\n🎉 Example completed successfully!");
    Ok(())
}
