//! Main finance facade that coordinates statements, receivables, and
//! reconciliation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::finance::{ReceivableManager, StatementManager};
use crate::reconciliation::{
    AllocationItem, CommitOutcome, ReconciliationEngine, Suggestion, UnreconcileOutcome,
};
use crate::traits::*;
use crate::types::*;

/// Main finance system for the club back office
///
/// Thin facade over the statement and receivable managers and the
/// reconciliation engine, all sharing one storage backend.
pub struct FinanceLedger<S: LedgerStore> {
    statements: StatementManager<S>,
    receivables: ReceivableManager<S>,
    engine: ReconciliationEngine<S>,
}

impl<S: LedgerStore + Clone> FinanceLedger<S> {
    /// Create a new finance ledger with the given storage backend
    pub fn new(store: S) -> Self {
        Self {
            statements: StatementManager::new(store.clone()),
            receivables: ReceivableManager::new(store.clone()),
            engine: ReconciliationEngine::new(store),
        }
    }

    // Statement operations
    /// Register imported statement lines as pending bank entries
    pub async fn register_statement(
        &mut self,
        lines: Vec<StatementLine>,
        account: Option<String>,
        source: Option<String>,
        cost_center_id: &str,
    ) -> FinanceResult<Vec<BankEntry>> {
        self.statements
            .register(lines, account, source, cost_center_id)
            .await
    }

    /// Get a bank entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> FinanceResult<Option<BankEntry>> {
        self.statements.get_entry(entry_id).await
    }

    /// Bank entries still awaiting reconciliation
    pub async fn pending_entries(&self) -> FinanceResult<Vec<BankEntry>> {
        self.statements.pending_entries().await
    }

    /// Bank entries already reconciled
    pub async fn reconciled_entries(&self) -> FinanceResult<Vec<BankEntry>> {
        self.statements.reconciled_entries().await
    }

    /// Delete an unreconciled bank entry
    pub async fn delete_entry(&mut self, entry_id: &str) -> FinanceResult<()> {
        self.statements.delete_entry(entry_id).await
    }

    // Receivable operations
    /// Register a payer
    pub async fn register_payer(&mut self, payer: Payer) -> FinanceResult<Payer> {
        self.receivables.register_payer(payer).await
    }

    /// Issue a new invoice
    pub async fn create_invoice(
        &mut self,
        id: String,
        payer_id: String,
        description: String,
        total: BigDecimal,
        due_date: NaiveDate,
        cost_center_id: String,
    ) -> FinanceResult<Invoice> {
        self.receivables
            .create_invoice(id, payer_id, description, total, due_date, cost_center_id)
            .await
    }

    /// Record a new movement
    pub async fn create_movement(
        &mut self,
        id: String,
        payer: Option<PayerRef>,
        description: String,
        total: BigDecimal,
        due_date: NaiveDate,
        cost_center_id: String,
    ) -> FinanceResult<Movement> {
        self.receivables
            .create_movement(id, payer, description, total, due_date, cost_center_id)
            .await
    }

    /// Get an invoice by ID
    pub async fn get_invoice(&self, invoice_id: &str) -> FinanceResult<Option<Invoice>> {
        self.receivables.get_invoice(invoice_id).await
    }

    /// Get a movement by ID
    pub async fn get_movement(&self, movement_id: &str) -> FinanceResult<Option<Movement>> {
        self.receivables.get_movement(movement_id).await
    }

    /// Invoices that can still receive allocations
    pub async fn open_invoices(&self) -> FinanceResult<Vec<Invoice>> {
        self.receivables.open_invoices().await
    }

    /// Flip pending receivables past their due date to overdue
    pub async fn refresh_overdue(&mut self, as_of: NaiveDate) -> FinanceResult<usize> {
        self.receivables.refresh_overdue(as_of).await
    }

    /// Cancel an unsettled invoice
    pub async fn cancel_invoice(&mut self, invoice_id: &str) -> FinanceResult<Invoice> {
        self.receivables.cancel_invoice(invoice_id).await
    }

    // Reconciliation operations
    /// Ranked reconciliation candidates for a pending bank entry
    pub async fn suggestions_for(&self, entry_id: &str) -> FinanceResult<Vec<Suggestion>> {
        self.engine.suggestions_for(entry_id).await
    }

    /// Commit a reconciliation of a bank entry
    pub async fn commit_reconciliation(
        &mut self,
        entry_id: &str,
        classification: Classification,
        cost_center_id: &str,
        allocation: Option<Vec<AllocationItem>>,
    ) -> FinanceResult<CommitOutcome> {
        self.engine
            .commit(entry_id, classification, cost_center_id, allocation)
            .await
    }

    /// Reverse a committed reconciliation
    pub async fn unreconcile(&mut self, entry_id: &str) -> FinanceResult<UnreconcileOutcome> {
        self.engine.unreconcile(entry_id).await
    }

    /// Snapshot of reconciliation progress and committed totals
    pub async fn reconciliation_summary(&self) -> FinanceResult<ReconciliationSummary> {
        let store = self.engine.store();
        let pending_entries = store.list_bank_entries(Some(false)).await?.len();
        let reconciled_entries = store.list_bank_entries(Some(true)).await?.len();

        let financial_entries = store.list_financial_entries().await?;
        let mut total_income = BigDecimal::from(0);
        let mut total_expense = BigDecimal::from(0);
        for entry in &financial_entries {
            match entry.classification {
                Classification::Income => total_income += &entry.amount,
                Classification::Expense => total_expense += &entry.amount,
            }
        }
        let net = &total_income - &total_expense;

        Ok(ReconciliationSummary {
            pending_entries,
            reconciled_entries,
            financial_entries: financial_entries.len(),
            total_income,
            total_expense,
            net,
        })
    }
}

/// Snapshot of reconciliation progress and committed totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Bank entries still awaiting reconciliation
    pub pending_entries: usize,
    /// Bank entries already reconciled
    pub reconciled_entries: usize,
    /// Committed financial entries
    pub financial_entries: usize,
    /// Sum of committed income entries
    pub total_income: BigDecimal,
    /// Sum of committed expense entries
    pub total_expense: BigDecimal,
    /// Income minus expense
    pub net: BigDecimal,
}
