//! Traits for storage abstraction and extensibility

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// Storage abstraction for the club ledger
///
/// This trait allows the finance core to work with any storage backend
/// (PostgreSQL, MySQL, SQLite, in-memory, etc.) by implementing these methods.
/// Single-record reads and lifecycle writes mirror the collections the engine
/// works over; multi-write reconciliation actions go through [`apply`], which
/// must be all-or-nothing.
///
/// [`apply`]: LedgerStore::apply
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Get a bank entry by ID
    async fn get_bank_entry(&self, entry_id: &str) -> FinanceResult<Option<BankEntry>>;

    /// List bank entries, optionally filtered by reconciled flag
    async fn list_bank_entries(&self, reconciled: Option<bool>) -> FinanceResult<Vec<BankEntry>>;

    /// Save a new bank entry
    async fn save_bank_entry(&mut self, entry: &BankEntry) -> FinanceResult<()>;

    /// Delete a bank entry
    async fn delete_bank_entry(&mut self, entry_id: &str) -> FinanceResult<()>;

    /// Get an invoice by ID
    async fn get_invoice(&self, invoice_id: &str) -> FinanceResult<Option<Invoice>>;

    /// List invoices, optionally filtered by payment state
    async fn list_invoices(&self, state: Option<PaymentState>) -> FinanceResult<Vec<Invoice>>;

    /// Save a new invoice
    async fn save_invoice(&mut self, invoice: &Invoice) -> FinanceResult<()>;

    /// Update an existing invoice
    async fn update_invoice(&mut self, invoice: &Invoice) -> FinanceResult<()>;

    /// Get a movement by ID
    async fn get_movement(&self, movement_id: &str) -> FinanceResult<Option<Movement>>;

    /// List movements, optionally filtered by payment state
    async fn list_movements(&self, state: Option<PaymentState>) -> FinanceResult<Vec<Movement>>;

    /// Save a new movement
    async fn save_movement(&mut self, movement: &Movement) -> FinanceResult<()>;

    /// Update an existing movement
    async fn update_movement(&mut self, movement: &Movement) -> FinanceResult<()>;

    /// Get a payer by ID
    async fn get_payer(&self, payer_id: &str) -> FinanceResult<Option<Payer>>;

    /// List all payers
    async fn list_payers(&self) -> FinanceResult<Vec<Payer>>;

    /// Save a new payer
    async fn save_payer(&mut self, payer: &Payer) -> FinanceResult<()>;

    /// Get a financial entry by ID
    async fn get_financial_entry(&self, entry_id: &str)
        -> FinanceResult<Option<FinancialEntry>>;

    /// List all financial entries
    async fn list_financial_entries(&self) -> FinanceResult<Vec<FinancialEntry>>;

    /// Reconciliation records owned by one bank entry
    async fn records_for_entry(
        &self,
        bank_entry_id: &str,
    ) -> FinanceResult<Vec<ReconciliationRecord>>;

    /// List all reconciliation records
    async fn list_reconciliation_records(&self) -> FinanceResult<Vec<ReconciliationRecord>>;

    /// Apply a batch of writes atomically
    ///
    /// Either every operation in the batch takes effect or none does; a
    /// failure must leave the store exactly as it was before the call.
    /// Implementations must also serialize `apply` calls, so two
    /// reconciliations racing on the same bank entry resolve to one winner
    /// while the loser re-reads the updated entry and fails its state check.
    async fn apply(&mut self, batch: WriteBatch) -> FinanceResult<()>;
}

/// One staged write inside a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    UpdateBankEntry(BankEntry),
    UpdateInvoice(Invoice),
    UpdateMovement(Movement),
    InsertFinancialEntry(FinancialEntry),
    DeleteFinancialEntry(String),
    InsertReconciliationRecord(ReconciliationRecord),
    DeleteReconciliationRecord(String),
}

/// An ordered list of writes applied as a single transaction
///
/// The reconciliation committer and unreconciler stage every mutation of a
/// reconciliation action into one batch, so partially-applied actions cannot
/// be observed no matter where the backend fails.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage a write at the end of the batch
    pub fn push(&mut self, op: WriteOp) {
        self.ops.push(op);
    }

    /// Staged writes, in application order
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    /// Consume the batch, yielding its writes in application order
    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
