//! In-memory ledger store implementation for testing and development

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Clone, Default)]
struct Collections {
    bank_entries: HashMap<String, BankEntry>,
    invoices: HashMap<String, Invoice>,
    movements: HashMap<String, Movement>,
    payers: HashMap<String, Payer>,
    financial_entries: HashMap<String, FinancialEntry>,
    reconciliation_records: HashMap<String, ReconciliationRecord>,
}

impl Collections {
    // Applied against a working copy; any error leaves the live data untouched
    fn apply_op(&mut self, op: WriteOp) -> FinanceResult<()> {
        match op {
            WriteOp::UpdateBankEntry(entry) => {
                if !self.bank_entries.contains_key(&entry.id) {
                    return Err(FinanceError::Storage(format!(
                        "cannot update missing bank entry '{}'",
                        entry.id
                    )));
                }
                self.bank_entries.insert(entry.id.clone(), entry);
            }
            WriteOp::UpdateInvoice(invoice) => {
                if !self.invoices.contains_key(&invoice.id) {
                    return Err(FinanceError::Storage(format!(
                        "cannot update missing invoice '{}'",
                        invoice.id
                    )));
                }
                self.invoices.insert(invoice.id.clone(), invoice);
            }
            WriteOp::UpdateMovement(movement) => {
                if !self.movements.contains_key(&movement.id) {
                    return Err(FinanceError::Storage(format!(
                        "cannot update missing movement '{}'",
                        movement.id
                    )));
                }
                self.movements.insert(movement.id.clone(), movement);
            }
            WriteOp::InsertFinancialEntry(entry) => {
                if self.financial_entries.contains_key(&entry.id) {
                    return Err(FinanceError::Storage(format!(
                        "financial entry '{}' already exists",
                        entry.id
                    )));
                }
                self.financial_entries.insert(entry.id.clone(), entry);
            }
            WriteOp::DeleteFinancialEntry(entry_id) => {
                if self.financial_entries.remove(&entry_id).is_none() {
                    return Err(FinanceError::Storage(format!(
                        "cannot delete missing financial entry '{}'",
                        entry_id
                    )));
                }
            }
            WriteOp::InsertReconciliationRecord(record) => {
                if self.reconciliation_records.contains_key(&record.id) {
                    return Err(FinanceError::Storage(format!(
                        "reconciliation record '{}' already exists",
                        record.id
                    )));
                }
                self.reconciliation_records.insert(record.id.clone(), record);
            }
            WriteOp::DeleteReconciliationRecord(record_id) => {
                if self.reconciliation_records.remove(&record_id).is_none() {
                    return Err(FinanceError::Storage(format!(
                        "cannot delete missing reconciliation record '{}'",
                        record_id
                    )));
                }
            }
        }
        Ok(())
    }
}

/// In-memory [`LedgerStore`] for tests and development
///
/// All collections live behind one lock so [`LedgerStore::apply`] can stage
/// a batch against a working copy and swap it in whole, which also
/// serializes concurrent reconciliation attempts.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collections::default())),
        }
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) {
        *self.inner.write().unwrap() = Collections::default();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_bank_entry(&self, entry_id: &str) -> FinanceResult<Option<BankEntry>> {
        Ok(self.inner.read().unwrap().bank_entries.get(entry_id).cloned())
    }

    async fn list_bank_entries(&self, reconciled: Option<bool>) -> FinanceResult<Vec<BankEntry>> {
        let inner = self.inner.read().unwrap();
        let mut entries: Vec<BankEntry> = inner
            .bank_entries
            .values()
            .filter(|entry| reconciled.is_none_or(|flag| entry.reconciled == flag))
            .cloned()
            .collect();
        entries.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));
        Ok(entries)
    }

    async fn save_bank_entry(&mut self, entry: &BankEntry) -> FinanceResult<()> {
        self.inner
            .write()
            .unwrap()
            .bank_entries
            .insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn delete_bank_entry(&mut self, entry_id: &str) -> FinanceResult<()> {
        if self
            .inner
            .write()
            .unwrap()
            .bank_entries
            .remove(entry_id)
            .is_some()
        {
            Ok(())
        } else {
            Err(FinanceError::EntryNotFound(entry_id.to_string()))
        }
    }

    async fn get_invoice(&self, invoice_id: &str) -> FinanceResult<Option<Invoice>> {
        Ok(self.inner.read().unwrap().invoices.get(invoice_id).cloned())
    }

    async fn list_invoices(&self, state: Option<PaymentState>) -> FinanceResult<Vec<Invoice>> {
        let inner = self.inner.read().unwrap();
        let mut invoices: Vec<Invoice> = inner
            .invoices
            .values()
            .filter(|invoice| state.is_none_or(|s| invoice.state == s))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(invoices)
    }

    async fn save_invoice(&mut self, invoice: &Invoice) -> FinanceResult<()> {
        self.inner
            .write()
            .unwrap()
            .invoices
            .insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }

    async fn update_invoice(&mut self, invoice: &Invoice) -> FinanceResult<()> {
        let mut inner = self.inner.write().unwrap();
        if inner.invoices.contains_key(&invoice.id) {
            inner.invoices.insert(invoice.id.clone(), invoice.clone());
            Ok(())
        } else {
            Err(FinanceError::TargetNotFound(format!(
                "invoice '{}'",
                invoice.id
            )))
        }
    }

    async fn get_movement(&self, movement_id: &str) -> FinanceResult<Option<Movement>> {
        Ok(self.inner.read().unwrap().movements.get(movement_id).cloned())
    }

    async fn list_movements(&self, state: Option<PaymentState>) -> FinanceResult<Vec<Movement>> {
        let inner = self.inner.read().unwrap();
        let mut movements: Vec<Movement> = inner
            .movements
            .values()
            .filter(|movement| state.is_none_or(|s| movement.state == s))
            .cloned()
            .collect();
        movements.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(movements)
    }

    async fn save_movement(&mut self, movement: &Movement) -> FinanceResult<()> {
        self.inner
            .write()
            .unwrap()
            .movements
            .insert(movement.id.clone(), movement.clone());
        Ok(())
    }

    async fn update_movement(&mut self, movement: &Movement) -> FinanceResult<()> {
        let mut inner = self.inner.write().unwrap();
        if inner.movements.contains_key(&movement.id) {
            inner.movements.insert(movement.id.clone(), movement.clone());
            Ok(())
        } else {
            Err(FinanceError::TargetNotFound(format!(
                "movement '{}'",
                movement.id
            )))
        }
    }

    async fn get_payer(&self, payer_id: &str) -> FinanceResult<Option<Payer>> {
        Ok(self.inner.read().unwrap().payers.get(payer_id).cloned())
    }

    async fn list_payers(&self) -> FinanceResult<Vec<Payer>> {
        let inner = self.inner.read().unwrap();
        let mut payers: Vec<Payer> = inner.payers.values().cloned().collect();
        payers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(payers)
    }

    async fn save_payer(&mut self, payer: &Payer) -> FinanceResult<()> {
        self.inner
            .write()
            .unwrap()
            .payers
            .insert(payer.id.clone(), payer.clone());
        Ok(())
    }

    async fn get_financial_entry(
        &self,
        entry_id: &str,
    ) -> FinanceResult<Option<FinancialEntry>> {
        Ok(self
            .inner
            .read()
            .unwrap()
            .financial_entries
            .get(entry_id)
            .cloned())
    }

    async fn list_financial_entries(&self) -> FinanceResult<Vec<FinancialEntry>> {
        let inner = self.inner.read().unwrap();
        let mut entries: Vec<FinancialEntry> =
            inner.financial_entries.values().cloned().collect();
        entries.sort_by(|a, b| (a.date, &a.id).cmp(&(b.date, &b.id)));
        Ok(entries)
    }

    async fn records_for_entry(
        &self,
        bank_entry_id: &str,
    ) -> FinanceResult<Vec<ReconciliationRecord>> {
        let inner = self.inner.read().unwrap();
        let mut records: Vec<ReconciliationRecord> = inner
            .reconciliation_records
            .values()
            .filter(|record| record.bank_entry_id == bank_entry_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(records)
    }

    async fn list_reconciliation_records(&self) -> FinanceResult<Vec<ReconciliationRecord>> {
        let inner = self.inner.read().unwrap();
        let mut records: Vec<ReconciliationRecord> =
            inner.reconciliation_records.values().cloned().collect();
        records.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        Ok(records)
    }

    async fn apply(&mut self, batch: WriteBatch) -> FinanceResult<()> {
        let mut inner = self.inner.write().unwrap();
        let mut staged = inner.clone();
        for op in batch.into_ops() {
            staged.apply_op(op)?;
        }
        *inner = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn sample_entry(id: &str) -> BankEntry {
        BankEntry::from_line(
            id.to_string(),
            StatementLine::new(
                NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                "transfer".to_string(),
                BigDecimal::from(100),
            ),
            None,
            None,
            "C1".to_string(),
        )
    }

    #[tokio::test]
    async fn failed_batch_leaves_store_untouched() {
        let mut store = MemoryStore::new();
        store.save_bank_entry(&sample_entry("be1")).await.unwrap();

        let mut reconciled = store.get_bank_entry("be1").await.unwrap().unwrap();
        reconciled.reconciled = true;

        let mut batch = WriteBatch::new();
        batch.push(WriteOp::UpdateBankEntry(reconciled));
        // Deleting a nonexistent financial entry poisons the whole batch
        batch.push(WriteOp::DeleteFinancialEntry("missing".to_string()));

        let err = store.apply(batch).await.unwrap_err();
        assert!(matches!(err, FinanceError::Storage(_)));

        let entry = store.get_bank_entry("be1").await.unwrap().unwrap();
        assert!(!entry.reconciled);
    }

    #[tokio::test]
    async fn list_bank_entries_filters_on_reconciled_flag() {
        let mut store = MemoryStore::new();
        store.save_bank_entry(&sample_entry("be1")).await.unwrap();
        let mut done = sample_entry("be2");
        done.reconciled = true;
        store.save_bank_entry(&done).await.unwrap();

        let pending = store.list_bank_entries(Some(false)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "be1");
        assert_eq!(store.list_bank_entries(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn records_are_scoped_to_their_bank_entry() {
        let mut store = MemoryStore::new();
        let record = ReconciliationRecord {
            id: "rec1".to_string(),
            bank_entry_id: "be1".to_string(),
            financial_entry_id: "fe1".to_string(),
            target: Some(AllocationTarget::Invoice("inv1".to_string())),
            prior_state: Some(PaymentState::Overdue),
            created_at: chrono::Utc::now().naive_utc(),
        };
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::InsertReconciliationRecord(record));
        store.apply(batch).await.unwrap();

        assert_eq!(store.records_for_entry("be1").await.unwrap().len(), 1);
        assert!(store.records_for_entry("be2").await.unwrap().is_empty());
    }
}
