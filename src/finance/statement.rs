//! Bank statement registration and entry lifecycle

use log::debug;
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;
use crate::utils::validation::validate_cost_center;

/// Manager for imported bank entries
///
/// Turns normalized statement lines into pending [`BankEntry`] rows and owns
/// the non-reconciliation parts of their lifecycle. Reconciliation itself
/// goes through the [`crate::reconciliation::ReconciliationEngine`].
pub struct StatementManager<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> StatementManager<S> {
    /// Create a new statement manager
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register the lines of an imported statement as pending bank entries
    ///
    /// Every entry starts unreconciled with the given default cost center;
    /// the source tag records which statement file the lines came from.
    pub async fn register(
        &mut self,
        lines: Vec<StatementLine>,
        account: Option<String>,
        source: Option<String>,
        cost_center_id: &str,
    ) -> FinanceResult<Vec<BankEntry>> {
        validate_cost_center(cost_center_id)?;

        let mut entries = Vec::with_capacity(lines.len());
        for line in lines {
            let entry = BankEntry::from_line(
                Uuid::new_v4().to_string(),
                line,
                account.clone(),
                source.clone(),
                cost_center_id.to_string(),
            );
            self.store.save_bank_entry(&entry).await?;
            entries.push(entry);
        }

        debug!(
            "registered {} bank entries from {}",
            entries.len(),
            source.as_deref().unwrap_or("unnamed statement")
        );
        Ok(entries)
    }

    /// Get a bank entry by ID
    pub async fn get_entry(&self, entry_id: &str) -> FinanceResult<Option<BankEntry>> {
        self.store.get_bank_entry(entry_id).await
    }

    /// Get a bank entry by ID, returning an error if not found
    pub async fn get_entry_required(&self, entry_id: &str) -> FinanceResult<BankEntry> {
        self.store
            .get_bank_entry(entry_id)
            .await?
            .ok_or_else(|| FinanceError::EntryNotFound(entry_id.to_string()))
    }

    /// Entries still awaiting reconciliation
    pub async fn pending_entries(&self) -> FinanceResult<Vec<BankEntry>> {
        self.store.list_bank_entries(Some(false)).await
    }

    /// Entries already reconciled
    pub async fn reconciled_entries(&self) -> FinanceResult<Vec<BankEntry>> {
        self.store.list_bank_entries(Some(true)).await
    }

    /// Delete a bank entry
    ///
    /// Reconciled entries cannot be deleted; unreconcile them first.
    pub async fn delete_entry(&mut self, entry_id: &str) -> FinanceResult<()> {
        let entry = self.get_entry_required(entry_id).await?;
        if entry.reconciled {
            return Err(FinanceError::AlreadyReconciled(entry.id));
        }
        self.store.delete_bank_entry(entry_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn lines() -> Vec<StatementLine> {
        vec![
            StatementLine::new(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                "Quota Ana Silva".to_string(),
                BigDecimal::from(60),
            ),
            StatementLine::new(
                NaiveDate::from_ymd_opt(2024, 2, 3).unwrap(),
                "Referee fees".to_string(),
                BigDecimal::from(-80),
            ),
        ]
    }

    #[tokio::test]
    async fn register_creates_pending_entries_with_source_tag() {
        let mut manager = StatementManager::new(MemoryStore::new());
        let entries = manager
            .register(lines(), Some("main".to_string()), Some("feb.xlsx".to_string()), "C1")
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| !e.reconciled));
        assert!(entries.iter().all(|e| e.source.as_deref() == Some("feb.xlsx")));
        assert_eq!(manager.pending_entries().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn register_requires_a_cost_center() {
        let mut manager = StatementManager::new(MemoryStore::new());
        let err = manager.register(lines(), None, None, " ").await.unwrap_err();
        assert!(matches!(err, FinanceError::Validation(_)));
    }

    #[tokio::test]
    async fn reconciled_entries_cannot_be_deleted() {
        let mut store = MemoryStore::new();
        let mut entry = BankEntry::from_line(
            "be1".to_string(),
            StatementLine::new(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                "transfer".to_string(),
                BigDecimal::from(10),
            ),
            None,
            None,
            "C1".to_string(),
        );
        entry.reconciled = true;
        store.save_bank_entry(&entry).await.unwrap();

        let mut manager = StatementManager::new(store);
        let err = manager.delete_entry("be1").await.unwrap_err();
        assert!(matches!(err, FinanceError::AlreadyReconciled(_)));
    }
}
