//! Invoice and movement lifecycle

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use log::debug;

use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_cost_center, validate_description, validate_positive_amount};

/// Manager for the club's receivables: formal invoices and generic movements
///
/// Only the non-settlement parts of the state machine live here; transitions
/// to `Paid`/`Partial` (and back) belong exclusively to the reconciliation
/// engine.
pub struct ReceivableManager<S: LedgerStore> {
    store: S,
}

impl<S: LedgerStore> ReceivableManager<S> {
    /// Create a new receivable manager
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Register a payer that statement descriptions can be matched against
    pub async fn register_payer(&mut self, payer: Payer) -> FinanceResult<Payer> {
        if payer.name.trim().is_empty() {
            return Err(FinanceError::Validation(
                "Payer name cannot be empty".to_string(),
            ));
        }
        self.store.save_payer(&payer).await?;
        Ok(payer)
    }

    /// Issue a new invoice to a member
    pub async fn create_invoice(
        &mut self,
        id: String,
        payer_id: String,
        description: String,
        total: BigDecimal,
        due_date: NaiveDate,
        cost_center_id: String,
    ) -> FinanceResult<Invoice> {
        validate_positive_amount(&total)?;
        validate_description(&description)?;
        validate_cost_center(&cost_center_id)?;

        if self.store.get_invoice(&id).await?.is_some() {
            return Err(FinanceError::Validation(format!(
                "Invoice with ID '{}' already exists",
                id
            )));
        }

        let invoice = Invoice::new(id, payer_id, description, total, due_date, cost_center_id);
        self.store.save_invoice(&invoice).await?;
        Ok(invoice)
    }

    /// Record a new movement (merchandise sale, sponsorship, one-off fee)
    pub async fn create_movement(
        &mut self,
        id: String,
        payer: Option<PayerRef>,
        description: String,
        total: BigDecimal,
        due_date: NaiveDate,
        cost_center_id: String,
    ) -> FinanceResult<Movement> {
        validate_positive_amount(&total)?;
        validate_description(&description)?;
        validate_cost_center(&cost_center_id)?;

        if self.store.get_movement(&id).await?.is_some() {
            return Err(FinanceError::Validation(format!(
                "Movement with ID '{}' already exists",
                id
            )));
        }

        let movement = Movement::new(id, payer, description, total, due_date, cost_center_id);
        self.store.save_movement(&movement).await?;
        Ok(movement)
    }

    /// Get an invoice by ID
    pub async fn get_invoice(&self, invoice_id: &str) -> FinanceResult<Option<Invoice>> {
        self.store.get_invoice(invoice_id).await
    }

    /// Get an invoice by ID, returning an error if not found
    pub async fn get_invoice_required(&self, invoice_id: &str) -> FinanceResult<Invoice> {
        self.store
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| FinanceError::TargetNotFound(format!("invoice '{}'", invoice_id)))
    }

    /// Get a movement by ID
    pub async fn get_movement(&self, movement_id: &str) -> FinanceResult<Option<Movement>> {
        self.store.get_movement(movement_id).await
    }

    /// Get a movement by ID, returning an error if not found
    pub async fn get_movement_required(&self, movement_id: &str) -> FinanceResult<Movement> {
        self.store
            .get_movement(movement_id)
            .await?
            .ok_or_else(|| FinanceError::TargetNotFound(format!("movement '{}'", movement_id)))
    }

    /// Invoices that can still receive allocations
    pub async fn open_invoices(&self) -> FinanceResult<Vec<Invoice>> {
        let invoices = self.store.list_invoices(None).await?;
        Ok(invoices
            .into_iter()
            .filter(|invoice| invoice.state.is_open())
            .collect())
    }

    /// Movements that can still receive allocations
    pub async fn open_movements(&self) -> FinanceResult<Vec<Movement>> {
        let movements = self.store.list_movements(None).await?;
        Ok(movements
            .into_iter()
            .filter(|movement| movement.state.is_open())
            .collect())
    }

    /// Flip pending receivables past their due date to `Overdue`
    ///
    /// Returns how many receivables changed state. Overdue is the state the
    /// suggestion engine draws invoice candidates from, so this is typically
    /// run right after a statement import.
    pub async fn refresh_overdue(&mut self, as_of: NaiveDate) -> FinanceResult<usize> {
        let mut flipped = 0;

        for mut invoice in self.store.list_invoices(Some(PaymentState::Pending)).await? {
            if invoice.due_date < as_of {
                invoice.state = PaymentState::Overdue;
                invoice.updated_at = chrono::Utc::now().naive_utc();
                self.store.update_invoice(&invoice).await?;
                flipped += 1;
            }
        }

        for mut movement in self.store.list_movements(Some(PaymentState::Pending)).await? {
            if movement.due_date < as_of {
                movement.state = PaymentState::Overdue;
                movement.updated_at = chrono::Utc::now().naive_utc();
                self.store.update_movement(&movement).await?;
                flipped += 1;
            }
        }

        if flipped > 0 {
            debug!("marked {} receivables overdue as of {}", flipped, as_of);
        }
        Ok(flipped)
    }

    /// Cancel an invoice that has not received any settlement
    pub async fn cancel_invoice(&mut self, invoice_id: &str) -> FinanceResult<Invoice> {
        let mut invoice = self.get_invoice_required(invoice_id).await?;
        if !matches!(invoice.state, PaymentState::Pending | PaymentState::Overdue) {
            return Err(FinanceError::Validation(format!(
                "Invoice '{}' cannot be cancelled in its current state",
                invoice.id
            )));
        }
        invoice.state = PaymentState::Cancelled;
        invoice.updated_at = chrono::Utc::now().naive_utc();
        self.store.update_invoice(&invoice).await?;
        Ok(invoice)
    }

    /// Cancel a movement that has not received any settlement
    pub async fn cancel_movement(&mut self, movement_id: &str) -> FinanceResult<Movement> {
        let mut movement = self.get_movement_required(movement_id).await?;
        if !matches!(movement.state, PaymentState::Pending | PaymentState::Overdue) {
            return Err(FinanceError::Validation(format!(
                "Movement '{}' cannot be cancelled in its current state",
                movement.id
            )));
        }
        movement.state = PaymentState::Cancelled;
        movement.updated_at = chrono::Utc::now().naive_utc();
        self.store.update_movement(&movement).await?;
        Ok(movement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_store::MemoryStore;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn refresh_overdue_flips_only_past_due_pending() {
        let mut manager = ReceivableManager::new(MemoryStore::new());
        manager
            .create_invoice(
                "inv-late".to_string(),
                "p1".to_string(),
                "March quota".to_string(),
                BigDecimal::from(60),
                date(2024, 3, 1),
                "C1".to_string(),
            )
            .await
            .unwrap();
        manager
            .create_invoice(
                "inv-future".to_string(),
                "p1".to_string(),
                "May quota".to_string(),
                BigDecimal::from(60),
                date(2024, 5, 1),
                "C1".to_string(),
            )
            .await
            .unwrap();

        let flipped = manager.refresh_overdue(date(2024, 4, 1)).await.unwrap();
        assert_eq!(flipped, 1);
        assert_eq!(
            manager.get_invoice_required("inv-late").await.unwrap().state,
            PaymentState::Overdue
        );
        assert_eq!(
            manager
                .get_invoice_required("inv-future")
                .await
                .unwrap()
                .state,
            PaymentState::Pending
        );
    }

    #[tokio::test]
    async fn duplicate_invoice_ids_are_rejected() {
        let mut manager = ReceivableManager::new(MemoryStore::new());
        manager
            .create_invoice(
                "inv1".to_string(),
                "p1".to_string(),
                "Quota".to_string(),
                BigDecimal::from(60),
                date(2024, 3, 1),
                "C1".to_string(),
            )
            .await
            .unwrap();
        let err = manager
            .create_invoice(
                "inv1".to_string(),
                "p2".to_string(),
                "Quota".to_string(),
                BigDecimal::from(30),
                date(2024, 3, 1),
                "C1".to_string(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, FinanceError::Validation(_)));
    }

    #[tokio::test]
    async fn only_unsettled_receivables_can_be_cancelled() {
        let mut store = MemoryStore::new();
        let mut movement = Movement::new(
            "mov1".to_string(),
            Some(PayerRef::Name("Sponsor Lda".to_string())),
            "Kit sponsorship".to_string(),
            BigDecimal::from(500),
            date(2024, 3, 1),
            "C2".to_string(),
        );
        movement.state = PaymentState::Partial;
        store.save_movement(&movement).await.unwrap();

        let mut manager = ReceivableManager::new(store);
        let err = manager.cancel_movement("mov1").await.unwrap_err();
        assert!(matches!(err, FinanceError::Validation(_)));
    }
}
