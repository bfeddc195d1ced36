//! Allocation of a bank entry across receivables, and its legality rules

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::types::*;

// Slack allowed on the allocated total before it counts as over-allocation,
// absorbing rounding introduced upstream by locale number parsing
fn over_allocation_tolerance() -> BigDecimal {
    BigDecimal::from(5) / BigDecimal::from(1000)
}

/// One caller-chosen split of a bank entry's amount
///
/// Amounts are always positive magnitudes regardless of the entry's sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationItem {
    /// The receivable this slice settles against
    pub target: AllocationTarget,
    /// Allocated amount (positive magnitude)
    pub amount: BigDecimal,
}

impl AllocationItem {
    /// Allocate an amount against an invoice
    pub fn invoice(invoice_id: String, amount: BigDecimal) -> Self {
        Self {
            target: AllocationTarget::Invoice(invoice_id),
            amount,
        }
    }

    /// Allocate an amount against a movement
    pub fn movement(movement_id: String, amount: BigDecimal) -> Self {
        Self {
            target: AllocationTarget::Movement(movement_id),
            amount,
        }
    }
}

/// Builder for allocation lists
#[derive(Debug, Default)]
pub struct AllocationBuilder {
    items: Vec<AllocationItem>,
}

impl AllocationBuilder {
    /// Create an empty allocation builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an invoice allocation
    pub fn invoice(mut self, invoice_id: String, amount: BigDecimal) -> Self {
        self.items.push(AllocationItem::invoice(invoice_id, amount));
        self
    }

    /// Add a movement allocation
    pub fn movement(mut self, movement_id: String, amount: BigDecimal) -> Self {
        self.items
            .push(AllocationItem::movement(movement_id, amount));
        self
    }

    /// Add a custom allocation item
    pub fn item(mut self, item: AllocationItem) -> Self {
        self.items.push(item);
        self
    }

    /// Build the allocation list
    pub fn build(self) -> Vec<AllocationItem> {
        self.items
    }
}

/// Total amount of an allocation list
pub fn allocated_total(allocation: &[AllocationItem]) -> BigDecimal {
    allocation.iter().map(|item| &item.amount).sum()
}

/// Whether an allocation settles less than the entry's full amount
///
/// A partial allocation is legal: the entry is still marked fully processed
/// and the remainder is not reopened as a new entry.
pub fn is_partial(entry: &BankEntry, allocation: &[AllocationItem]) -> bool {
    !allocation.is_empty() && allocated_total(allocation) < entry.unsigned_amount()
}

/// Check the legality of a proposed allocation
///
/// Rules are evaluated in order and the first violation aborts:
///
/// 1. `EmptyClassification`: a direct reconciliation (no allocation list)
///    requires a cost center.
/// 2. `NoAllocationSelected`: a supplied list must be non-empty and every
///    amount positive.
/// 3. `DuplicateTarget`: no receivable may appear twice.
/// 4. `OverAllocation`: the allocated total may not exceed the entry's
///    unsigned amount.
pub fn validate_allocation(
    entry: &BankEntry,
    cost_center_id: &str,
    allocation: Option<&[AllocationItem]>,
) -> FinanceResult<()> {
    let items = match allocation {
        None => {
            if cost_center_id.trim().is_empty() {
                return Err(FinanceError::EmptyClassification);
            }
            return Ok(());
        }
        Some(items) => items,
    };

    if items.is_empty() || items.iter().any(|item| item.amount <= BigDecimal::from(0)) {
        return Err(FinanceError::NoAllocationSelected);
    }

    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(&item.target) {
            return Err(FinanceError::DuplicateTarget(item.target.to_string()));
        }
    }

    let allocated = allocated_total(items);
    let available = entry.unsigned_amount();
    if allocated > &available + over_allocation_tolerance() {
        return Err(FinanceError::OverAllocation {
            allocated,
            available,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(amount: &str) -> BankEntry {
        BankEntry::from_line(
            "be1".to_string(),
            StatementLine::new(
                NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                "bank line".to_string(),
                amount.parse().unwrap(),
            ),
            None,
            None,
            "C1".to_string(),
        )
    }

    #[test]
    fn direct_reconciliation_requires_cost_center() {
        let result = validate_allocation(&entry("100"), "  ", None);
        assert!(matches!(result, Err(FinanceError::EmptyClassification)));
        assert!(validate_allocation(&entry("100"), "C1", None).is_ok());
    }

    #[test]
    fn supplied_allocation_must_have_positive_items() {
        let empty: Vec<AllocationItem> = Vec::new();
        assert!(matches!(
            validate_allocation(&entry("100"), "C1", Some(&empty)),
            Err(FinanceError::NoAllocationSelected)
        ));

        let zero = vec![AllocationItem::invoice(
            "inv1".to_string(),
            BigDecimal::from(0),
        )];
        assert!(matches!(
            validate_allocation(&entry("100"), "C1", Some(&zero)),
            Err(FinanceError::NoAllocationSelected)
        ));
    }

    #[test]
    fn duplicate_targets_are_rejected() {
        let allocation = AllocationBuilder::new()
            .invoice("inv1".to_string(), BigDecimal::from(30))
            .invoice("inv1".to_string(), BigDecimal::from(40))
            .build();
        assert!(matches!(
            validate_allocation(&entry("100"), "C1", Some(&allocation)),
            Err(FinanceError::DuplicateTarget(_))
        ));
    }

    #[test]
    fn same_id_across_kinds_is_not_a_duplicate() {
        let allocation = AllocationBuilder::new()
            .invoice("x1".to_string(), BigDecimal::from(30))
            .movement("x1".to_string(), BigDecimal::from(40))
            .build();
        assert!(validate_allocation(&entry("100"), "C1", Some(&allocation)).is_ok());
    }

    #[test]
    fn over_allocation_is_rejected_beyond_tolerance() {
        let over = vec![AllocationItem::movement(
            "mov1".to_string(),
            BigDecimal::from(150),
        )];
        assert!(matches!(
            validate_allocation(&entry("100"), "C1", Some(&over)),
            Err(FinanceError::OverAllocation { .. })
        ));

        // Rounding slack within 0.005 passes
        let near: Vec<AllocationItem> = vec![AllocationItem::invoice(
            "inv1".to_string(),
            "100.004".parse().unwrap(),
        )];
        assert!(validate_allocation(&entry("100"), "C1", Some(&near)).is_ok());
    }

    #[test]
    fn allocation_sign_is_independent_of_entry_sign() {
        let allocation = vec![AllocationItem::invoice(
            "inv1".to_string(),
            BigDecimal::from(45),
        )];
        assert!(validate_allocation(&entry("-45"), "C1", Some(&allocation)).is_ok());
    }

    #[test]
    fn under_allocation_is_legal_and_partial() {
        let e = entry("120");
        let allocation = vec![AllocationItem::invoice(
            "inv1".to_string(),
            BigDecimal::from(50),
        )];
        assert!(validate_allocation(&e, "C1", Some(&allocation)).is_ok());
        assert!(is_partial(&e, &allocation));

        let full = AllocationBuilder::new()
            .invoice("inv1".to_string(), BigDecimal::from(50))
            .invoice("inv2".to_string(), BigDecimal::from(70))
            .build();
        assert!(!is_partial(&e, &full));
    }
}
