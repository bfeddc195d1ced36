//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> FinanceResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(FinanceError::Validation(
            "Amount must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a cost center id is usable
pub fn validate_cost_center(cost_center_id: &str) -> FinanceResult<()> {
    if cost_center_id.trim().is_empty() {
        return Err(FinanceError::Validation(
            "Cost center id cannot be empty".to_string(),
        ));
    }

    if cost_center_id.len() > 50 {
        return Err(FinanceError::Validation(
            "Cost center id cannot exceed 50 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that a receivable description is usable
pub fn validate_description(description: &str) -> FinanceResult<()> {
    if description.trim().is_empty() {
        return Err(FinanceError::Validation(
            "Description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(FinanceError::Validation(
            "Description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}
