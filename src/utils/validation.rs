//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is not negative
pub fn validate_non_negative_amount(label: &str, amount: &BigDecimal) -> WorkshopResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(WorkshopError::Validation(format!(
            "{} cannot be negative",
            label
        )))
    } else {
        Ok(())
    }
}

/// Validate a display name
pub fn validate_name(label: &str, name: &str) -> WorkshopResult<()> {
    if name.trim().is_empty() {
        return Err(WorkshopError::Validation(format!("{} cannot be empty", label)));
    }

    if name.len() > 200 {
        return Err(WorkshopError::Validation(format!(
            "{} cannot exceed 200 characters",
            label
        )));
    }

    Ok(())
}

/// Validate that a product code is valid
pub fn validate_product_code(product_code: &str) -> WorkshopResult<()> {
    if product_code.trim().is_empty() {
        return Err(WorkshopError::Validation(
            "Product code cannot be empty".to_string(),
        ));
    }

    if product_code.len() > 50 {
        return Err(WorkshopError::Validation(
            "Product code cannot exceed 50 characters".to_string(),
        ));
    }

    // Alphanumeric, dashes, underscores and dots
    if !product_code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(WorkshopError::Validation(
            "Product code can only contain alphanumeric characters, dashes, underscores, and dots"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate the lines of a new invoice
pub fn validate_invoice_lines(lines: &[LineRequest]) -> WorkshopResult<()> {
    if lines.is_empty() {
        return Err(WorkshopError::Validation(
            "Invoice must have at least one line".to_string(),
        ));
    }

    for line in lines {
        if line.quantity <= 0 {
            return Err(WorkshopError::Validation(format!(
                "Quantity for item {} must be positive",
                line.item_id
            )));
        }
    }

    Ok(())
}
