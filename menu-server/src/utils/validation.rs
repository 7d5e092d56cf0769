//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use rust_decimal::Decimal;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: product, category, business name
pub const MAX_NAME_LEN: usize = 100;

/// Descriptions shown under a menu entry
pub const MAX_NOTE_LEN: usize = 500;

/// URLs / image object keys
pub const MAX_URL_LEN: usize = 2048;

// ── Validation helpers (CRUD handlers) ──────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    if value.chars().count() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.chars().count()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Prices are never negative
pub fn validate_price(price: Decimal) -> Result<(), AppError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::with_message(
            shared::error::ErrorCode::ProductInvalidPrice,
            format!("price must not be negative (got {price})"),
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::error::ErrorCode;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Drinks", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());

        let long = "x".repeat(MAX_NAME_LEN + 1);
        let err = validate_required_text(&long, "name", MAX_NAME_LEN).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn test_name_limit_counts_chars_not_bytes() {
        let name = "ç".repeat(MAX_NAME_LEN);
        assert!(validate_required_text(&name, "name", MAX_NAME_LEN).is_ok());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "description", MAX_NOTE_LEN).is_ok());
        assert!(validate_optional_text(&Some("x".repeat(MAX_NOTE_LEN + 1)), "description", MAX_NOTE_LEN).is_err());
    }

    #[test]
    fn test_price() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::new(1250, 2)).is_ok());
        let err = validate_price(Decimal::new(-1, 0)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProductInvalidPrice);
    }
}
