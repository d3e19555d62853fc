//! # Validation Module
//!
//! Input validation utilities for Optica.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: CLI argument parsing (clap)                                  │
//! │  ├── Types and required flags                                          │
//! │  └── PRODUCT_ID:QTY item syntax                                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Drafts and ledger inputs (Rust)                              │
//! │  └── THIS MODULE: RUT format, required text, ranges                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE index on clients.rut                                       │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use optica_core::validation::{normalize_rut, validate_quantity};
//!
//! assert_eq!(normalize_rut("9.876.543-2").unwrap(), "9876543-2");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_AMOUNT, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, PUPILLARY_DISTANCE_RANGE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates and normalizes a Chilean RUT.
///
/// ## Rules
/// - Surrounding whitespace is trimmed, dots are stripped
/// - Body of 7 or 8 digits, a dash, then a check digit `0-9` or `K`
/// - A lowercase `k` is upper-cased
///
/// The check digit is not verified against the body (modulo 11); the shop
/// registers whatever the client's card shows.
///
/// ## Example
/// ```rust
/// use optica_core::validation::normalize_rut;
///
/// assert_eq!(normalize_rut("12.345.678-k").unwrap(), "12345678-K");
/// assert!(normalize_rut("123456-7").is_err());
/// assert!(normalize_rut("").is_err());
/// ```
pub fn normalize_rut(raw: &str) -> ValidationResult<String> {
    let rut: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '.')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if rut.is_empty() {
        return Err(ValidationError::required("rut"));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: "rut".to_string(),
        reason: "expected 12345678-9 (7-8 digits, dash, digit or K)".to_string(),
    };

    let (body, check) = rut.split_once('-').ok_or_else(invalid)?;

    let body_ok = (7..=8).contains(&body.len()) && body.chars().all(|c| c.is_ascii_digit());
    let check_ok = check.len() == 1 && check.chars().all(|c| c.is_ascii_digit() || c == 'K');

    if !body_ok || !check_ok {
        return Err(invalid());
    }

    Ok(rut)
}

/// Validates a required text field.
///
/// ## Returns
/// The trimmed value.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<String> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(value.to_string())
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (lists everything)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.len() > 100 {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a stock count, price or ledger total.
///
/// ## Rules
/// - Between 0 and 99,999,999 inclusive (zero allows courtesy items)
pub fn validate_amount(field: &str, value: i64) -> ValidationResult<()> {
    if !(0..=MAX_AMOUNT).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_AMOUNT,
        });
    }

    Ok(())
}

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  optica sale --item 4:5                                                 │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  validate_quantity(5) ← THIS FUNCTION                                  │
/// │       │                                                                 │
/// │       ├── qty <= 0? → Error: "quantity must be positive"               │
/// │       ├── qty > 999? → Error: "quantity must be between 1 and 999"     │
/// │       └── OK → Cart::add_item                                          │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a foreign key supplied by the caller (client, supplier, product).
pub fn validate_id(field: &str, id: i64) -> ValidationResult<()> {
    if id <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a pupillary distance in millimetres (40-80).
pub fn validate_pupillary_distance(dp: i64) -> ValidationResult<()> {
    if !PUPILLARY_DISTANCE_RANGE.contains(&dp) {
        return Err(ValidationError::OutOfRange {
            field: "dp".to_string(),
            min: *PUPILLARY_DISTANCE_RANGE.start(),
            max: *PUPILLARY_DISTANCE_RANGE.end(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of lines on a ledger input.
///
/// ## Rules
/// - Between 1 and MAX_CART_ITEMS (100), the most a cart can hold
pub fn validate_line_count(lines: usize) -> ValidationResult<()> {
    if lines == 0 {
        return Err(ValidationError::required("lines"));
    }
    if lines > MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "lines".to_string(),
            min: 1,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_rut() {
        assert_eq!(normalize_rut("12345678-9").unwrap(), "12345678-9");
        assert_eq!(normalize_rut(" 12.345.678-k ").unwrap(), "12345678-K");
        assert_eq!(normalize_rut("1234567-0").unwrap(), "1234567-0");

        assert!(matches!(
            normalize_rut("   "),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            normalize_rut("123456789-1"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(normalize_rut("12345678").is_err());
        assert!(normalize_rut("12345678-").is_err());
        assert!(normalize_rut("12345678-X").is_err());
        assert!(normalize_rut("12345678-12").is_err());
        assert!(normalize_rut("1234a678-9").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert_eq!(validate_required("name", "  Ana ").unwrap(), "Ana");
        assert!(validate_required("name", "").is_err());
        assert!(validate_required("name", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount("stock", 0).is_ok());
        assert!(validate_amount("stock", 99_999_999).is_ok());
        assert!(validate_amount("stock", 100_000_000).is_err());
        assert!(validate_amount("stock", -1).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_pupillary_distance() {
        assert!(validate_pupillary_distance(40).is_ok());
        assert!(validate_pupillary_distance(80).is_ok());
        assert!(validate_pupillary_distance(39).is_err());
        assert!(validate_pupillary_distance(81).is_err());
    }

    #[test]
    fn test_validate_id_and_line_count() {
        assert!(validate_id("client_id", 1).is_ok());
        assert!(validate_id("client_id", 0).is_err());
        assert!(validate_line_count(0).is_err());
        assert!(validate_line_count(100).is_ok());
        assert!(validate_line_count(101).is_err());
    }
}
