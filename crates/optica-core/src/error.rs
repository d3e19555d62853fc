//! # Error Types
//!
//! Domain-specific error types for optica-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  optica-core errors (this file)                                        │
//! │  ├── CoreError        - Cart and data-integrity failures               │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  optica-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── AppError         - What the operator sees                         │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError / DbError → AppError → stderr       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough stock left for a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to Cart (qty: 5)
    ///      │
    ///      ▼
    /// stock=6, already in cart=3 → available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Armazón Ray-Ban", stock: 6, in_cart: 3, requested: 5 }
    /// ```
    #[error(
        "Insufficient stock for {product}: stock {stock}, in cart {in_cart}, can add {}",
        stock - in_cart
    )]
    InsufficientStock {
        product: String,
        stock: i64,
        in_cart: i64,
        requested: i64,
    },

    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(i64),

    /// A stored prescription payload could not be decoded.
    ///
    /// The record stays as it is; it just cannot be edited structurally.
    #[error("Corrupted prescription data: {reason}")]
    CorruptedRecipe { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any database call; an operation that fails validation
/// never writes anything.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., malformed RUT, unparseable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., RUT already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },

    /// Two values that must agree do not.
    #[error("{field} is {actual}, expected {expected}")]
    Mismatch {
        field: String,
        expected: i64,
        actual: i64,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Lente de contacto".to_string(),
            stock: 6,
            in_cart: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Lente de contacto: stock 6, in cart 3, can add 3"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("rut").to_string(), "rut is required");

        let err = ValidationError::Mismatch {
            field: "total".to_string(),
            expected: 100,
            actual: 90,
        };
        assert_eq!(err.to_string(), "total is 90, expected 100");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("seller").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
