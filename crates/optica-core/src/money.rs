//! # Money Module
//!
//! Provides the `Money` type for peso amounts.
//!
//! ## Why Integer Pesos?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Chilean pesos have no minor unit in everyday retail.                  │
//! │                                                                         │
//! │    Armazón        $45.990                                               │
//! │    Lente orgánico $32.000                                               │
//! │    ──────────────────────                                               │
//! │    Total          $77.990   ← exact integer arithmetic, no rounding     │
//! │                                                                         │
//! │  Prices, costs and totals are i64 pesos everywhere: database columns,  │
//! │  cart lines, ledger inputs and report sums.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use optica_core::money::Money;
//!
//! let frame = Money::from_pesos(45_990);
//! let lens = Money::from_pesos(32_000);
//!
//! assert_eq!((frame + lens).pesos(), 77_990);
//! assert_eq!(lens.multiply_quantity(2).to_string(), "$64.000");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;

// =============================================================================
// Money Type
// =============================================================================

/// A peso amount.
///
/// ## Design Decisions
/// - **i64 (signed)**: differences such as an override below subtotal stay representable
/// - **Single field tuple struct**: zero-cost wrapper over the raw column value
/// - **`#[serde(transparent)]`**: serializes as a bare integer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from whole pesos.
    #[inline]
    pub const fn from_pesos(pesos: i64) -> Self {
        Money(pesos)
    }

    /// Returns the value in pesos.
    #[inline]
    pub const fn pesos(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies a unit amount by a line quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Lente de contacto $12.500
    /// Quantity: 3
    ///      │
    ///      ▼
    /// multiply_quantity(3) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: $37.500
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows pesos with `.` thousands separators, as printed on Chilean receipts.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}", sign, grouped)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_pesos(0).to_string(), "$0");
        assert_eq!(Money::from_pesos(990).to_string(), "$990");
        assert_eq!(Money::from_pesos(1_000).to_string(), "$1.000");
        assert_eq!(Money::from_pesos(45_990).to_string(), "$45.990");
        assert_eq!(Money::from_pesos(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Money::from_pesos(-2_500).to_string(), "-$2.500");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_pesos(1_000);
        let b = Money::from_pesos(500);

        assert_eq!((a + b).pesos(), 1_500);
        assert_eq!(a.multiply_quantity(4).pesos(), 4_000);
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 650].into_iter().map(Money::from_pesos).sum();
        assert_eq!(total.pesos(), 1_000);

        let empty: Money = std::iter::empty::<Money>().sum();
        assert!(empty.is_zero());
    }

    #[test]
    fn test_serializes_as_integer() {
        let json = serde_json::to_string(&Money::from_pesos(12_000)).unwrap();
        assert_eq!(json, "12000");
    }
}
