//! # optica-core: Pure Domain Logic for Optica
//!
//! Everything the optical shop knows about its own business, with no I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Optica Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    optica CLI (apps/optica-cli)                 │   │
//! │  │    client / product / recipe / sale / purchase / report         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ optica-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   cart    │  │  recipe   │  │ validation│  │   │
//! │  │   │  Client   │  │   Cart    │  │  payload  │  │   RUT     │  │   │
//! │  │   │  Product  │  │  ceiling  │  │  codec    │  │  fields   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    optica-db (Database Layer)                   │   │
//! │  │          gateway, ledger, repositories, reports                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities, drafts, ledger inputs and report rows
//! - [`money`] - Integer pesos
//! - [`error`] - Domain error types
//! - [`validation`] - Field and RUT validation
//! - [`cart`] - Transaction cart with the sale stock ceiling
//! - [`recipe`] - Structured prescription payload
//!
//! ## Example Usage
//!
//! ```rust
//! use optica_core::validation::normalize_rut;
//!
//! assert_eq!(normalize_rut(" 12.345.678-k ").unwrap(), "12345678-K");
//! assert!(normalize_rut("12345678").is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod recipe;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use recipe::{DistanceCorrection, EyeCorrection, RecipePayload};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Matches the quantity picker range of the shop counter (1-999).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Upper bound for stock counts and prices entered on a product form.
pub const MAX_AMOUNT: i64 = 99_999_999;

/// Valid pupillary distance range in millimetres.
pub const PUPILLARY_DISTANCE_RANGE: std::ops::RangeInclusive<i64> = 40..=80;
