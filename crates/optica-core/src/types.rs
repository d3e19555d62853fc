//! # Domain Types
//!
//! Core domain types used throughout Optica.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │  Prescription   │   │    Supplier     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │◄──│  client_id (FK) │   │  id             │       │
//! │  │  rut (unique)   │   │  diagnosis      │   │  name, contact  │       │
//! │  │  name           │   │  recipe (JSON)  │   └────────▲────────┘       │
//! │  └────────▲────────┘   └─────────────────┘            │                │
//! │           │                                            │                │
//! │  ┌────────┴────────┐   ┌─────────────────┐   ┌────────┴────────┐       │
//! │  │      Order      │   │     Product     │   │    Purchase     │       │
//! │  │  (sale header)  │   │  ─────────────  │   │  (header)       │       │
//! │  │  seller, total  │   │  stock          │   │  total          │       │
//! │  └────────┬────────┘   │  cost / sale    │   └────────┬────────┘       │
//! │           │            └──▲───────────▲──┘            │                │
//! │     SaleLine ─────────────┘           └───────── PurchaseLine          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Records and Drafts
//! - Records (`Client`, `Product`, ...) are rows as stored, with their integer id
//! - Drafts (`ClientDraft`, ...) are what a form submits; `validate()` returns
//!   the cleaned draft ready to be written

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;
use crate::recipe::RecipePayload;
use crate::validation::{
    normalize_rut, validate_amount, validate_id, validate_line_count, validate_quantity,
    validate_required, ValidationResult,
};

// =============================================================================
// Client
// =============================================================================

/// A registered client of the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Client {
    pub id: i64,
    pub name: String,
    pub last_name: String,
    /// Normalized RUT, unique across clients.
    pub rut: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl Client {
    /// "Name LastName", as shown on sale history.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.name, self.last_name)
    }
}

/// Client fields as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientDraft {
    pub name: String,
    pub last_name: String,
    pub rut: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

impl ClientDraft {
    /// Trims every field, requires all of them and normalizes the RUT.
    pub fn validate(&self) -> ValidationResult<ClientDraft> {
        Ok(ClientDraft {
            name: validate_required("name", &self.name)?,
            last_name: validate_required("last_name", &self.last_name)?,
            rut: normalize_rut(&self.rut)?,
            phone: validate_required("phone", &self.phone)?,
            email: validate_required("email", &self.email)?,
            address: validate_required("address", &self.address)?,
        })
    }
}

// =============================================================================
// Product
// =============================================================================

/// An inventory item: frames, lenses, contact lenses, accessories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Free-text category ("Armazón", "Lente de contacto", ...).
    pub category: String,
    pub brand: String,
    /// Units on hand. Moved only by the ledger and by product edits.
    pub stock: i64,
    /// Cost in pesos; default unit cost on a purchase.
    pub cost_price: i64,
    /// Price in pesos; default unit price on a sale.
    pub sale_price: i64,
}

impl Product {
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_pesos(self.cost_price)
    }

    #[inline]
    pub fn price(&self) -> Money {
        Money::from_pesos(self.sale_price)
    }
}

/// Product fields as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub category: String,
    pub brand: String,
    pub stock: i64,
    pub cost_price: i64,
    pub sale_price: i64,
}

impl ProductDraft {
    /// Requires the text fields and bounds the integer fields to 0..=99,999,999.
    pub fn validate(&self) -> ValidationResult<ProductDraft> {
        validate_amount("stock", self.stock)?;
        validate_amount("cost_price", self.cost_price)?;
        validate_amount("sale_price", self.sale_price)?;

        Ok(ProductDraft {
            name: validate_required("name", &self.name)?,
            category: validate_required("category", &self.category)?,
            brand: validate_required("brand", &self.brand)?,
            ..*self
        })
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A supplier of frames and lenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub address: String,
}

/// Supplier fields as submitted by a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierDraft {
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub address: String,
}

impl SupplierDraft {
    pub fn validate(&self) -> ValidationResult<SupplierDraft> {
        Ok(SupplierDraft {
            name: validate_required("name", &self.name)?,
            contact: validate_required("contact", &self.contact)?,
            phone: validate_required("phone", &self.phone)?,
            address: validate_required("address", &self.address)?,
        })
    }
}

// =============================================================================
// Prescription
// =============================================================================

/// Which viewing distances a prescription corrects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
pub enum Diagnosis {
    #[serde(rename = "Lejos")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Lejos"))]
    Far,
    #[serde(rename = "Cerca")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Cerca"))]
    Near,
    #[serde(rename = "Ambos")]
    #[cfg_attr(feature = "sqlx", sqlx(rename = "Ambos"))]
    Both,
}

impl Diagnosis {
    pub const ALL: [Diagnosis; 3] = [Diagnosis::Far, Diagnosis::Near, Diagnosis::Both];

    /// Stored label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Diagnosis::Far => "Lejos",
            Diagnosis::Near => "Cerca",
            Diagnosis::Both => "Ambos",
        }
    }

    pub fn covers_far(&self) -> bool {
        matches!(self, Diagnosis::Far | Diagnosis::Both)
    }

    pub fn covers_near(&self) -> bool {
        matches!(self, Diagnosis::Near | Diagnosis::Both)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts the stored labels and their English names, case-insensitively.
impl FromStr for Diagnosis {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lejos" | "far" => Ok(Diagnosis::Far),
            "cerca" | "near" => Ok(Diagnosis::Near),
            "ambos" | "both" => Ok(Diagnosis::Both),
            _ => Err(ValidationError::NotAllowed {
                field: "diagnosis".to_string(),
                allowed: Diagnosis::ALL.iter().map(|d| d.to_string()).collect(),
            }),
        }
    }
}

/// A clinical record for a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Prescription {
    pub id: i64,
    pub client_id: i64,
    pub date: NaiveDate,
    pub diagnosis: Diagnosis,
    /// Encoded [`RecipePayload`]; opaque until decoded.
    pub recipe: String,
    pub observations: String,
}

impl Prescription {
    /// Decodes the stored payload. See [`RecipePayload::decode`].
    pub fn payload(&self) -> crate::CoreResult<RecipePayload> {
        RecipePayload::decode(&self.recipe)
    }
}

/// Prescription fields as submitted by a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionDraft {
    pub client_id: i64,
    pub date: NaiveDate,
    pub diagnosis: Diagnosis,
    pub recipe: RecipePayload,
    pub observations: String,
}

impl PrescriptionDraft {
    /// Keeps only the distances the diagnosis covers and checks their `dp`.
    pub fn validate(&self) -> ValidationResult<PrescriptionDraft> {
        validate_id("client_id", self.client_id)?;

        let recipe = self.recipe.clone().retain_for(self.diagnosis);
        recipe.validate()?;

        Ok(PrescriptionDraft {
            recipe,
            observations: self.observations.trim().to_string(),
            ..self.clone()
        })
    }
}

// =============================================================================
// Sales and Purchases
// =============================================================================

/// Status of a sale. Sales are recorded already paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Paid,
}

impl OrderStatus {
    /// Stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Paid => "paid",
        }
    }
}

/// A sale header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub date: NaiveDate,
    pub seller: String,
    /// Charged total; may differ from the line sum.
    pub total: i64,
    pub status: OrderStatus,
}

/// A line of a sale. Uses the price at the time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
}

/// A purchase header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Purchase {
    pub id: i64,
    pub supplier_id: i64,
    pub date: NaiveDate,
    pub total: i64,
}

/// A line of a purchase. Uses the cost at the time of purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseLine {
    pub id: i64,
    pub purchase_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_cost: i64,
}

/// A sale header with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleDetail {
    pub order: Order,
    pub lines: Vec<SaleLine>,
}

/// A purchase header with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseDetail {
    pub purchase: Purchase,
    pub lines: Vec<PurchaseLine>,
}

// =============================================================================
// Ledger Inputs
// =============================================================================

/// One line handed to the ledger. `unit_price` is the sale price for a sale
/// and the unit cost for a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerLine {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: i64,
}

impl LedgerLine {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_pesos(self.unit_price).multiply_quantity(self.quantity)
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_id("product_id", self.product_id)?;
        validate_quantity(self.quantity)?;
        validate_amount("unit_price", self.unit_price)
    }
}

/// Bounded prices, quantities and line count keep the sum far below `i64::MAX`.
fn validate_lines(lines: &[LedgerLine]) -> ValidationResult<Money> {
    validate_line_count(lines.len())?;
    for line in lines {
        line.validate()?;
    }
    Ok(lines.iter().map(LedgerLine::line_total).sum())
}

/// A sale ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub client_id: i64,
    pub seller: String,
    /// Charged total. May be overridden below or above the line sum.
    pub total: i64,
    /// Defaults to today when absent.
    pub date: Option<NaiveDate>,
    pub lines: Vec<LedgerLine>,
}

impl NewSale {
    /// Sum of `unit_price * quantity` over the lines.
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(LedgerLine::line_total).sum()
    }

    /// Checks the sale before the ledger touches the database.
    ///
    /// ## Returns
    /// The computed subtotal, so the caller can log a total override.
    pub fn validate(&self) -> ValidationResult<Money> {
        validate_id("client_id", self.client_id)?;
        validate_required("seller", &self.seller)?;
        validate_amount("total", self.total)?;
        validate_lines(&self.lines)
    }
}

/// A purchase ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPurchase {
    pub supplier_id: i64,
    /// Must equal the line sum.
    pub total: i64,
    /// Defaults to today when absent.
    pub date: Option<NaiveDate>,
    pub lines: Vec<LedgerLine>,
}

impl NewPurchase {
    pub fn subtotal(&self) -> Money {
        self.lines.iter().map(LedgerLine::line_total).sum()
    }

    /// Checks the purchase, including that `total` matches its lines.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("supplier_id", self.supplier_id)?;
        validate_amount("total", self.total)?;
        let computed = validate_lines(&self.lines)?;

        if computed.pesos() != self.total {
            return Err(ValidationError::Mismatch {
                field: "total".to_string(),
                expected: computed.pesos(),
                actual: self.total,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

/// Sale or purchase, for history, reversal and cart pricing.
///
/// ## Stock Effect
/// ```text
/// Sale      recorded: stock -= qty    reversed: stock += qty
/// Purchase  recorded: stock += qty    reversed: stock -= qty
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Sale,
    Purchase,
}

impl TransactionKind {
    /// Sign applied to line quantities when the transaction is recorded.
    pub const fn stock_sign(&self) -> i64 {
        match self {
            TransactionKind::Sale => -1,
            TransactionKind::Purchase => 1,
        }
    }

    /// Sign applied to recorded quantities when the transaction is deleted.
    pub const fn reversal_sign(&self) -> i64 {
        -self.stock_sign()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Sale => "sale",
            TransactionKind::Purchase => "purchase",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepts `Venta` / `Compra` and `sale` / `purchase`, case-insensitively.
impl FromStr for TransactionKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "venta" | "sale" => Ok(TransactionKind::Sale),
            "compra" | "purchase" => Ok(TransactionKind::Purchase),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec![
                    "Venta".to_string(),
                    "Compra".to_string(),
                    "sale".to_string(),
                    "purchase".to_string(),
                ],
            }),
        }
    }
}

// =============================================================================
// Delete Outcome
// =============================================================================

/// Result of a guarded delete. A refusal is a normal outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    Refused { reason: String },
    NotFound,
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }
}

// =============================================================================
// Report Rows
// =============================================================================

/// A sale or purchase header with its counterpart's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionSummary {
    pub id: i64,
    pub date: NaiveDate,
    /// Client full name for sales, supplier name for purchases.
    pub counterpart: String,
    /// Only sales have a seller.
    pub seller: Option<String>,
    pub total: i64,
}

/// One sale in a monthly report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MonthlySaleRow {
    pub id: i64,
    pub date: NaiveDate,
    pub client: String,
    pub seller: String,
    pub total: i64,
}

/// Sales of one month, optionally for one seller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyReport {
    pub year: i32,
    pub month: u32,
    pub seller: Option<String>,
    pub rows: Vec<MonthlySaleRow>,
    pub total: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
