//! # Command Line Definition
//!
//! ```text
//! optica [--config FILE] [--db FILE] [--json] <COMMAND>
//!
//!   client   list | search | show | add | update | delete
//!   product  list | search | show | low-stock | add | update | delete
//!   supplier list | search | show | add | update | delete
//!   recipe   list | show | add | update | delete
//!   sale     --client ID --seller NAME --item ID:QTY... [--total N] [--date D]
//!   purchase --supplier ID --item ID:QTY... [--date D]
//!   show     sale|purchase ID
//!   void     sale|purchase ID
//!   history  sale|purchase [--from D] [--to D]
//!   report   [--year Y] [--month M] [--seller NAME]
//!   sellers
//! ```

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use optica_core::{Diagnosis, TransactionKind, MAX_AMOUNT};
use std::path::PathBuf;
use std::str::FromStr;

/// Point of sale and clinical records for an optical shop.
#[derive(Debug, Parser)]
#[command(name = "optica", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database file, overriding config and OPTICA_DB_PATH
    #[arg(long, global = true, value_name = "FILE")]
    pub db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage inventory
    #[command(subcommand)]
    Product(ProductCommand),

    /// Manage suppliers
    #[command(subcommand)]
    Supplier(SupplierCommand),

    /// Manage prescriptions
    #[command(subcommand)]
    Recipe(RecipeCommand),

    /// Record a sale
    Sale(SaleArgs),

    /// Record a purchase from a supplier
    Purchase(PurchaseArgs),

    /// Show a sale or purchase with its lines
    Show(TransactionRef),

    /// Delete a sale or purchase and reverse its stock movement
    Void(TransactionRef),

    /// List sales or purchases in a date range
    History(HistoryArgs),

    /// Monthly sales report
    Report(ReportArgs),

    /// List sellers with recorded sales
    Sellers,
}

// =============================================================================
// Entity Commands
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// List every client
    List,
    /// Search by name, last name or RUT
    Search { query: String },
    /// Show one client
    Show { id: i64 },
    /// Register a client
    Add(ClientFields),
    /// Edit a client; omitted fields keep their value
    Update {
        id: i64,
        #[command(flatten)]
        fields: ClientPatch,
    },
    /// Delete a client without prescriptions or sales
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct ClientFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub last_name: String,
    /// RUT, with or without dots (12.345.678-9)
    #[arg(long)]
    pub rut: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub address: String,
}

#[derive(Debug, Args)]
pub struct ClientPatch {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    #[arg(long)]
    pub rut: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    /// List every product
    List,
    /// Search by name, category or brand
    Search { query: String },
    /// Show one product
    Show { id: i64 },
    /// Products at or below a stock threshold
    LowStock {
        #[arg(long, default_value_t = 5)]
        threshold: i64,
    },
    /// Add a product
    Add(ProductFields),
    /// Edit a product; omitted fields keep their value
    Update {
        id: i64,
        #[command(flatten)]
        fields: ProductPatch,
    },
    /// Delete a product that was never sold or purchased
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct ProductFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub brand: String,
    #[arg(long, default_value_t = 0)]
    pub stock: i64,
    /// Unit cost in pesos
    #[arg(long)]
    pub cost: i64,
    /// Sale price in pesos
    #[arg(long)]
    pub price: i64,
}

#[derive(Debug, Args)]
pub struct ProductPatch {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub stock: Option<i64>,
    #[arg(long)]
    pub cost: Option<i64>,
    #[arg(long)]
    pub price: Option<i64>,
}

#[derive(Debug, Subcommand)]
pub enum SupplierCommand {
    /// List every supplier
    List,
    /// Search by name or contact
    Search { query: String },
    /// Show one supplier
    Show { id: i64 },
    /// Register a supplier
    Add(SupplierFields),
    /// Edit a supplier; omitted fields keep their value
    Update {
        id: i64,
        #[command(flatten)]
        fields: SupplierPatch,
    },
    /// Delete a supplier without purchases
    Delete { id: i64 },
}

#[derive(Debug, Args)]
pub struct SupplierFields {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub contact: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub address: String,
}

#[derive(Debug, Args)]
pub struct SupplierPatch {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
}

// =============================================================================
// Prescriptions
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum RecipeCommand {
    /// List prescriptions, newest first
    List {
        /// Only this client's prescriptions
        #[arg(long)]
        client: Option<i64>,
    },
    /// Show a prescription with its correction values
    Show { id: i64 },
    /// Record a prescription
    Add(RecipeArgs),
    /// Replace a prescription
    Update {
        id: i64,
        #[command(flatten)]
        recipe: RecipeArgs,
    },
    /// Delete a prescription
    Delete { id: i64 },
}

/// Eye values are `SPHERE,CYLINDER,AXIS`, e.g. `-1.25,-0.50,180`.
#[derive(Debug, Args)]
pub struct RecipeArgs {
    #[arg(long)]
    pub client: i64,

    /// Exam date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Lejos, Cerca or Ambos
    #[arg(long)]
    pub diagnosis: Diagnosis,

    /// Far pupillary distance (40-80 mm)
    #[arg(long)]
    pub far_dp: Option<i64>,
    /// Far correction, right eye
    #[arg(long, value_name = "ESF,CIL,EJE", allow_hyphen_values = true)]
    pub far_od: Option<EyeArg>,
    /// Far correction, left eye
    #[arg(long, value_name = "ESF,CIL,EJE", allow_hyphen_values = true)]
    pub far_oi: Option<EyeArg>,

    /// Near pupillary distance (40-80 mm)
    #[arg(long)]
    pub near_dp: Option<i64>,
    /// Near correction, right eye
    #[arg(long, value_name = "ESF,CIL,EJE", allow_hyphen_values = true)]
    pub near_od: Option<EyeArg>,
    /// Near correction, left eye
    #[arg(long, value_name = "ESF,CIL,EJE", allow_hyphen_values = true)]
    pub near_oi: Option<EyeArg>,

    /// Full payload as JSON instead of the per-eye flags
    #[arg(long, conflicts_with_all = ["far_dp", "far_od", "far_oi", "near_dp", "near_od", "near_oi"])]
    pub payload: Option<String>,

    #[arg(long, default_value = "")]
    pub observations: String,
}

/// `SPHERE,CYLINDER,AXIS`; trailing parts may be omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EyeArg {
    pub sphere: String,
    pub cylinder: String,
    pub axis: String,
}

impl FromStr for EyeArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() > 3 {
            return Err(format!("expected SPHERE,CYLINDER,AXIS, got '{}'", s));
        }
        let part = |i: usize| parts.get(i).copied().unwrap_or_default().to_string();
        Ok(EyeArg {
            sphere: part(0),
            cylinder: part(1),
            axis: part(2),
        })
    }
}

// =============================================================================
// Sales, Purchases and Reports
// =============================================================================

/// `PRODUCT_ID:QUANTITY`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemArg {
    pub product_id: i64,
    pub quantity: i64,
}

impl FromStr for ItemArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, qty) = s
            .split_once(':')
            .ok_or_else(|| format!("expected PRODUCT_ID:QUANTITY, got '{}'", s))?;
        let product_id = id
            .trim()
            .parse()
            .map_err(|_| format!("invalid product id '{}'", id))?;
        let quantity = qty
            .trim()
            .parse()
            .map_err(|_| format!("invalid quantity '{}'", qty))?;
        Ok(ItemArg {
            product_id,
            quantity,
        })
    }
}

#[derive(Debug, Args)]
pub struct SaleArgs {
    #[arg(long)]
    pub client: i64,

    #[arg(long)]
    pub seller: String,

    /// Line to sell; repeat for more lines
    #[arg(long = "item", value_name = "PRODUCT_ID:QTY", required = true)]
    pub items: Vec<ItemArg>,

    /// Charged total in pesos (default: line sum)
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_AMOUNT))]
    pub total: Option<i64>,

    /// Sale date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct PurchaseArgs {
    #[arg(long)]
    pub supplier: i64,

    /// Line to buy at the product's cost; repeat for more lines
    #[arg(long = "item", value_name = "PRODUCT_ID:QTY", required = true)]
    pub items: Vec<ItemArg>,

    /// Purchase date (default: today)
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct TransactionRef {
    /// sale / venta or purchase / compra
    pub kind: TransactionKind,
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// sale / venta or purchase / compra
    pub kind: TransactionKind,

    /// First day (default: first of the current month)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day, inclusive (default: today)
    #[arg(long)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Default: current year
    #[arg(long)]
    pub year: Option<i32>,

    /// 1-12, default: current month
    #[arg(long)]
    pub month: Option<u32>,

    /// Only this seller's sales
    #[arg(long)]
    pub seller: Option<String>,
}
