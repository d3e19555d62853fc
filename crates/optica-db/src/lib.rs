//! # optica-db: Database Layer for Optica
//!
//! This crate provides database access for the optical shop.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Optica Data Flow                                 │
//! │                                                                         │
//! │  CLI command (optica sale --client 3 --item 4:2)                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     optica-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ClientRepo    │    │              │  │   │
//! │  │   │ SqlitePool    │    │ ProductRepo   │    │ 001_initial  │  │   │
//! │  │   │      │        │    │ LedgerRepo    │    │              │  │   │
//! │  │   │   Gateway  ◄──┼────│ ReportRepo    │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/optica/optica.db                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`gateway`] - Parameterized statements, one transaction per write
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Entity CRUD, ledger and reports
//!
//! ## Usage
//!
//! ```rust,ignore
//! use optica_db::{Database, DbConfig, EntityRepository};
//!
//! let db = Database::new(DbConfig::new("optica.db")).await?;
//!
//! let frames = db.products().search("armazón").await?;
//! let order_id = db.ledger().create_sale(&cart.to_sale(3, "Marta", None, None)).await?;
//!
//! db.close().await;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gateway;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use gateway::{Gateway, SqlValue, WriteOutcome};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::prescription::PrescriptionRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::EntityRepository;
