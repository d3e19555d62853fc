//! # Repository Module
//!
//! Database repository implementations for Optica.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │  db.clients().create(&draft)                                   │
//! │       ▼                                                                 │
//! │  ClientRepository ── impl EntityRepository ──┐                         │
//! │  ProductRepository ─ impl EntityRepository ──┤                         │
//! │  SupplierRepository  impl EntityRepository ──┼──► Gateway ──► SQLite   │
//! │  PrescriptionRepository impl EntityRepository┤                         │
//! │  LedgerRepository (explicit transactions) ───┤                         │
//! │  ReportRepository (read only) ───────────────┘                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`](client::ClientRepository) - Clients, RUT uniqueness
//! - [`ProductRepository`](product::ProductRepository) - Inventory items
//! - [`SupplierRepository`](supplier::SupplierRepository) - Suppliers
//! - [`PrescriptionRepository`](prescription::PrescriptionRepository) - Clinical records
//! - [`LedgerRepository`](ledger::LedgerRepository) - Sales and purchases
//! - [`ReportRepository`](report::ReportRepository) - History and monthly reports

pub mod client;
pub mod ledger;
pub mod prescription;
pub mod product;
pub mod report;
pub mod supplier;

#[cfg(test)]
pub(crate) mod fixtures;

use optica_core::DeleteOutcome;
use tracing::{debug, warn};

use crate::error::DbResult;
use crate::gateway::{Gateway, SqlValue};
use crate::params;

// =============================================================================
// Entity Repository Trait
// =============================================================================

/// Uniform CRUD over one entity.
///
/// Implemented once each for clients, products, suppliers and prescriptions.
#[allow(async_fn_in_trait)]
pub trait EntityRepository {
    /// Stored row.
    type Record;
    /// Form input for create / update.
    type Draft;

    /// Name used in errors and logs.
    const ENTITY: &'static str;

    async fn list(&self) -> DbResult<Vec<Self::Record>>;

    async fn get(&self, id: i64) -> DbResult<Option<Self::Record>>;

    /// Validates and inserts. Returns the new id.
    async fn create(&self, draft: &Self::Draft) -> DbResult<i64>;

    /// Validates and replaces every field. Missing id is `DbError::NotFound`.
    async fn update(&self, id: i64, draft: &Self::Draft) -> DbResult<()>;

    /// Removes the row unless something still references it.
    async fn delete(&self, id: i64) -> DbResult<DeleteOutcome>;
}

// =============================================================================
// Referential Guards
// =============================================================================

/// A dependent table that blocks a delete.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DependencyGuard {
    /// Must select at least one row when a dependent exists; binds the id once.
    pub sql: &'static str,
    pub reason: &'static str,
}

/// Checks guards in order, then deletes.
///
/// ```text
/// guard 1 exists? ── yes ──► Refused { reason 1 }
///      │ no
/// guard 2 exists? ── yes ──► Refused { reason 2 }
///      │ no
/// DELETE ── 0 rows ──► NotFound
///      │ 1 row
///      ▼
///   Deleted
/// ```
pub(crate) async fn guarded_delete(
    gateway: &Gateway,
    entity: &str,
    id: i64,
    guards: &[DependencyGuard],
    delete_sql: &str,
) -> DbResult<DeleteOutcome> {
    let key = params![id];

    for guard in guards {
        if gateway.exists(guard.sql, &key).await? {
            warn!(entity, id, reason = guard.reason, "Delete refused");
            return Ok(DeleteOutcome::Refused {
                reason: guard.reason.to_string(),
            });
        }
    }

    delete_row(gateway, entity, id, delete_sql).await
}

/// Deletes by id with no guard.
pub(crate) async fn delete_row(
    gateway: &Gateway,
    entity: &str,
    id: i64,
    delete_sql: &str,
) -> DbResult<DeleteOutcome> {
    let outcome = gateway.execute(delete_sql, &[SqlValue::Int(id)]).await?;

    if outcome.rows() == 0 {
        debug!(entity, id, "Nothing to delete");
        return Ok(DeleteOutcome::NotFound);
    }

    debug!(entity, id, "Deleted");
    Ok(DeleteOutcome::Deleted)
}

/// `%query%` for LIKE searches.
pub(crate) fn like_pattern(query: &str) -> String {
    format!("%{}%", query)
}
