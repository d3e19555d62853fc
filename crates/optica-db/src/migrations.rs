//! # Schema Migrations
//!
//! The schema ships inside the binary (`migrations/sqlite`) and is brought up
//! to date every time a [`Database`](crate::Database) opens.
//!
//! ```text
//! 001_initial_schema.sql
//!   clients ─┬─< prescriptions
//!            └─< orders ──< order_lines >── products
//!   suppliers ──< purchases ──< purchase_lines >── products
//! ```
//!
//! Applied files are recorded in `_sqlx_migrations`. Edit nothing that has
//! shipped; add `NNN_description.sql` with the next number instead.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::DbResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations/sqlite");

/// Applies whatever has not been applied yet. Safe on every start.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    debug!(embedded = MIGRATOR.migrations.len(), "Applying schema migrations");

    MIGRATOR.run(pool).await?;

    info!("Schema up to date");
    Ok(())
}

/// Returns `(embedded, applied)`.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let embedded = MIGRATOR.migrations.len();

    let tracked: i64 = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master \
         WHERE type = 'table' AND name = '_sqlx_migrations')",
    )
    .fetch_one(pool)
    .await?;
    if tracked == 0 {
        return Ok((embedded, 0));
    }

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await?;

    Ok((embedded, usize::try_from(applied).unwrap_or(0)))
}
