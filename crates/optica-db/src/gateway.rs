//! # Persistence Gateway
//!
//! The one place that turns a SQL string plus parameters into a database call.
//!
//! ## Read vs Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Gateway Methods                                    │
//! │                                                                         │
//! │  execute(sql, params)     INSERT / UPDATE / DELETE                     │
//! │       │                                                                 │
//! │       ├── BEGIN                                                         │
//! │       ├── run statement ──── error ──► ROLLBACK ──► Err(DbError)        │
//! │       ├── COMMIT                                                        │
//! │       └── Inserted(new_id) | Affected(rows)                            │
//! │                                                                         │
//! │  fetch_one / fetch_all    SELECT → Option<T> / Vec<T>  (T: FromRow)    │
//! │  exists                   SELECT → bool (any row?)                     │
//! │  begin                    explicit transaction for the ledger          │
//! │                                                                         │
//! │  Every method fails with NotConnected once the handle is closed.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Parameters are always bound as `?` placeholders, never formatted into
//! the SQL text.

use chrono::NaiveDate;
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

// =============================================================================
// Parameters
// =============================================================================

/// A bound statement parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Date(NaiveDate),
    Null,
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// Builds a `[SqlValue; N]` from anything convertible.
///
/// ```rust
/// use optica_db::{params, SqlValue};
///
/// let p = params![7_i64, "Marta", None::<i64>];
/// assert_eq!(p[1], SqlValue::Text("Marta".to_string()));
/// assert_eq!(p[2], SqlValue::Null);
/// ```
#[macro_export]
macro_rules! params {
    ($($value:expr),* $(,)?) => {
        [$($crate::SqlValue::from($value)),*]
    };
}

/// Binds every parameter onto a `query`, `query_as` or `query_scalar`.
macro_rules! bind_params {
    ($query:expr, $params:expr) => {{
        let mut query = $query;
        for value in $params.iter() {
            query = match value {
                $crate::gateway::SqlValue::Int(v) => query.bind(*v),
                $crate::gateway::SqlValue::Text(v) => query.bind(v.as_str()),
                $crate::gateway::SqlValue::Date(v) => query.bind(*v),
                $crate::gateway::SqlValue::Null => query.bind(None::<i64>),
            };
        }
        query
    }};
}

pub(crate) use bind_params;

// =============================================================================
// Statement Classification
// =============================================================================

/// What a write reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// INSERT: the new row id.
    Inserted(i64),
    /// UPDATE / DELETE: rows touched.
    Affected(u64),
}

impl WriteOutcome {
    /// Rows touched; an insert counts as one.
    pub fn rows(&self) -> u64 {
        match self {
            WriteOutcome::Inserted(_) => 1,
            WriteOutcome::Affected(n) => *n,
        }
    }

    /// The inserted id, if this was an insert.
    pub fn inserted_id(&self) -> Option<i64> {
        match self {
            WriteOutcome::Inserted(id) => Some(*id),
            WriteOutcome::Affected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementKind {
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    fn of(sql: &str) -> Self {
        let keyword = sql
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        match keyword.as_str() {
            "INSERT" => StatementKind::Insert,
            "UPDATE" => StatementKind::Update,
            "DELETE" => StatementKind::Delete,
            _ => StatementKind::Other,
        }
    }

    fn outcome(self, done: &SqliteQueryResult) -> WriteOutcome {
        match self {
            StatementKind::Insert => WriteOutcome::Inserted(done.last_insert_rowid()),
            _ => WriteOutcome::Affected(done.rows_affected()),
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Owns the connection pool and runs parameterized statements.
///
/// Cheap to clone; every repository holds one.
#[derive(Debug, Clone)]
pub struct Gateway {
    pool: SqlitePool,
}

impl Gateway {
    pub fn new(pool: SqlitePool) -> Self {
        Gateway { pool }
    }

    pub fn is_connected(&self) -> bool {
        !self.pool.is_closed()
    }

    fn ensure_connected(&self) -> DbResult<()> {
        if self.pool.is_closed() {
            return Err(DbError::NotConnected);
        }
        Ok(())
    }

    /// Runs an INSERT, UPDATE or DELETE in its own transaction.
    ///
    /// ## Returns
    /// * `Ok(WriteOutcome::Inserted(id))` - INSERT committed
    /// * `Ok(WriteOutcome::Affected(n))` - UPDATE / DELETE committed
    /// * `Err(DbError::QueryFailed)` - Not a write statement, nothing run
    /// * `Err(_)` - Database error; the transaction was rolled back
    pub async fn execute(&self, sql: &str, params: &[SqlValue]) -> DbResult<WriteOutcome> {
        self.ensure_connected()?;

        let kind = StatementKind::of(sql);
        if kind == StatementKind::Other {
            return Err(DbError::QueryFailed(
                "execute only accepts INSERT, UPDATE or DELETE".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        match bind_params!(sqlx::query(sql), params)
            .execute(&mut *tx)
            .await
        {
            Ok(done) => {
                tx.commit().await?;
                let outcome = kind.outcome(&done);
                debug!(?outcome, "Statement committed");
                Ok(outcome)
            }
            Err(e) => {
                warn!(error = %e, "Statement failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed");
                }
                Err(e.into())
            }
        }
    }

    /// Fetches at most one row.
    pub async fn fetch_one<T>(&self, sql: &str, params: &[SqlValue]) -> DbResult<Option<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.ensure_connected()?;

        let row = bind_params!(sqlx::query_as::<_, T>(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Fetches every row.
    pub async fn fetch_all<T>(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<T>>
    where
        T: for<'r> FromRow<'r, SqliteRow> + Send + Unpin,
    {
        self.ensure_connected()?;

        let rows = bind_params!(sqlx::query_as::<_, T>(sql), params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// True when the query returns at least one row.
    pub async fn exists(&self, sql: &str, params: &[SqlValue]) -> DbResult<bool> {
        self.ensure_connected()?;

        let row = bind_params!(sqlx::query(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Opens an explicit transaction. Dropping it without `commit` rolls back.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Sqlite>> {
        self.ensure_connected()?;
        Ok(self.pool.begin().await?)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
