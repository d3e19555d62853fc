//! # Report Repository
//!
//! Read-only history and monthly sales queries.
//!
//! ## Date Windows
//! ```text
//! transactions_by_date(kind, start, end)   start <= date <= end   newest first
//! sales_by_month(2024, 7, seller?)         2024-07-01 <= date < 2024-08-01
//!                                          oldest first, plus Σ total
//! ```
//!
//! Dates are stored as `YYYY-MM-DD` text, so range comparisons are plain
//! string comparisons in SQLite.

use chrono::{Datelike, NaiveDate};
use optica_core::{
    MonthlyReport, MonthlySaleRow, TransactionKind, TransactionSummary, ValidationError,
};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::params;

const SALES_BY_DATE: &str = "\
    SELECT o.id, o.date, c.name || ' ' || c.last_name AS counterpart, \
           o.seller AS seller, o.total \
    FROM orders o JOIN clients c ON c.id = o.client_id \
    WHERE o.date BETWEEN ? AND ? \
    ORDER BY o.date DESC, o.id DESC";

const PURCHASES_BY_DATE: &str = "\
    SELECT p.id, p.date, s.name AS counterpart, NULL AS seller, p.total \
    FROM purchases p JOIN suppliers s ON s.id = p.supplier_id \
    WHERE p.date BETWEEN ? AND ? \
    ORDER BY p.date DESC, p.id DESC";

const MONTHLY_SALES: &str = "\
    SELECT o.id, o.date, c.name || ' ' || c.last_name AS client, o.seller, o.total \
    FROM orders o JOIN clients c ON c.id = o.client_id \
    WHERE o.date >= ? AND o.date < ?";

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    gateway: Gateway,
}

impl ReportRepository {
    pub fn new(gateway: Gateway) -> Self {
        ReportRepository { gateway }
    }

    /// Sale or purchase headers within an inclusive date range.
    ///
    /// ## Arguments
    /// * `kind` - Sales join the client's full name, purchases the supplier name
    /// * `start`, `end` - Inclusive bounds; `start > end` yields nothing
    pub async fn transactions_by_date(
        &self,
        kind: TransactionKind,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<TransactionSummary>> {
        debug!(%kind, %start, %end, "Loading transaction history");

        let sql = match kind {
            TransactionKind::Sale => SALES_BY_DATE,
            TransactionKind::Purchase => PURCHASES_BY_DATE,
        };
        self.gateway.fetch_all(sql, &params![start, end]).await
    }

    /// Sales of one calendar month, optionally for one seller.
    ///
    /// ## Returns
    /// * `Ok(MonthlyReport)` - Rows oldest first and the sum of their totals
    /// * `Err(DbError::Validation)` - Month outside 1..=12, or a year chrono cannot represent
    /// * `Err(DbError::CorruptedData)` - Stored totals sum past `i64::MAX`
    pub async fn sales_by_month(
        &self,
        year: i32,
        month: u32,
        seller: Option<&str>,
    ) -> DbResult<MonthlyReport> {
        let (from, until) = month_window(year, month)?;
        let seller = seller.map(str::trim).filter(|s| !s.is_empty());

        debug!(year, month, ?seller, "Loading monthly sales");

        let rows: Vec<MonthlySaleRow> = match seller {
            Some(name) => {
                let sql = format!("{MONTHLY_SALES} AND o.seller = ? ORDER BY o.date, o.id");
                self.gateway
                    .fetch_all(&sql, &params![from, until, name])
                    .await?
            }
            None => {
                let sql = format!("{MONTHLY_SALES} ORDER BY o.date, o.id");
                self.gateway.fetch_all(&sql, &params![from, until]).await?
            }
        };

        let total = rows
            .iter()
            .try_fold(0i64, |sum, r| sum.checked_add(r.total))
            .ok_or_else(|| {
                DbError::CorruptedData(format!("sales total for {year}-{month:02} overflows"))
            })?;

        Ok(MonthlyReport {
            year,
            month,
            seller: seller.map(str::to_string),
            rows,
            total,
        })
    }

    /// Every seller that has recorded a sale, alphabetically.
    pub async fn sellers(&self) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> = self
            .gateway
            .fetch_all("SELECT DISTINCT seller FROM orders ORDER BY seller", &[])
            .await?;
        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

/// `[first of month, first of next month)`.
fn month_window(year: i32, month: u32) -> DbResult<(NaiveDate, NaiveDate)> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        }
        .into());
    }

    let year_out_of_range = || ValidationError::OutOfRange {
        field: "year".to_string(),
        min: i64::from(NaiveDate::MIN.year()),
        max: i64::from(NaiveDate::MAX.year()),
    };

    let from = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(year_out_of_range)?;
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1).ok_or_else(year_out_of_range)?, 1)
    } else {
        (year, month + 1)
    };
    let until = NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(year_out_of_range)?;

    Ok((from, until))
}
