//! # Ledger Repository
//!
//! Records and reverses sales and purchases. Every operation here couples a
//! header, its lines and the matching stock movement in ONE transaction.
//!
//! ## Stock Invariant
//! ```text
//! product.stock = initial stock
//!               + Σ purchase line quantities
//!               − Σ sale line quantities        (over transactions still on record)
//! ```
//!
//! ## create_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  NewSale::validate()  ── invalid ──► Err(Validation)   (nothing opened) │
//! │       │                                                                 │
//! │  BEGIN                                                                  │
//! │  INSERT orders (client, date, seller, total, 'paid')  → order_id       │
//! │  for each line:                                                         │
//! │     INSERT order_lines (order_id, product, qty, unit_price)            │
//! │     UPDATE products SET stock = stock - qty   ── 0 rows ──┐            │
//! │       │                                                   │            │
//! │       │ any error ────────────────────────────────────────┴► ROLLBACK  │
//! │  COMMIT                                                                 │
//! │       └──► Ok(order_id)                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `create_purchase` is the mirror image (`stock + qty`). `delete_transaction`
//! reads the recorded lines, applies the opposite movement, then removes lines
//! and header.

use chrono::{Local, NaiveDate};
use optica_core::{
    DeleteOutcome, NewPurchase, NewSale, Order, OrderStatus, Purchase, PurchaseDetail,
    PurchaseLine, SaleDetail, SaleLine, TransactionKind,
};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::gateway::{bind_params, Gateway};
use crate::params;

// =============================================================================
// Statements per Transaction Kind
// =============================================================================

/// The fixed statements a transaction kind runs against its own tables.
#[derive(Debug)]
struct LedgerStatements {
    header_exists: &'static str,
    recorded_lines: &'static str,
    delete_lines: &'static str,
    delete_header: &'static str,
}

const SALE_STATEMENTS: LedgerStatements = LedgerStatements {
    header_exists: "SELECT 1 FROM orders WHERE id = ?",
    recorded_lines: "SELECT product_id, quantity FROM order_lines WHERE order_id = ?",
    delete_lines: "DELETE FROM order_lines WHERE order_id = ?",
    delete_header: "DELETE FROM orders WHERE id = ?",
};

const PURCHASE_STATEMENTS: LedgerStatements = LedgerStatements {
    header_exists: "SELECT 1 FROM purchases WHERE id = ?",
    recorded_lines: "SELECT product_id, quantity FROM purchase_lines WHERE purchase_id = ?",
    delete_lines: "DELETE FROM purchase_lines WHERE purchase_id = ?",
    delete_header: "DELETE FROM purchases WHERE id = ?",
};

fn statements(kind: TransactionKind) -> &'static LedgerStatements {
    match kind {
        TransactionKind::Sale => &SALE_STATEMENTS,
        TransactionKind::Purchase => &PURCHASE_STATEMENTS,
    }
}

const INSERT_ORDER: &str =
    "INSERT INTO orders (client_id, date, seller, total, status) VALUES (?, ?, ?, ?, ?)";
const INSERT_ORDER_LINE: &str =
    "INSERT INTO order_lines (order_id, product_id, quantity, unit_price) VALUES (?, ?, ?, ?)";
const INSERT_PURCHASE: &str = "INSERT INTO purchases (supplier_id, date, total) VALUES (?, ?, ?)";
const INSERT_PURCHASE_LINE: &str =
    "INSERT INTO purchase_lines (purchase_id, product_id, quantity, unit_cost) VALUES (?, ?, ?, ?)";
const MOVE_STOCK: &str = "UPDATE products SET stock = stock + ? WHERE id = ?";

fn today() -> NaiveDate {
    Local::now().date_naive()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale and purchase transactions.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    gateway: Gateway,
}

impl LedgerRepository {
    pub fn new(gateway: Gateway) -> Self {
        LedgerRepository { gateway }
    }

    /// Records a sale and takes its quantities out of stock.
    ///
    /// ## Arguments
    /// * `sale` - Client, seller, charged total and lines. `sale.total` may
    ///   differ from the line sum; the difference is logged.
    ///
    /// ## Returns
    /// * `Ok(order_id)` - Header, lines and stock committed together
    /// * `Err(DbError::Validation)` - Rejected before any write
    /// * `Err(_)` - A statement failed; everything was rolled back
    pub async fn create_sale(&self, sale: &NewSale) -> DbResult<i64> {
        let subtotal = sale.validate()?;

        if subtotal.pesos() != sale.total {
            info!(
                client_id = sale.client_id,
                seller = %sale.seller,
                subtotal = subtotal.pesos(),
                total = sale.total,
                "Sale total overridden"
            );
        }

        let date = sale.date.unwrap_or_else(today);
        let mut tx = self.gateway.begin().await?;

        match record_sale(&mut tx, sale, date).await {
            Ok(order_id) => {
                commit(tx).await?;
                info!(
                    order_id,
                    lines = sale.lines.len(),
                    total = sale.total,
                    "Sale recorded"
                );
                Ok(order_id)
            }
            Err(e) => {
                rollback(tx, TransactionKind::Sale, &e).await;
                Err(e)
            }
        }
    }

    /// Records a purchase and adds its quantities to stock.
    ///
    /// ## Returns
    /// * `Ok(purchase_id)` - Committed
    /// * `Err(DbError::Validation(Mismatch))` - `total` differs from the line sum
    /// * `Err(_)` - A statement failed; everything was rolled back
    pub async fn create_purchase(&self, purchase: &NewPurchase) -> DbResult<i64> {
        purchase.validate()?;

        let date = purchase.date.unwrap_or_else(today);
        let mut tx = self.gateway.begin().await?;

        match record_purchase(&mut tx, purchase, date).await {
            Ok(purchase_id) => {
                commit(tx).await?;
                info!(
                    purchase_id,
                    lines = purchase.lines.len(),
                    total = purchase.total,
                    "Purchase recorded"
                );
                Ok(purchase_id)
            }
            Err(e) => {
                rollback(tx, TransactionKind::Purchase, &e).await;
                Err(e)
            }
        }
    }

    /// Deletes a sale or purchase and reverses its stock movement.
    ///
    /// Uses the quantities recorded on the lines, not current product data.
    ///
    /// ## Returns
    /// * `Ok(DeleteOutcome::Deleted)` - Stock restored, lines and header gone
    /// * `Ok(DeleteOutcome::NotFound)` - No such id; nothing changed
    /// * `Err(_)` - A statement failed; everything was rolled back
    pub async fn delete_transaction(
        &self,
        kind: TransactionKind,
        id: i64,
    ) -> DbResult<DeleteOutcome> {
        debug!(%kind, id, "Deleting transaction");

        let mut tx = self.gateway.begin().await?;

        match reverse(&mut tx, kind, id).await {
            Ok(true) => {
                commit(tx).await?;
                info!(%kind, id, "Transaction deleted, stock reversed");
                Ok(DeleteOutcome::Deleted)
            }
            Ok(false) => {
                debug!(%kind, id, "Transaction not found");
                tx.rollback().await?;
                Ok(DeleteOutcome::NotFound)
            }
            Err(e) => {
                rollback(tx, kind, &e).await;
                Err(e)
            }
        }
    }

    /// A sale header with its lines.
    pub async fn get_sale(&self, id: i64) -> DbResult<Option<SaleDetail>> {
        let order: Option<Order> = self
            .gateway
            .fetch_one(
                "SELECT id, client_id, date, seller, total, status FROM orders WHERE id = ?",
                &params![id],
            )
            .await?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines: Vec<SaleLine> = self
            .gateway
            .fetch_all(
                "SELECT id, order_id, product_id, quantity, unit_price FROM order_lines \
                 WHERE order_id = ? ORDER BY id",
                &params![id],
            )
            .await?;

        Ok(Some(SaleDetail { order, lines }))
    }

    /// A purchase header with its lines.
    pub async fn get_purchase(&self, id: i64) -> DbResult<Option<PurchaseDetail>> {
        let purchase: Option<Purchase> = self
            .gateway
            .fetch_one(
                "SELECT id, supplier_id, date, total FROM purchases WHERE id = ?",
                &params![id],
            )
            .await?;

        let Some(purchase) = purchase else {
            return Ok(None);
        };

        let lines: Vec<PurchaseLine> = self
            .gateway
            .fetch_all(
                "SELECT id, purchase_id, product_id, quantity, unit_cost FROM purchase_lines \
                 WHERE purchase_id = ? ORDER BY id",
                &params![id],
            )
            .await?;

        Ok(Some(PurchaseDetail { purchase, lines }))
    }
}

// =============================================================================
// Transaction Steps
// =============================================================================

async fn record_sale(
    tx: &mut Transaction<'_, Sqlite>,
    sale: &NewSale,
    date: NaiveDate,
) -> DbResult<i64> {
    let status = OrderStatus::Paid;
    let header = params![
        sale.client_id,
        date,
        sale.seller.trim(),
        sale.total,
        status.as_str()
    ];
    let order_id = bind_params!(sqlx::query(INSERT_ORDER), header)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();

    debug!(order_id, ?status, "Order header inserted");

    for line in &sale.lines {
        let values = params![order_id, line.product_id, line.quantity, line.unit_price];
        bind_params!(sqlx::query(INSERT_ORDER_LINE), values)
            .execute(&mut **tx)
            .await?;

        move_stock(
            tx,
            line.product_id,
            TransactionKind::Sale.stock_sign() * line.quantity,
        )
        .await?;
    }

    Ok(order_id)
}

async fn record_purchase(
    tx: &mut Transaction<'_, Sqlite>,
    purchase: &NewPurchase,
    date: NaiveDate,
) -> DbResult<i64> {
    let header = params![purchase.supplier_id, date, purchase.total];
    let purchase_id = bind_params!(sqlx::query(INSERT_PURCHASE), header)
        .execute(&mut **tx)
        .await?
        .last_insert_rowid();

    debug!(purchase_id, "Purchase header inserted");

    for line in &purchase.lines {
        let values = params![purchase_id, line.product_id, line.quantity, line.unit_price];
        bind_params!(sqlx::query(INSERT_PURCHASE_LINE), values)
            .execute(&mut **tx)
            .await?;

        move_stock(
            tx,
            line.product_id,
            TransactionKind::Purchase.stock_sign() * line.quantity,
        )
        .await?;
    }

    Ok(purchase_id)
}

/// Returns `false` when the header does not exist (nothing touched).
async fn reverse(tx: &mut Transaction<'_, Sqlite>, kind: TransactionKind, id: i64) -> DbResult<bool> {
    let sql = statements(kind);
    let key = params![id];

    let exists = bind_params!(sqlx::query(sql.header_exists), key)
        .fetch_optional(&mut **tx)
        .await?
        .is_some();
    if !exists {
        return Ok(false);
    }

    let lines: Vec<(i64, i64)> =
        bind_params!(sqlx::query_as::<_, (i64, i64)>(sql.recorded_lines), key)
            .fetch_all(&mut **tx)
            .await?;

    for (product_id, quantity) in lines {
        move_stock(tx, product_id, kind.reversal_sign() * quantity).await?;
    }

    bind_params!(sqlx::query(sql.delete_lines), key)
        .execute(&mut **tx)
        .await?;
    bind_params!(sqlx::query(sql.delete_header), key)
        .execute(&mut **tx)
        .await?;

    Ok(true)
}

/// Adds `delta` to a product's stock. A missing product fails the transaction.
async fn move_stock(tx: &mut Transaction<'_, Sqlite>, product_id: i64, delta: i64) -> DbResult<()> {
    let values = params![delta, product_id];
    let done = bind_params!(sqlx::query(MOVE_STOCK), values)
        .execute(&mut **tx)
        .await?;

    if done.rows_affected() == 0 {
        return Err(DbError::not_found("Product", product_id));
    }

    debug!(product_id, delta, "Stock moved");
    Ok(())
}

async fn commit(tx: Transaction<'static, Sqlite>) -> DbResult<()> {
    tx.commit()
        .await
        .map_err(|e| DbError::TransactionFailed(e.to_string()))
}

async fn rollback(tx: Transaction<'static, Sqlite>, kind: TransactionKind, cause: &DbError) {
    warn!(%kind, error = %cause, "Ledger operation failed, rolling back");
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Rollback failed");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::repository::fixtures::{client_draft, product_draft, setup, supplier_draft};
    use crate::repository::EntityRepository;
    use crate::Database;
    use optica_core::{LedgerLine, ValidationError};

    struct Shop {
        db: Database,
        client: i64,
        supplier: i64,
        product: i64,
    }

    async fn shop(stock: i64) -> Shop {
        let db = setup().await;
        let client = db.clients().create(&client_draft("12345678-9")).await.unwrap();
        let supplier = db.suppliers().create(&supplier_draft("Opticolor")).await.unwrap();
        let product = db.products().create(&product_draft("Armazón", stock)).await.unwrap();
        Shop {
            db,
            client,
            supplier,
            product,
        }
    }

    fn line(product_id: i64, quantity: i64, unit_price: i64) -> LedgerLine {
        LedgerLine {
            product_id,
            quantity,
            unit_price,
        }
    }

    fn sale(client_id: i64, lines: Vec<LedgerLine>) -> NewSale {
        let total = lines.iter().map(|l| l.quantity * l.unit_price).sum();
        NewSale {
            client_id,
            seller: "Marta".to_string(),
            total,
            date: None,
            lines,
        }
    }

    fn purchase(supplier_id: i64, lines: Vec<LedgerLine>) -> NewPurchase {
        let total = lines.iter().map(|l| l.quantity * l.unit_price).sum();
        NewPurchase {
            supplier_id,
            total,
            date: None,
            lines,
        }
    }

    async fn stock(db: &Database, product: i64) -> i64 {
        db.products().get(product).await.unwrap().unwrap().stock
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_stock_follows_ledger() {
        let s = shop(10).await;
        let ledger = s.db.ledger();

        let sale_id = ledger
            .create_sale(&sale(s.client, vec![line(s.product, 3, 45_000)]))
            .await
            .unwrap();
        assert_eq!(stock(&s.db, s.product).await, 7);

        ledger
            .create_purchase(&purchase(s.supplier, vec![line(s.product, 5, 20_000)]))
            .await
            .unwrap();
        assert_eq!(stock(&s.db, s.product).await, 12);

        let outcome = ledger
            .delete_transaction(TransactionKind::Sale, sale_id)
            .await
            .unwrap();
        assert_eq!(outcome, DeleteOutcome::Deleted);
        assert_eq!(stock(&s.db, s.product).await, 15);

        assert_eq!(count(&s.db, "orders").await, 0);
        assert_eq!(count(&s.db, "order_lines").await, 0);
    }

    #[tokio::test]
    async fn test_deleting_purchase_subtracts() {
        let s = shop(1).await;
        let ledger = s.db.ledger();

        let id = ledger
            .create_purchase(&purchase(s.supplier, vec![line(s.product, 4, 20_000)]))
            .await
            .unwrap();
        assert_eq!(stock(&s.db, s.product).await, 5);

        ledger
            .delete_transaction(TransactionKind::Purchase, id)
            .await
            .unwrap();
        assert_eq!(stock(&s.db, s.product).await, 1);
        assert_eq!(count(&s.db, "purchase_lines").await, 0);
    }

    #[tokio::test]
    async fn test_stock_matches_surviving_transactions() {
        let s = shop(20).await;
        let second = s
            .db
            .products()
            .create(&product_draft("Lente", 8))
            .await
            .unwrap();
        let third = s
            .db
            .products()
            .create(&product_draft("Estuche", 0))
            .await
            .unwrap();
        let initial: HashMap<i64, i64> = [(s.product, 20), (second, 8), (third, 0)].into();
        let ledger = s.db.ledger();

        // (kind, id, lines) of every recorded transaction still alive.
        let mut alive: Vec<(TransactionKind, i64, Vec<LedgerLine>)> = Vec::new();

        let steps: Vec<(TransactionKind, Vec<LedgerLine>)> = vec![
            (
                TransactionKind::Purchase,
                vec![line(third, 6, 3_000), line(second, 2, 15_000)],
            ),
            (
                TransactionKind::Sale,
                vec![line(s.product, 3, 45_000), line(s.product, 2, 45_000), line(third, 1, 5_000)],
            ),
            (TransactionKind::Sale, vec![line(second, 4, 30_000)]),
            (
                TransactionKind::Purchase,
                vec![line(s.product, 5, 20_000), line(s.product, 1, 20_000)],
            ),
            (
                TransactionKind::Sale,
                vec![line(second, 1, 30_000), line(third, 2, 5_000), line(s.product, 7, 45_000)],
            ),
        ];

        for (kind, lines) in steps {
            let id = match kind {
                TransactionKind::Sale => ledger.create_sale(&sale(s.client, lines.clone())).await,
                TransactionKind::Purchase => {
                    ledger
                        .create_purchase(&purchase(s.supplier, lines.clone()))
                        .await
                }
            }
            .unwrap();
            alive.push((kind, id, lines));
        }

        // Void the second sale first, then the first purchase, then the first sale.
        for position in [2, 0, 0] {
            let (kind, id, _) = alive.remove(position);
            assert_eq!(
                ledger.delete_transaction(kind, id).await.unwrap(),
                DeleteOutcome::Deleted
            );

            for (product, start) in &initial {
                let expected = start
                    + alive
                        .iter()
                        .flat_map(|(kind, _, lines)| {
                            lines
                                .iter()
                                .filter(|l| l.product_id == *product)
                                .map(move |l| kind.stock_sign() * l.quantity)
                        })
                        .sum::<i64>();
                assert_eq!(stock(&s.db, *product).await, expected, "product {product}");
            }
        }

        assert_eq!(alive.len(), 2);
        assert_eq!(count(&s.db, "orders").await, 1);
        assert_eq!(count(&s.db, "purchases").await, 1);
    }

    #[tokio::test]
    async fn test_unbounded_total_rejected() {
        let s = shop(10).await;
        let mut huge = sale(s.client, vec![line(s.product, 1, 45_000)]);
        huge.total = i64::MAX;

        assert!(matches!(
            s.db.ledger().create_sale(&huge).await,
            Err(DbError::Validation(_))
        ));
        assert_eq!(count(&s.db, "orders").await, 0);
    }

    #[tokio::test]
    async fn test_failed_second_line_rolls_back_everything() {
        let s = shop(10).await;

        let bad = sale(
            s.client,
            vec![line(s.product, 2, 45_000), line(s.product + 100, 1, 10_000)],
        );
        assert!(s.db.ledger().create_sale(&bad).await.is_err());

        assert_eq!(stock(&s.db, s.product).await, 10);
        assert_eq!(count(&s.db, "orders").await, 0);
        assert_eq!(count(&s.db, "order_lines").await, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_not_found() {
        let s = shop(10).await;
        let ledger = s.db.ledger();

        ledger
            .create_sale(&sale(s.client, vec![line(s.product, 1, 45_000)]))
            .await
            .unwrap();

        assert_eq!(
            ledger
                .delete_transaction(TransactionKind::Sale, 999)
                .await
                .unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(
            ledger
                .delete_transaction(TransactionKind::Purchase, 1)
                .await
                .unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(stock(&s.db, s.product).await, 9);
    }

    #[tokio::test]
    async fn test_purchase_total_mismatch_rejected() {
        let s = shop(0).await;
        let mut p = purchase(s.supplier, vec![line(s.product, 2, 20_000)]);
        p.total = 39_000;

        let err = s.db.ledger().create_purchase(&p).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Mismatch { .. })
        ));
        assert_eq!(count(&s.db, "purchases").await, 0);
        assert_eq!(stock(&s.db, s.product).await, 0);
    }

    #[tokio::test]
    async fn test_sale_total_override_and_detail() {
        let s = shop(10).await;
        let ledger = s.db.ledger();

        let mut discounted = sale(s.client, vec![line(s.product, 2, 45_000)]);
        discounted.total = 80_000;
        discounted.date = NaiveDate::from_ymd_opt(2024, 7, 15);

        let id = ledger.create_sale(&discounted).await.unwrap();
        let detail = ledger.get_sale(id).await.unwrap().unwrap();

        assert_eq!(detail.order.total, 80_000);
        assert_eq!(detail.order.status, OrderStatus::Paid);
        assert_eq!(detail.order.date, NaiveDate::from_ymd_opt(2024, 7, 15).unwrap());
        assert_eq!(detail.lines.len(), 1);
        assert_eq!(detail.lines[0].unit_price, 45_000);
        assert!(ledger.get_sale(id + 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purchase_detail_and_default_date() {
        let s = shop(0).await;
        let ledger = s.db.ledger();

        let id = ledger
            .create_purchase(&purchase(s.supplier, vec![line(s.product, 3, 20_000)]))
            .await
            .unwrap();
        let detail = ledger.get_purchase(id).await.unwrap().unwrap();

        assert_eq!(detail.purchase.total, 60_000);
        assert_eq!(detail.purchase.date, today());
        assert_eq!(detail.lines[0].unit_cost, 20_000);
    }

    #[tokio::test]
    async fn test_validation_runs_before_writes() {
        let s = shop(10).await;
        let ledger = s.db.ledger();

        assert!(ledger.create_sale(&sale(s.client, vec![])).await.is_err());
        assert!(ledger
            .create_sale(&sale(0, vec![line(s.product, 1, 1)]))
            .await
            .is_err());
        let mut no_seller = sale(s.client, vec![line(s.product, 1, 1)]);
        no_seller.seller = String::new();
        assert!(ledger.create_sale(&no_seller).await.is_err());

        assert_eq!(count(&s.db, "orders").await, 0);
        assert_eq!(stock(&s.db, s.product).await, 10);
    }

    #[tokio::test]
    async fn test_closed_database() {
        let s = shop(10).await;
        s.db.close().await;

        assert!(matches!(
            s.db.ledger()
                .create_sale(&sale(s.client, vec![line(s.product, 1, 1)]))
                .await,
            Err(DbError::NotConnected)
        ));
    }
}
