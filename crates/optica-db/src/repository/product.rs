//! # Product Repository
//!
//! Database operations for inventory items.
//!
//! ## Key Operations
//! - LIKE search across name, category and brand
//! - CRUD with range-checked stock and prices
//! - Guarded delete: a product that appears on any sale or purchase line stays
//!
//! Stock is written here only by a full product edit. Sales and purchases
//! move it through [`LedgerRepository`](super::ledger::LedgerRepository).

use optica_core::validation::validate_search_query;
use optica_core::{DeleteOutcome, Product, ProductDraft};
use tracing::debug;

use super::{guarded_delete, like_pattern, DependencyGuard, EntityRepository};
use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::params;

const SELECT_PRODUCT: &str =
    "SELECT id, name, category, brand, stock, cost_price, sale_price FROM products";

const PRODUCT_GUARDS: [DependencyGuard; 2] = [
    DependencyGuard {
        sql: "SELECT 1 FROM order_lines WHERE product_id = ? LIMIT 1",
        reason: "Product appears on recorded sales",
    },
    DependencyGuard {
        sql: "SELECT 1 FROM purchase_lines WHERE product_id = ? LIMIT 1",
        reason: "Product appears on recorded purchases",
    },
];

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let frames = repo.search("armazón").await?;
/// let product = repo.get(4).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    gateway: Gateway,
}

impl ProductRepository {
    pub fn new(gateway: Gateway) -> Self {
        ProductRepository { gateway }
    }

    /// Searches products by name, category or brand.
    ///
    /// ## Arguments
    /// * `query` - Partial text; empty lists every product
    pub async fn search(&self, query: &str) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Searching products");

        if query.is_empty() {
            return self.list().await;
        }

        let sql = format!(
            "{SELECT_PRODUCT} WHERE name LIKE ?1 OR category LIKE ?1 OR brand LIKE ?1 ORDER BY name"
        );
        let products: Vec<Product> = self
            .gateway
            .fetch_all(&sql, &params![like_pattern(&query)])
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Products at or below a stock threshold, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE stock <= ? ORDER BY stock, name");
        self.gateway.fetch_all(&sql, &params![threshold]).await
    }
}

impl EntityRepository for ProductRepository {
    type Record = Product;
    type Draft = ProductDraft;

    const ENTITY: &'static str = "Product";

    async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("{SELECT_PRODUCT} ORDER BY name");
        self.gateway.fetch_all(&sql, &[]).await
    }

    async fn get(&self, id: i64) -> DbResult<Option<Product>> {
        let sql = format!("{SELECT_PRODUCT} WHERE id = ?");
        self.gateway.fetch_one(&sql, &params![id]).await
    }

    async fn create(&self, draft: &ProductDraft) -> DbResult<i64> {
        let draft = draft.validate()?;
        debug!(name = %draft.name, stock = draft.stock, "Creating product");

        let outcome = self
            .gateway
            .execute(
                "INSERT INTO products (name, category, brand, stock, cost_price, sale_price) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                &params![
                    &draft.name,
                    &draft.category,
                    &draft.brand,
                    draft.stock,
                    draft.cost_price,
                    draft.sale_price
                ],
            )
            .await?;

        outcome
            .inserted_id()
            .ok_or_else(|| DbError::Internal("insert returned no id".to_string()))
    }

    async fn update(&self, id: i64, draft: &ProductDraft) -> DbResult<()> {
        let draft = draft.validate()?;
        debug!(id, name = %draft.name, "Updating product");

        let outcome = self
            .gateway
            .execute(
                "UPDATE products SET name = ?, category = ?, brand = ?, stock = ?, \
                 cost_price = ?, sale_price = ? WHERE id = ?",
                &params![
                    &draft.name,
                    &draft.category,
                    &draft.brand,
                    draft.stock,
                    draft.cost_price,
                    draft.sale_price,
                    id
                ],
            )
            .await?;

        if outcome.rows() == 0 {
            return Err(DbError::not_found(Self::ENTITY, id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> DbResult<DeleteOutcome> {
        guarded_delete(
            &self.gateway,
            Self::ENTITY,
            id,
            &PRODUCT_GUARDS,
            "DELETE FROM products WHERE id = ?",
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
