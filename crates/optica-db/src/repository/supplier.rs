//! # Supplier Repository
//!
//! Database operations for suppliers. A supplier with purchases on record
//! cannot be deleted.

use optica_core::validation::validate_search_query;
use optica_core::{DeleteOutcome, Supplier, SupplierDraft};
use tracing::debug;

use super::{guarded_delete, like_pattern, DependencyGuard, EntityRepository};
use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::params;

const SELECT_SUPPLIER: &str = "SELECT id, name, contact, phone, address FROM suppliers";

const SUPPLIER_GUARDS: [DependencyGuard; 1] = [DependencyGuard {
    sql: "SELECT 1 FROM purchases WHERE supplier_id = ? LIMIT 1",
    reason: "Supplier has purchases on record",
}];

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    gateway: Gateway,
}

impl SupplierRepository {
    pub fn new(gateway: Gateway) -> Self {
        SupplierRepository { gateway }
    }

    /// Searches by name or contact person. An empty query lists everything.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Supplier>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Searching suppliers");

        if query.is_empty() {
            return self.list().await;
        }

        let sql = format!("{SELECT_SUPPLIER} WHERE name LIKE ?1 OR contact LIKE ?1 ORDER BY name");
        self.gateway
            .fetch_all(&sql, &params![like_pattern(&query)])
            .await
    }
}

impl EntityRepository for SupplierRepository {
    type Record = Supplier;
    type Draft = SupplierDraft;

    const ENTITY: &'static str = "Supplier";

    async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} ORDER BY name");
        self.gateway.fetch_all(&sql, &[]).await
    }

    async fn get(&self, id: i64) -> DbResult<Option<Supplier>> {
        let sql = format!("{SELECT_SUPPLIER} WHERE id = ?");
        self.gateway.fetch_one(&sql, &params![id]).await
    }

    async fn create(&self, draft: &SupplierDraft) -> DbResult<i64> {
        let draft = draft.validate()?;
        debug!(name = %draft.name, "Creating supplier");

        let outcome = self
            .gateway
            .execute(
                "INSERT INTO suppliers (name, contact, phone, address) VALUES (?, ?, ?, ?)",
                &params![&draft.name, &draft.contact, &draft.phone, &draft.address],
            )
            .await?;

        outcome
            .inserted_id()
            .ok_or_else(|| DbError::Internal("insert returned no id".to_string()))
    }

    async fn update(&self, id: i64, draft: &SupplierDraft) -> DbResult<()> {
        let draft = draft.validate()?;
        debug!(id, name = %draft.name, "Updating supplier");

        let outcome = self
            .gateway
            .execute(
                "UPDATE suppliers SET name = ?, contact = ?, phone = ?, address = ? WHERE id = ?",
                &params![&draft.name, &draft.contact, &draft.phone, &draft.address, id],
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
            &SUPPLIER_GUARDS,
            "DELETE FROM suppliers WHERE id = ?",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{product_draft, setup, supplier_draft};
    use optica_core::{LedgerLine, NewPurchase};

    #[tokio::test]
    async fn test_create_search_update() {
        let db = setup().await;
        let repo = db.suppliers();

        let id = repo.create(&supplier_draft("Opticolor")).await.unwrap();
        repo.create(&supplier_draft("Lentes Andinos")).await.unwrap();

        assert_eq!(repo.search("andin").await.unwrap().len(), 1);
        // Both share the contact person
        assert_eq!(repo.search("pérez").await.unwrap().len(), 2);

        let mut draft = supplier_draft("Opticolor Ltda.");
        draft.contact = "María Díaz".to_string();
        repo.update(id, &draft).await.unwrap();
        assert_eq!(repo.get(id).await.unwrap().unwrap().contact, "María Díaz");

        let mut blank = supplier_draft("X");
        blank.phone = String::new();
        assert!(repo.update(id, &blank).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_guarded_by_purchases() {
        let db = setup().await;
        let supplier = db.suppliers().create(&supplier_draft("Opticolor")).await.unwrap();
        let idle = db.suppliers().create(&supplier_draft("Sin compras")).await.unwrap();
        let product = db.products().create(&product_draft("Lente", 0)).await.unwrap();

        db.ledger()
            .create_purchase(&NewPurchase {
                supplier_id: supplier,
                total: 20_000,
                date: None,
                lines: vec![LedgerLine {
                    product_id: product,
                    quantity: 1,
                    unit_price: 20_000,
                }],
            })
            .await
            .unwrap();

        assert!(matches!(
            db.suppliers().delete(supplier).await.unwrap(),
            DeleteOutcome::Refused { .. }
        ));
        assert_eq!(db.suppliers().delete(idle).await.unwrap(), DeleteOutcome::Deleted);
    }
}
