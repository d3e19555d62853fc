//! # Client Repository
//!
//! Database operations for clients.
//!
//! ## RUT Uniqueness
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ClientDraft::validate()  "12.345.678-k" → "12345678-K"                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SELECT 1 FROM clients WHERE rut = ? [AND id <> ?]                     │
//! │       │                                                                 │
//! │       ├── found ──► Validation(Duplicate { rut })   nothing written    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT / UPDATE  (UNIQUE index still backs the check)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use optica_core::validation::validate_search_query;
use optica_core::{Client, ClientDraft, DeleteOutcome, ValidationError};
use tracing::debug;

use super::{guarded_delete, like_pattern, DependencyGuard, EntityRepository};
use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::params;

const SELECT_CLIENT: &str =
    "SELECT id, name, last_name, rut, phone, email, address FROM clients";

const CLIENT_GUARDS: [DependencyGuard; 2] = [
    DependencyGuard {
        sql: "SELECT 1 FROM prescriptions WHERE client_id = ? LIMIT 1",
        reason: "Client has prescriptions on record",
    },
    DependencyGuard {
        sql: "SELECT 1 FROM orders WHERE client_id = ? LIMIT 1",
        reason: "Client has sales on record",
    },
];

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    gateway: Gateway,
}

impl ClientRepository {
    pub fn new(gateway: Gateway) -> Self {
        ClientRepository { gateway }
    }

    /// Searches by name, last name or RUT. An empty query lists everyone.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Client>> {
        let query = validate_search_query(query)?;
        debug!(query = %query, "Searching clients");

        if query.is_empty() {
            return self.list().await;
        }

        let pattern = like_pattern(&query);
        let sql = format!(
            "{SELECT_CLIENT} WHERE name LIKE ?1 OR last_name LIKE ?1 OR rut LIKE ?1 ORDER BY id"
        );
        self.gateway.fetch_all(&sql, &params![pattern]).await
    }

    /// Looks a client up by RUT, in any accepted spelling.
    pub async fn get_by_rut(&self, rut: &str) -> DbResult<Option<Client>> {
        let rut = optica_core::validation::normalize_rut(rut)?;
        let sql = format!("{SELECT_CLIENT} WHERE rut = ?");
        self.gateway.fetch_one(&sql, &params![rut]).await
    }

    async fn ensure_unique_rut(&self, rut: &str, exclude_id: Option<i64>) -> DbResult<()> {
        let taken = self
            .gateway
            .exists(
                "SELECT 1 FROM clients WHERE rut = ? AND id <> ?",
                &params![rut, exclude_id.unwrap_or(0)],
            )
            .await?;

        if taken {
            return Err(ValidationError::Duplicate {
                field: "rut".to_string(),
                value: rut.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl EntityRepository for ClientRepository {
    type Record = Client;
    type Draft = ClientDraft;

    const ENTITY: &'static str = "Client";

    async fn list(&self) -> DbResult<Vec<Client>> {
        let sql = format!("{SELECT_CLIENT} ORDER BY id");
        self.gateway.fetch_all(&sql, &[]).await
    }

    async fn get(&self, id: i64) -> DbResult<Option<Client>> {
        let sql = format!("{SELECT_CLIENT} WHERE id = ?");
        self.gateway.fetch_one(&sql, &params![id]).await
    }

    async fn create(&self, draft: &ClientDraft) -> DbResult<i64> {
        let draft = draft.validate()?;
        self.ensure_unique_rut(&draft.rut, None).await?;

        debug!(rut = %draft.rut, "Creating client");

        let outcome = self
            .gateway
            .execute(
                "INSERT INTO clients (name, last_name, rut, phone, email, address) \
                 VALUES (?, ?, ?, ?, ?, ?)",
                &params![
                    &draft.name,
                    &draft.last_name,
                    &draft.rut,
                    &draft.phone,
                    &draft.email,
                    &draft.address
                ],
            )
            .await?;

        outcome
            .inserted_id()
            .ok_or_else(|| DbError::Internal("insert returned no id".to_string()))
    }

    async fn update(&self, id: i64, draft: &ClientDraft) -> DbResult<()> {
        let draft = draft.validate()?;
        self.ensure_unique_rut(&draft.rut, Some(id)).await?;

        debug!(id, rut = %draft.rut, "Updating client");

        let outcome = self
            .gateway
            .execute(
                "UPDATE clients SET name = ?, last_name = ?, rut = ?, phone = ?, email = ?, \
                 address = ? WHERE id = ?",
                &params![
                    &draft.name,
                    &draft.last_name,
                    &draft.rut,
                    &draft.phone,
                    &draft.email,
                    &draft.address,
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
            &CLIENT_GUARDS,
            "DELETE FROM clients WHERE id = ?",
        )
        .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{client_draft as draft, setup};
    use chrono::NaiveDate;
    use optica_core::{Diagnosis, PrescriptionDraft, RecipePayload};

    #[tokio::test]
    async fn test_create_normalizes_rut() {
        let db = setup().await;
        let repo = db.clients();

        let id = repo.create(&draft("12.345.678-k")).await.unwrap();
        let client = repo.get(id).await.unwrap().unwrap();

        assert_eq!(client.rut, "12345678-K");
        assert_eq!(client.full_name(), "Ana Rojas");
        assert_eq!(repo.get_by_rut("12345678-k").await.unwrap().unwrap().id, id);
    }

    #[tokio::test]
    async fn test_duplicate_rut_on_create() {
        let db = setup().await;
        let repo = db.clients();

        repo.create(&draft("12345678-9")).await.unwrap();
        let err = repo.create(&draft("12.345.678-9")).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Duplicate { .. })
        ));
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_rut_on_update_to_other() {
        let db = setup().await;
        let repo = db.clients();

        let first = repo.create(&draft("11111111-1")).await.unwrap();
        let second = repo.create(&draft("22222222-2")).await.unwrap();

        // Keeping its own RUT is fine
        repo.update(first, &draft("11111111-1")).await.unwrap();

        let err = repo.update(second, &draft("11.111.111-1")).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Validation(ValidationError::Duplicate { .. })
        ));
        assert_eq!(repo.get(second).await.unwrap().unwrap().rut, "22222222-2");
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let db = setup().await;
        let repo = db.clients();

        assert!(repo.create(&draft("123")).await.is_err());
        let mut missing_email = draft("12345678-9");
        missing_email.email = " ".to_string();
        assert!(repo.create(&missing_email).await.is_err());

        assert!(repo.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let db = setup().await;
        let err = db
            .clients()
            .update(99, &draft("12345678-9"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_search() {
        let db = setup().await;
        let repo = db.clients();

        repo.create(&draft("12345678-9")).await.unwrap();
        let mut other = draft("9876543-2");
        other.name = "Pedro".to_string();
        other.last_name = "Soto".to_string();
        repo.create(&other).await.unwrap();

        assert_eq!(repo.search("sot").await.unwrap().len(), 1);
        assert_eq!(repo.search("9876").await.unwrap()[0].name, "Pedro");
        assert_eq!(repo.search("").await.unwrap().len(), 2);
        assert!(repo.search("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_refused_with_prescription() {
        let db = setup().await;
        let id = db.clients().create(&draft("12345678-9")).await.unwrap();

        db.prescriptions()
            .create(&PrescriptionDraft {
                client_id: id,
                date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                diagnosis: Diagnosis::Far,
                recipe: RecipePayload::default(),
                observations: String::new(),
            })
            .await
            .unwrap();

        let outcome = db.clients().delete(id).await.unwrap();
        assert!(matches!(outcome, DeleteOutcome::Refused { ref reason } if reason.contains("prescriptions")));
        assert!(db.clients().get(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_free_client_and_missing() {
        let db = setup().await;
        let id = db.clients().create(&draft("12345678-9")).await.unwrap();

        assert_eq!(db.clients().delete(id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(db.clients().delete(id).await.unwrap(), DeleteOutcome::NotFound);
    }
}
