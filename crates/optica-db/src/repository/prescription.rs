//! # Prescription Repository
//!
//! Clinical records. The structured payload is stored as JSON text in
//! `prescriptions.recipe` and only decoded on request; a record whose payload
//! is corrupted can still be listed and deleted.
//!
//! Deleting a prescription is never refused.

use optica_core::{DeleteOutcome, Prescription, PrescriptionDraft, RecipePayload};
use tracing::{debug, warn};

use super::{delete_row, EntityRepository};
use crate::error::{DbError, DbResult};
use crate::gateway::Gateway;
use crate::params;

const SELECT_PRESCRIPTION: &str =
    "SELECT id, client_id, date, diagnosis, recipe, observations FROM prescriptions";

#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    gateway: Gateway,
}

impl PrescriptionRepository {
    pub fn new(gateway: Gateway) -> Self {
        PrescriptionRepository { gateway }
    }

    /// A client's prescriptions, newest first.
    pub async fn list_for_client(&self, client_id: i64) -> DbResult<Vec<Prescription>> {
        debug!(client_id, "Listing prescriptions");
        let sql = format!("{SELECT_PRESCRIPTION} WHERE client_id = ? ORDER BY date DESC, id DESC");
        self.gateway.fetch_all(&sql, &params![client_id]).await
    }

    /// Fetches a prescription together with its decoded payload.
    ///
    /// ## Returns
    /// * `Ok(Some((record, payload)))` - Found and decoded
    /// * `Ok(None)` - No such id
    /// * `Err(DbError::CorruptedData)` - Stored payload is unreadable; the
    ///   record is left as it is
    pub async fn get_with_payload(
        &self,
        id: i64,
    ) -> DbResult<Option<(Prescription, RecipePayload)>> {
        let Some(record) = self.get(id).await? else {
            return Ok(None);
        };

        match record.payload() {
            Ok(payload) => Ok(Some((record, payload))),
            Err(e) => {
                warn!(id, error = %e, "Stored prescription payload is corrupted");
                Err(e.into())
            }
        }
    }
}

impl EntityRepository for PrescriptionRepository {
    type Record = Prescription;
    type Draft = PrescriptionDraft;

    const ENTITY: &'static str = "Prescription";

    async fn list(&self) -> DbResult<Vec<Prescription>> {
        let sql = format!("{SELECT_PRESCRIPTION} ORDER BY date DESC, id DESC");
        self.gateway.fetch_all(&sql, &[]).await
    }

    async fn get(&self, id: i64) -> DbResult<Option<Prescription>> {
        let sql = format!("{SELECT_PRESCRIPTION} WHERE id = ?");
        self.gateway.fetch_one(&sql, &params![id]).await
    }

    /// Keeps only the distances the diagnosis covers before encoding.
    async fn create(&self, draft: &PrescriptionDraft) -> DbResult<i64> {
        let draft = draft.validate()?;
        debug!(client_id = draft.client_id, diagnosis = %draft.diagnosis, "Creating prescription");

        let outcome = self
            .gateway
            .execute(
                "INSERT INTO prescriptions (client_id, date, diagnosis, recipe, observations) \
                 VALUES (?, ?, ?, ?, ?)",
                &params![
                    draft.client_id,
                    draft.date,
                    draft.diagnosis.as_str(),
                    draft.recipe.encode(),
                    &draft.observations
                ],
            )
            .await?;

        outcome
            .inserted_id()
            .ok_or_else(|| DbError::Internal("insert returned no id".to_string()))
    }

    async fn update(&self, id: i64, draft: &PrescriptionDraft) -> DbResult<()> {
        let draft = draft.validate()?;
        debug!(id, diagnosis = %draft.diagnosis, "Updating prescription");

        let outcome = self
            .gateway
            .execute(
                "UPDATE prescriptions SET client_id = ?, date = ?, diagnosis = ?, recipe = ?, \
                 observations = ? WHERE id = ?",
                &params![
                    draft.client_id,
                    draft.date,
                    draft.diagnosis.as_str(),
                    draft.recipe.encode(),
                    &draft.observations,
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
        delete_row(
            &self.gateway,
            Self::ENTITY,
            id,
            "DELETE FROM prescriptions WHERE id = ?",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::fixtures::{client_draft, setup};
    use chrono::NaiveDate;
    use optica_core::{Diagnosis, DistanceCorrection, EyeCorrection};

    fn correction(dp: i64, sphere: &str) -> DistanceCorrection {
        DistanceCorrection {
            pupillary_distance: dp,
            right_eye: EyeCorrection {
                sphere: sphere.to_string(),
                cylinder: "-0.50".to_string(),
                axis: "180".to_string(),
            },
            left_eye: EyeCorrection::default(),
        }
    }

    fn draft(client_id: i64, day: u32, diagnosis: Diagnosis) -> PrescriptionDraft {
        PrescriptionDraft {
            client_id,
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            diagnosis,
            recipe: RecipePayload {
                far: Some(correction(62, "-1.25")),
                near: Some(correction(60, "+1.00")),
            },
            observations: "Control en 12 meses".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_keeps_diagnosis_distances() {
        let db = setup().await;
        let client = db.clients().create(&client_draft("12345678-9")).await.unwrap();
        let repo = db.prescriptions();

        let id = repo.create(&draft(client, 3, Diagnosis::Far)).await.unwrap();
        let (record, payload) = repo.get_with_payload(id).await.unwrap().unwrap();

        assert_eq!(record.diagnosis, Diagnosis::Far);
        assert_eq!(payload.far.unwrap().right_eye.sphere, "-1.25");
        assert!(payload.near.is_none());
    }

    #[tokio::test]
    async fn test_list_for_client_newest_first() {
        let db = setup().await;
        let client = db.clients().create(&client_draft("12345678-9")).await.unwrap();
        let repo = db.prescriptions();

        repo.create(&draft(client, 1, Diagnosis::Both)).await.unwrap();
        let newest = repo.create(&draft(client, 20, Diagnosis::Near)).await.unwrap();

        let list = repo.list_for_client(client).await.unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, newest);
    }

    #[tokio::test]
    async fn test_invalid_dp_rejected() {
        let db = setup().await;
        let client = db.clients().create(&client_draft("12345678-9")).await.unwrap();

        let mut bad = draft(client, 3, Diagnosis::Far);
        bad.recipe.far = Some(correction(90, "-1.00"));

        assert!(matches!(
            db.prescriptions().create(&bad).await,
            Err(DbError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupted_payload_is_reported_and_kept() {
        let db = setup().await;
        let client = db.clients().create(&client_draft("12345678-9")).await.unwrap();
        let repo = db.prescriptions();
        let id = repo.create(&draft(client, 3, Diagnosis::Both)).await.unwrap();

        db.gateway()
            .execute(
                "UPDATE prescriptions SET recipe = ? WHERE id = ?",
                &params!["{lejos: broken", id],
            )
            .await
            .unwrap();

        assert!(matches!(
            repo.get_with_payload(id).await,
            Err(DbError::CorruptedData(_))
        ));
        // Still listed and untouched
        let record = repo.get(id).await.unwrap().unwrap();
        assert_eq!(record.recipe, "{lejos: broken");
    }

    #[tokio::test]
    async fn test_update_and_unconditional_delete() {
        let db = setup().await;
        let client = db.clients().create(&client_draft("12345678-9")).await.unwrap();
        let repo = db.prescriptions();
        let id = repo.create(&draft(client, 3, Diagnosis::Far)).await.unwrap();

        repo.update(id, &draft(client, 4, Diagnosis::Near)).await.unwrap();
        let (record, payload) = repo.get_with_payload(id).await.unwrap().unwrap();
        assert_eq!(record.diagnosis, Diagnosis::Near);
        assert!(payload.far.is_none());

        assert_eq!(repo.delete(id).await.unwrap(), DeleteOutcome::Deleted);
        assert_eq!(repo.delete(id).await.unwrap(), DeleteOutcome::NotFound);
        assert!(matches!(
            repo.update(id, &draft(client, 4, Diagnosis::Near)).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
