use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::medication::{Medication, NewMedication};

const MEDICATION_COLUMNS: &str =
    "id, user_id, name, dosage, frequency, start_date, end_date, instructions, created_at";

/// Repository trait for medications
#[async_trait]
pub trait MedicationRepositoryTrait {
    async fn create(&self, medication: NewMedication) -> Result<Medication, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Medication>, RepositoryError>;

    /// All medications of a user, newest start date first
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Medication>, RepositoryError>;

    /// Medications whose date range contains `date`
    async fn list_active_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Medication>, RepositoryError>;

    async fn update(&self, medication: &Medication) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError>;
}

/// SQLite-backed medication repository
#[derive(Debug, Clone)]
pub struct MedicationRepository {
    pool: DatabasePool,
}

impl MedicationRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_medication(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        instructions: row.get(7)?,
        created_at: row.get(8)?,
    })
}

#[async_trait]
impl MedicationRepositoryTrait for MedicationRepository {
    async fn create(&self, request: NewMedication) -> Result<Medication, RepositoryError> {
        let medication = Medication {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            name: request.name,
            dosage: request.dosage,
            frequency: request.frequency,
            start_date: request.start_date,
            end_date: request.end_date,
            instructions: request.instructions,
            created_at: Utc::now(),
        };

        debug!("Storing medication: {}", medication.id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO medications
             (id, user_id, name, dosage, frequency, start_date, end_date, instructions, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                medication.id,
                medication.user_id,
                medication.name,
                medication.dosage,
                medication.frequency,
                medication.start_date,
                medication.end_date,
                medication.instructions,
                medication.created_at,
            ],
        )?;

        Ok(medication)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Medication>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM medications WHERE id = ?1", MEDICATION_COLUMNS);
        let medication = conn.query_row(&sql, [id], map_medication).optional()?;
        Ok(medication)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Medication>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM medications WHERE user_id = ?1 ORDER BY start_date DESC, name",
            MEDICATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let medications = stmt
            .query_map([user_id], map_medication)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(medications)
    }

    async fn list_active_on(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Medication>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM medications
             WHERE user_id = ?1 AND start_date <= ?2 AND (end_date IS NULL OR end_date >= ?2)
             ORDER BY name",
            MEDICATION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let medications = stmt
            .query_map(params![user_id, date], map_medication)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(medications)
    }

    async fn update(&self, medication: &Medication) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE medications SET name = ?2, dosage = ?3, frequency = ?4, start_date = ?5,
                 end_date = ?6, instructions = ?7
             WHERE id = ?1",
            params![
                medication.id,
                medication.name,
                medication.dosage,
                medication.frequency,
                medication.start_date,
                medication.end_date,
                medication.instructions,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("Medication {}", medication.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM medications WHERE id = ?1", [id])?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("Medication {}", id)));
        }
        Ok(())
    }

    async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM medications WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::seed_user;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn medication(user_id: &str, name: &str, start: &str, end: Option<&str>) -> NewMedication {
        NewMedication {
            user_id: user_id.to_string(),
            name: name.to_string(),
            dosage: "10mg".to_string(),
            frequency: "once daily".to_string(),
            start_date: date(start),
            end_date: end.map(date),
            instructions: None,
        }
    }

    #[tokio::test]
    async fn test_active_on_respects_date_range() {
        let pool = DatabasePool::in_memory().unwrap();
        let user_id = seed_user(&pool, "ada").await;
        let repo = MedicationRepository::new(pool);

        repo.create(medication(&user_id, "Lisinopril", "2024-01-01", None)).await.unwrap();
        repo.create(medication(&user_id, "Amoxicillin", "2024-03-01", Some("2024-03-10"))).await.unwrap();
        repo.create(medication(&user_id, "Future", "2024-06-01", None)).await.unwrap();

        let active: Vec<String> = repo
            .list_active_on(&user_id, date("2024-03-10"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(active, vec!["Amoxicillin", "Lisinopril"]);

        let later = repo.list_active_on(&user_id, date("2024-03-11")).await.unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].name, "Lisinopril");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let pool = DatabasePool::in_memory().unwrap();
        let user_id = seed_user(&pool, "ada").await;
        let repo = MedicationRepository::new(pool);

        let mut med = repo.create(medication(&user_id, "Metformin", "2024-01-01", None)).await.unwrap();
        med.dosage = "500mg".to_string();
        med.end_date = Some(date("2024-12-31"));
        repo.update(&med).await.unwrap();

        let stored = repo.get_by_id(&med.id).await.unwrap().unwrap();
        assert_eq!(stored.dosage, "500mg");
        assert_eq!(stored.end_date, Some(date("2024-12-31")));
        assert_eq!(repo.count_by_user(&user_id).await.unwrap(), 1);

        repo.delete(&med.id).await.unwrap();
        assert!(repo.get_by_id(&med.id).await.unwrap().is_none());
    }
}
