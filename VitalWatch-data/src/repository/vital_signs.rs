use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::vital_signs::{NewVitalSigns, VitalSigns};

const VITAL_COLUMNS: &str = "id, user_id, timestamp, heart_rate, blood_pressure_systolic, \
     blood_pressure_diastolic, temperature, oxygen_saturation";

/// Repository trait for vital-sign readings
#[async_trait]
pub trait VitalSignsRepositoryTrait {
    /// Store a new reading
    async fn create(&self, reading: NewVitalSigns) -> Result<VitalSigns, RepositoryError>;

    /// Most recent reading for a user
    async fn get_latest(&self, user_id: &str) -> Result<Option<VitalSigns>, RepositoryError>;

    /// Readings taken at or after `since`, oldest first
    async fn get_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<VitalSigns>, RepositoryError>;

    /// The `limit` most recent readings, returned oldest first
    async fn get_recent(&self, user_id: &str, limit: usize) -> Result<Vec<VitalSigns>, RepositoryError>;
}

/// SQLite-backed vital-sign repository
#[derive(Debug, Clone)]
pub struct VitalSignsRepository {
    pool: DatabasePool,
}

impl VitalSignsRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_vital_signs(row: &Row<'_>) -> rusqlite::Result<VitalSigns> {
    Ok(VitalSigns {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: row.get(2)?,
        heart_rate: row.get(3)?,
        blood_pressure_systolic: row.get(4)?,
        blood_pressure_diastolic: row.get(5)?,
        temperature: row.get(6)?,
        oxygen_saturation: row.get(7)?,
    })
}

#[async_trait]
impl VitalSignsRepositoryTrait for VitalSignsRepository {
    async fn create(&self, request: NewVitalSigns) -> Result<VitalSigns, RepositoryError> {
        let reading = VitalSigns {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            timestamp: request.timestamp.unwrap_or_else(Utc::now),
            heart_rate: request.heart_rate,
            blood_pressure_systolic: request.blood_pressure_systolic,
            blood_pressure_diastolic: request.blood_pressure_diastolic,
            temperature: request.temperature,
            oxygen_saturation: request.oxygen_saturation,
        };

        debug!("Storing vital signs in database: id={}", reading.id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO vital_signs
             (id, user_id, timestamp, heart_rate, blood_pressure_systolic,
              blood_pressure_diastolic, temperature, oxygen_saturation)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                reading.id,
                reading.user_id,
                reading.timestamp,
                reading.heart_rate,
                reading.blood_pressure_systolic,
                reading.blood_pressure_diastolic,
                reading.temperature,
                reading.oxygen_saturation,
            ],
        )?;

        Ok(reading)
    }

    async fn get_latest(&self, user_id: &str) -> Result<Option<VitalSigns>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM vital_signs WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT 1",
            VITAL_COLUMNS
        );
        let reading = conn.query_row(&sql, [user_id], map_vital_signs).optional()?;
        Ok(reading)
    }

    async fn get_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<VitalSigns>, RepositoryError> {
        debug!("Getting vital signs for user {} since {}", user_id, since);
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM vital_signs WHERE user_id = ?1 AND timestamp >= ?2 ORDER BY timestamp ASC",
            VITAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let readings = stmt
            .query_map(params![user_id, since], map_vital_signs)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(readings)
    }

    async fn get_recent(&self, user_id: &str, limit: usize) -> Result<Vec<VitalSigns>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM vital_signs WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
            VITAL_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut readings = stmt
            .query_map(params![user_id, limit as i64], map_vital_signs)?
            .collect::<Result<Vec<_>, _>>()?;
        readings.reverse();
        Ok(readings)
    }
}
