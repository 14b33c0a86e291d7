use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::report_schedule::{NewReportSchedule, ReportSchedule};

const SCHEDULE_COLUMNS: &str = "id, user_id, frequency, report_period, active, created_at, updated_at";

/// Repository trait for report schedules
#[async_trait]
pub trait ReportScheduleRepositoryTrait {
    async fn create(&self, schedule: NewReportSchedule) -> Result<ReportSchedule, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<ReportSchedule>, RepositoryError>;

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ReportSchedule>, RepositoryError>;

    /// Active schedules of every user with the given frequency
    async fn list_active_by_frequency(&self, frequency: &str) -> Result<Vec<ReportSchedule>, RepositoryError>;

    async fn update(&self, schedule: &ReportSchedule) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;
}

/// SQLite-backed report schedule repository
#[derive(Debug, Clone)]
pub struct ReportScheduleRepository {
    pool: DatabasePool,
}

impl ReportScheduleRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_schedule(row: &Row<'_>) -> rusqlite::Result<ReportSchedule> {
    Ok(ReportSchedule {
        id: row.get(0)?,
        user_id: row.get(1)?,
        frequency: row.get(2)?,
        report_period: row.get(3)?,
        active: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[async_trait]
impl ReportScheduleRepositoryTrait for ReportScheduleRepository {
    async fn create(&self, request: NewReportSchedule) -> Result<ReportSchedule, RepositoryError> {
        let now = Utc::now();
        let schedule = ReportSchedule {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            frequency: request.frequency,
            report_period: request.report_period,
            active: true,
            created_at: now,
            updated_at: now,
        };

        debug!("Storing {} report schedule: {}", schedule.frequency, schedule.id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO report_schedules
             (id, user_id, frequency, report_period, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                schedule.id,
                schedule.user_id,
                schedule.frequency,
                schedule.report_period,
                schedule.active,
                schedule.created_at,
                schedule.updated_at,
            ],
        )?;

        Ok(schedule)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<ReportSchedule>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM report_schedules WHERE id = ?1", SCHEDULE_COLUMNS);
        let schedule = conn.query_row(&sql, [id], map_schedule).optional()?;
        Ok(schedule)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<ReportSchedule>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM report_schedules WHERE user_id = ?1 ORDER BY created_at",
            SCHEDULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map([user_id], map_schedule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(schedules)
    }

    async fn list_active_by_frequency(&self, frequency: &str) -> Result<Vec<ReportSchedule>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM report_schedules WHERE frequency = ?1 AND active = 1 ORDER BY created_at",
            SCHEDULE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let schedules = stmt
            .query_map([frequency], map_schedule)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(schedules)
    }

    async fn update(&self, schedule: &ReportSchedule) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE report_schedules SET frequency = ?2, report_period = ?3, active = ?4, updated_at = ?5
             WHERE id = ?1",
            params![
                schedule.id,
                schedule.frequency,
                schedule.report_period,
                schedule.active,
                schedule.updated_at,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("Report schedule {}", schedule.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM report_schedules WHERE id = ?1", [id])?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("Report schedule {}", id)));
        }
        Ok(())
    }
}
