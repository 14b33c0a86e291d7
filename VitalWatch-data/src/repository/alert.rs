use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::alert::{Alert, NewAlert};

const ALERT_COLUMNS: &str = "id, user_id, timestamp, alert_type, message, vital_sign, value, \
     severity, acknowledged, acknowledged_at";

/// Repository trait for alerts
#[async_trait]
pub trait AlertRepositoryTrait {
    async fn create(&self, alert: NewAlert) -> Result<Alert, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Alert>, RepositoryError>;

    /// Unacknowledged alerts, newest first
    async fn list_unacknowledged(&self, user_id: &str) -> Result<Vec<Alert>, RepositoryError>;

    /// Alerts raised at or after `since`, newest first
    async fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Alert>, RepositoryError>;

    /// Mark an alert as acknowledged at `at`
    async fn acknowledge(&self, id: &str, at: DateTime<Utc>) -> Result<(), RepositoryError>;

    async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError>;
}

/// SQLite-backed alert repository
#[derive(Debug, Clone)]
pub struct AlertRepository {
    pool: DatabasePool,
}

impl AlertRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_alert(row: &Row<'_>) -> rusqlite::Result<Alert> {
    Ok(Alert {
        id: row.get(0)?,
        user_id: row.get(1)?,
        timestamp: row.get(2)?,
        alert_type: row.get(3)?,
        message: row.get(4)?,
        vital_sign: row.get(5)?,
        value: row.get(6)?,
        severity: row.get(7)?,
        acknowledged: row.get(8)?,
        acknowledged_at: row.get(9)?,
    })
}

#[async_trait]
impl AlertRepositoryTrait for AlertRepository {
    async fn create(&self, request: NewAlert) -> Result<Alert, RepositoryError> {
        let alert = Alert {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            timestamp: Utc::now(),
            alert_type: request.alert_type,
            message: request.message,
            vital_sign: request.vital_sign,
            value: request.value,
            severity: request.severity,
            acknowledged: false,
            acknowledged_at: None,
        };

        debug!("Storing {} alert for user {}", alert.alert_type, alert.user_id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO alerts
             (id, user_id, timestamp, alert_type, message, vital_sign, value, severity, acknowledged)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
            params![
                alert.id,
                alert.user_id,
                alert.timestamp,
                alert.alert_type,
                alert.message,
                alert.vital_sign,
                alert.value,
                alert.severity,
            ],
        )?;

        Ok(alert)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Alert>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM alerts WHERE id = ?1", ALERT_COLUMNS);
        let alert = conn.query_row(&sql, [id], map_alert).optional()?;
        Ok(alert)
    }

    async fn list_unacknowledged(&self, user_id: &str) -> Result<Vec<Alert>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM alerts WHERE user_id = ?1 AND acknowledged = 0 ORDER BY timestamp DESC",
            ALERT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map([user_id], map_alert)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    async fn list_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<Alert>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!(
            "SELECT {} FROM alerts WHERE user_id = ?1 AND timestamp >= ?2 ORDER BY timestamp DESC",
            ALERT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let alerts = stmt
            .query_map(params![user_id, since], map_alert)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(alerts)
    }

    async fn acknowledge(&self, id: &str, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE alerts SET acknowledged = 1, acknowledged_at = ?2 WHERE id = ?1",
            params![id, at],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("Alert {}", id)));
        }
        Ok(())
    }

    async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM alerts WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
