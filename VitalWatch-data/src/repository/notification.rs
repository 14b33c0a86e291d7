use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::notification::{NewNotificationLog, NotificationLog, NotificationPreference};

/// Repository trait for notification preferences and delivery logs
#[async_trait]
pub trait NotificationRepositoryTrait {
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<NotificationPreference>, RepositoryError>;

    /// Insert or replace the preferences row of the user
    async fn save_preferences(&self, preferences: &NotificationPreference) -> Result<(), RepositoryError>;

    async fn create_log(&self, log: NewNotificationLog) -> Result<NotificationLog, RepositoryError>;

    /// Most recent logs first
    async fn list_logs(&self, user_id: &str, limit: usize) -> Result<Vec<NotificationLog>, RepositoryError>;

    /// Whether a log of this type about `reference_id` was written at or after `since`
    async fn has_log_since(
        &self,
        user_id: &str,
        notification_type: &str,
        reference_id: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}

/// SQLite-backed notification repository
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: DatabasePool,
}

impl NotificationRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_preferences(row: &Row<'_>) -> rusqlite::Result<NotificationPreference> {
    Ok(NotificationPreference {
        user_id: row.get(0)?,
        email_enabled: row.get(1)?,
        sms_enabled: row.get(2)?,
        quiet_hours_start: row.get(3)?,
        quiet_hours_end: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

// Channels are stored as a JSON array
fn map_log(row: &Row<'_>) -> rusqlite::Result<(NotificationLog, String)> {
    Ok((
        NotificationLog {
            id: row.get(0)?,
            user_id: row.get(1)?,
            notification_type: row.get(2)?,
            severity: row.get(3)?,
            message: row.get(4)?,
            channels: Vec::new(),
            reference_id: row.get(6)?,
            timestamp: row.get(7)?,
        },
        row.get(5)?,
    ))
}

#[async_trait]
impl NotificationRepositoryTrait for NotificationRepository {
    async fn get_preferences(
        &self,
        user_id: &str,
    ) -> Result<Option<NotificationPreference>, RepositoryError> {
        let conn = self.pool.get()?;
        let preferences = conn
            .query_row(
                "SELECT user_id, email_enabled, sms_enabled, quiet_hours_start, quiet_hours_end,
                        created_at, updated_at
                 FROM notification_preferences WHERE user_id = ?1",
                [user_id],
                map_preferences,
            )
            .optional()?;
        Ok(preferences)
    }

    async fn save_preferences(&self, preferences: &NotificationPreference) -> Result<(), RepositoryError> {
        debug!("Saving notification preferences for user {}", preferences.user_id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO notification_preferences
             (user_id, email_enabled, sms_enabled, quiet_hours_start, quiet_hours_end, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(user_id) DO UPDATE SET
                 email_enabled = excluded.email_enabled,
                 sms_enabled = excluded.sms_enabled,
                 quiet_hours_start = excluded.quiet_hours_start,
                 quiet_hours_end = excluded.quiet_hours_end,
                 updated_at = excluded.updated_at",
            params![
                preferences.user_id,
                preferences.email_enabled,
                preferences.sms_enabled,
                preferences.quiet_hours_start,
                preferences.quiet_hours_end,
                preferences.created_at,
                preferences.updated_at,
            ],
        )?;
        Ok(())
    }

    async fn create_log(&self, request: NewNotificationLog) -> Result<NotificationLog, RepositoryError> {
        let log = NotificationLog {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            notification_type: request.notification_type,
            severity: request.severity,
            message: request.message,
            channels: request.channels,
            reference_id: request.reference_id,
            timestamp: Utc::now(),
        };
        let channels = serde_json::to_string(&log.channels)?;

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO notification_logs
             (id, user_id, notification_type, severity, message, channels, reference_id, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                log.id,
                log.user_id,
                log.notification_type,
                log.severity,
                log.message,
                channels,
                log.reference_id,
                log.timestamp,
            ],
        )?;

        Ok(log)
    }

    async fn list_logs(&self, user_id: &str, limit: usize) -> Result<Vec<NotificationLog>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, notification_type, severity, message, channels, reference_id, timestamp
             FROM notification_logs WHERE user_id = ?1 ORDER BY timestamp DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], map_log)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(mut log, channels)| {
                log.channels = serde_json::from_str(&channels)?;
                Ok(log)
            })
            .collect()
    }

    async fn has_log_since(
        &self,
        user_id: &str,
        notification_type: &str,
        reference_id: &str,
        since: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notification_logs
             WHERE user_id = ?1 AND notification_type = ?2 AND reference_id = ?3 AND timestamp >= ?4",
            params![user_id, notification_type, reference_id, since],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::seed_user;
    use chrono::Duration;

    #[tokio::test]
    async fn test_preferences_round_trip_and_update() {
        let pool = DatabasePool::in_memory().unwrap();
        let user_id = seed_user(&pool, "ada").await;
        let repo = NotificationRepository::new(pool);

        assert!(repo.get_preferences(&user_id).await.unwrap().is_none());

        let mut prefs = NotificationPreference::defaults_for(&user_id);
        repo.save_preferences(&prefs).await.unwrap();

        prefs.sms_enabled = false;
        prefs.quiet_hours_start = Some("22:00".to_string());
        prefs.quiet_hours_end = Some("07:00".to_string());
        repo.save_preferences(&prefs).await.unwrap();

        let stored = repo.get_preferences(&user_id).await.unwrap().unwrap();
        assert!(stored.email_enabled);
        assert!(!stored.sms_enabled);
        assert_eq!(stored.quiet_hours_start.as_deref(), Some("22:00"));
    }

    #[tokio::test]
    async fn test_logs_keep_channels_and_dedupe_window() {
        let pool = DatabasePool::in_memory().unwrap();
        let user_id = seed_user(&pool, "ada").await;
        let repo = NotificationRepository::new(pool);

        repo.create_log(NewNotificationLog {
            user_id: user_id.clone(),
            notification_type: "MEDICATION_REMINDER".to_string(),
            severity: "MEDIUM".to_string(),
            message: "Time to take Aspirin - 81mg".to_string(),
            channels: vec!["APP_NOTIFICATION".to_string()],
            reference_id: Some("med-1".to_string()),
        })
        .await
        .unwrap();

        let logs = repo.list_logs(&user_id, 50).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].channels, vec!["APP_NOTIFICATION"]);

        let hour_ago = Utc::now() - Duration::hours(1);
        assert!(repo
            .has_log_since(&user_id, "MEDICATION_REMINDER", "med-1", hour_ago)
            .await
            .unwrap());
        assert!(!repo
            .has_log_since(&user_id, "MEDICATION_REMINDER", "med-2", hour_ago)
            .await
            .unwrap());
    }
}
