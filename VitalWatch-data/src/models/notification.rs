use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Per-user notification settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreference {
    pub user_id: String,
    pub email_enabled: bool,
    pub sms_enabled: bool,
    /// Local time `HH:MM`
    pub quiet_hours_start: Option<String>,
    /// Local time `HH:MM`
    pub quiet_hours_end: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NotificationPreference {
    /// Defaults used the first time a user's preferences are read
    pub fn defaults_for(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.to_string(),
            email_enabled: true,
            sms_enabled: true,
            quiet_hours_start: None,
            quiet_hours_end: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Record of a notification that was sent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLog {
    pub id: String,
    pub user_id: String,
    pub notification_type: String,
    pub severity: String,
    pub message: String,
    /// Channels the notification went out on
    pub channels: Vec<String>,
    /// Record the notification is about, e.g. the reminded medication
    pub reference_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Input data for logging a notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotificationLog {
    pub user_id: String,
    pub notification_type: String,
    pub severity: String,
    pub message: String,
    pub channels: Vec<String>,
    pub reference_id: Option<String>,
}
