use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

pub const CHANNEL_IN_APP: &str = "in_app";
pub const CHANNEL_EMAIL: &str = "email";
pub const CHANNEL_SMS: &str = "sms";
pub const CHANNEL_EMERGENCY_CONTACTS: &str = "emergency_contacts";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct NotificationPreferences {
    pub email_enabled: bool,
    pub sms_enabled: bool,
    /// `HH:MM`
    pub quiet_hours_start: Option<String>,
    /// `HH:MM`
    pub quiet_hours_end: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdatePreferencesRequest {
    pub email_enabled: Option<bool>,
    pub sms_enabled: Option<bool>,
    /// `HH:MM`; an empty string clears the value
    pub quiet_hours_start: Option<String>,
    /// `HH:MM`; an empty string clears the value
    pub quiet_hours_end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct NotificationLogView {
    pub id: String,
    pub notification_type: String,
    pub severity: String,
    pub message: String,
    pub channels: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Finding handed to the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Prediction {
    /// `anomaly`, `trend` or `test`
    #[serde(rename = "type")]
    pub prediction_type: String,
    pub message: String,
}

impl Prediction {
    pub fn new(prediction_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            prediction_type: prediction_type.into(),
            message: message.into(),
        }
    }
}

/// What the dispatcher did with a prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DispatchOutcome {
    pub title: String,
    /// `info`, `warning` or `critical`
    pub severity: String,
    pub channels: Vec<String>,
}
