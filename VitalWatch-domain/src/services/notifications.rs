//! Notification dispatch and preferences.
//!
//! Findings from the analysis services arrive as [`Prediction`]s. Each one is
//! pushed in-app; warnings and critical findings also go out by email and
//! SMS according to the user's preferences, and critical findings reach the
//! emergency contacts as well.

use async_trait::async_trait;
use chrono::{Local, NaiveTime, Utc};
use serde_json::json;
use tracing::{info, instrument, warn};

use vital_watch_data::models::{NewNotificationLog, NotificationPreference, User};

use crate::delivery::DeliveryChannels;
use crate::entities::conversions;
use crate::entities::notification::{
    CHANNEL_EMAIL, CHANNEL_EMERGENCY_CONTACTS, CHANNEL_IN_APP, CHANNEL_SMS,
};
use crate::entities::{
    DispatchOutcome, NotificationLogView, NotificationPreferences, Prediction, UpdatePreferencesRequest,
};
use crate::events::{names, LiveEvent};
use crate::services::{Repositories, ServiceError};

pub const SEVERITY_INFO: &str = "info";
pub const SEVERITY_WARNING: &str = "warning";
pub const SEVERITY_CRITICAL: &str = "critical";

/// Logs returned by the log listing
pub const LOG_LIMIT: usize = 50;

const QUIET_HOURS_FORMAT: &str = "%H:%M";

#[async_trait]
pub trait NotificationServiceTrait {
    /// Deliver a finding; `None` when its type is not one that is notified
    async fn handle_prediction(
        &self,
        user_id: &str,
        prediction: &Prediction,
    ) -> Result<Option<DispatchOutcome>, ServiceError>;

    /// Current preferences, created with defaults on first access
    async fn get_preferences(&self, user_id: &str) -> Result<NotificationPreferences, ServiceError>;

    async fn update_preferences(
        &self,
        user_id: &str,
        request: UpdatePreferencesRequest,
    ) -> Result<NotificationPreferences, ServiceError>;

    /// The most recent notification logs, newest first
    async fn get_logs(&self, user_id: &str) -> Result<Vec<NotificationLogView>, ServiceError>;

    /// Send a test notification through the normal dispatch path
    async fn send_test(&self, user_id: &str) -> Result<DispatchOutcome, ServiceError>;
}

/// Title shown for a prediction type; other types are not notified
pub fn notification_title(prediction_type: &str) -> Option<&'static str> {
    match prediction_type {
        "anomaly" => Some("Abnormal Vital Signs Detected"),
        "trend" => Some("Vital Signs Trend Alert"),
        "test" => Some("Test Notification"),
        _ => None,
    }
}

pub fn notification_severity(prediction: &Prediction) -> &'static str {
    let message = prediction.message.to_lowercase();
    match prediction.prediction_type.as_str() {
        "anomaly" if message.contains("heart rate") || message.contains("oxygen saturation") => {
            SEVERITY_CRITICAL
        }
        "anomaly" => SEVERITY_WARNING,
        "trend" if message.contains("decrease") => SEVERITY_WARNING,
        _ => SEVERITY_INFO,
    }
}

/// Whether `now` falls in the quiet window. A window whose start is after
/// its end wraps past midnight.
pub fn in_quiet_hours(start: Option<&str>, end: Option<&str>, now: NaiveTime) -> bool {
    let (Some(start), Some(end)) = (start, end) else {
        return false;
    };
    let (Ok(start), Ok(end)) = (
        NaiveTime::parse_from_str(start, QUIET_HOURS_FORMAT),
        NaiveTime::parse_from_str(end, QUIET_HOURS_FORMAT),
    ) else {
        return false;
    };

    if start <= end {
        now >= start && now < end
    } else {
        now >= start || now < end
    }
}

fn parse_quiet_hour(field: &str, value: Option<String>) -> Result<Option<Option<String>>, ServiceError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(Some(None)),
        Some(v) => NaiveTime::parse_from_str(v.trim(), QUIET_HOURS_FORMAT)
            .map(|t| Some(Some(t.format(QUIET_HOURS_FORMAT).to_string())))
            .map_err(|_| ServiceError::Validation(format!("{}: Time must use the HH:MM format", field))),
    }
}

/// Load the preferences row of a user, storing the defaults when missing
pub(crate) async fn load_preferences(
    repos: &Repositories,
    user_id: &str,
) -> Result<NotificationPreference, ServiceError> {
    if let Some(preferences) = repos.notifications.get_preferences(user_id).await? {
        return Ok(preferences);
    }
    let defaults = NotificationPreference::defaults_for(user_id);
    repos.notifications.save_preferences(&defaults).await?;
    Ok(defaults)
}

pub struct NotificationService {
    repos: Repositories,
    channels: DeliveryChannels,
}

impl NotificationService {
    pub fn new(repos: Repositories, channels: DeliveryChannels) -> Self {
        Self { repos, channels }
    }

    /// Dispatch as if the local clock read `now`
    pub async fn dispatch_at(
        &self,
        user_id: &str,
        prediction: &Prediction,
        now: NaiveTime,
    ) -> Result<Option<DispatchOutcome>, ServiceError> {
        let Some(title) = notification_title(&prediction.prediction_type) else {
            return Ok(None);
        };
        let severity = notification_severity(prediction);

        let user = self
            .repos
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        self.channels.bus.publish(LiveEvent::new(user_id, names::NOTIFICATION).with_payload(json!({
            "title": title,
            "message": prediction.message,
            "severity": severity,
        })));
        let mut channels = vec![CHANNEL_IN_APP.to_string()];

        if severity != SEVERITY_INFO {
            let preferences = load_preferences(&self.repos, user_id).await?;
            let quiet = in_quiet_hours(
                preferences.quiet_hours_start.as_deref(),
                preferences.quiet_hours_end.as_deref(),
                now,
            );

            if quiet && severity != SEVERITY_CRITICAL {
                info!(user_id, "Quiet hours active, skipping email and SMS");
            } else {
                let body = format!("{}\n\n{}", title, prediction.message);
                if preferences.email_enabled && self.send_email(&user.email, title, &body).await {
                    channels.push(CHANNEL_EMAIL.to_string());
                }
                if preferences.sms_enabled {
                    if let Some(phone) = user.phone.as_deref() {
                        if self.send_sms(phone, &body).await {
                            channels.push(CHANNEL_SMS.to_string());
                        }
                    }
                }
            }

            if severity == SEVERITY_CRITICAL && self.notify_contacts(&user, &prediction.message).await? {
                channels.push(CHANNEL_EMERGENCY_CONTACTS.to_string());
            }
        }

        self.repos
            .notifications
            .create_log(NewNotificationLog {
                user_id: user_id.to_string(),
                notification_type: prediction.prediction_type.clone(),
                severity: severity.to_string(),
                message: prediction.message.clone(),
                channels: channels.clone(),
                reference_id: None,
            })
            .await?;

        Ok(Some(DispatchOutcome {
            title: title.to_string(),
            severity: severity.to_string(),
            channels,
        }))
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> bool {
        let Some(sender) = &self.channels.email else {
            return false;
        };
        match sender.send_email(to, subject, body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(to, error = %e, "Email notification failed");
                false
            }
        }
    }

    async fn send_sms(&self, to: &str, body: &str) -> bool {
        let Some(sender) = &self.channels.sms else {
            return false;
        };
        match sender.send_sms(to, body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(to, error = %e, "SMS notification failed");
                false
            }
        }
    }

    /// Tell every emergency contact; true when any delivery succeeded
    async fn notify_contacts(&self, user: &User, message: &str) -> Result<bool, ServiceError> {
        let contacts = self.repos.contacts.list_by_user(&user.id).await?;
        let subject = format!("URGENT: Health Alert for {}", user.full_name());
        let body = format!("{}\n\n{}", subject, message);

        let mut delivered = false;
        for contact in contacts {
            if let Some(email) = contact.email.as_deref() {
                delivered |= self.send_email(email, &subject, &body).await;
            }
            delivered |= self.send_sms(&contact.phone, &body).await;
        }
        Ok(delivered)
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    #[instrument(skip(self, prediction))]
    async fn handle_prediction(
        &self,
        user_id: &str,
        prediction: &Prediction,
    ) -> Result<Option<DispatchOutcome>, ServiceError> {
        self.dispatch_at(user_id, prediction, Local::now().time()).await
    }

    async fn get_preferences(&self, user_id: &str) -> Result<NotificationPreferences, ServiceError> {
        let preferences = load_preferences(&self.repos, user_id).await?;
        Ok(conversions::convert_to_domain_preferences(preferences))
    }

    async fn update_preferences(
        &self,
        user_id: &str,
        request: UpdatePreferencesRequest,
    ) -> Result<NotificationPreferences, ServiceError> {
        let start = parse_quiet_hour("quiet_hours_start", request.quiet_hours_start)?;
        let end = parse_quiet_hour("quiet_hours_end", request.quiet_hours_end)?;

        let mut preferences = load_preferences(&self.repos, user_id).await?;
        if let Some(enabled) = request.email_enabled {
            preferences.email_enabled = enabled;
        }
        if let Some(enabled) = request.sms_enabled {
            preferences.sms_enabled = enabled;
        }
        if let Some(start) = start {
            preferences.quiet_hours_start = start;
        }
        if let Some(end) = end {
            preferences.quiet_hours_end = end;
        }
        preferences.updated_at = Utc::now();

        self.repos.notifications.save_preferences(&preferences).await?;
        info!(user_id, "Notification preferences updated");
        Ok(conversions::convert_to_domain_preferences(preferences))
    }

    async fn get_logs(&self, user_id: &str) -> Result<Vec<NotificationLogView>, ServiceError> {
        let logs = self.repos.notifications.list_logs(user_id, LOG_LIMIT).await?;
        Ok(logs.into_iter().map(conversions::convert_to_domain_log).collect())
    }

    async fn send_test(&self, user_id: &str) -> Result<DispatchOutcome, ServiceError> {
        let prediction = Prediction::new("test", "This is a test notification from VitalWatch");
        self.handle_prediction(user_id, &prediction)
            .await?
            .ok_or_else(|| ServiceError::Internal("Test notification was not dispatched".to_string()))
    }
}
