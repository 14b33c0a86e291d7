use async_trait::async_trait;
use chrono::{Local, Utc};
use serde_json::json;
use tracing::{error, info, instrument, warn};

use vital_watch_data::models::{EmergencyContact, NewAlert, NewNotificationLog, User};

use crate::delivery::DeliveryChannels;
use crate::entities::alert::{ALERT_TYPE_EMERGENCY, SEVERITY_HIGH};
use crate::entities::conversions;
use crate::entities::notification::{CHANNEL_EMAIL, CHANNEL_SMS};
use crate::entities::{EmergencyResult, SosRequest, VitalSnapshot};
use crate::events::{names, LiveEvent};
use crate::services::{Repositories, ServiceError};

/// Message used when the watch sends an SOS without text
pub const WATCH_SOS_MESSAGE: &str = "Emergency triggered from watch!";

pub const NO_CONTACTS_MESSAGE: &str = "Please add emergency contacts first";

const NOTIFICATION_TYPE_EMERGENCY: &str = "EMERGENCY";
const CHANNEL_ATTEMPTED: &str = "attempted";

#[async_trait]
pub trait EmergencyServiceTrait {
    /// Run the SOS workflow: store an alert and notify every emergency contact
    async fn handle_emergency(&self, user_id: &str, request: SosRequest) -> Result<EmergencyResult, ServiceError>;
}

/// Text sent to emergency contacts
pub fn build_emergency_message(
    user: &User,
    request: &SosRequest,
    vitals: Option<&VitalSnapshot>,
    time: &str,
) -> String {
    let mut message = format!("EMERGENCY ALERT for {}\n", user.full_name());

    if let Some(text) = request.message.as_deref().filter(|m| !m.trim().is_empty()) {
        message.push_str(&format!("Message: {}\n", text));
    }

    if let Some(v) = vitals {
        message.push_str(&format!(
            "\nVital Signs:\nHeart Rate: {:.1} bpm\nBlood Pressure: {:.1}/{:.1} mmHg\nTemperature: {:.1}°C\nOxygen Saturation: {:.1}%\n",
            v.heart_rate, v.blood_pressure_systolic, v.blood_pressure_diastolic, v.temperature, v.oxygen_saturation
        ));
    }

    let location = request
        .location
        .as_deref()
        .filter(|l| !l.trim().is_empty())
        .unwrap_or("Not provided");
    message.push_str(&format!("\nLocation: {}\nTime: {}\n\nPlease respond immediately!", location, time));

    message
}

pub struct EmergencyService {
    repos: Repositories,
    channels: DeliveryChannels,
}

impl EmergencyService {
    pub fn new(repos: Repositories, channels: DeliveryChannels) -> Self {
        Self { repos, channels }
    }

    /// Vitals to quote: the ones sent with the request, else the latest reading
    async fn snapshot(&self, user_id: &str, request: &SosRequest) -> Result<Option<VitalSnapshot>, ServiceError> {
        if let Some(vitals) = &request.vital_signs {
            return Ok(Some(vitals.clone()));
        }
        let latest = self.repos.vitals.get_latest(user_id).await?;
        Ok(latest
            .map(conversions::convert_to_domain_reading)
            .map(|reading| conversions::convert_to_snapshot(&reading)))
    }

    /// Channels that delivered to one contact
    async fn notify_contact(&self, contact: &EmergencyContact, subject: &str, message: &str) -> Vec<String> {
        if !self.channels.has_external() {
            return vec![CHANNEL_ATTEMPTED.to_string()];
        }

        let mut channels = Vec::new();
        if let Some(sms) = &self.channels.sms {
            match sms.send_sms(&contact.phone, message).await {
                Ok(()) => channels.push(CHANNEL_SMS.to_string()),
                Err(e) => error!(contact = %contact.name, error = %e, "Emergency SMS failed"),
            }
        }
        if let (Some(email), Some(address)) = (&self.channels.email, contact.email.as_deref()) {
            match email.send_email(address, subject, message).await {
                Ok(()) => channels.push(CHANNEL_EMAIL.to_string()),
                Err(e) => error!(contact = %contact.name, error = %e, "Emergency email failed"),
            }
        }
        channels
    }
}

#[async_trait]
impl EmergencyServiceTrait for EmergencyService {
    #[instrument(skip(self, request))]
    async fn handle_emergency(&self, user_id: &str, request: SosRequest) -> Result<EmergencyResult, ServiceError> {
        let user = self
            .repos
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))?;

        let contacts = self.repos.contacts.list_by_user(user_id).await?;
        if contacts.is_empty() {
            warn!(user_id, "Emergency triggered without emergency contacts");
            return Err(ServiceError::Validation(NO_CONTACTS_MESSAGE.to_string()));
        }

        let vitals = self.snapshot(user_id, &request).await?;
        let time = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let message = build_emergency_message(&user, &request, vitals.as_ref(), &time);

        let alert = self
            .repos
            .alerts
            .create(NewAlert {
                user_id: user_id.to_string(),
                alert_type: ALERT_TYPE_EMERGENCY.to_string(),
                message: message.clone(),
                vital_sign: None,
                value: None,
                severity: Some(SEVERITY_HIGH.to_string()),
            })
            .await?;

        let subject = format!("EMERGENCY ALERT for {}", user.full_name());
        let mut contacts_notified = 0;
        for contact in &contacts {
            let channels = self.notify_contact(contact, &subject, &message).await;
            if !channels.is_empty() {
                contacts_notified += 1;
            }

            self.repos
                .notifications
                .create_log(NewNotificationLog {
                    user_id: user_id.to_string(),
                    notification_type: NOTIFICATION_TYPE_EMERGENCY.to_string(),
                    severity: SEVERITY_HIGH.to_string(),
                    message: format!("Emergency alert sent to {}", contact.name),
                    channels,
                    reference_id: Some(contact.id.clone()),
                })
                .await?;
        }

        self.channels.bus.publish(LiveEvent::new(user_id, names::NOTIFICATION).with_payload(json!({
            "title": "Emergency Alert",
            "message": "Emergency contacts have been notified",
            "severity": "critical",
            "alert_id": alert.id,
            "sent_at": Utc::now(),
        })));

        info!(user_id, contacts = contacts.len(), contacts_notified, "Emergency workflow completed");

        Ok(EmergencyResult {
            success: true,
            message: "Emergency contacts have been notified".to_string(),
            contacts_notified,
            alert_id: alert.id,
        })
    }
}
