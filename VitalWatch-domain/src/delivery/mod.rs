// Outbound notification channels
pub mod email;
pub mod sms;

use std::sync::Arc;

use tracing::info;

use crate::events::EventBus;

pub use email::{EmailConfig, EmailError, EmailSender, SmtpEmailSender};
pub use sms::{SmsConfig, SmsError, SmsSender, TwilioSmsSender};

/// Senders available to the notification and emergency services.
///
/// Email and SMS are optional; the in-app bus is always present.
#[derive(Clone)]
pub struct DeliveryChannels {
    pub email: Option<Arc<dyn EmailSender + Send + Sync>>,
    pub sms: Option<Arc<dyn SmsSender + Send + Sync>>,
    pub bus: EventBus,
}

impl DeliveryChannels {
    /// In-app delivery only
    pub fn new(bus: EventBus) -> Self {
        Self { email: None, sms: None, bus }
    }

    /// Build the SMTP and Twilio senders that are configured in the environment
    pub fn from_env(bus: EventBus) -> Self {
        let mut channels = Self::new(bus);

        match SmtpEmailSender::from_env() {
            Some(sender) => channels.email = Some(Arc::new(sender)),
            None => info!("SMTP_HOST not set, email notifications disabled"),
        }
        match TwilioSmsSender::from_env() {
            Some(sender) => channels.sms = Some(Arc::new(sender)),
            None => info!("Twilio credentials not set, SMS notifications disabled"),
        }

        channels
    }

    pub fn with_email(mut self, sender: Arc<dyn EmailSender + Send + Sync>) -> Self {
        self.email = Some(sender);
        self
    }

    pub fn with_sms(mut self, sender: Arc<dyn SmsSender + Send + Sync>) -> Self {
        self.sms = Some(sender);
        self
    }

    /// Whether any external channel is configured
    pub fn has_external(&self) -> bool {
        self.email.is_some() || self.sms.is_some()
    }
}
