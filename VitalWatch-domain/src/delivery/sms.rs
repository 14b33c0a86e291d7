//! SMS delivery through the Twilio REST API.
//!
//! Each message is POSTed as a form to
//! `{base}/2010-04-01/Accounts/{sid}/Messages.json` with basic auth. Transport
//! errors, 429 and 5xx responses are retried three times, backing off 1 s, 2 s
//! and 4 s. Other 4xx responses fail at once.

use std::time::Duration;

use async_trait::async_trait;

const RETRY_DELAYS: [Duration; 3] = [Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)];
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("SMS gateway returned HTTP {0}")]
    HttpStatus(u16),
}

impl SmsError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            SmsError::Request(_) => true,
            SmsError::HttpStatus(status) => *status == 429 || *status >= 500,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number in E.164 format
    pub from_number: String,
    pub api_base: String,
}

impl SmsConfig {
    /// `None` unless account sid, auth token and sender number are all set
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            account_sid: var("TWILIO_ACCOUNT_SID")?,
            auth_token: var("TWILIO_AUTH_TOKEN")?,
            from_number: var("TWILIO_PHONE_NUMBER")?,
            api_base: var("TWILIO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

/// Outbound SMS channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsSender {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), SmsError>;
}

pub struct TwilioSmsSender {
    config: SmsConfig,
    client: reqwest::Client,
    retry_delays: Vec<Duration>,
}

impl TwilioSmsSender {
    pub fn new(config: SmsConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Falling back to default HTTP client");
                reqwest::Client::new()
            });
        Self {
            config,
            client,
            retry_delays: RETRY_DELAYS.to_vec(),
        }
    }

    /// Replace the backoff schedule; one retry per delay
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn from_env() -> Option<Self> {
        SmsConfig::from_env().map(Self::new)
    }

    async fn try_send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let params = [
            ("To", to),
            ("From", self.config.from_number.as_str()),
            ("Body", body),
        ];
        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SmsError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send_sms(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let mut delays = self.retry_delays.iter();
        let mut attempt = 1;

        loop {
            let err = match self.try_send(to, body).await {
                Ok(()) => {
                    tracing::info!(to, attempt, "SMS sent");
                    return Ok(());
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                tracing::error!(to, attempt, error = %err, "SMS rejected by gateway");
                return Err(err);
            }
            let Some(delay) = delays.next() else {
                tracing::error!(to, attempt, error = %err, "SMS delivery failed after all retries");
                return Err(err);
            };

            tracing::warn!(to, attempt, error = %err, "SMS attempt failed, retrying");
            tokio::time::sleep(*delay).await;
            attempt += 1;
        }
    }
}
