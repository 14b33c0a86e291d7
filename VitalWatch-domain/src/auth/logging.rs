use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Types of authentication events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEventType {
    Registration,
    Login,
    FailedLogin,
    Logout,
    TokenRefresh,
    TokenValidation,
    PasswordChange,
}

impl std::fmt::Display for AuthEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthEventType::Registration => write!(f, "REGISTRATION"),
            AuthEventType::Login => write!(f, "LOGIN"),
            AuthEventType::FailedLogin => write!(f, "FAILED_LOGIN"),
            AuthEventType::Logout => write!(f, "LOGOUT"),
            AuthEventType::TokenRefresh => write!(f, "TOKEN_REFRESH"),
            AuthEventType::TokenValidation => write!(f, "TOKEN_VALIDATION"),
            AuthEventType::PasswordChange => write!(f, "PASSWORD_CHANGE"),
        }
    }
}

/// Authentication event record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthEvent {
    pub event_type: AuthEventType,
    /// User id or login email, when known
    pub user_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub details: Option<String>,
    /// Request path being accessed
    pub resource: Option<String>,
    pub duration_ms: Option<u64>,
    /// `password`, `jwt`, `refresh_token`
    pub auth_method: Option<String>,
}

impl AuthEvent {
    pub fn new(event_type: AuthEventType, user_id: Option<&str>, success: bool) -> Self {
        Self {
            event_type,
            user_id: user_id.map(String::from),
            timestamp: Utc::now(),
            success,
            details: None,
            resource: None,
            duration_ms: None,
            auth_method: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_auth_method(mut self, auth_method: impl Into<String>) -> Self {
        self.auth_method = Some(auth_method.into());
        self
    }
}

/// Write an authentication event to the log
pub fn log_auth_event(event: AuthEvent) {
    let user = event.user_id.as_deref().unwrap_or("anonymous");
    let status = if event.success { "SUCCESS" } else { "FAILURE" };
    let details = event.details.as_deref().unwrap_or("");

    info!(
        resource = event.resource.as_deref().unwrap_or("-"),
        duration_ms = event.duration_ms.unwrap_or(0),
        method = event.auth_method.as_deref().unwrap_or("-"),
        "AUTH-LOG [{}] [{}] [{}] [{}] {}",
        event.event_type,
        user,
        status,
        event.timestamp.to_rfc3339(),
        details
    );
}

pub fn log_token_refresh(user_id: &str, success: bool, details: Option<&str>) {
    let mut event = AuthEvent::new(AuthEventType::TokenRefresh, Some(user_id), success)
        .with_auth_method("refresh_token");
    if let Some(d) = details {
        event = event.with_details(d);
    }
    log_auth_event(event);
}

pub fn log_logout(user_id: &str) {
    log_auth_event(AuthEvent::new(AuthEventType::Logout, Some(user_id), true).with_auth_method("jwt"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_auth_event() {
        let event = AuthEvent::new(AuthEventType::Login, Some("user123"), true)
            .with_details("Login successful")
            .with_resource("/auth/login")
            .with_duration(150)
            .with_auth_method("password");

        assert_eq!(event.event_type, AuthEventType::Login);
        assert_eq!(event.user_id.as_deref(), Some("user123"));
        assert!(event.success);
        assert_eq!(event.resource.as_deref(), Some("/auth/login"));
        assert_eq!(event.duration_ms, Some(150));
        assert_eq!(event.auth_method.as_deref(), Some("password"));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(AuthEventType::Login.to_string(), "LOGIN");
        assert_eq!(AuthEventType::FailedLogin.to_string(), "FAILED_LOGIN");
        assert_eq!(AuthEventType::PasswordChange.to_string(), "PASSWORD_CHANGE");
    }
}
