use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

pub const ALERT_TYPE_EMERGENCY: &str = "EMERGENCY";
pub const ALERT_TYPE_AI_PREDICTION: &str = "AI_PREDICTION";

pub const SEVERITY_MEDIUM: &str = "MEDIUM";
pub const SEVERITY_HIGH: &str = "HIGH";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct AlertView {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub alert_type: String,
    pub message: String,
    pub vital_sign: Option<String>,
    pub value: Option<f64>,
    pub severity: Option<String>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl AlertView {
    /// Severities counted as warnings in summaries
    pub fn is_warning(&self) -> bool {
        matches!(self.severity.as_deref(), Some("warning") | Some(SEVERITY_MEDIUM))
    }

    /// Severities counted as dangers in summaries
    pub fn is_danger(&self) -> bool {
        matches!(
            self.severity.as_deref(),
            Some("danger") | Some("critical") | Some(SEVERITY_HIGH)
        )
    }
}
