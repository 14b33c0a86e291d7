use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for an alert raised for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// e.g. `vital_signs`, `EMERGENCY`, `AI_PREDICTION`
    pub alert_type: String,
    pub message: String,
    /// Vital the alert is about, `multiple` for combined alerts
    pub vital_sign: Option<String>,
    pub value: Option<f64>,
    /// `info`, `warning`, `danger`, `MEDIUM` or `HIGH`
    pub severity: Option<String>,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// Input data for raising an alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlert {
    pub user_id: String,
    pub alert_type: String,
    pub message: String,
    pub vital_sign: Option<String>,
    pub value: Option<f64>,
    pub severity: Option<String>,
}
