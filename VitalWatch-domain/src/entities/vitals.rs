use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::alert::AlertView;

/// One set of vital-sign measurements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalSignsReading {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    /// Beats per minute
    pub heart_rate: f64,
    /// mmHg
    pub blood_pressure_systolic: f64,
    /// mmHg
    pub blood_pressure_diastolic: f64,
    /// Degrees Celsius
    pub temperature: f64,
    /// Percent
    pub oxygen_saturation: f64,
}

/// Payload for recording a reading
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RecordVitalSignsRequest {
    #[validate(range(min = 20.0, max = 250.0, message = "Heart rate must be between 20 and 250"))]
    pub heart_rate: f64,

    #[validate(range(min = 50.0, max = 260.0, message = "Systolic pressure must be between 50 and 260"))]
    pub blood_pressure_systolic: f64,

    #[validate(range(min = 30.0, max = 160.0, message = "Diastolic pressure must be between 30 and 160"))]
    pub blood_pressure_diastolic: f64,

    #[validate(range(min = 30.0, max = 45.0, message = "Temperature must be between 30 and 45"))]
    pub temperature: f64,

    #[validate(range(min = 50.0, max = 100.0, message = "Oxygen saturation must be between 50 and 100"))]
    pub oxygen_saturation: f64,

    /// Defaults to now
    pub timestamp: Option<DateTime<Utc>>,
}

/// Where a reading came from; decides the type of alert it raises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingSource {
    Manual,
    Watch,
    Simulated,
}

impl ReadingSource {
    pub fn alert_type(&self) -> &'static str {
        match self {
            ReadingSource::Watch => "WATCH_ALERT",
            ReadingSource::Manual | ReadingSource::Simulated => "vital_signs",
        }
    }

    pub fn alert_prefix(&self) -> &'static str {
        match self {
            ReadingSource::Watch => "Health concerns detected via watch: ",
            ReadingSource::Manual | ReadingSource::Simulated => "Health concerns detected: ",
        }
    }
}

/// Result of checking a reading against ranges and history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalSignsAnalysis {
    /// `normal` or `alert`
    pub status: String,
    /// Out-of-range messages such as "High heart rate: 120.0"
    pub alerts: Vec<String>,
    pub critical_concerns: Vec<String>,
    pub anomalies: Vec<String>,
    pub trends: Vec<String>,
    pub predictions: Vec<String>,
}

impl VitalSignsAnalysis {
    pub fn is_critical(&self) -> bool {
        !self.critical_concerns.is_empty()
    }

    pub fn needs_alert(&self) -> bool {
        !self.alerts.is_empty() || !self.anomalies.is_empty()
    }
}

/// Outcome of recording a reading
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct RecordVitalsResponse {
    pub reading: VitalSignsReading,
    pub analysis: VitalSignsAnalysis,
    pub alert: Option<AlertView>,
    pub emergency_triggered: bool,
}

/// Reading that deviates from the user's recent history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct AnomalyPoint {
    pub timestamp: DateTime<Utc>,
    pub vital_sign: String,
    pub value: f64,
    /// `"{low} - {high}"`, one standard deviation around the mean
    pub expected_range: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ForecastPoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Forecast per vital sign name
pub type TrendForecast = BTreeMap<String, Vec<ForecastPoint>>;

/// Human-readable finding produced from anomalies and forecasts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Insight {
    /// `anomaly` or `trend`
    #[serde(rename = "type")]
    pub insight_type: String,
    /// `info`, `warning` or `danger`
    pub severity: String,
    pub message: String,
}
