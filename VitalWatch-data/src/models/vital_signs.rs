use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for one set of vital-sign measurements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitalSigns {
    /// Unique identifier for the reading
    pub id: String,

    /// Owning user
    pub user_id: String,

    /// When the reading was taken
    pub timestamp: DateTime<Utc>,

    /// Heart rate in beats per minute
    pub heart_rate: f64,

    /// Systolic blood pressure in mmHg
    pub blood_pressure_systolic: f64,

    /// Diastolic blood pressure in mmHg
    pub blood_pressure_diastolic: f64,

    /// Body temperature in degrees Celsius
    pub temperature: f64,

    /// Blood oxygen saturation in percent
    pub oxygen_saturation: f64,
}

/// Input data for storing a reading
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVitalSigns {
    pub user_id: String,
    /// Defaults to the current time when absent
    pub timestamp: Option<DateTime<Utc>>,
    pub heart_rate: f64,
    pub blood_pressure_systolic: f64,
    pub blood_pressure_diastolic: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
}
