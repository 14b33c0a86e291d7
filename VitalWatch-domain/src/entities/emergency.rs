use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

/// Vital values quoted in an emergency message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalSnapshot {
    pub heart_rate: f64,
    pub blood_pressure_systolic: f64,
    pub blood_pressure_diastolic: f64,
    pub temperature: f64,
    pub oxygen_saturation: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct SosRequest {
    pub message: Option<String>,
    /// Free-form location, e.g. an address or "lat,lon"
    pub location: Option<String>,
    pub vital_signs: Option<VitalSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct EmergencyResult {
    pub success: bool,
    pub message: String,
    pub contacts_notified: usize,
    pub alert_id: String,
}
