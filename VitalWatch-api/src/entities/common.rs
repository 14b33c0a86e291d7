use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Plain confirmation body
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Query parameters for the vital-signs history
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct HistoryQuery {
    /// Hours to look back (default: 24)
    pub hours: Option<i64>,
}

/// Query parameters for recording a simulated reading
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SimulateQuery {
    /// Push one vital out of its normal range (default: false)
    pub abnormal: Option<bool>,
}

/// Query parameters for anomaly detection
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct WindowQuery {
    /// Hours of readings to analyse (default: 24)
    pub hours: Option<i64>,
}

/// Query parameters for trend predictions
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PredictionQuery {
    /// Hours of readings to fit (default: 24)
    pub hours: Option<i64>,
    /// Forecast steps to produce (default: 4)
    pub forecast: Option<u32>,
}

/// Query parameters for report statistics
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DaysQuery {
    /// Days covered (default: 30)
    pub days: Option<u32>,
}

/// Query parameters for report generation
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReportQuery {
    /// Days covered (default: 30)
    pub days: Option<u32>,
    /// `json` (default) or `text`
    pub format: Option<String>,
}

/// Query parameters for data export
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ExportQuery {
    /// `vitals` or `alerts`; required for CSV
    #[serde(rename = "type")]
    pub data_type: Option<String>,
    /// Days covered (default: 30)
    pub days: Option<u32>,
}
