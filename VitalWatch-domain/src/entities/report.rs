use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

use super::alert::AlertView;
use super::medication::MedicationView;

/// Chart data for the daily, weekly or monthly dashboard view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct TimeframeReport {
    pub timeframe: String,
    pub start: DateTime<Utc>,
    /// `YYYY-MM-DD HH:MM`, one per reading
    pub timestamps: Vec<String>,
    pub heart_rate: Vec<f64>,
    pub blood_pressure_systolic: Vec<f64>,
    pub blood_pressure_diastolic: Vec<f64>,
    pub temperature: Vec<f64>,
    pub oxygen_saturation: Vec<f64>,
    pub insights: Vec<DailyInsight>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct DailyInsight {
    pub date: NaiveDate,
    pub avg_heart_rate: f64,
    pub avg_spo2: f64,
    pub avg_temperature: f64,
    /// Alerts raised that day
    pub alerts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalStatistics {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct VitalStatisticsSummary {
    pub heart_rate: VitalStatistics,
    pub blood_pressure_systolic: VitalStatistics,
    pub blood_pressure_diastolic: VitalStatistics,
    pub temperature: VitalStatistics,
    pub oxygen_saturation: VitalStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct AlertSummary {
    pub total: usize,
    pub warning: usize,
    pub danger: usize,
    /// Five most recent alerts
    pub recent: Vec<AlertView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct HealthReport {
    pub patient_name: String,
    pub generated_at: DateTime<Utc>,
    pub period_days: u32,
    /// Absent when no readings fall inside the period
    pub vital_statistics: Option<VitalStatisticsSummary>,
    pub alert_summary: AlertSummary,
    pub medications: Vec<MedicationView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ReportStats {
    pub period_days: u32,
    pub vital_statistics: Option<VitalStatisticsSummary>,
    pub alert_summary: AlertSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct ReportScheduleView {
    pub id: String,
    pub frequency: String,
    pub report_period: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateScheduleRequest {
    /// `daily`, `weekly` or `monthly`
    pub frequency: String,

    /// Days covered by each report, 30 when absent
    #[validate(range(min = 1, max = 365, message = "Report period must be between 1 and 365 days"))]
    pub report_period: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateScheduleRequest {
    pub frequency: Option<String>,

    #[validate(range(min = 1, max = 365, message = "Report period must be between 1 and 365 days"))]
    pub report_period: Option<u32>,

    pub active: Option<bool>,
}

/// A rendered file ready to be downloaded
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}
