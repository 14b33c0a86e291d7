use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a recurring health report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSchedule {
    pub id: String,
    pub user_id: String,
    /// `daily`, `weekly` or `monthly`
    pub frequency: String,
    /// Number of days each report covers
    pub report_period: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input data for creating a schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReportSchedule {
    pub user_id: String,
    pub frequency: String,
    pub report_period: u32,
}
