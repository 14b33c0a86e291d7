use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a prescribed medication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    /// Free-form frequency such as "twice daily"
    pub frequency: String,
    pub start_date: NaiveDate,
    /// Open-ended when absent
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Medication {
    /// Whether the medication is being taken on `date`
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && self.end_date.map_or(true, |end| end >= date)
    }
}

/// Input data for creating a medication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
}
