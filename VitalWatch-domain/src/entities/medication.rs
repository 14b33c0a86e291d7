use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MedicationView {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateMedicationRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 50, message = "Dosage is required"))]
    pub dosage: String,

    /// e.g. "once daily", "twice daily", "weekly"
    #[validate(length(min = 1, max = 50, message = "Frequency is required"))]
    pub frequency: String,

    /// `YYYY-MM-DD`
    pub start_date: NaiveDate,

    pub end_date: Option<NaiveDate>,

    #[validate(length(max = 1000, message = "Instructions cannot exceed 1000 characters"))]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateMedicationRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Dosage cannot be empty"))]
    pub dosage: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Frequency cannot be empty"))]
    pub frequency: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    #[validate(length(max = 1000, message = "Instructions cannot exceed 1000 characters"))]
    pub instructions: Option<String>,
}

/// A medication that is due now
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct MedicationReminder {
    pub medication_id: String,
    pub name: String,
    pub dosage: String,
    /// Local hour the dose is scheduled for
    pub scheduled_hour: u32,
    pub message: String,
}
