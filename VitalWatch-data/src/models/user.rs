use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Storage model for a registered patient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: String,

    /// Unique login name
    pub username: String,

    /// Unique email address, used for login
    pub email: String,

    /// Argon2 PHC hash of the password
    pub password_hash: String,

    pub first_name: String,

    pub last_name: String,

    /// Mobile number used for SMS notifications
    pub phone: Option<String>,

    pub medical_conditions: Option<String>,

    pub allergies: Option<String>,

    pub blood_type: Option<String>,

    pub date_of_birth: Option<NaiveDate>,

    pub gender: Option<String>,

    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input data for creating a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}
