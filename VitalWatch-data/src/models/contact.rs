use serde::{Deserialize, Serialize};

/// Storage model for a person notified in an emergency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub relationship: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}

/// Input data for creating an emergency contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEmergencyContact {
    pub user_id: String,
    pub name: String,
    pub relationship: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}
