use serde::{Deserialize, Serialize};
use validator::Validate;

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct EmergencyContactView {
    pub id: String,
    pub name: String,
    pub relationship: Option<String>,
    pub phone: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct CreateContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(max = 50, message = "Relationship is too long"))]
    pub relationship: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Phone is required"))]
    pub phone: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UpdateContactRequest {
    #[validate(length(min = 1, max = 100, message = "Name cannot be empty"))]
    pub name: Option<String>,

    #[validate(length(max = 50, message = "Relationship is too long"))]
    pub relationship: Option<String>,

    #[validate(length(min = 1, max = 30, message = "Phone cannot be empty"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
}
