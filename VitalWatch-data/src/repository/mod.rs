// Repository module structure
pub mod errors;
mod alert;
mod contact;
mod medication;
mod notification;
mod report_schedule;
mod user;
mod vital_signs;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use alert::{AlertRepository, AlertRepositoryTrait};
pub use contact::{EmergencyContactRepository, EmergencyContactRepositoryTrait};
pub use medication::{MedicationRepository, MedicationRepositoryTrait};
pub use notification::{NotificationRepository, NotificationRepositoryTrait};
pub use report_schedule::{ReportScheduleRepository, ReportScheduleRepositoryTrait};
pub use user::{UserRepository, UserRepositoryTrait};
pub use vital_signs::{VitalSignsRepository, VitalSignsRepositoryTrait};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{UserRepository, UserRepositoryTrait};
    use crate::database::DatabasePool;
    use crate::models::user::NewUser;

    /// Insert a user so rows with a foreign key can be stored
    pub async fn seed_user(pool: &DatabasePool, username: &str) -> String {
        UserRepository::new(pool.clone())
            .create(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "hash".to_string(),
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                phone: None,
            })
            .await
            .unwrap()
            .id
    }
}
