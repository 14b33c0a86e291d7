mod vitals_test;

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::database::DatabasePool;
use vital_watch_domain::delivery::DeliveryChannels;
use vital_watch_domain::entities::{RecordVitalSignsRequest, RegisterRequest};
use vital_watch_domain::events::EventBus;
use vital_watch_domain::services::ServiceRegistry;

/// Services over a fresh in-memory database with in-app delivery only
pub(crate) fn test_services() -> ServiceRegistry {
    let pool = DatabasePool::in_memory().expect("in-memory pool");
    ServiceRegistry::new(pool, DeliveryChannels::new(EventBus::default()))
}

/// Register a patient and return the caller identity handlers receive
pub(crate) async fn registered_user(services: &ServiceRegistry, username: &str) -> UserInfo {
    let profile = services
        .accounts
        .register(RegisterRequest {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password: "correct-horse".to_string(),
            confirm_password: "correct-horse".to_string(),
            first_name: "Test".to_string(),
            last_name: "Patient".to_string(),
            phone: None,
        })
        .await
        .expect("registration succeeds");

    UserInfo {
        user_id: profile.id,
        auth_source: "jwt".to_string(),
    }
}

pub(crate) fn normal_reading() -> RecordVitalSignsRequest {
    RecordVitalSignsRequest {
        heart_rate: 72.0,
        blood_pressure_systolic: 118.0,
        blood_pressure_diastolic: 76.0,
        temperature: 36.8,
        oxygen_saturation: 98.0,
        timestamp: None,
    }
}
