// Domain services
// This module contains business logic implementations.

pub mod accounts;
pub mod alerts;
pub mod analysis;
pub mod contacts;
pub mod emergency;
pub mod errors;
pub mod export;
pub mod medications;
pub mod notifications;
pub mod predictive;
pub mod reminders;
pub mod reports;
pub mod vitals;

use std::sync::Arc;

use vital_watch_data::database::{self, DatabaseError, DatabasePool};
use vital_watch_data::repository::{
    AlertRepository, AlertRepositoryTrait, EmergencyContactRepository, EmergencyContactRepositoryTrait,
    MedicationRepository, MedicationRepositoryTrait, NotificationRepository, NotificationRepositoryTrait,
    ReportScheduleRepository, ReportScheduleRepositoryTrait, UserRepository, UserRepositoryTrait,
    VitalSignsRepository, VitalSignsRepositoryTrait,
};

use crate::delivery::DeliveryChannels;
use crate::events::EventBus;

// Re-export service traits and implementations
pub use accounts::{AccountService, AccountServiceTrait};
pub use alerts::{AlertService, AlertServiceTrait};
pub use contacts::{ContactService, ContactServiceTrait};
pub use emergency::{EmergencyService, EmergencyServiceTrait};
pub use errors::ServiceError;
pub use export::{ExportService, ExportServiceTrait};
pub use medications::{MedicationService, MedicationServiceTrait};
pub use notifications::{NotificationService, NotificationServiceTrait};
pub use predictive::{InsightService, InsightServiceTrait};
pub use reminders::{ReminderService, ReminderServiceTrait};
pub use reports::{ReportService, ReportServiceTrait};
pub use vitals::{VitalsService, VitalsServiceTrait};

/// Repositories shared by the services that span several tables
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepositoryTrait + Send + Sync>,
    pub vitals: Arc<dyn VitalSignsRepositoryTrait + Send + Sync>,
    pub contacts: Arc<dyn EmergencyContactRepositoryTrait + Send + Sync>,
    pub medications: Arc<dyn MedicationRepositoryTrait + Send + Sync>,
    pub alerts: Arc<dyn AlertRepositoryTrait + Send + Sync>,
    pub notifications: Arc<dyn NotificationRepositoryTrait + Send + Sync>,
    pub schedules: Arc<dyn ReportScheduleRepositoryTrait + Send + Sync>,
}

impl Repositories {
    /// SQLite repositories over one pool
    pub fn sqlite(pool: DatabasePool) -> Self {
        Self {
            users: Arc::new(UserRepository::new(pool.clone())),
            vitals: Arc::new(VitalSignsRepository::new(pool.clone())),
            contacts: Arc::new(EmergencyContactRepository::new(pool.clone())),
            medications: Arc::new(MedicationRepository::new(pool.clone())),
            alerts: Arc::new(AlertRepository::new(pool.clone())),
            notifications: Arc::new(NotificationRepository::new(pool.clone())),
            schedules: Arc::new(ReportScheduleRepository::new(pool)),
        }
    }
}

/// Every service the API and the scheduler need, wired together
#[derive(Clone)]
pub struct ServiceRegistry {
    pub accounts: Arc<dyn AccountServiceTrait + Send + Sync>,
    pub vitals: Arc<dyn VitalsServiceTrait + Send + Sync>,
    pub contacts: Arc<dyn ContactServiceTrait + Send + Sync>,
    pub medications: Arc<dyn MedicationServiceTrait + Send + Sync>,
    pub reminders: Arc<dyn ReminderServiceTrait + Send + Sync>,
    pub alerts: Arc<dyn AlertServiceTrait + Send + Sync>,
    pub emergency: Arc<dyn EmergencyServiceTrait + Send + Sync>,
    pub notifications: Arc<dyn NotificationServiceTrait + Send + Sync>,
    pub insights: Arc<dyn InsightServiceTrait + Send + Sync>,
    pub reports: Arc<dyn ReportServiceTrait + Send + Sync>,
    pub export: Arc<dyn ExportServiceTrait + Send + Sync>,
    pub bus: EventBus,
}

impl ServiceRegistry {
    pub fn new(pool: DatabasePool, channels: DeliveryChannels) -> Self {
        let repos = Repositories::sqlite(pool.clone());
        let bus = channels.bus.clone();

        let notifications: Arc<dyn NotificationServiceTrait + Send + Sync> =
            Arc::new(NotificationService::new(repos.clone(), channels.clone()));
        let emergency: Arc<dyn EmergencyServiceTrait + Send + Sync> =
            Arc::new(EmergencyService::new(repos.clone(), channels));

        Self {
            accounts: Arc::new(AccountService::new(repos.clone())),
            vitals: Arc::new(VitalsService::new(repos.clone(), emergency.clone(), bus.clone())),
            contacts: Arc::new(ContactService::new(EmergencyContactRepository::new(pool.clone()))),
            medications: Arc::new(MedicationService::new(MedicationRepository::new(pool.clone()))),
            reminders: Arc::new(ReminderService::new(repos.clone(), bus.clone())),
            alerts: Arc::new(AlertService::new(AlertRepository::new(pool))),
            emergency,
            insights: Arc::new(InsightService::new(repos.clone(), notifications.clone())),
            notifications,
            reports: Arc::new(ReportService::new(repos.clone())),
            export: Arc::new(ExportService::new(repos)),
            bus,
        }
    }
}

/// Build the services over the global pool with senders from the environment
pub fn create_default_services(bus: EventBus) -> Result<ServiceRegistry, DatabaseError> {
    let pool = database::get_db_pool()?;
    Ok(ServiceRegistry::new(pool, DeliveryChannels::from_env(bus)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::entities::RecordVitalSignsRequest;
    use vital_watch_data::models::NewUser;

    pub fn repositories() -> (DatabasePool, Repositories) {
        let pool = DatabasePool::in_memory().unwrap();
        (pool.clone(), Repositories::sqlite(pool))
    }

    pub async fn seed_user(repos: &Repositories, username: &str, phone: Option<&str>) -> String {
        repos
            .users
            .create(NewUser {
                username: username.to_string(),
                email: format!("{}@example.com", username),
                password_hash: "hash".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                phone: phone.map(str::to_string),
            })
            .await
            .unwrap()
            .id
    }

    pub fn vitals_request(hr: f64, sys: f64, dia: f64, temp: f64, spo2: f64) -> RecordVitalSignsRequest {
        RecordVitalSignsRequest {
            heart_rate: hr,
            blood_pressure_systolic: sys,
            blood_pressure_diastolic: dia,
            temperature: temp,
            oxygen_saturation: spo2,
            timestamp: None,
        }
    }
}
