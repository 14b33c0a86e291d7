use std::sync::Arc;

use axum::extract::FromRef;

use vital_watch_domain::events::EventBus;
use vital_watch_domain::health::{HealthService, HealthServiceTrait};
use vital_watch_domain::services::{
    AccountServiceTrait, AlertServiceTrait, ContactServiceTrait, EmergencyServiceTrait, ExportServiceTrait,
    InsightServiceTrait, MedicationServiceTrait, NotificationServiceTrait, ReminderServiceTrait,
    ReportServiceTrait, ServiceRegistry, VitalsServiceTrait,
};

/// Shared application state available to all handlers via `State<AppState>`.
///
/// Handlers extract only the service they need; every service is behind an
/// `Arc`, so cloning the state is cheap.
#[derive(Clone)]
pub struct AppState {
    pub services: ServiceRegistry,
    pub health: Arc<dyn HealthServiceTrait + Send + Sync>,
}

impl AppState {
    pub fn new(services: ServiceRegistry) -> Self {
        Self {
            services,
            health: Arc::new(HealthService),
        }
    }

    pub fn with_health(mut self, health: Arc<dyn HealthServiceTrait + Send + Sync>) -> Self {
        self.health = health;
        self
    }
}

macro_rules! service_from_state {
    ($($field:ident: $service:ident),* $(,)?) => {
        $(
            impl FromRef<AppState> for Arc<dyn $service + Send + Sync> {
                fn from_ref(state: &AppState) -> Self {
                    state.services.$field.clone()
                }
            }
        )*
    };
}

service_from_state! {
    accounts: AccountServiceTrait,
    vitals: VitalsServiceTrait,
    contacts: ContactServiceTrait,
    medications: MedicationServiceTrait,
    reminders: ReminderServiceTrait,
    alerts: AlertServiceTrait,
    emergency: EmergencyServiceTrait,
    notifications: NotificationServiceTrait,
    insights: InsightServiceTrait,
    reports: ReportServiceTrait,
    export: ExportServiceTrait,
}

impl FromRef<AppState> for EventBus {
    fn from_ref(state: &AppState) -> Self {
        state.services.bus.clone()
    }
}

impl FromRef<AppState> for Arc<dyn HealthServiceTrait + Send + Sync> {
    fn from_ref(state: &AppState) -> Self {
        state.health.clone()
    }
}
