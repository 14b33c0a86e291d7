use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

/// Registers the `bearer` scheme referenced by the protected paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::api::handlers::health::health_check,

        // Auth endpoints
        crate::api::handlers::accounts::register,
        crate::api::handlers::accounts::login,
        vital_watch_domain::auth::middleware::refresh_token,
        vital_watch_domain::auth::middleware::auth_info,
        vital_watch_domain::auth::middleware::logout,

        // Profile endpoints
        crate::api::handlers::accounts::get_profile,
        crate::api::handlers::accounts::update_profile,
        crate::api::handlers::accounts::update_medical_info,
        crate::api::handlers::accounts::change_password,

        // Vital signs endpoints
        crate::api::handlers::vitals::record_vitals,
        crate::api::handlers::vitals::latest_vitals,
        crate::api::handlers::vitals::vitals_history,
        crate::api::handlers::vitals::analyze_vitals,
        crate::api::handlers::vitals::simulate_vitals,

        // Emergency contact endpoints
        crate::api::handlers::contacts::list_contacts,
        crate::api::handlers::contacts::create_contact,
        crate::api::handlers::contacts::get_contact,
        crate::api::handlers::contacts::update_contact,
        crate::api::handlers::contacts::delete_contact,

        // Medication endpoints
        crate::api::handlers::medications::list_medications,
        crate::api::handlers::medications::todays_medications,
        crate::api::handlers::medications::create_medication,
        crate::api::handlers::medications::get_medication,
        crate::api::handlers::medications::update_medication,
        crate::api::handlers::medications::delete_medication,
        crate::api::handlers::medications::check_reminders,

        // Alerts and SOS
        crate::api::handlers::alerts::list_alerts,
        crate::api::handlers::alerts::acknowledge_alert,
        crate::api::handlers::emergency::trigger_sos,

        // Insights
        crate::api::handlers::insights::get_insights,
        crate::api::handlers::insights::get_predictions,
        crate::api::handlers::insights::get_anomalies,

        // Notifications
        crate::api::handlers::notifications::get_preferences,
        crate::api::handlers::notifications::update_preferences,
        crate::api::handlers::notifications::get_logs,
        crate::api::handlers::notifications::send_test,

        // Reports and export
        crate::api::handlers::reports::timeframe_report,
        crate::api::handlers::reports::generate_report,
        crate::api::handlers::reports::report_stats,
        crate::api::handlers::reports::list_schedules,
        crate::api::handlers::reports::create_schedule,
        crate::api::handlers::reports::update_schedule,
        crate::api::handlers::reports::delete_schedule,
        crate::api::handlers::export::export_data,

        // Watch companion
        crate::api::handlers::watch::watch_medications,
        crate::api::handlers::watch::watch_vitals,
        crate::api::handlers::watch::watch_sos
    ),
    components(
        schemas(
            // API layer
            crate::api::error::ErrorResponse,
            crate::entities::MessageResponse,
            crate::api::handlers::health::HealthResponse,
            crate::api::handlers::health::ComponentStatus,
            crate::api::handlers::health::ComponentHealthStatus,

            // Accounts
            vital_watch_domain::entities::RegisterRequest,
            vital_watch_domain::entities::LoginRequest,
            vital_watch_domain::entities::LoginResponse,
            vital_watch_domain::entities::UserProfile,
            vital_watch_domain::entities::ProfileStats,
            vital_watch_domain::entities::ProfileResponse,
            vital_watch_domain::entities::UpdateProfileRequest,
            vital_watch_domain::entities::UpdateMedicalInfoRequest,
            vital_watch_domain::entities::ChangePasswordRequest,
            vital_watch_domain::auth::UserInfo,
            vital_watch_domain::auth::Claims,

            // Vital signs and insights
            vital_watch_domain::entities::VitalSignsReading,
            vital_watch_domain::entities::RecordVitalSignsRequest,
            vital_watch_domain::entities::RecordVitalsResponse,
            vital_watch_domain::entities::VitalSignsAnalysis,
            vital_watch_domain::entities::AnomalyPoint,
            vital_watch_domain::entities::ForecastPoint,
            vital_watch_domain::entities::Insight,
            vital_watch_domain::entities::AlertView,

            // Contacts, medications and emergencies
            vital_watch_domain::entities::EmergencyContactView,
            vital_watch_domain::entities::CreateContactRequest,
            vital_watch_domain::entities::UpdateContactRequest,
            vital_watch_domain::entities::MedicationView,
            vital_watch_domain::entities::CreateMedicationRequest,
            vital_watch_domain::entities::UpdateMedicationRequest,
            vital_watch_domain::entities::MedicationReminder,
            vital_watch_domain::entities::SosRequest,
            vital_watch_domain::entities::VitalSnapshot,
            vital_watch_domain::entities::EmergencyResult,

            // Notifications
            vital_watch_domain::entities::NotificationPreferences,
            vital_watch_domain::entities::UpdatePreferencesRequest,
            vital_watch_domain::entities::NotificationLogView,
            vital_watch_domain::entities::Prediction,
            vital_watch_domain::entities::DispatchOutcome,

            // Reports
            vital_watch_domain::entities::TimeframeReport,
            vital_watch_domain::entities::DailyInsight,
            vital_watch_domain::entities::VitalStatistics,
            vital_watch_domain::entities::VitalStatisticsSummary,
            vital_watch_domain::entities::AlertSummary,
            vital_watch_domain::entities::HealthReport,
            vital_watch_domain::entities::ReportStats,
            vital_watch_domain::entities::ReportScheduleView,
            vital_watch_domain::entities::CreateScheduleRequest,
            vital_watch_domain::entities::UpdateScheduleRequest
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoint"),
        (name = "Authentication", description = "Registration, login and token management"),
        (name = "profile", description = "Patient profile and medical information"),
        (name = "vitals", description = "Vital sign readings and analysis"),
        (name = "contacts", description = "Emergency contacts"),
        (name = "medications", description = "Medication schedule and reminders"),
        (name = "alerts", description = "Health alerts"),
        (name = "emergency", description = "SOS workflow"),
        (name = "insights", description = "Anomalies, trend predictions and insights"),
        (name = "notifications", description = "Notification preferences and history"),
        (name = "reports", description = "Health reports and report schedules"),
        (name = "export", description = "CSV and JSON data export"),
        (name = "watch", description = "Smartwatch companion endpoints")
    ),
    info(
        title = "VitalWatch API",
        version = "0.1.0",
        description = "API for monitoring patient vital signs, medications and emergencies",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        ),
    ),
    servers(
        (url = "/", description = "Local development server")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_doc_generation() {
        let openapi = ApiDoc::openapi();

        assert_eq!(openapi.info.title, "VitalWatch API");
        assert_eq!(openapi.info.version, "0.1.0");

        let tags = openapi.tags.as_ref().expect("tags should be defined");
        assert!(tags.iter().any(|tag| tag.name == "vitals"));
        assert!(tags.iter().any(|tag| tag.name == "reports"));

        let paths = &openapi.paths.paths;
        for path in [
            "/health",
            "/auth/register",
            "/auth/login",
            "/auth/refresh",
            "/api/v1/auth/info",
            "/api/v1/vitals",
            "/api/v1/vitals/history",
            "/api/v1/contacts/{id}",
            "/api/v1/medications/today",
            "/api/v1/alerts/{id}/acknowledge",
            "/api/v1/sos",
            "/api/v1/predictions",
            "/api/v1/reports/{timeframe}",
            "/api/v1/reports/schedules/{id}",
            "/api/v1/export/{format}",
            "/api/v1/watch/sos",
        ] {
            assert!(paths.contains_key(path), "missing path {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let openapi = ApiDoc::openapi();
        let json = serde_json::to_value(&openapi).expect("openapi serializes");

        assert_eq!(json["components"]["securitySchemes"]["bearer"]["scheme"], "bearer");
        assert_eq!(json["components"]["securitySchemes"]["bearer"]["bearerFormat"], "JWT");
    }
}
