use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::debug;

use vital_watch_domain::auth::{auth_info, auth_middleware, configure_auth, logout, refresh_token};

use crate::api::handlers::{
    accounts, alerts, contacts, emergency, export, health, insights, medications, notifications, reports, vitals,
    watch,
};
use crate::api::state::AppState;
use crate::api::ws::ws_handler;
use crate::openapi::configure_swagger_routes;

/// Create the application router
pub fn create_app(state: AppState) -> Router {
    debug!("Creating application router");

    // Routes that require a valid access token
    let api_routes = Router::new()
        .route("/auth/info", get(auth_info))
        .route("/auth/logout", post(logout))
        .route("/profile", get(accounts::get_profile).put(accounts::update_profile))
        .route("/profile/medical", put(accounts::update_medical_info))
        .route("/profile/password", post(accounts::change_password))
        .route("/vitals", post(vitals::record_vitals))
        .route("/vitals/latest", get(vitals::latest_vitals))
        .route("/vitals/history", get(vitals::vitals_history))
        .route("/vitals/analysis", get(vitals::analyze_vitals))
        .route("/vitals/simulate", post(vitals::simulate_vitals))
        .route("/contacts", get(contacts::list_contacts).post(contacts::create_contact))
        .route(
            "/contacts/:id",
            get(contacts::get_contact)
                .put(contacts::update_contact)
                .delete(contacts::delete_contact),
        )
        // Static segments take priority over `:id`
        .route("/medications", get(medications::list_medications).post(medications::create_medication))
        .route("/medications/today", get(medications::todays_medications))
        .route("/medications/reminders/check", post(medications::check_reminders))
        .route(
            "/medications/:id",
            get(medications::get_medication)
                .put(medications::update_medication)
                .delete(medications::delete_medication),
        )
        .route("/alerts", get(alerts::list_alerts))
        .route("/alerts/:id/acknowledge", post(alerts::acknowledge_alert))
        .route("/sos", post(emergency::trigger_sos))
        .route("/insights", get(insights::get_insights))
        .route("/predictions", get(insights::get_predictions))
        .route("/anomalies", get(insights::get_anomalies))
        .route(
            "/notifications/preferences",
            get(notifications::get_preferences).put(notifications::update_preferences),
        )
        .route("/notifications/logs", get(notifications::get_logs))
        .route("/notifications/test", post(notifications::send_test))
        .route("/reports/generate", get(reports::generate_report))
        .route("/reports/stats", get(reports::report_stats))
        .route("/reports/schedules", get(reports::list_schedules).post(reports::create_schedule))
        .route(
            "/reports/schedules/:id",
            put(reports::update_schedule).delete(reports::delete_schedule),
        )
        .route("/reports/:timeframe", get(reports::timeframe_report))
        .route("/export/:format", get(export::export_data))
        .route("/watch/medications", get(watch::watch_medications))
        .route("/watch/vitals", post(watch::watch_vitals))
        .route("/watch/sos", post(watch::watch_sos))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<AppState>,
        ));

    debug!("API routes configured");

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/auth/refresh", post(refresh_token))
        .route("/ws", get(ws_handler));

    debug!("Public routes configured");

    let app = Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .with_state(state);

    let app = add_swagger_ui(app);
    debug!("Swagger UI merged");

    let app = configure_auth(app).layer(TraceLayer::new_for_http());
    debug!("Security configuration applied");

    health::initialize_server_start_time();

    app
}

/// Add Swagger UI to the router
pub fn add_swagger_ui(app: Router) -> Router {
    app.merge(configure_swagger_routes())
}
