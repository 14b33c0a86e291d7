use std::sync::Once;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use vital_watch_api::api::{create_application, AppState};
use vital_watch_domain::database::DatabasePool;
use vital_watch_domain::delivery::DeliveryChannels;
use vital_watch_domain::events::EventBus;
use vital_watch_domain::services::ServiceRegistry;

static INIT: Once = Once::new();

fn initialize() {
    INIT.call_once(|| {
        std::env::set_var("JWT_SECRET", "integration-test-secret-key-for-vital-watch");
        std::env::remove_var("BYPASS_AUTH");
    });
}

fn create_test_app() -> Router {
    initialize();
    let pool = DatabasePool::in_memory().expect("in-memory pool");
    let services = ServiceRegistry::new(pool, DeliveryChannels::new(EventBus::default()));
    create_application(AppState::new(services))
}

async fn send(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, token, body).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("invalid JSON ({}): {:?}", e, bytes))
    };
    (status, value)
}

/// Register and log in, returning the access token
async fn sign_up(app: &Router, username: &str) -> String {
    let (status, _) = send_json(
        app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "correct-horse",
            "confirm_password": "correct-horse",
            "first_name": "Test",
            "last_name": "Patient"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": format!("{}@EXAMPLE.com", username), "password": "correct-horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    body["access_token"].as_str().expect("access token").to_string()
}

#[tokio::test]
async fn test_health_endpoint_reports_version() {
    let app = create_test_app();

    let (status, body) = send_json(&app, Method::GET, "/health", None, None).await;

    // The global pool is not initialised in tests, so only the shape is stable
    assert!(matches!(
        status,
        StatusCode::OK | StatusCode::SERVICE_UNAVAILABLE | StatusCode::INTERNAL_SERVER_ERROR
    ));
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["components"]["database"]["status"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = create_test_app();

    let (status, _) = send(&app, Method::GET, "/api/v1/vitals/latest", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/v1/profile", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_mismatched_passwords() {
    let app = create_test_app();

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "mismatch",
            "email": "mismatch@example.com",
            "password": "correct-horse",
            "confirm_password": "battery-staple",
            "first_name": "Test",
            "last_name": "Patient"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Passwords do not match");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = create_test_app();
    sign_up(&app, "twice").await;

    let (status, _) = send_json(
        &app,
        Method::POST,
        "/auth/register",
        None,
        Some(json!({
            "username": "twice-again",
            "email": "twice@example.com",
            "password": "correct-horse",
            "confirm_password": "correct-horse",
            "first_name": "Test",
            "last_name": "Patient"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = create_test_app();
    sign_up(&app, "wrongpw").await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/auth/login",
        None,
        Some(json!({ "email": "wrongpw@example.com", "password": "not-the-password" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_profile_and_vitals_flow() {
    let app = create_test_app();
    let token = sign_up(&app, "flow").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["username"], "flow");

    let (status, _) = send_json(&app, Method::GET, "/api/v1/vitals/latest", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/vitals",
        Some(&token),
        Some(json!({
            "heart_rate": 130.0,
            "blood_pressure_systolic": 120.0,
            "blood_pressure_diastolic": 80.0,
            "temperature": 36.9,
            "oxygen_saturation": 97.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["analysis"]["status"], "alert");
    let alert_id = body["alert"]["id"].as_str().expect("alert raised").to_string();

    let (status, body) = send_json(&app, Method::GET, "/api/v1/alerts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let uri = format!("/api/v1/alerts/{}/acknowledge", alert_id);
    let (status, body) = send_json(&app, Method::POST, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["acknowledged"], true);

    let (status, body) = send_json(&app, Method::GET, "/api/v1/alerts", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_static_medication_routes_win_over_id() {
    let app = create_test_app();
    let token = sign_up(&app, "meds").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/medications/today", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());

    let (status, body) = send_json(&app, Method::POST, "/api/v1/medications/reminders/check", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_array());

    let (status, _) = send_json(&app, Method::GET, "/api/v1/medications/unknown-id", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contacts_are_scoped_to_their_owner() {
    let app = create_test_app();
    let owner = sign_up(&app, "owner").await;
    let other = sign_up(&app, "intruder").await;

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/contacts",
        Some(&owner),
        Some(json!({ "name": "Rita", "phone": "+15550123", "relationship": "Sister" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let uri = format!("/api/v1/contacts/{}", body["id"].as_str().unwrap());

    let (status, _) = send_json(&app, Method::GET, &uri, Some(&other), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::DELETE, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send_json(&app, Method::GET, &uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sos_without_contacts_is_bad_request() {
    let app = create_test_app();
    let token = sign_up(&app, "lonely").await;

    let (status, body) = send_json(&app, Method::POST, "/api/v1/sos", Some(&token), Some(json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Please add emergency contacts first");
}

#[tokio::test]
async fn test_export_routes() {
    let app = create_test_app();
    let token = sign_up(&app, "exporter").await;

    let (status, _) = send_json(&app, Method::GET, "/api/v1/export/csv", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, Method::GET, "/api/v1/export/xml", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, bytes) = send(&app, Method::GET, "/api/v1/export/csv?type=vitals&days=7", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("timestamp,"));
}

#[tokio::test]
async fn test_report_routes() {
    let app = create_test_app();
    let token = sign_up(&app, "reporter").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/reports/weekly", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());

    let (status, _) = send_json(&app, Method::GET, "/api/v1/reports/yearly", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send_json(&app, Method::GET, "/api/v1/reports/stats?days=7", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["period_days"], 7);

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/api/v1/reports/schedules",
        Some(&token),
        Some(json!({ "frequency": "fortnightly" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = create_test_app();
    let token = sign_up(&app, "leaver").await;

    let (status, body) = send_json(&app, Method::GET, "/api/v1/auth/info", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["auth_source"], "jwt");

    let (status, _) = send_json(&app, Method::POST, "/api/v1/auth/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/v1/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_websocket_requires_valid_token() {
    let app = create_test_app();

    let (status, _) = send(&app, Method::GET, "/ws", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/ws?token=garbage", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = create_test_app();

    let (status, body) = send_json(&app, Method::GET, "/api-docs/openapi.json", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "VitalWatch API");
}
