use axum::{
    body::to_bytes,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;

use vital_watch_domain::entities::{CreateContactRequest, RecordVitalSignsRequest};
use vital_watch_domain::services::emergency::WATCH_SOS_MESSAGE;

use super::{normal_reading, registered_user, test_services};
use crate::api::handlers::{contacts, insights, vitals, watch};
use crate::entities::{HistoryQuery, PredictionQuery, SimulateQuery};

async fn json_body(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_record_vitals_returns_created() {
    let services = test_services();
    let user = registered_user(&services, "alice").await;

    let response = vitals::record_vitals(State(services.vitals.clone()), Extension(user), Json(normal_reading()))
        .await
        .unwrap()
        .into_response();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["reading"]["heart_rate"], 72.0);
    assert_eq!(body["analysis"]["status"], "normal");
    assert!(body["alert"].is_null());
}

#[tokio::test]
async fn test_record_vitals_rejects_out_of_range_values() {
    let services = test_services();
    let user = registered_user(&services, "bob").await;

    let request = RecordVitalSignsRequest {
        heart_rate: 400.0,
        ..normal_reading()
    };
    let err = vitals::record_vitals(State(services.vitals.clone()), Extension(user), Json(request))
        .await
        .err()
        .expect("validation error");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_latest_vitals_without_readings_is_not_found() {
    let services = test_services();
    let user = registered_user(&services, "carol").await;

    let err = vitals::latest_vitals(State(services.vitals.clone()), Extension(user))
        .await
        .err()
        .expect("no readings yet");

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert_eq!(err.message, "No vital signs data available");
}

#[tokio::test]
async fn test_history_and_simulation() {
    let services = test_services();
    let user = registered_user(&services, "dave").await;

    let response = vitals::simulate_vitals(
        State(services.vitals.clone()),
        Extension(user.clone()),
        Query(SimulateQuery { abnormal: Some(false) }),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Out-of-range hours are clamped rather than rejected
    let Json(history) = vitals::vitals_history(
        State(services.vitals.clone()),
        Extension(user),
        Query(HistoryQuery { hours: Some(-5) }),
    )
    .await
    .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_watch_vitals_are_recorded() {
    let services = test_services();
    let user = registered_user(&services, "erin").await;

    let response = watch::watch_vitals(State(services.vitals.clone()), Extension(user.clone()), Json(normal_reading()))
        .await
        .unwrap()
        .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    let latest = services.vitals.latest(&user.user_id).await.unwrap();
    assert_eq!(latest.oxygen_saturation, 98.0);
}

#[tokio::test]
async fn test_watch_sos_without_contacts_is_rejected() {
    let services = test_services();
    let user = registered_user(&services, "frank").await;

    let err = watch::watch_sos(State(services.emergency.clone()), Extension(user.clone()), None)
        .await
        .err()
        .expect("no contacts on file");

    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert!(services.alerts.list_active(&user.user_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_watch_sos_uses_default_message() {
    let services = test_services();
    let user = registered_user(&services, "grace").await;

    let created = contacts::create_contact(
        State(services.contacts.clone()),
        Extension(user.clone()),
        Json(CreateContactRequest {
            name: "Henry".to_string(),
            relationship: Some("Brother".to_string()),
            phone: "+15550100".to_string(),
            email: None,
        }),
    )
    .await
    .unwrap()
    .into_response();
    assert_eq!(created.status(), StatusCode::CREATED);

    let Json(result) = watch::watch_sos(State(services.emergency.clone()), Extension(user.clone()), None)
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.contacts_notified, 1);

    let alerts = services.alerts.list_active(&user.user_id).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains(WATCH_SOS_MESSAGE));
}

#[tokio::test]
async fn test_predictions_with_few_readings_are_empty() {
    let services = test_services();
    let user = registered_user(&services, "hana").await;
    services
        .vitals
        .record(&user.user_id, normal_reading(), vital_watch_domain::entities::ReadingSource::Manual)
        .await
        .unwrap();

    let Json(forecast) = insights::get_predictions(
        State(services.insights.clone()),
        Extension(user.clone()),
        Query(PredictionQuery::default()),
    )
    .await
    .unwrap();
    assert!(forecast.is_empty());

    let Json(found) = insights::get_insights(State(services.insights.clone()), Extension(user))
        .await
        .unwrap();
    assert!(found.is_empty());
}
