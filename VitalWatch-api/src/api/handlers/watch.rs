//! Endpoints used by the companion smartwatch app.
//!
//! These mirror the patient endpoints but tag readings with the watch as
//! their source and accept an SOS without a body.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use tracing::{info, instrument, warn};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{
    EmergencyResult, MedicationView, ReadingSource, RecordVitalSignsRequest, RecordVitalsResponse, SosRequest,
};
use vital_watch_domain::services::emergency::WATCH_SOS_MESSAGE;

use super::emergency::EmergencyService;
use super::medications::MedicationService;
use super::vitals::VitalsService;
use crate::api::error::{ApiResult, ErrorResponse};

#[utoipa::path(
    get,
    path = "/api/v1/watch/medications",
    responses(
        (status = 200, description = "Medications to show on the watch today", body = [MedicationView]),
    ),
    security(("bearer" = [])),
    tag = "watch"
)]
#[instrument(skip(service))]
pub async fn watch_medications(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<MedicationView>>> {
    Ok(Json(service.active_today(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/watch/vitals",
    request_body = RecordVitalSignsRequest,
    responses(
        (status = 201, description = "Watch reading stored and analysed", body = RecordVitalsResponse),
        (status = 400, description = "Reading out of the accepted ranges", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "watch"
)]
#[instrument(skip(service, request))]
pub async fn watch_vitals(
    State(service): State<VitalsService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<RecordVitalSignsRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = service.record(&user.user_id, request, ReadingSource::Watch).await?;
    info!(user_id = %user.user_id, emergency = response.emergency_triggered, "Watch reading recorded");
    Ok((StatusCode::CREATED, Json(response)))
}

/// SOS from the watch; the body is optional
#[utoipa::path(
    post,
    path = "/api/v1/watch/sos",
    request_body(content = SosRequest, description = "Optional location and message"),
    responses(
        (status = 200, description = "Contacts notified", body = EmergencyResult),
        (status = 400, description = "No emergency contacts on file", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "watch"
)]
#[instrument(skip(service, body))]
pub async fn watch_sos(
    State(service): State<EmergencyService>,
    Extension(user): Extension<UserInfo>,
    body: Option<Json<SosRequest>>,
) -> ApiResult<Json<EmergencyResult>> {
    let mut request = body.map(|Json(request)| request).unwrap_or_default();
    if request.message.as_deref().map_or(true, |m| m.trim().is_empty()) {
        request.message = Some(WATCH_SOS_MESSAGE.to_string());
    }

    warn!(user_id = %user.user_id, "SOS triggered from watch");
    Ok(Json(service.handle_emergency(&user.user_id, request).await?))
}
