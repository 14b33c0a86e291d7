use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::{info, instrument, warn};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{
    ReadingSource, RecordVitalSignsRequest, RecordVitalsResponse, VitalSignsAnalysis, VitalSignsReading,
};
use vital_watch_domain::services::vitals::DEFAULT_HISTORY_HOURS;
use vital_watch_domain::services::VitalsServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::entities::{HistoryQuery, SimulateQuery};

/// Service type for dependency injection
pub type VitalsService = Arc<dyn VitalsServiceTrait + Send + Sync>;

const MAX_HISTORY_HOURS: i64 = 24 * 365;

/// Record a reading and analyse it
#[utoipa::path(
    post,
    path = "/api/v1/vitals",
    request_body = RecordVitalSignsRequest,
    responses(
        (status = 201, description = "Reading stored and analysed", body = RecordVitalsResponse),
        (status = 400, description = "Reading out of the accepted ranges", body = ErrorResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(service, request))]
pub async fn record_vitals(
    State(service): State<VitalsService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<RecordVitalSignsRequest>,
) -> ApiResult<impl IntoResponse> {
    let response = service.record(&user.user_id, request, ReadingSource::Manual).await?;
    if response.alert.is_some() {
        warn!(user_id = %user.user_id, status = %response.analysis.status, "Reading raised an alert");
    }
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/v1/vitals/latest",
    responses(
        (status = 200, description = "Most recent reading", body = VitalSignsReading),
        (status = 404, description = "No vital signs data available", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(service))]
pub async fn latest_vitals(
    State(service): State<VitalsService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<VitalSignsReading>> {
    Ok(Json(service.latest(&user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/vitals/history",
    params(HistoryQuery),
    responses(
        (status = 200, description = "Readings in the window, oldest first", body = [VitalSignsReading]),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(service))]
pub async fn vitals_history(
    State(service): State<VitalsService>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<VitalSignsReading>>> {
    let hours = params.hours.unwrap_or(DEFAULT_HISTORY_HOURS).clamp(1, MAX_HISTORY_HOURS);
    Ok(Json(service.history(&user.user_id, hours).await?))
}

/// Analyse the latest reading against recent history
#[utoipa::path(
    get,
    path = "/api/v1/vitals/analysis",
    responses(
        (status = 200, description = "Analysis of the latest reading", body = VitalSignsAnalysis),
        (status = 404, description = "No vital signs data available", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(service))]
pub async fn analyze_vitals(
    State(service): State<VitalsService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<VitalSignsAnalysis>> {
    Ok(Json(service.analyze(&user.user_id).await?))
}

/// Record a generated reading
#[utoipa::path(
    post,
    path = "/api/v1/vitals/simulate",
    params(SimulateQuery),
    responses(
        (status = 201, description = "Simulated reading stored", body = RecordVitalsResponse),
    ),
    security(("bearer" = [])),
    tag = "vitals"
)]
#[instrument(skip(service))]
pub async fn simulate_vitals(
    State(service): State<VitalsService>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<SimulateQuery>,
) -> ApiResult<impl IntoResponse> {
    let abnormal = params.abnormal.unwrap_or(false);
    let response = service.simulate(&user.user_id, abnormal).await?;
    info!(user_id = %user.user_id, abnormal, "Simulated reading recorded");
    Ok((StatusCode::CREATED, Json(response)))
}
