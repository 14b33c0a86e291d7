use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::{info, instrument};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{
    CreateScheduleRequest, HealthReport, ReportScheduleView, ReportStats, TimeframeReport, UpdateScheduleRequest,
};
use vital_watch_domain::services::reports::DEFAULT_REPORT_DAYS;
use vital_watch_domain::services::ReportServiceTrait;

use super::export::attachment;
use crate::api::error::{ApiResult, ErrorResponse};
use crate::entities::{DaysQuery, ReportQuery};

pub type ReportService = Arc<dyn ReportServiceTrait + Send + Sync>;

const MAX_REPORT_DAYS: u32 = 365;

fn report_days(days: Option<u32>) -> u32 {
    days.unwrap_or(DEFAULT_REPORT_DAYS).clamp(1, MAX_REPORT_DAYS)
}

/// Chart data for one timeframe
#[utoipa::path(
    get,
    path = "/api/v1/reports/{timeframe}",
    params(("timeframe" = String, Path, description = "`daily`, `weekly` or `monthly`")),
    responses(
        (status = 200, description = "Series and per-day insights", body = TimeframeReport),
        (status = 400, description = "Invalid timeframe", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service))]
pub async fn timeframe_report(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
    Path(timeframe): Path<String>,
) -> ApiResult<Json<TimeframeReport>> {
    Ok(Json(service.timeframe_report(&user.user_id, &timeframe).await?))
}

/// Generate a health report as JSON or as a text download
#[utoipa::path(
    get,
    path = "/api/v1/reports/generate",
    params(ReportQuery),
    responses(
        (status = 200, description = "Health report", body = HealthReport),
        (status = 400, description = "Unsupported report format", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service))]
pub async fn generate_report(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<ReportQuery>,
) -> ApiResult<Response> {
    let days = report_days(params.days);
    let format = params.format.as_deref().unwrap_or("json").to_lowercase();

    match format.as_str() {
        "json" => {
            let report = service.generate_report(&user.user_id, days).await?;
            Ok(Json(report).into_response())
        }
        "text" | "txt" => {
            let file = service.download_report(&user.user_id, days).await?;
            info!(user_id = %user.user_id, filename = %file.filename, "Report downloaded");
            Ok(attachment(file))
        }
        other => Err(ErrorResponse::bad_request(format!(
            "Unsupported report format '{}'. Use json or text",
            other
        ))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/stats",
    params(DaysQuery),
    responses(
        (status = 200, description = "Reading and alert counts", body = ReportStats),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service))]
pub async fn report_stats(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<DaysQuery>,
) -> ApiResult<Json<ReportStats>> {
    Ok(Json(service.stats(&user.user_id, report_days(params.days)).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/reports/schedules",
    responses(
        (status = 200, description = "Report schedules of the caller", body = [ReportScheduleView]),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service))]
pub async fn list_schedules(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<ReportScheduleView>>> {
    Ok(Json(service.list_schedules(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/reports/schedules",
    request_body = CreateScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = ReportScheduleView),
        (status = 400, description = "Invalid frequency", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service, request))]
pub async fn create_schedule(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<CreateScheduleRequest>,
) -> ApiResult<impl IntoResponse> {
    let schedule = service.create_schedule(&user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

#[utoipa::path(
    put,
    path = "/api/v1/reports/schedules/{id}",
    params(("id" = String, Path, description = "Schedule ID")),
    request_body = UpdateScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = ReportScheduleView),
        (status = 400, description = "Invalid frequency", body = ErrorResponse),
        (status = 403, description = "Schedule belongs to another user", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service, request))]
pub async fn update_schedule(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
    Json(request): Json<UpdateScheduleRequest>,
) -> ApiResult<Json<ReportScheduleView>> {
    Ok(Json(service.update_schedule(&user.user_id, &id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/reports/schedules/{id}",
    params(("id" = String, Path, description = "Schedule ID")),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 403, description = "Schedule belongs to another user", body = ErrorResponse),
        (status = 404, description = "Schedule not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "reports"
)]
#[instrument(skip(service))]
pub async fn delete_schedule(
    State(service): State<ReportService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete_schedule(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
