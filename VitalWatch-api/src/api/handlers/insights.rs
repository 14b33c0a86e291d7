use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use tracing::instrument;

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{AnomalyPoint, Insight, TrendForecast};
use vital_watch_domain::services::predictive::{DEFAULT_FORECAST_HOURS, DEFAULT_WINDOW_HOURS};
use vital_watch_domain::services::InsightServiceTrait;

use crate::api::error::ApiResult;
use crate::entities::{PredictionQuery, WindowQuery};

pub type InsightService = Arc<dyn InsightServiceTrait + Send + Sync>;

const MAX_WINDOW_HOURS: i64 = 24 * 90;
const MAX_FORECAST_STEPS: u32 = 48;

/// Anomalies and trend findings; warnings are also stored as alerts
#[utoipa::path(
    get,
    path = "/api/v1/insights",
    responses(
        (status = 200, description = "Insights for the last day; empty with too few readings", body = [Insight]),
    ),
    security(("bearer" = [])),
    tag = "insights"
)]
#[instrument(skip(service))]
pub async fn get_insights(
    State(service): State<InsightService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<Insight>>> {
    Ok(Json(service.generate_insights(&user.user_id).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/predictions",
    params(PredictionQuery),
    responses(
        (status = 200, description = "Forecast per vital sign; empty with fewer than 10 readings", body = serde_json::Value),
    ),
    security(("bearer" = [])),
    tag = "insights"
)]
#[instrument(skip(service))]
pub async fn get_predictions(
    State(service): State<InsightService>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<PredictionQuery>,
) -> ApiResult<Json<TrendForecast>> {
    let hours = params.hours.unwrap_or(DEFAULT_WINDOW_HOURS).clamp(1, MAX_WINDOW_HOURS);
    let forecast = params.forecast.unwrap_or(DEFAULT_FORECAST_HOURS).clamp(1, MAX_FORECAST_STEPS);
    Ok(Json(service.predict_trends(&user.user_id, hours, forecast).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/anomalies",
    params(WindowQuery),
    responses(
        (status = 200, description = "Readings flagged as anomalous", body = [AnomalyPoint]),
    ),
    security(("bearer" = [])),
    tag = "insights"
)]
#[instrument(skip(service))]
pub async fn get_anomalies(
    State(service): State<InsightService>,
    Extension(user): Extension<UserInfo>,
    Query(params): Query<WindowQuery>,
) -> ApiResult<Json<Vec<AnomalyPoint>>> {
    let hours = params.hours.unwrap_or(DEFAULT_WINDOW_HOURS).clamp(1, MAX_WINDOW_HOURS);
    Ok(Json(service.detect_anomalies(&user.user_id, hours).await?))
}
