use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::instrument;

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::AlertView;
use vital_watch_domain::services::AlertServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};

pub type AlertService = Arc<dyn AlertServiceTrait + Send + Sync>;

/// Unacknowledged alerts, newest first
#[utoipa::path(
    get,
    path = "/api/v1/alerts",
    responses(
        (status = 200, description = "Active alerts", body = [AlertView]),
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
#[instrument(skip(service))]
pub async fn list_alerts(
    State(service): State<AlertService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<AlertView>>> {
    Ok(Json(service.list_active(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/alerts/{id}/acknowledge",
    params(("id" = String, Path, description = "Alert ID")),
    responses(
        (status = 200, description = "Alert acknowledged", body = AlertView),
        (status = 403, description = "Alert belongs to another user", body = ErrorResponse),
        (status = 404, description = "Alert not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "alerts"
)]
#[instrument(skip(service))]
pub async fn acknowledge_alert(
    State(service): State<AlertService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> ApiResult<Json<AlertView>> {
    Ok(Json(service.acknowledge(&user.user_id, &id).await?))
}
