use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::instrument;

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{
    DispatchOutcome, NotificationLogView, NotificationPreferences, UpdatePreferencesRequest,
};
use vital_watch_domain::services::NotificationServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};

pub type NotificationService = Arc<dyn NotificationServiceTrait + Send + Sync>;

#[utoipa::path(
    get,
    path = "/api/v1/notifications/preferences",
    responses(
        (status = 200, description = "Notification preferences", body = NotificationPreferences),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(service))]
pub async fn get_preferences(
    State(service): State<NotificationService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<NotificationPreferences>> {
    Ok(Json(service.get_preferences(&user.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/notifications/preferences",
    request_body = UpdatePreferencesRequest,
    responses(
        (status = 200, description = "Preferences updated", body = NotificationPreferences),
        (status = 400, description = "Invalid quiet hours", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(service, request))]
pub async fn update_preferences(
    State(service): State<NotificationService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<UpdatePreferencesRequest>,
) -> ApiResult<Json<NotificationPreferences>> {
    Ok(Json(service.update_preferences(&user.user_id, request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/notifications/logs",
    responses(
        (status = 200, description = "Most recent notifications, newest first", body = [NotificationLogView]),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(service))]
pub async fn get_logs(
    State(service): State<NotificationService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<NotificationLogView>>> {
    Ok(Json(service.get_logs(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/test",
    responses(
        (status = 200, description = "Test notification dispatched", body = DispatchOutcome),
    ),
    security(("bearer" = [])),
    tag = "notifications"
)]
#[instrument(skip(service))]
pub async fn send_test(
    State(service): State<NotificationService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<DispatchOutcome>> {
    Ok(Json(service.send_test(&user.user_id).await?))
}
