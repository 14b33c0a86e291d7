use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::{instrument, warn};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{EmergencyResult, SosRequest};
use vital_watch_domain::services::EmergencyServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};

pub type EmergencyService = Arc<dyn EmergencyServiceTrait + Send + Sync>;

/// Trigger the SOS workflow
///
/// Stores a critical alert and notifies every emergency contact through the
/// channels their preferences allow. Vital values default to the latest
/// reading when the request carries none.
#[utoipa::path(
    post,
    path = "/api/v1/sos",
    request_body = SosRequest,
    responses(
        (status = 200, description = "Contacts notified", body = EmergencyResult),
        (status = 400, description = "No emergency contacts on file", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "emergency"
)]
#[instrument(skip(service, request))]
pub async fn trigger_sos(
    State(service): State<EmergencyService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<SosRequest>,
) -> ApiResult<Json<EmergencyResult>> {
    warn!(user_id = %user.user_id, "SOS triggered");
    Ok(Json(service.handle_emergency(&user.user_id, request).await?))
}
