use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::{info, instrument};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{
    CreateMedicationRequest, MedicationReminder, MedicationView, UpdateMedicationRequest,
};
use vital_watch_domain::services::{MedicationServiceTrait, ReminderServiceTrait};

use crate::api::error::{ApiResult, ErrorResponse};

/// Service types for dependency injection
pub type MedicationService = Arc<dyn MedicationServiceTrait + Send + Sync>;
pub type ReminderService = Arc<dyn ReminderServiceTrait + Send + Sync>;

#[utoipa::path(
    get,
    path = "/api/v1/medications",
    responses(
        (status = 200, description = "All medications of the caller", body = [MedicationView]),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service))]
pub async fn list_medications(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<MedicationView>>> {
    Ok(Json(service.list(&user.user_id).await?))
}

/// Medications whose date range includes today
#[utoipa::path(
    get,
    path = "/api/v1/medications/today",
    responses(
        (status = 200, description = "Medications active today", body = [MedicationView]),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service))]
pub async fn todays_medications(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<MedicationView>>> {
    Ok(Json(service.active_today(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/medications",
    request_body = CreateMedicationRequest,
    responses(
        (status = 201, description = "Medication added", body = MedicationView),
        (status = 400, description = "Invalid medication data", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service, request))]
pub async fn create_medication(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<CreateMedicationRequest>,
) -> ApiResult<impl IntoResponse> {
    let medication = service.create(&user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(medication)))
}

#[utoipa::path(
    get,
    path = "/api/v1/medications/{id}",
    params(("id" = String, Path, description = "Medication ID")),
    responses(
        (status = 200, description = "Medication found", body = MedicationView),
        (status = 403, description = "Medication belongs to another user", body = ErrorResponse),
        (status = 404, description = "Medication not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service))]
pub async fn get_medication(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> ApiResult<Json<MedicationView>> {
    Ok(Json(service.get(&user.user_id, &id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/medications/{id}",
    params(("id" = String, Path, description = "Medication ID")),
    request_body = UpdateMedicationRequest,
    responses(
        (status = 200, description = "Medication updated", body = MedicationView),
        (status = 400, description = "Invalid medication data", body = ErrorResponse),
        (status = 403, description = "Medication belongs to another user", body = ErrorResponse),
        (status = 404, description = "Medication not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service, request))]
pub async fn update_medication(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
    Json(request): Json<UpdateMedicationRequest>,
) -> ApiResult<Json<MedicationView>> {
    Ok(Json(service.update(&user.user_id, &id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/medications/{id}",
    params(("id" = String, Path, description = "Medication ID")),
    responses(
        (status = 204, description = "Medication deleted"),
        (status = 403, description = "Medication belongs to another user", body = ErrorResponse),
        (status = 404, description = "Medication not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service))]
pub async fn delete_medication(
    State(service): State<MedicationService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Send the reminders due in the current hour
#[utoipa::path(
    post,
    path = "/api/v1/medications/reminders/check",
    responses(
        (status = 200, description = "Reminders sent by this check", body = [MedicationReminder]),
    ),
    security(("bearer" = [])),
    tag = "medications"
)]
#[instrument(skip(service))]
pub async fn check_reminders(
    State(service): State<ReminderService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<MedicationReminder>>> {
    let reminders = service.check_reminders(&user.user_id).await?;
    info!(user_id = %user.user_id, count = reminders.len(), "Manual reminder check");
    Ok(Json(reminders))
}
