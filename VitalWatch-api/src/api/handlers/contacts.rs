use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use tracing::instrument;

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{CreateContactRequest, EmergencyContactView, UpdateContactRequest};
use vital_watch_domain::services::ContactServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};

/// Service type for dependency injection
pub type ContactService = Arc<dyn ContactServiceTrait + Send + Sync>;

#[utoipa::path(
    get,
    path = "/api/v1/contacts",
    responses(
        (status = 200, description = "Emergency contacts of the caller", body = [EmergencyContactView]),
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
#[instrument(skip(service))]
pub async fn list_contacts(
    State(service): State<ContactService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<Vec<EmergencyContactView>>> {
    Ok(Json(service.list(&user.user_id).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/contacts",
    request_body = CreateContactRequest,
    responses(
        (status = 201, description = "Contact added", body = EmergencyContactView),
        (status = 400, description = "Name and phone are required", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
#[instrument(skip(service, request))]
pub async fn create_contact(
    State(service): State<ContactService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<CreateContactRequest>,
) -> ApiResult<impl IntoResponse> {
    let contact = service.create(&user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

#[utoipa::path(
    get,
    path = "/api/v1/contacts/{id}",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 200, description = "Contact found", body = EmergencyContactView),
        (status = 403, description = "Contact belongs to another user", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
#[instrument(skip(service))]
pub async fn get_contact(
    State(service): State<ContactService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> ApiResult<Json<EmergencyContactView>> {
    Ok(Json(service.get(&user.user_id, &id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/contacts/{id}",
    params(("id" = String, Path, description = "Contact ID")),
    request_body = UpdateContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = EmergencyContactView),
        (status = 403, description = "Contact belongs to another user", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
#[instrument(skip(service, request))]
pub async fn update_contact(
    State(service): State<ContactService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
    Json(request): Json<UpdateContactRequest>,
) -> ApiResult<Json<EmergencyContactView>> {
    Ok(Json(service.update(&user.user_id, &id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/api/v1/contacts/{id}",
    params(("id" = String, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 403, description = "Contact belongs to another user", body = ErrorResponse),
        (status = 404, description = "Contact not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "contacts"
)]
#[instrument(skip(service))]
pub async fn delete_contact(
    State(service): State<ContactService>,
    Extension(user): Extension<UserInfo>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    service.delete(&user.user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
