use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use tracing::{info, instrument};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileResponse, RegisterRequest, UpdateMedicalInfoRequest,
    UpdateProfileRequest, UserProfile,
};
use vital_watch_domain::services::AccountServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::entities::MessageResponse;

/// Service type for dependency injection
pub type AccountService = Arc<dyn AccountServiceTrait + Send + Sync>;

/// Create a patient account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserProfile),
        (status = 400, description = "Invalid registration data", body = ErrorResponse),
        (status = 409, description = "Email or username already in use", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(service, request), fields(username = %request.username))]
pub async fn register(
    State(service): State<AccountService>,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = service.register(request).await?;
    info!(user_id = %user.id, "Account registered");
    Ok((StatusCode::CREATED, Json(user)))
}

/// Exchange email and password for tokens
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid email or password", body = ErrorResponse),
    ),
    tag = "Authentication"
)]
#[instrument(skip(service, request))]
pub async fn login(
    State(service): State<AccountService>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    Ok(Json(service.login(request).await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile with account statistics", body = ProfileResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "profile"
)]
#[instrument(skip(service))]
pub async fn get_profile(
    State(service): State<AccountService>,
    Extension(user): Extension<UserInfo>,
) -> ApiResult<Json<ProfileResponse>> {
    Ok(Json(service.get_profile(&user.user_id).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Invalid profile data", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "profile"
)]
#[instrument(skip(service, request))]
pub async fn update_profile(
    State(service): State<AccountService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(service.update_profile(&user.user_id, request).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile/medical",
    request_body = UpdateMedicalInfoRequest,
    responses(
        (status = 200, description = "Medical information updated", body = UserProfile),
        (status = 400, description = "Invalid medical information", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "profile"
)]
#[instrument(skip(service, request))]
pub async fn update_medical_info(
    State(service): State<AccountService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<UpdateMedicalInfoRequest>,
) -> ApiResult<Json<UserProfile>> {
    Ok(Json(service.update_medical_info(&user.user_id, request).await?))
}

#[utoipa::path(
    post,
    path = "/api/v1/profile/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect or new password is too weak", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "profile"
)]
#[instrument(skip(service, request))]
pub async fn change_password(
    State(service): State<AccountService>,
    Extension(user): Extension<UserInfo>,
    Json(request): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    service.change_password(&user.user_id, request).await?;
    Ok(Json(MessageResponse::new("Password updated successfully")))
}
