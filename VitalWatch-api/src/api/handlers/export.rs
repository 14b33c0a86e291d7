use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Response},
    Extension,
};
use tracing::{info, instrument};

use vital_watch_domain::auth::UserInfo;
use vital_watch_domain::entities::DownloadFile;
use vital_watch_domain::services::export::DEFAULT_EXPORT_DAYS;
use vital_watch_domain::services::ExportServiceTrait;

use crate::api::error::{ApiResult, ErrorResponse};
use crate::entities::ExportQuery;

pub type ExportService = Arc<dyn ExportServiceTrait + Send + Sync>;

/// Serve a rendered file as an attachment
pub fn attachment(file: DownloadFile) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    (
        StatusCode::OK,
        [(CONTENT_TYPE, file.content_type.to_string()), (CONTENT_DISPOSITION, disposition)],
        file.body,
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/api/v1/export/{format}",
    params(
        ("format" = String, Path, description = "`csv` or `json`"),
        ExportQuery
    ),
    responses(
        (status = 200, description = "CSV or JSON file attachment", body = String, content_type = "text/csv"),
        (status = 400, description = "Unsupported format or missing data type", body = ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "export"
)]
#[instrument(skip(service))]
pub async fn export_data(
    State(service): State<ExportService>,
    Extension(user): Extension<UserInfo>,
    Path(format): Path<String>,
    Query(params): Query<ExportQuery>,
) -> ApiResult<Response> {
    let days = params.days.unwrap_or(DEFAULT_EXPORT_DAYS);
    let file = service
        .export(&user.user_id, &format, params.data_type.as_deref(), days)
        .await?;
    info!(user_id = %user.user_id, filename = %file.filename, "Export generated");
    Ok(attachment(file))
}
