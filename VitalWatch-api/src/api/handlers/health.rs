use std::sync::{Arc, Once};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use vital_watch_domain::health::{ComponentStatus as DomainComponentStatus, HealthServiceTrait, SystemStatus};

/// Health check response with system information
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Current service status ("ok", "degraded", or "error")
    pub status: String,
    /// Current application version from Cargo manifest
    pub version: String,
    /// Timestamp of when the response was generated
    pub timestamp: u64,
    /// Uptime of the service in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    /// Details about various components of the system
    pub components: ComponentStatus,
    pub environment: String,
}

/// Status of individual system components
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentStatus {
    pub database: ComponentHealthStatus,
    pub api: ComponentHealthStatus,
    /// Any further components reported by the health service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional: Option<serde_json::Value>,
}

/// Health status for an individual component
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ComponentHealthStatus {
    /// Status of the component ("ok", "degraded", or "error")
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

pub type HealthService = Arc<dyn HealthServiceTrait + Send + Sync>;

static SERVER_START_TIME: OnceCell<u64> = OnceCell::new();
static INIT: Once = Once::new();

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Record the server start time used to report uptime
pub fn initialize_server_start_time() {
    INIT.call_once(|| {
        let _ = SERVER_START_TIME.set(unix_now());
    });
}

/// Health check endpoint to verify the API is running
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "API is healthy", body = HealthResponse),
        (status = 500, description = "API is not healthy", body = HealthResponse),
        (status = 503, description = "API is degraded", body = HealthResponse)
    ),
    tag = "health"
)]
#[instrument(skip(health_service))]
pub async fn health_check(State(health_service): State<HealthService>) -> impl IntoResponse {
    info!("Health check requested");

    let now = unix_now();
    let uptime = SERVER_START_TIME.get().map(|&start| now.saturating_sub(start));
    let system_health = health_service.get_system_health().await;

    let overall_status = match system_health.status {
        SystemStatus::Healthy => "ok",
        SystemStatus::Degraded => "degraded",
        SystemStatus::Unhealthy => "error",
    };

    let component = |name: &str| {
        system_health
            .components
            .get(name)
            .map(|c| ComponentHealthStatus {
                status: map_component_status(&c.status),
                message: c.details.clone(),
            })
            .unwrap_or_else(|| ComponentHealthStatus {
                status: map_component_status(&DomainComponentStatus::Healthy),
                message: None,
            })
    };

    let additional: serde_json::Map<String, serde_json::Value> = system_health
        .components
        .iter()
        .filter(|(name, _)| name.as_str() != "database" && name.as_str() != "api")
        .map(|(name, c)| {
            (
                name.clone(),
                serde_json::json!({
                    "status": map_component_status(&c.status),
                    "message": c.details,
                }),
            )
        })
        .collect();

    let response = HealthResponse {
        status: overall_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now,
        uptime,
        components: ComponentStatus {
            database: component("database"),
            api: component("api"),
            additional: (!additional.is_empty()).then(|| additional.into()),
        },
        environment: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
    };

    let status = match overall_status {
        "ok" => StatusCode::OK,
        "degraded" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(response))
}

fn map_component_status(status: &DomainComponentStatus) -> String {
    match status {
        DomainComponentStatus::Healthy => "ok",
        DomainComponentStatus::Degraded => "degraded",
        DomainComponentStatus::Unhealthy => "error",
    }
    .to_string()
}
