//! Authentication for the VitalWatch API
//!
//! Password hashing, JWT issue/validation, token revocation and the axum
//! middleware that guards the `/api/v1` routes.

use serde::{Deserialize, Serialize};

#[cfg(feature = "with-api")]
use utoipa::ToSchema;

pub mod logging;
pub mod password;
pub mod token;
pub mod token_blacklist;

/// Authentication claims for JSON Web Tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
    /// Unique token id, used for revocation
    pub jti: String,
    /// `access` or `refresh`
    pub token_type: String,
}

/// Authenticated caller, inserted into request extensions by the middleware
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "with-api", derive(ToSchema))]
pub struct UserInfo {
    pub user_id: String,
    /// How the caller authenticated (`jwt` or `bypass`)
    pub auth_source: String,
}

#[cfg(feature = "with-api")]
pub use self::middleware::{auth_info, auth_middleware, configure_auth, logout, refresh_token};

#[cfg(feature = "with-api")]
pub mod middleware {
    use std::env;
    use std::time::Instant;

    use axum::{
        body::Body,
        extract::State,
        http::{header, HeaderMap, HeaderValue, Request, StatusCode},
        middleware::Next,
        response::Response,
        Extension, Json,
    };
    use serde_json::{json, Value};
    use tracing::{debug, error, warn};

    use super::logging::{log_auth_event, log_logout, log_token_refresh, AuthEvent, AuthEventType};
    use super::token::{self, SecurityError, TokenType};
    use super::{Claims, UserInfo};

    fn unauthorized() -> Response {
        Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .body(Body::empty())
            .unwrap_or_default()
    }

    /// Extract the token from an `Authorization: Bearer ...` header
    pub(super) fn bearer_token(headers: &HeaderMap) -> Result<&str, &'static str> {
        let value = headers
            .get(header::AUTHORIZATION)
            .ok_or("Missing Authorization header")?;
        let value = value
            .to_str()
            .map_err(|_| "Invalid Authorization header format")?;
        value
            .strip_prefix("Bearer ")
            .filter(|t| !t.trim().is_empty())
            .ok_or("Authorization header does not contain Bearer token")
    }

    /// Authentication middleware for protected routes
    pub async fn auth_middleware<S>(
        _state: State<S>,
        mut req: Request<Body>,
        next: Next,
    ) -> Response {
        let request_path = req.uri().path().to_string();
        let start_time = Instant::now();

        if cfg!(debug_assertions) && env::var("BYPASS_AUTH").is_ok() {
            if let Some(user_id) = req
                .headers()
                .get("x-user-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
            {
                debug!("Auth bypass enabled in development mode for {}", user_id);
                req.extensions_mut().insert(UserInfo {
                    user_id,
                    auth_source: "bypass".to_string(),
                });
                return next.run(req).await;
            }
        }

        let token = match bearer_token(req.headers()) {
            Ok(token) => token.to_string(),
            Err(reason) => {
                debug!("{}", reason);
                log_auth_event(
                    AuthEvent::new(AuthEventType::TokenValidation, None, false)
                        .with_details(reason)
                        .with_resource(request_path)
                        .with_duration(start_time.elapsed().as_millis() as u64)
                        .with_auth_method("jwt"),
                );
                return unauthorized();
            }
        };

        match token::validate_token_of_type(&token, TokenType::Access) {
            Ok(claims) => {
                log_auth_event(
                    AuthEvent::new(AuthEventType::TokenValidation, Some(&claims.sub), true)
                        .with_resource(request_path)
                        .with_duration(start_time.elapsed().as_millis() as u64)
                        .with_auth_method("jwt"),
                );

                req.extensions_mut().insert(UserInfo {
                    user_id: claims.sub.clone(),
                    auth_source: "jwt".to_string(),
                });
                req.extensions_mut().insert(claims);

                next.run(req).await
            }
            Err(e) => {
                match e {
                    SecurityError::TokenExpired | SecurityError::TokenRevoked => warn!("{}", e),
                    _ => debug!("Token rejected: {}", e),
                }
                log_auth_event(
                    AuthEvent::new(AuthEventType::TokenValidation, None, false)
                        .with_details(e.to_string())
                        .with_resource(request_path)
                        .with_duration(start_time.elapsed().as_millis() as u64)
                        .with_auth_method("jwt"),
                );
                unauthorized()
            }
        }
    }

    /// Apply CORS and security headers to every response
    pub fn configure_auth(app: axum::Router) -> axum::Router {
        use axum::http::{HeaderName, Method};
        use tower_http::cors::{Any, CorsLayer};
        use tower_http::set_header::SetResponseHeaderLayer;

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .max_age(std::time::Duration::from_secs(3600));

        let security_headers = tower::ServiceBuilder::new()
            .layer(SetResponseHeaderLayer::if_not_present(
                header::STRICT_TRANSPORT_SECURITY,
                HeaderValue::from_static("max-age=63072000; includeSubDomains"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_FRAME_OPTIONS,
                HeaderValue::from_static("DENY"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            ))
            .layer(SetResponseHeaderLayer::if_not_present(
                HeaderName::from_static("permissions-policy"),
                HeaderValue::from_static("camera=(), microphone=(), geolocation=(self)"),
            ));

        app.layer(cors).layer(security_headers)
    }

    /// Token information for the authenticated caller
    #[utoipa::path(
        get,
        path = "/api/v1/auth/info",
        responses(
            (status = 200, description = "Authentication information", body = serde_json::Value),
            (status = 401, description = "Not authenticated")
        ),
        tag = "Authentication",
        security(("bearer" = []))
    )]
    pub async fn auth_info(
        Extension(user_info): Extension<UserInfo>,
        claims: Option<Extension<Claims>>,
    ) -> Json<Value> {
        Json(json!({
            "user_id": user_info.user_id,
            "auth_source": user_info.auth_source,
            "expires_at": claims.map(|Extension(c)| c.exp),
            "status": "authenticated"
        }))
    }

    /// Exchange a refresh token for a new access token
    #[utoipa::path(
        post,
        path = "/auth/refresh",
        responses(
            (status = 200, description = "Token refreshed successfully", body = serde_json::Value),
            (status = 401, description = "Invalid refresh token", body = serde_json::Value)
        ),
        tag = "Authentication"
    )]
    pub async fn refresh_token(headers: HeaderMap) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
        let start_time = Instant::now();

        let refresh = match bearer_token(&headers) {
            Ok(token) => token,
            Err(reason) => {
                log_auth_event(
                    AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                        .with_details(reason)
                        .with_duration(start_time.elapsed().as_millis() as u64)
                        .with_auth_method("refresh_token"),
                );
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "error": "invalid_request", "message": reason })),
                ));
            }
        };

        let claims = match token::validate_token_of_type(refresh, TokenType::Refresh) {
            Ok(claims) => claims,
            Err(e) => {
                warn!("Invalid refresh token: {}", e);
                log_auth_event(
                    AuthEvent::new(AuthEventType::TokenRefresh, None, false)
                        .with_details(e.to_string())
                        .with_duration(start_time.elapsed().as_millis() as u64)
                        .with_auth_method("refresh_token"),
                );
                return Err((
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "invalid_token",
                        "message": "Invalid or expired refresh token"
                    })),
                ));
            }
        };

        match token::generate_token(&claims.sub, TokenType::Access) {
            Ok(access_token) => {
                log_token_refresh(&claims.sub, true, None);
                Ok(Json(json!({
                    "access_token": access_token,
                    "token_type": "Bearer",
                    "expires_in": TokenType::Access.expires_in(),
                    "user_id": claims.sub
                })))
            }
            Err(e) => {
                error!("Failed to generate new access token: {}", e);
                log_token_refresh(&claims.sub, false, Some(&e.to_string()));
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "server_error",
                        "message": "Failed to generate new token"
                    })),
                ))
            }
        }
    }

    /// Revoke the presented access token
    #[utoipa::path(
        post,
        path = "/api/v1/auth/logout",
        responses(
            (status = 200, description = "Logged out successfully", body = serde_json::Value),
            (status = 401, description = "Not authenticated")
        ),
        tag = "Authentication",
        security(("bearer" = []))
    )]
    pub async fn logout(
        Extension(user_info): Extension<UserInfo>,
        claims: Option<Extension<Claims>>,
    ) -> Json<Value> {
        if let Some(Extension(claims)) = claims {
            token::revoke_token(&claims);
        }
        log_logout(&user_info.user_id);

        Json(json!({
            "message": "Logged out successfully",
            "status": "success"
        }))
    }

}
