use std::env;
use std::time::{Duration as StdDuration, SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::token_blacklist;
use crate::auth::Claims;

const DEFAULT_ISSUER: &str = "vital-watch-api";

/// Security errors for authentication and token operations
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Token validation error: {0}")]
    TokenValidation(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token format")]
    InvalidToken,

    /// An access token was presented where a refresh token is needed, or the reverse
    #[error("Wrong token type: expected {0}")]
    WrongTokenType(&'static str),

    #[error("Security configuration error: {0}")]
    ConfigError(String),

    #[error("Token has been revoked")]
    TokenRevoked,
}

/// Token types for authentication
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenType {
    /// Bearer token for protected routes
    Access,
    /// Long-lived token exchanged for new access tokens
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    pub(crate) fn expiration(&self) -> Duration {
        match self {
            TokenType::Access => {
                let minutes = env::var("ACCESS_TOKEN_EXPIRATION_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(1440);
                Duration::minutes(minutes)
            }
            TokenType::Refresh => {
                let days = env::var("REFRESH_TOKEN_EXPIRATION_DAYS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok())
                    .unwrap_or(7);
                Duration::days(days)
            }
        }
    }

    /// Lifetime in seconds, as reported to clients
    pub fn expires_in(&self) -> i64 {
        self.expiration().num_seconds()
    }
}

fn jwt_secret() -> Result<String, SecurityError> {
    env::var("JWT_SECRET").map_err(|e| {
        error!("JWT_SECRET environment variable not found: {}", e);
        SecurityError::ConfigError("JWT_SECRET environment variable not found".to_string())
    })
}

fn jwt_issuer() -> String {
    env::var("JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string())
}

/// Generate a signed token for `user_id`
pub fn generate_token(user_id: &str, token_type: TokenType) -> Result<String, SecurityError> {
    let secret = jwt_secret()?;

    let now = Utc::now();
    let expiration = now + token_type.expiration();

    let claims = Claims {
        sub: user_id.to_string(),
        iss: jwt_issuer(),
        iat: now.timestamp(),
        exp: expiration.timestamp(),
        jti: Uuid::new_v4().to_string(),
        token_type: token_type.as_str().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {}", e);
        SecurityError::TokenValidation(e.to_string())
    })?;

    info!("Generated {:?} token for user {}", token_type, user_id);
    debug!("Token expiration: {}", expiration);

    Ok(token)
}

/// Validate signature, issuer, expiry and revocation; returns the claims
pub fn validate_token(token: &str) -> Result<Claims, SecurityError> {
    let secret = jwt_secret()?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;
    validation.set_issuer(&[jwt_issuer()]);

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => SecurityError::TokenExpired,
        jsonwebtoken::errors::ErrorKind::InvalidToken => SecurityError::InvalidToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => {
            SecurityError::TokenValidation("Invalid signature".to_string())
        }
        _ => SecurityError::TokenValidation(e.to_string()),
    })?;

    let claims = token_data.claims;
    if token_blacklist::blacklist().is_revoked(&claims.jti) {
        debug!("Token {} for user {} is revoked", claims.jti, claims.sub);
        return Err(SecurityError::TokenRevoked);
    }

    Ok(claims)
}

/// Validate a token and require it to be of `expected` type
pub fn validate_token_of_type(token: &str, expected: TokenType) -> Result<Claims, SecurityError> {
    let claims = validate_token(token)?;
    if claims.token_type != expected.as_str() {
        return Err(SecurityError::WrongTokenType(expected.as_str()));
    }
    Ok(claims)
}

/// Revoke the token described by `claims` until it would have expired
pub fn revoke_token(claims: &Claims) {
    info!("Revoking token {} for user {}", claims.jti, claims.sub);
    let expires_at = UNIX_EPOCH + StdDuration::from_secs(claims.exp.max(0) as u64);
    // Tokens already past expiry only need a short entry
    let expires_at = expires_at.max(SystemTime::now() + StdDuration::from_secs(60));
    token_blacklist::blacklist().revoke_token(&claims.jti, expires_at);
}

#[cfg(test)]
pub(crate) fn setup_test_env() {
    std::env::set_var("JWT_SECRET", "test_secret_key_for_testing_only");
    std::env::set_var("JWT_ISSUER", "vital-watch-test");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        setup_test_env();

        let token = generate_token("user-123", TokenType::Access).unwrap();
        assert!(!token.is_empty());

        let claims = validate_token(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
        assert_eq!(claims.iss, "vital-watch-test");
        assert_eq!(claims.token_type, "access");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        setup_test_env();

        let claims = Claims {
            sub: "user-456".to_string(),
            iss: "vital-watch-test".to_string(),
            iat: Utc::now().timestamp() - 7200,
            exp: Utc::now().timestamp() - 3600,
            jti: Uuid::new_v4().to_string(),
            token_type: "access".to_string(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test_secret_key_for_testing_only"),
        )
        .unwrap();

        match validate_token(&token) {
            Err(SecurityError::TokenExpired) => {}
            other => panic!("Expected TokenExpired but got: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token() {
        setup_test_env();

        match validate_token("invalid.token.format") {
            Err(SecurityError::InvalidToken) | Err(SecurityError::TokenValidation(_)) => {}
            other => panic!("Expected InvalidToken or TokenValidation, got {:?}", other),
        }
    }

    #[test]
    fn test_revoked_token_is_rejected_but_others_are_not() {
        setup_test_env();

        let first = generate_token("user-789", TokenType::Access).unwrap();
        let second = generate_token("user-789", TokenType::Access).unwrap();

        let claims = validate_token(&first).unwrap();
        revoke_token(&claims);

        assert!(matches!(validate_token(&first), Err(SecurityError::TokenRevoked)));
        assert!(validate_token(&second).is_ok());
    }

    #[test]
    fn test_token_type_is_enforced() {
        setup_test_env();

        let refresh = generate_token("user-1", TokenType::Refresh).unwrap();
        assert!(validate_token_of_type(&refresh, TokenType::Refresh).is_ok());
        assert!(matches!(
            validate_token_of_type(&refresh, TokenType::Access),
            Err(SecurityError::WrongTokenType("access"))
        ));
    }

    #[test]
    fn test_token_type_expirations() {
        std::env::set_var("REFRESH_TOKEN_EXPIRATION_DAYS", "7");
        assert_eq!(TokenType::Refresh.expiration(), Duration::days(7));
        assert_eq!(TokenType::Refresh.expires_in(), 7 * 24 * 3600);
    }
}
