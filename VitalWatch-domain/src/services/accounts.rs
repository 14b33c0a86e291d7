use std::time::Instant;

use async_trait::async_trait;
use tracing::{error, info, instrument};
use validator::Validate;

use vital_watch_data::models::{NewUser, User};

use crate::auth::logging::{log_auth_event, AuthEvent, AuthEventType};
use crate::auth::password::{hash_password, validate_password_strength, verify_password, MIN_PASSWORD_LENGTH};
use crate::auth::token::{generate_token, SecurityError, TokenType};
use crate::entities::conversions;
use crate::entities::{
    ChangePasswordRequest, LoginRequest, LoginResponse, ProfileResponse, ProfileStats, RegisterRequest,
    UpdateMedicalInfoRequest, UpdateProfileRequest, UserProfile,
};
use crate::services::{Repositories, ServiceError};

pub const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Trait for account operations
#[async_trait]
pub trait AccountServiceTrait {
    async fn register(&self, request: RegisterRequest) -> Result<UserProfile, ServiceError>;

    /// Check credentials and issue an access and a refresh token
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError>;

    async fn get_profile(&self, user_id: &str) -> Result<ProfileResponse, ServiceError>;

    async fn update_profile(&self, user_id: &str, request: UpdateProfileRequest) -> Result<UserProfile, ServiceError>;

    async fn update_medical_info(
        &self,
        user_id: &str,
        request: UpdateMedicalInfoRequest,
    ) -> Result<UserProfile, ServiceError>;

    async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<(), ServiceError>;
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub struct AccountService {
    repos: Repositories,
}

impl AccountService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    async fn user(&self, user_id: &str) -> Result<User, ServiceError> {
        self.repos
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }

    fn hash(&self, password: &str) -> Result<String, ServiceError> {
        hash_password(password).map_err(|e| {
            error!("Password hashing failed: {}", e);
            ServiceError::Internal("Failed to hash password".to_string())
        })
    }

    fn failed_login(&self, email: &str, started: Instant) -> ServiceError {
        log_auth_event(
            AuthEvent::new(AuthEventType::FailedLogin, None, false)
                .with_details(format!("Login failed for {}", email))
                .with_auth_method("password")
                .with_duration(started.elapsed().as_millis() as u64),
        );
        ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string())
    }
}

#[async_trait]
impl AccountServiceTrait for AccountService {
    #[instrument(skip(self, request))]
    async fn register(&self, request: RegisterRequest) -> Result<UserProfile, ServiceError> {
        if request.password != request.confirm_password {
            return Err(ServiceError::Validation("Passwords do not match".to_string()));
        }
        request.validate()?;
        validate_password_strength(&request.password, MIN_PASSWORD_LENGTH).map_err(ServiceError::Validation)?;

        let email = request.email.trim().to_lowercase();
        if self.repos.users.get_by_email(&email).await?.is_some() {
            return Err(ServiceError::Conflict("Email already registered".to_string()));
        }
        if self.repos.users.get_by_username(request.username.trim()).await?.is_some() {
            return Err(ServiceError::Conflict("Username already taken".to_string()));
        }

        let user = self
            .repos
            .users
            .create(NewUser {
                username: request.username.trim().to_string(),
                email,
                password_hash: self.hash(&request.password)?,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                phone: non_empty(request.phone),
            })
            .await?;

        log_auth_event(
            AuthEvent::new(AuthEventType::Registration, Some(&user.id), true).with_details("Account created"),
        );
        Ok(conversions::convert_to_domain_profile(&user))
    }

    #[instrument(skip(self, request))]
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ServiceError> {
        let started = Instant::now();
        let email = request.email.trim().to_lowercase();

        let Some(user) = self.repos.users.get_by_email(&email).await? else {
            return Err(self.failed_login(&email, started));
        };

        match verify_password(&request.password, &user.password_hash) {
            Ok(true) => {}
            Ok(false) => return Err(self.failed_login(&email, started)),
            Err(e) => {
                error!(user_id = %user.id, "Stored password hash is unreadable: {}", e);
                return Err(self.failed_login(&email, started));
            }
        }

        let token_error = |e: SecurityError| {
            error!("Token generation failed: {}", e);
            ServiceError::Internal("Failed to generate token".to_string())
        };
        let access_token = generate_token(&user.id, TokenType::Access).map_err(token_error)?;
        let refresh_token = generate_token(&user.id, TokenType::Refresh).map_err(token_error)?;

        log_auth_event(
            AuthEvent::new(AuthEventType::Login, Some(&user.id), true)
                .with_auth_method("password")
                .with_duration(started.elapsed().as_millis() as u64),
        );

        Ok(LoginResponse {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: TokenType::Access.expires_in(),
            user: conversions::convert_to_domain_profile(&user),
        })
    }

    async fn get_profile(&self, user_id: &str) -> Result<ProfileResponse, ServiceError> {
        let user = self.user(user_id).await?;
        let stats = ProfileStats {
            total_alerts: self.repos.alerts.count_by_user(user_id).await?,
            medications: self.repos.medications.count_by_user(user_id).await?,
            contacts: self.repos.contacts.count_by_user(user_id).await?,
        };
        Ok(ProfileResponse {
            user: conversions::convert_to_domain_profile(&user),
            stats,
        })
    }

    #[instrument(skip(self, request))]
    async fn update_profile(&self, user_id: &str, request: UpdateProfileRequest) -> Result<UserProfile, ServiceError> {
        request.validate()?;
        let mut user = self.user(user_id).await?;

        if let Some(email) = request.email {
            let email = email.trim().to_lowercase();
            if email != user.email {
                if let Some(other) = self.repos.users.get_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(ServiceError::Conflict("Email already registered".to_string()));
                    }
                }
                user.email = email;
            }
        }
        if let Some(first_name) = request.first_name {
            user.first_name = first_name.trim().to_string();
        }
        if let Some(last_name) = request.last_name {
            user.last_name = last_name.trim().to_string();
        }
        if request.phone.is_some() {
            user.phone = non_empty(request.phone);
        }

        self.repos.users.update(&user).await?;
        info!(user_id, "Profile updated");
        Ok(conversions::convert_to_domain_profile(&user))
    }

    async fn update_medical_info(
        &self,
        user_id: &str,
        request: UpdateMedicalInfoRequest,
    ) -> Result<UserProfile, ServiceError> {
        request.validate()?;
        let mut user = self.user(user_id).await?;

        if request.medical_conditions.is_some() {
            user.medical_conditions = non_empty(request.medical_conditions);
        }
        if request.allergies.is_some() {
            user.allergies = non_empty(request.allergies);
        }
        if request.blood_type.is_some() {
            user.blood_type = non_empty(request.blood_type);
        }
        if request.date_of_birth.is_some() {
            user.date_of_birth = request.date_of_birth;
        }
        if request.gender.is_some() {
            user.gender = non_empty(request.gender);
        }

        self.repos.users.update(&user).await?;
        info!(user_id, "Medical information updated");
        Ok(conversions::convert_to_domain_profile(&user))
    }

    #[instrument(skip(self, request))]
    async fn change_password(&self, user_id: &str, request: ChangePasswordRequest) -> Result<(), ServiceError> {
        let user = self.user(user_id).await?;

        if !verify_password(&request.current_password, &user.password_hash).unwrap_or(false) {
            log_auth_event(
                AuthEvent::new(AuthEventType::PasswordChange, Some(user_id), false)
                    .with_details("Current password did not match"),
            );
            return Err(ServiceError::Validation("Current password is incorrect".to_string()));
        }
        if request.new_password != request.confirm_password {
            return Err(ServiceError::Validation("Passwords do not match".to_string()));
        }
        request.validate()?;

        self.repos
            .users
            .update_password(user_id, &self.hash(&request.new_password)?)
            .await?;

        log_auth_event(AuthEvent::new(AuthEventType::PasswordChange, Some(user_id), true));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::token::{setup_test_env, validate_token_of_type};
    use crate::services::test_support::repositories;

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "s3cure-pass".to_string(),
            confirm_password: "s3cure-pass".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone: Some("+15550100".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        setup_test_env();
        let (_pool, repos) = repositories();
        let service = AccountService::new(repos);

        let profile = service.register(register_request("jane", "Jane@Example.com")).await.unwrap();
        assert_eq!(profile.email, "jane@example.com");
        assert_eq!(profile.phone.as_deref(), Some("+15550100"));

        let response = service
            .login(LoginRequest {
                email: "jane@example.com".to_string(),
                password: "s3cure-pass".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(response.token_type, "Bearer");
        assert_eq!(response.user.id, profile.id);
        let claims = validate_token_of_type(&response.access_token, TokenType::Access).unwrap();
        assert_eq!(claims.sub, profile.id);
        assert!(validate_token_of_type(&response.refresh_token, TokenType::Refresh).is_ok());
    }

    #[tokio::test]
    async fn test_register_rejections() {
        let (_pool, repos) = repositories();
        let service = AccountService::new(repos);

        let mut mismatch = register_request("a1", "a1@example.com");
        mismatch.confirm_password = "different".to_string();
        assert_eq!(service.register(mismatch).await.unwrap_err().message(), "Passwords do not match");

        let mut short = register_request("a2", "a2@example.com");
        short.password = "short".to_string();
        short.confirm_password = "short".to_string();
        assert!(matches!(service.register(short).await, Err(ServiceError::Validation(_))));

        assert!(matches!(
            service.register(register_request("a3", "not-an-email")).await,
            Err(ServiceError::Validation(_))
        ));

        service.register(register_request("taken", "taken@example.com")).await.unwrap();
        let err = service.register(register_request("other", "taken@example.com")).await.unwrap_err();
        assert_eq!(err.message(), "Email already registered");
        let err = service.register(register_request("taken", "fresh@example.com")).await.unwrap_err();
        assert_eq!(err.message(), "Username already taken");
    }

    #[tokio::test]
    async fn test_login_failures_are_unauthorized() {
        let (_pool, repos) = repositories();
        let service = AccountService::new(repos);
        service.register(register_request("bob", "bob@example.com")).await.unwrap();

        for (email, password) in [("bob@example.com", "wrong-pass"), ("nobody@example.com", "s3cure-pass")] {
            let err = service
                .login(LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ServiceError::Unauthorized(_)));
            assert_eq!(err.message(), INVALID_CREDENTIALS);
        }
    }

    #[tokio::test]
    async fn test_profile_updates_and_stats() {
        let (_pool, repos) = repositories();
        let service = AccountService::new(repos);
        let user = service.register(register_request("carol", "carol@example.com")).await.unwrap();
        service.register(register_request("dave", "dave@example.com")).await.unwrap();

        let profile = service.get_profile(&user.id).await.unwrap();
        assert_eq!(profile.stats, ProfileStats { total_alerts: 0, medications: 0, contacts: 0 });

        let err = service
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    email: Some("dave@example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let updated = service
            .update_profile(
                &user.id,
                UpdateProfileRequest {
                    first_name: Some("Caroline".to_string()),
                    phone: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Caroline");
        assert_eq!(updated.phone, None);

        let medical = service
            .update_medical_info(
                &user.id,
                UpdateMedicalInfoRequest {
                    allergies: Some("Penicillin".to_string()),
                    blood_type: Some("O+".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(medical.allergies.as_deref(), Some("Penicillin"));
        assert_eq!(medical.blood_type.as_deref(), Some("O+"));
        assert_eq!(medical.first_name, "Caroline");
    }

    #[tokio::test]
    async fn test_change_password() {
        setup_test_env();
        let (_pool, repos) = repositories();
        let service = AccountService::new(repos);
        let user = service.register(register_request("erin", "erin@example.com")).await.unwrap();

        let err = service
            .change_password(
                &user.id,
                ChangePasswordRequest {
                    current_password: "wrong".to_string(),
                    new_password: "another-pass".to_string(),
                    confirm_password: "another-pass".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Current password is incorrect");

        service
            .change_password(
                &user.id,
                ChangePasswordRequest {
                    current_password: "s3cure-pass".to_string(),
                    new_password: "another-pass".to_string(),
                    confirm_password: "another-pass".to_string(),
                },
            )
            .await
            .unwrap();

        let login = service
            .login(LoginRequest {
                email: "erin@example.com".to_string(),
                password: "another-pass".to_string(),
            })
            .await;
        assert!(login.is_ok());
    }
}
