use thiserror::Error;
use validator::ValidationErrors;
use vital_watch_data::repository::RepositoryError;

/// Errors returned by domain services
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The record exists but belongs to another user
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Message without the variant prefix, for API responses
    pub fn message(&self) -> &str {
        match self {
            ServiceError::Validation(m)
            | ServiceError::NotFound(m)
            | ServiceError::Forbidden(m)
            | ServiceError::Conflict(m)
            | ServiceError::Unauthorized(m)
            | ServiceError::Repository(m)
            | ServiceError::Delivery(m)
            | ServiceError::Internal(m) => m,
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => ServiceError::NotFound(msg),
            RepositoryError::Validation(msg) => ServiceError::Validation(msg),
            RepositoryError::Conflict(msg) => ServiceError::Conflict(msg),
            other => ServiceError::Repository(other.to_string()),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Validation(validation_message(&errors))
    }
}

/// Flatten validator errors into `field: msg, msg; field: msg`
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .iter()
        .map(|(field, errors)| {
            let messages: Vec<String> = errors
                .iter()
                .map(|err| match &err.message {
                    Some(msg) => msg.to_string(),
                    None => format!("Invalid {}", field),
                })
                .collect();
            format!("{}: {}", field, messages.join(", "))
        })
        .collect::<Vec<String>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 1, max = 10, message = "Out of range"))]
        value: u32,
        #[validate(length(min = 1))]
        name: String,
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let errors = Sample { value: 0, name: String::new() }.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "name: Invalid name; value: Out of range");
    }

    #[test]
    fn test_repository_errors_map_to_service_errors() {
        let err: ServiceError = RepositoryError::NotFound("Alert 1".to_string()).into();
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(err.message(), "Alert 1");

        let err: ServiceError = RepositoryError::Conflict("email".to_string()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }
}
