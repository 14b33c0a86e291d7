use async_trait::async_trait;
use tracing::info;
use validator::Validate;

use vital_watch_data::models::{EmergencyContact, NewEmergencyContact};
use vital_watch_data::repository::EmergencyContactRepositoryTrait;

use crate::entities::conversions;
use crate::entities::{CreateContactRequest, EmergencyContactView, UpdateContactRequest};
use crate::services::ServiceError;

/// Trait for emergency contact operations
#[async_trait]
pub trait ContactServiceTrait {
    async fn list(&self, user_id: &str) -> Result<Vec<EmergencyContactView>, ServiceError>;

    async fn create(&self, user_id: &str, request: CreateContactRequest) -> Result<EmergencyContactView, ServiceError>;

    async fn get(&self, user_id: &str, id: &str) -> Result<EmergencyContactView, ServiceError>;

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateContactRequest,
    ) -> Result<EmergencyContactView, ServiceError>;

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), ServiceError>;
}

/// Emergency contact service for domain logic
pub struct ContactService<R: EmergencyContactRepositoryTrait> {
    repository: R,
}

impl<R: EmergencyContactRepositoryTrait + Send + Sync> ContactService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Load a contact and check that it belongs to `user_id`
    async fn owned(&self, user_id: &str, id: &str) -> Result<EmergencyContact, ServiceError> {
        let contact = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Contact not found".to_string()))?;
        if contact.user_id != user_id {
            return Err(ServiceError::Forbidden("Access denied".to_string()));
        }
        Ok(contact)
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl<R: EmergencyContactRepositoryTrait + Send + Sync> ContactServiceTrait for ContactService<R> {
    async fn list(&self, user_id: &str) -> Result<Vec<EmergencyContactView>, ServiceError> {
        let contacts = self.repository.list_by_user(user_id).await?;
        Ok(contacts.into_iter().map(conversions::convert_to_domain_contact).collect())
    }

    async fn create(&self, user_id: &str, request: CreateContactRequest) -> Result<EmergencyContactView, ServiceError> {
        request.validate()?;

        let contact = self
            .repository
            .create(NewEmergencyContact {
                user_id: user_id.to_string(),
                name: request.name.trim().to_string(),
                relationship: optional(request.relationship),
                phone: request.phone.trim().to_string(),
                email: optional(request.email),
            })
            .await?;

        info!(user_id, contact_id = %contact.id, "Emergency contact added");
        Ok(conversions::convert_to_domain_contact(contact))
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<EmergencyContactView, ServiceError> {
        self.owned(user_id, id).await.map(conversions::convert_to_domain_contact)
    }

    async fn update(
        &self,
        user_id: &str,
        id: &str,
        request: UpdateContactRequest,
    ) -> Result<EmergencyContactView, ServiceError> {
        request.validate()?;
        let mut contact = self.owned(user_id, id).await?;

        if let Some(name) = request.name {
            contact.name = name.trim().to_string();
        }
        if let Some(phone) = request.phone {
            contact.phone = phone.trim().to_string();
        }
        if request.relationship.is_some() {
            contact.relationship = optional(request.relationship);
        }
        if request.email.is_some() {
            contact.email = optional(request.email);
        }

        self.repository.update(&contact).await?;
        Ok(conversions::convert_to_domain_contact(contact))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<(), ServiceError> {
        self.owned(user_id, id).await?;
        self.repository.delete(id).await?;
        info!(user_id, contact_id = id, "Emergency contact deleted");
        Ok(())
    }
}
