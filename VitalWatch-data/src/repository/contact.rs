use async_trait::async_trait;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::contact::{EmergencyContact, NewEmergencyContact};

/// Repository trait for emergency contacts
#[async_trait]
pub trait EmergencyContactRepositoryTrait {
    async fn create(&self, contact: NewEmergencyContact) -> Result<EmergencyContact, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<EmergencyContact>, RepositoryError>;

    /// Contacts of a user in name order
    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EmergencyContact>, RepositoryError>;

    async fn update(&self, contact: &EmergencyContact) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &str) -> Result<(), RepositoryError>;

    async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError>;
}

/// SQLite-backed emergency contact repository
#[derive(Debug, Clone)]
pub struct EmergencyContactRepository {
    pool: DatabasePool,
}

impl EmergencyContactRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_contact(row: &Row<'_>) -> rusqlite::Result<EmergencyContact> {
    Ok(EmergencyContact {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        relationship: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
    })
}

#[async_trait]
impl EmergencyContactRepositoryTrait for EmergencyContactRepository {
    async fn create(&self, request: NewEmergencyContact) -> Result<EmergencyContact, RepositoryError> {
        let contact = EmergencyContact {
            id: Uuid::new_v4().to_string(),
            user_id: request.user_id,
            name: request.name,
            relationship: request.relationship,
            phone: request.phone,
            email: request.email,
        };

        debug!("Storing emergency contact: {}", contact.id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO emergency_contacts (id, user_id, name, relationship, phone, email)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                contact.id,
                contact.user_id,
                contact.name,
                contact.relationship,
                contact.phone,
                contact.email,
            ],
        )?;

        Ok(contact)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<EmergencyContact>, RepositoryError> {
        let conn = self.pool.get()?;
        let contact = conn
            .query_row(
                "SELECT id, user_id, name, relationship, phone, email
                 FROM emergency_contacts WHERE id = ?1",
                [id],
                map_contact,
            )
            .optional()?;
        Ok(contact)
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<EmergencyContact>, RepositoryError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, name, relationship, phone, email
             FROM emergency_contacts WHERE user_id = ?1 ORDER BY name",
        )?;
        let contacts = stmt
            .query_map([user_id], map_contact)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(contacts)
    }

    async fn update(&self, contact: &EmergencyContact) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE emergency_contacts SET name = ?2, relationship = ?3, phone = ?4, email = ?5
             WHERE id = ?1",
            params![
                contact.id,
                contact.name,
                contact.relationship,
                contact.phone,
                contact.email,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("Emergency contact {}", contact.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let deleted = conn.execute("DELETE FROM emergency_contacts WHERE id = ?1", [id])?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound(format!("Emergency contact {}", id)));
        }
        Ok(())
    }

    async fn count_by_user(&self, user_id: &str) -> Result<usize, RepositoryError> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM emergency_contacts WHERE user_id = ?1",
            [user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::seed_user;

    fn contact(user_id: &str, name: &str) -> NewEmergencyContact {
        NewEmergencyContact {
            user_id: user_id.to_string(),
            name: name.to_string(),
            relationship: Some("Sibling".to_string()),
            phone: "+15550101".to_string(),
            email: None,
        }
    }

    #[tokio::test]
    async fn test_contact_crud() {
        let pool = DatabasePool::in_memory().unwrap();
        let user_id = seed_user(&pool, "ada").await;
        let repo = EmergencyContactRepository::new(pool);

        let mut created = repo.create(contact(&user_id, "Zoe")).await.unwrap();
        repo.create(contact(&user_id, "Ann")).await.unwrap();

        let names: Vec<String> = repo
            .list_by_user(&user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Ann", "Zoe"]);

        created.email = Some("zoe@example.com".to_string());
        repo.update(&created).await.unwrap();
        let stored = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(stored.email.as_deref(), Some("zoe@example.com"));

        repo.delete(&created.id).await.unwrap();
        assert_eq!(repo.count_by_user(&user_id).await.unwrap(), 1);
        assert!(matches!(
            repo.delete(&created.id).await,
            Err(RepositoryError::NotFound(_))
        ));
    }
}
