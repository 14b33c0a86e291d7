use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;
use uuid::Uuid;

use super::errors::RepositoryError;
use crate::database::DatabasePool;
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, phone, \
     medical_conditions, allergies, blood_type, date_of_birth, gender, created_at";

/// Repository trait for user accounts
#[async_trait]
pub trait UserRepositoryTrait {
    /// Create a user; a taken username or email yields `Conflict`
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// All users, oldest account first
    async fn list(&self) -> Result<Vec<User>, RepositoryError>;

    /// Persist the profile and medical fields of `user`
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), RepositoryError>;
}

/// SQLite-backed user repository
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: DatabasePool,
}

impl UserRepository {
    /// Create a new repository
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column);
        let user = conn.query_row(&sql, [value], map_user).optional()?;
        Ok(user)
    }
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        phone: row.get(6)?,
        medical_conditions: row.get(7)?,
        allergies: row.get(8)?,
        blood_type: row.get(9)?,
        date_of_birth: row.get(10)?,
        gender: row.get(11)?,
        created_at: row.get(12)?,
    })
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn create(&self, new_user: NewUser) -> Result<User, RepositoryError> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone,
            medical_conditions: None,
            allergies: None,
            blood_type: None,
            date_of_birth: None,
            gender: None,
            created_at: Utc::now(),
        };

        debug!("Storing user in database: {}", user.id);
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, first_name, last_name, phone, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id,
                user.username,
                user.email,
                user.password_hash,
                user.first_name,
                user.last_name,
                user.phone,
                user.created_at,
            ],
        )?;

        Ok(user)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one("id", id)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one("email", email)
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.find_one("username", username)
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let conn = self.pool.get()?;
        let sql = format!("SELECT {} FROM users ORDER BY created_at", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map([], map_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        debug!("Updating user profile: {}", user.id);
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE users SET email = ?2, first_name = ?3, last_name = ?4, phone = ?5,
                 medical_conditions = ?6, allergies = ?7, blood_type = ?8,
                 date_of_birth = ?9, gender = ?10
             WHERE id = ?1",
            params![
                user.id,
                user.email,
                user.first_name,
                user.last_name,
                user.phone,
                user.medical_conditions,
                user.allergies,
                user.blood_type,
                user.date_of_birth,
                user.gender,
            ],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("User {}", user.id)));
        }
        Ok(())
    }

    async fn update_password(&self, id: &str, password_hash: &str) -> Result<(), RepositoryError> {
        let conn = self.pool.get()?;
        let updated = conn.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![id, password_hash],
        )?;

        if updated == 0 {
            return Err(RepositoryError::NotFound(format!("User {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone: Some("+15550100".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        let user = repo.create(new_user("ada", "ada@example.com")).await.unwrap();

        let by_email = repo.get_by_email("ada@example.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);
        assert_eq!(by_email.full_name(), "Ada Lovelace");

        let by_name = repo.get_by_username("ada").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        repo.create(new_user("ada", "ada@example.com")).await.unwrap();

        let result = repo.create(new_user("other", "ada@example.com")).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_profile_and_password() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        let mut user = repo.create(new_user("ada", "ada@example.com")).await.unwrap();

        user.blood_type = Some("O+".to_string());
        user.allergies = Some("penicillin".to_string());
        repo.update(&user).await.unwrap();
        repo.update_password(&user.id, "new-hash").await.unwrap();

        let stored = repo.get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(stored.blood_type.as_deref(), Some("O+"));
        assert_eq!(stored.allergies.as_deref(), Some("penicillin"));
        assert_eq!(stored.password_hash, "new-hash");
    }

    #[tokio::test]
    async fn test_update_unknown_user_is_not_found() {
        let repo = UserRepository::new(DatabasePool::in_memory().unwrap());
        let result = repo.update_password("missing", "hash").await;
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
    }
}
