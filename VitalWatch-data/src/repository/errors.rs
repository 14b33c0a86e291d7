use thiserror::Error;
use crate::database::DatabaseError;

/// Error type for repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// A uniqueness constraint rejected the write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Not found error
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Stored data could not be decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(error: rusqlite::Error) -> Self {
        match &error {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.code == rusqlite::ErrorCode::ConstraintViolation
                    && msg.as_deref().map_or(false, |m| m.contains("UNIQUE")) =>
            {
                RepositoryError::Conflict(msg.clone().unwrap_or_default())
            }
            _ => RepositoryError::Sqlite(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_conflict() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (name TEXT UNIQUE); INSERT INTO t VALUES ('a');")
            .unwrap();

        let err: RepositoryError = conn
            .execute("INSERT INTO t VALUES ('a')", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::Conflict(_)), "{:?}", err);
    }

    #[test]
    fn test_other_sqlite_errors_pass_through() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err: RepositoryError = conn
            .execute("INSERT INTO missing VALUES (1)", [])
            .unwrap_err()
            .into();

        assert!(matches!(err, RepositoryError::Sqlite(_)));
    }
}
