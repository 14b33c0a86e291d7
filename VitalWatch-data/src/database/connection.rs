//! Database connection module for the VitalWatch application
//!
//! Connections come from an r2d2 pool over SQLite. The binary installs one
//! global pool at startup; tests build private in-memory pools through
//! [`DatabasePool::in_memory`].

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use tracing::{error, info, warn};

use super::migrations::run_sqlite_migrations;
use super::DatabaseError;

/// Global database pool used throughout the application
static DB_POOL: OnceCell<DatabasePool> = OnceCell::new();

/// Default location of the SQLite file when `DB_SQLITE_PATH` is unset
pub const DEFAULT_SQLITE_PATH: &str = "data/vital_watch.db";

/// A pooled SQLite connection
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseType {
    /// SQLite database (file-based)
    Sqlite,
}

impl FromStr for DatabaseType {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" => Ok(DatabaseType::Sqlite),
            _ => Err(DatabaseError::UnsupportedDatabaseType(s.to_string())),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database type
    pub db_type: DatabaseType,
    /// Path to SQLite database file
    pub sqlite_path: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DatabaseType::Sqlite,
            sqlite_path: DEFAULT_SQLITE_PATH.to_string(),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a new database configuration from environment variables
    pub fn from_env() -> Result<Self, DatabaseError> {
        let db_type_str = env::var("DB_TYPE").unwrap_or_else(|_| "sqlite".to_string());
        let db_type = db_type_str.parse::<DatabaseType>()?;

        let sqlite_path = match env::var("DB_SQLITE_PATH") {
            Ok(path) => {
                info!("Using SQLite database at: {}", path);
                path
            }
            Err(_) => {
                info!("No DB_SQLITE_PATH provided, will use default path: {}", DEFAULT_SQLITE_PATH);
                DEFAULT_SQLITE_PATH.to_string()
            }
        };

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(10);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        info!(
            "Database configuration: max_connections={}, timeout={}s",
            max_connections, timeout_seconds
        );

        Ok(DatabaseConfig {
            db_type,
            sqlite_path,
            max_connections,
            timeout_seconds,
        })
    }
}

/// Shared handle to the SQLite connection pool
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: Arc<r2d2::Pool<SqliteConnectionManager>>,
    in_memory: bool,
}

impl DatabasePool {
    /// Open the file-backed pool described by `config`, falling back to an
    /// in-memory database when the file cannot be used
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing SQLite database at: {}", config.sqlite_path);

        if let Some(parent) = Path::new(&config.sqlite_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                info!("Creating parent directory: {:?}", parent);
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!("Failed to create directory: {}, falling back to in-memory database", e);
                    return Self::in_memory();
                }
            }
        }

        let manager = SqliteConnectionManager::file(&config.sqlite_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE)
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

        let pool = match r2d2::Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.timeout_seconds))
            .build(manager)
        {
            Ok(pool) => pool,
            Err(e) => {
                error!("Failed to create SQLite connection pool: {}", e);
                warn!("Falling back to in-memory SQLite database");
                return Self::in_memory();
            }
        };

        let pool = Self {
            pool: Arc::new(pool),
            in_memory: false,
        };

        match pool.migrate() {
            Ok(()) => {
                info!("SQLite connection pool created successfully");
                Ok(pool)
            }
            Err(e) => {
                error!("Failed to prepare SQLite database: {}", e);
                warn!("Falling back to in-memory SQLite database");
                Self::in_memory()
            }
        }
    }

    /// Create a migrated in-memory database.
    ///
    /// Every SQLite in-memory connection is its own database, so the pool is
    /// limited to a single connection that is never recycled.
    pub fn in_memory() -> Result<Self, DatabaseError> {
        info!("Initializing in-memory SQLite database");

        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

        let pool = r2d2::Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connection_timeout(Duration::from_secs(30))
            .build(manager)?;

        let pool = Self {
            pool: Arc::new(pool),
            in_memory: true,
        };
        pool.migrate()?;

        info!("In-memory SQLite database initialized successfully");
        Ok(pool)
    }

    /// Check out a connection
    pub fn get(&self) -> Result<PooledConnection, DatabaseError> {
        Ok(self.pool.get()?)
    }

    /// Whether this pool is backed by an in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.in_memory
    }

    /// Current pool statistics
    pub fn state(&self) -> r2d2::State {
        self.pool.state()
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        let conn = self.get()?;
        run_sqlite_migrations(&conn).map_err(DatabaseError::MigrationError)
    }
}

/// Initialize the global database connection pool from the environment
pub fn initialize_database_pool() -> Result<(), DatabaseError> {
    if DB_POOL.get().is_some() {
        return Err(DatabaseError::PoolAlreadyInitialized);
    }

    let config = DatabaseConfig::from_env()?;
    info!("Initializing database pool with type: {:?}", config.db_type);

    let pool = DatabasePool::connect(&config)?;
    DB_POOL
        .set(pool)
        .map_err(|_| DatabaseError::PoolAlreadyInitialized)
}

/// Get the global database connection pool
pub fn get_db_pool() -> Result<DatabasePool, DatabaseError> {
    DB_POOL.get().cloned().ok_or(DatabaseError::PoolNotInitialized)
}

/// Describe the global pool's database and connection counts
pub fn get_connection_info() -> Option<String> {
    let pool = DB_POOL.get()?;
    Some(describe_pool(pool))
}

/// Describe a pool's database and connection counts
pub fn describe_pool(pool: &DatabasePool) -> String {
    let conn = match pool.get() {
        Ok(conn) => conn,
        Err(e) => {
            error!("Failed to get SQLite connection: {}", e);
            return format!("SQLite connection error: {}", e);
        }
    };

    let location = match conn.query_row("PRAGMA database_list", [], |row| row.get::<_, String>(2)) {
        Ok(path) if path.is_empty() || path == ":memory:" => "SQLite in-memory database".to_string(),
        Ok(path) => format!("SQLite database at {}", path),
        Err(_) => "SQLite database (path unknown)".to_string(),
    };
    drop(conn);

    let state = pool.state();
    format!(
        "{} (connections: active={}, idle={})",
        location, state.connections, state.idle_connections
    )
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_database_config_default() {
        let config = DatabaseConfig::default();
        assert_eq!(config.db_type, DatabaseType::Sqlite);
        assert_eq!(config.sqlite_path, DEFAULT_SQLITE_PATH);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!("sqlite".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        assert_eq!("SQLite".parse::<DatabaseType>().unwrap(), DatabaseType::Sqlite);
        assert!("postgres".parse::<DatabaseType>().is_err());
    }

    #[test]
    fn test_in_memory_pool_is_migrated() {
        let pool = DatabasePool::in_memory().unwrap();
        assert!(pool.is_in_memory());

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'vital_signs'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_describe_in_memory_pool() {
        let pool = DatabasePool::in_memory().unwrap();
        let info = describe_pool(&pool);
        assert!(info.starts_with("SQLite in-memory database"), "{}", info);
    }
}
