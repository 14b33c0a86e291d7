// Database migrations module
// Schema changes are idempotent CREATE ... IF NOT EXISTS statements

mod sqlite;
pub use sqlite::run_migrations as run_sqlite_migrations;
