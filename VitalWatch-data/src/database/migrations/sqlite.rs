use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_users_table(conn)?;
    create_vital_signs_table(conn)?;
    create_emergency_contacts_table(conn)?;
    create_medications_table(conn)?;
    create_alerts_table(conn)?;
    create_notification_tables(conn)?;
    create_report_schedules_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

fn create_users_table(conn: &Connection) -> Result<(), String> {
    info!("Creating users table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            phone TEXT,
            medical_conditions TEXT,
            allergies TEXT,
            blood_type TEXT,
            date_of_birth TEXT,
            gender TEXT,
            created_at TEXT NOT NULL
        );",
    )
    .map_err(|e| format!("Failed to create users table: {}", e))
}

fn create_vital_signs_table(conn: &Connection) -> Result<(), String> {
    info!("Creating vital_signs table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS vital_signs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            timestamp TEXT NOT NULL,
            heart_rate REAL NOT NULL,
            blood_pressure_systolic REAL NOT NULL,
            blood_pressure_diastolic REAL NOT NULL,
            temperature REAL NOT NULL,
            oxygen_saturation REAL NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_vital_signs_user_timestamp
        ON vital_signs (user_id, timestamp DESC);",
    )
    .map_err(|e| format!("Failed to create vital_signs table: {}", e))
}

fn create_emergency_contacts_table(conn: &Connection) -> Result<(), String> {
    info!("Creating emergency_contacts table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS emergency_contacts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            relationship TEXT,
            phone TEXT NOT NULL,
            email TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_emergency_contacts_user
        ON emergency_contacts (user_id);",
    )
    .map_err(|e| format!("Failed to create emergency_contacts table: {}", e))
}

fn create_medications_table(conn: &Connection) -> Result<(), String> {
    info!("Creating medications table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS medications (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            dosage TEXT NOT NULL,
            frequency TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT,
            instructions TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_medications_user
        ON medications (user_id);",
    )
    .map_err(|e| format!("Failed to create medications table: {}", e))
}

fn create_alerts_table(conn: &Connection) -> Result<(), String> {
    info!("Creating alerts table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            timestamp TEXT NOT NULL,
            alert_type TEXT NOT NULL,
            message TEXT NOT NULL,
            vital_sign TEXT,
            value REAL,
            severity TEXT,
            acknowledged INTEGER NOT NULL DEFAULT 0,
            acknowledged_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_alerts_user_timestamp
        ON alerts (user_id, timestamp DESC);",
    )
    .map_err(|e| format!("Failed to create alerts table: {}", e))
}

fn create_notification_tables(conn: &Connection) -> Result<(), String> {
    info!("Creating notification tables if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS notification_preferences (
            user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
            email_enabled INTEGER NOT NULL DEFAULT 1,
            sms_enabled INTEGER NOT NULL DEFAULT 1,
            quiet_hours_start TEXT,
            quiet_hours_end TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS notification_logs (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            notification_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            message TEXT NOT NULL,
            channels TEXT NOT NULL,
            reference_id TEXT,
            timestamp TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_notification_logs_user_timestamp
        ON notification_logs (user_id, timestamp DESC);
        CREATE INDEX IF NOT EXISTS idx_notification_logs_reference
        ON notification_logs (user_id, notification_type, reference_id);",
    )
    .map_err(|e| format!("Failed to create notification tables: {}", e))
}

fn create_report_schedules_table(conn: &Connection) -> Result<(), String> {
    info!("Creating report_schedules table if not exists");

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS report_schedules (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            frequency TEXT NOT NULL,
            report_period INTEGER NOT NULL DEFAULT 30,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_report_schedules_frequency
        ON report_schedules (frequency, active);",
    )
    .map_err(|e| format!("Failed to create report_schedules table: {}", e))
}
