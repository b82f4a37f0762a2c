//! Database schema definitions
//!
//! Contains SQL for creating all tables and indexes

use super::DbError;
use rusqlite::Connection;

/// SQL schema for all tables
const SCHEMA: &str = r#"
-- Accounts
CREATE TABLE IF NOT EXISTS users (
    username TEXT PRIMARY KEY,
    email TEXT NOT NULL,
    field TEXT NOT NULL,
    role TEXT NOT NULL DEFAULT 'user',
    status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_status ON users(status);

-- Enabled KPI identifiers per user, stored as a JSON object {id: true}
CREATE TABLE IF NOT EXISTS user_kpi_preferences (
    username TEXT PRIMARY KEY,
    kpi_preferences TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Append-only KPI results
CREATE TABLE IF NOT EXISTS kpi_entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    field TEXT NOT NULL,
    date TEXT NOT NULL,
    process_name TEXT NOT NULL,
    kpi_type TEXT NOT NULL,
    kpi_data TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_entries_user ON kpi_entries(username, date);
CREATE INDEX IF NOT EXISTS idx_entries_type ON kpi_entries(username, kpi_type, date DESC);

-- Simulation runs
CREATE TABLE IF NOT EXISTS simulations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    field TEXT NOT NULL,
    date TEXT NOT NULL,
    simulation_type TEXT NOT NULL,
    data TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_simulations_user ON simulations(username, date DESC);

-- Activity log
CREATE TABLE IF NOT EXISTS activity_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    activity_type TEXT NOT NULL,
    details TEXT NOT NULL DEFAULT '',
    timestamp TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_activity_time ON activity_logs(timestamp DESC);
"#;

/// Create all database tables
pub fn create_tables(conn: &Connection) -> Result<(), DbError> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(count, 5);
    }

    #[test]
    fn test_create_tables_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }
}
