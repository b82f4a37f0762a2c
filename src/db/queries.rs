//! Database query implementations
//!
//! Contains functions for accounts, preferences, KPI entries, simulation
//! runs and the activity log

use std::collections::BTreeMap;

use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use super::DbError;
use crate::kpi::Industry;
use crate::models::{
    Account, AccountStatus, ActivityLog, KpiEntry, NewKpiEntry, NewSimulationRecord, Role,
    SimulationRecord,
};

/// Current UTC time as stored in `*_at`/`timestamp` columns
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

// ============================================================================
// Accounts
// ============================================================================

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        username: row.get(0)?,
        email: row.get(1)?,
        field: Industry::from(row.get::<_, String>(2)?),
        role: Role::from(row.get::<_, String>(3)?.as_str()),
        status: AccountStatus::from(row.get::<_, String>(4)?.as_str()),
        created_at: row.get(5)?,
    })
}

/// Insert a new account
pub fn insert_user(conn: &Connection, account: &Account) -> Result<(), DbError> {
    conn.execute(
        r#"
        INSERT INTO users (username, email, field, role, status, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            account.username,
            account.email,
            account.field.label(),
            account.role.as_str(),
            account.status.as_str(),
            account.created_at,
        ],
    )?;
    Ok(())
}

/// Get a single account by username
pub fn get_user(conn: &Connection, username: &str) -> Result<Option<Account>, DbError> {
    let account = conn
        .query_row(
            r#"
            SELECT username, email, field, role, status, created_at
            FROM users WHERE username = ?1
            "#,
            params![username],
            account_from_row,
        )
        .optional()?;
    Ok(account)
}

/// Check if a username is taken
pub fn user_exists(conn: &Connection, username: &str) -> Result<bool, DbError> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Accounts in a given approval state, oldest first
pub fn get_users_by_status(
    conn: &Connection,
    status: AccountStatus,
) -> Result<Vec<Account>, DbError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT username, email, field, role, status, created_at
        FROM users WHERE status = ?1
        ORDER BY created_at, username
        "#,
    )?;

    let accounts = stmt
        .query_map(params![status.as_str()], account_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(accounts)
}

/// Change an account's approval state; false when the user does not exist
pub fn update_user_status(
    conn: &Connection,
    username: &str,
    status: AccountStatus,
) -> Result<bool, DbError> {
    let changed = conn.execute(
        "UPDATE users SET status = ?2 WHERE username = ?1",
        params![username, status.as_str()],
    )?;
    Ok(changed > 0)
}

/// Number of admin accounts
pub fn count_admins(conn: &Connection) -> Result<u32, DbError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE role = 'admin'",
        [],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

// ============================================================================
// KPI preferences
// ============================================================================

/// Stored `{kpi_id: flag}` map for a user, if one was ever saved
pub fn get_kpi_preferences(
    conn: &Connection,
    username: &str,
) -> Result<Option<BTreeMap<String, bool>>, DbError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT kpi_preferences FROM user_kpi_preferences WHERE username = ?1",
            params![username],
            |row| row.get(0),
        )
        .optional()?;

    match stored {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

/// Replace a user's stored preference map
pub fn save_kpi_preferences(
    conn: &Connection,
    username: &str,
    preferences: &BTreeMap<String, bool>,
) -> Result<(), DbError> {
    let json = serde_json::to_string(preferences)?;
    conn.execute(
        r#"
        INSERT INTO user_kpi_preferences (username, kpi_preferences, updated_at)
        VALUES (?1, ?2, ?3)
        ON CONFLICT(username) DO UPDATE SET
            kpi_preferences = excluded.kpi_preferences,
            updated_at = excluded.updated_at
        "#,
        params![username, json, now_timestamp()],
    )?;
    Ok(())
}

// ============================================================================
// KPI entries
// ============================================================================

const ENTRY_COLUMNS: &str =
    "id, username, field, date, process_name, kpi_type, kpi_data, created_at";

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<KpiEntry> {
    Ok(KpiEntry {
        id: row.get(0)?,
        username: row.get(1)?,
        field: Industry::from(row.get::<_, String>(2)?),
        date: row.get(3)?,
        process_name: row.get(4)?,
        kpi_type: row.get(5)?,
        values: json_column(row, 6)?,
        created_at: row.get(7)?,
    })
}

/// Append a KPI entry, returning its id
pub fn insert_kpi_entry(conn: &Connection, entry: &NewKpiEntry) -> Result<i64, DbError> {
    let kpi_data = serde_json::to_string(&entry.values)?;
    conn.execute(
        r#"
        INSERT INTO kpi_entries (username, field, date, process_name, kpi_type, kpi_data, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
        params![
            entry.username,
            entry.field.label(),
            entry.date,
            entry.process_name,
            entry.kpi_type,
            kpi_data,
            now_timestamp(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Get a single entry by id
pub fn get_kpi_entry(conn: &Connection, id: i64) -> Result<Option<KpiEntry>, DbError> {
    let sql = format!("SELECT {} FROM kpi_entries WHERE id = ?1", ENTRY_COLUMNS);
    let entry = conn.query_row(&sql, params![id], entry_from_row).optional()?;
    Ok(entry)
}

/// All entries of a user, oldest date first
pub fn get_user_entries(conn: &Connection, username: &str) -> Result<Vec<KpiEntry>, DbError> {
    let sql = format!(
        "SELECT {} FROM kpi_entries WHERE username = ?1 ORDER BY date ASC, id ASC",
        ENTRY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let entries = stmt
        .query_map(params![username], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

/// Entries of one KPI type for a user, newest first, optionally for one process
pub fn get_user_entries_by_type(
    conn: &Connection,
    username: &str,
    kpi_type: &str,
    process_name: Option<&str>,
) -> Result<Vec<KpiEntry>, DbError> {
    let mut sql = format!(
        "SELECT {} FROM kpi_entries WHERE username = ?1 AND kpi_type = ?2",
        ENTRY_COLUMNS
    );
    if process_name.is_some() {
        sql.push_str(" AND process_name = ?3");
    }
    sql.push_str(" ORDER BY date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;

    let entries = match process_name {
        Some(process) => stmt
            .query_map(params![username, kpi_type, process], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?,
        None => stmt
            .query_map(params![username, kpi_type], entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?,
    };

    Ok(entries)
}

/// Every entry of every user, for the admin overview
pub fn get_all_entries(conn: &Connection) -> Result<Vec<KpiEntry>, DbError> {
    let sql = format!(
        "SELECT {} FROM kpi_entries ORDER BY date ASC, id ASC",
        ENTRY_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;

    let entries = stmt
        .query_map([], entry_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(entries)
}

// ============================================================================
// Simulations
// ============================================================================

/// Store a simulation run, returning its id
pub fn insert_simulation(conn: &Connection, record: &NewSimulationRecord) -> Result<i64, DbError> {
    let data = serde_json::to_string(&record.data)?;
    conn.execute(
        r#"
        INSERT INTO simulations (username, field, date, simulation_type, data, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            record.username,
            record.field.label(),
            record.date,
            record.simulation_type,
            data,
            now_timestamp(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Simulation runs of a user, newest first
pub fn get_user_simulations(
    conn: &Connection,
    username: &str,
) -> Result<Vec<SimulationRecord>, DbError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, username, field, date, simulation_type, data, created_at
        FROM simulations WHERE username = ?1
        ORDER BY date DESC, id DESC
        "#,
    )?;

    let records = stmt
        .query_map(params![username], |row| {
            Ok(SimulationRecord {
                id: row.get(0)?,
                username: row.get(1)?,
                field: Industry::from(row.get::<_, String>(2)?),
                date: row.get(3)?,
                simulation_type: row.get(4)?,
                data: json_column(row, 5)?,
                created_at: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(records)
}

// ============================================================================
// Activity log
// ============================================================================

/// Append an activity log row
pub fn insert_activity(
    conn: &Connection,
    username: &str,
    activity_type: &str,
    details: &str,
) -> Result<i64, DbError> {
    conn.execute(
        r#"
        INSERT INTO activity_logs (username, activity_type, details, timestamp)
        VALUES (?1, ?2, ?3, ?4)
        "#,
        params![username, activity_type, details, now_timestamp()],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Activity logs newest first, optionally bounded by inclusive dates
pub fn get_activity_logs(
    conn: &Connection,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: usize,
) -> Result<Vec<ActivityLog>, DbError> {
    // Build query dynamically based on which date filters are provided
    let mut sql = String::from(
        "SELECT id, username, activity_type, details, timestamp FROM activity_logs WHERE 1 = 1",
    );
    let mut bindings: Vec<String> = Vec::new();

    if let Some(from) = from {
        bindings.push(from.format("%Y-%m-%d").to_string());
        sql.push_str(&format!(" AND substr(timestamp, 1, 10) >= ?{}", bindings.len()));
    }
    if let Some(to) = to {
        bindings.push(to.format("%Y-%m-%d").to_string());
        sql.push_str(&format!(" AND substr(timestamp, 1, 10) <= ?{}", bindings.len()));
    }
    bindings.push(limit.to_string());
    sql.push_str(&format!(
        " ORDER BY timestamp DESC, id DESC LIMIT CAST(?{} AS INTEGER)",
        bindings.len()
    ));

    let mut stmt = conn.prepare(&sql)?;

    let logs = stmt
        .query_map(params_from_iter(bindings.iter()), |row| {
            Ok(ActivityLog {
                id: row.get(0)?,
                username: row.get(1)?,
                activity_type: row.get(2)?,
                details: row.get(3)?,
                timestamp: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn account(username: &str, status: AccountStatus) -> Account {
        Account {
            username: username.to_string(),
            email: format!("{}@plant.example", username),
            field: Industry::FoodAndBeverage,
            role: Role::User,
            status,
            created_at: now_timestamp(),
        }
    }

    #[test]
    fn test_user_round_trip() {
        let conn = conn();
        insert_user(&conn, &account("alice", AccountStatus::Pending)).unwrap();

        let stored = get_user(&conn, "alice").unwrap().unwrap();
        assert_eq!(stored.field, Industry::FoodAndBeverage);
        assert_eq!(stored.status, AccountStatus::Pending);
        assert!(user_exists(&conn, "alice").unwrap());
        assert!(get_user(&conn, "bob").unwrap().is_none());

        assert!(update_user_status(&conn, "alice", AccountStatus::Approved).unwrap());
        assert!(!update_user_status(&conn, "bob", AccountStatus::Approved).unwrap());
        assert!(get_users_by_status(&conn, AccountStatus::Pending)
            .unwrap()
            .is_empty());
        assert_eq!(
            get_users_by_status(&conn, AccountStatus::Approved).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_preferences_upsert() {
        let conn = conn();
        assert!(get_kpi_preferences(&conn, "alice").unwrap().is_none());

        let mut first = BTreeMap::new();
        first.insert("oee".to_string(), true);
        first.insert("fpy".to_string(), true);
        save_kpi_preferences(&conn, "alice", &first).unwrap();

        let mut second = BTreeMap::new();
        second.insert("yield".to_string(), true);
        save_kpi_preferences(&conn, "alice", &second).unwrap();

        assert_eq!(get_kpi_preferences(&conn, "alice").unwrap(), Some(second));
    }

    #[test]
    fn test_entry_round_trip() {
        let conn = conn();
        let mut values = BTreeMap::new();
        values.insert("oee_value".to_string(), 90.0);
        values.insert("quality".to_string(), 90.0);

        let new = NewKpiEntry {
            username: "alice".to_string(),
            field: Industry::OilAndGas,
            date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            process_name: "Line 1".to_string(),
            kpi_type: "oee".to_string(),
            values: values.clone(),
        };
        let id = insert_kpi_entry(&conn, &new).unwrap();

        let stored = get_kpi_entry(&conn, id).unwrap().unwrap();
        assert_eq!(stored.kpi_type, "oee");
        assert_eq!(stored.date, new.date);
        assert_eq!(stored.process_name, "Line 1");
        assert_eq!(stored.field, Industry::OilAndGas);
        assert_eq!(stored.values, values);
    }

    #[test]
    fn test_entries_ordering_and_filter() {
        let conn = conn();
        for (day, process) in [(3, "A"), (1, "B"), (2, "A")] {
            let mut values = BTreeMap::new();
            values.insert("yield_rate".to_string(), day as f64);
            insert_kpi_entry(
                &conn,
                &NewKpiEntry {
                    username: "alice".to_string(),
                    field: Industry::Pharmaceutical,
                    date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                    process_name: process.to_string(),
                    kpi_type: "yield".to_string(),
                    values,
                },
            )
            .unwrap();
        }

        let all = get_user_entries(&conn, "alice").unwrap();
        let days: Vec<u32> = all.iter().map(|e| chrono::Datelike::day(&e.date)).collect();
        assert_eq!(days, vec![1, 2, 3]);

        let newest_a = get_user_entries_by_type(&conn, "alice", "yield", Some("A")).unwrap();
        assert_eq!(newest_a.len(), 2);
        assert!(newest_a[0].date > newest_a[1].date);

        assert!(get_user_entries_by_type(&conn, "bob", "yield", None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_activity_logs_filter() {
        let conn = conn();
        insert_activity(&conn, "alice", "kpi_entry", "3 KPIs").unwrap();
        conn.execute(
            "INSERT INTO activity_logs (username, activity_type, details, timestamp) VALUES ('bob', 'csv_import', '', '2020-01-05T10:00:00Z')",
            [],
        )
        .unwrap();

        let all = get_activity_logs(&conn, None, None, 100).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].username, "alice");

        let old = get_activity_logs(
            &conn,
            NaiveDate::from_ymd_opt(2020, 1, 1),
            NaiveDate::from_ymd_opt(2020, 1, 31),
            100,
        )
        .unwrap();
        assert_eq!(old.len(), 1);
        assert_eq!(old[0].username, "bob");

        let limited = get_activity_logs(&conn, None, None, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }
}
