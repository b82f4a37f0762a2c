//! Activity log sink
//!
//! Recording an activity never fails the action that triggered it: write
//! errors are logged and dropped.

use chrono::NaiveDate;

use crate::db::{queries, Database, DbError};
use crate::models::{ActivityKind, ActivityLog};

/// Default number of rows returned by [`recent_activity`]
pub const DEFAULT_LOG_LIMIT: usize = 500;

/// Record one user action
pub fn record(db: &Database, username: &str, kind: ActivityKind, details: &str) {
    let result =
        db.with_connection(|conn| queries::insert_activity(conn, username, kind.as_str(), details));
    if let Err(e) = result {
        tracing::warn!(
            "Failed to record {} activity for {}: {}",
            kind.as_str(),
            username,
            e
        );
    }
}

/// Activity logs newest first, bounded by optional inclusive dates
pub fn recent_activity(
    db: &Database,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    limit: usize,
) -> Result<Vec<ActivityLog>, DbError> {
    db.with_connection(|conn| queries::get_activity_logs(conn, from, to, limit))
}
