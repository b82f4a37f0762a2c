//! Activity log types

use serde::{Deserialize, Serialize};

/// Kinds of user actions recorded in the activity log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Registration,
    AccountStatus,
    PreferencesUpdate,
    KpiEntry,
    CsvImport,
    Simulation,
    Export,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Registration => "registration",
            ActivityKind::AccountStatus => "account_status",
            ActivityKind::PreferencesUpdate => "preferences_update",
            ActivityKind::KpiEntry => "kpi_entry",
            ActivityKind::CsvImport => "csv_import",
            ActivityKind::Simulation => "simulation",
            ActivityKind::Export => "export",
        }
    }
}

/// One activity log row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityLog {
    pub id: i64,
    pub username: String,
    pub activity_type: String,
    pub details: String,
    pub timestamp: String,
}
