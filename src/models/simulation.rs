//! Stored simulation runs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::kpi::Industry;

/// A persisted simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub id: i64,
    pub username: String,
    pub field: Industry,
    pub date: NaiveDate,
    pub simulation_type: String,
    /// Parameters and results of the run
    pub data: serde_json::Value,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSimulationRecord {
    pub username: String,
    pub field: Industry,
    pub date: NaiveDate,
    pub simulation_type: String,
    pub data: serde_json::Value,
}
