//! Persisting computed KPI results
//!
//! Each computed KPI becomes its own entry. Entries are written one by one
//! with no surrounding transaction: a failed write is reported for that KPI
//! and the remaining ones are still attempted.

use chrono::NaiveDate;
use serde::Serialize;

use super::{compute_all, ComputationReport};
use crate::db::{queries, Database, DbError};
use crate::kpi::{Catalogue, Industry, InputRow};
use crate::models::NewKpiEntry;
use crate::preferences::KpiSelection;

/// Append-only storage for KPI entries
pub trait EntrySink {
    fn append_entry(&self, entry: &NewKpiEntry) -> Result<i64, DbError>;
}

impl EntrySink for Database {
    fn append_entry(&self, entry: &NewKpiEntry) -> Result<i64, DbError> {
        self.with_connection(|conn| queries::insert_kpi_entry(conn, entry))
    }
}

/// Who and what a row of measurements belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct EntryHeader {
    pub username: String,
    pub field: Industry,
    pub date: NaiveDate,
    pub process_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistStatus {
    Saved { entry_id: i64 },
    Failed { error: String },
}

/// Write result for one KPI type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistOutcome {
    pub kpi_type: String,
    #[serde(flatten)]
    pub status: PersistStatus,
}

impl PersistOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self.status, PersistStatus::Saved { .. })
    }
}

/// Write every computed result of `report` as a separate entry
pub fn persist_report(
    sink: &impl EntrySink,
    header: &EntryHeader,
    report: &ComputationReport,
) -> Vec<PersistOutcome> {
    report
        .computed
        .iter()
        .map(|(kpi_type, values)| {
            let entry = NewKpiEntry {
                username: header.username.clone(),
                field: header.field.clone(),
                date: header.date,
                process_name: header.process_name.clone(),
                kpi_type: kpi_type.clone(),
                values: values.clone(),
            };

            let status = match sink.append_entry(&entry) {
                Ok(entry_id) => PersistStatus::Saved { entry_id },
                Err(e) => {
                    tracing::error!(
                        "Failed to save {} entry for {} on {}: {}",
                        kpi_type,
                        header.username,
                        header.date,
                        e
                    );
                    PersistStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };

            PersistOutcome {
                kpi_type: kpi_type.clone(),
                status,
            }
        })
        .collect()
}

/// Computation report and per-KPI write results for one input row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    pub report: ComputationReport,
    pub outcomes: Vec<PersistOutcome>,
}

impl Submission {
    pub fn saved(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_saved()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.saved()
    }
}

/// Compute the enabled KPIs of one row and persist the results
pub fn submit(
    sink: &impl EntrySink,
    header: &EntryHeader,
    row: &InputRow,
    enabled: &KpiSelection,
    catalogue: &Catalogue,
) -> Submission {
    let report = compute_all(row, enabled, catalogue);
    let outcomes = persist_report(sink, header, &report);
    Submission { report, outcomes }
}
