//! CSV import of raw measurements
//!
//! A CSV file carries one observation per row: `Date`, `Process_Name` and
//! one column per input field. Rows are processed independently; a bad row
//! is reported and the import moves on.

pub mod csv_import;

use serde::Serialize;
use thiserror::Error;

use crate::kpi::{Catalogue, KpiError};
use crate::preferences::KpiSelection;

pub use csv_import::{import_csv, import_csv_file, ImportSummary, RowOutcome, RowStatus};

pub const DATE_COLUMN: &str = "Date";
pub const PROCESS_COLUMN: &str = "Process_Name";

/// File-level import errors; nothing was imported
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),
}

/// Row-level import errors; the row was skipped
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum RowError {
    #[error("Malformed row: {0}")]
    Malformed(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Process name is empty")]
    EmptyProcessName,

    #[error("{0}")]
    InvalidValue(String),
}

impl From<KpiError> for RowError {
    fn from(e: KpiError) -> Self {
        RowError::InvalidValue(e.to_string())
    }
}

/// Template CSV for a KPI selection
///
/// The header lists the union of the selected KPIs' required fields, each
/// once, followed by a placeholder row.
pub fn csv_template(selection: &KpiSelection, catalogue: &Catalogue) -> String {
    let ids: Vec<&str> = selection.iter().map(String::as_str).collect();
    let mut header = vec![DATE_COLUMN, PROCESS_COLUMN];
    header.extend(catalogue.fields_for(&ids));

    format!("{}\nYYYY-MM-DD,Process1\n", header.join(","))
}
