//! CSV reading and per-row processing

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Serialize;

use super::{ImportError, RowError, DATE_COLUMN, PROCESS_COLUMN};
use crate::engine::{submit, EntryHeader, EntrySink, Submission};
use crate::kpi::{Catalogue, Industry, InputRow};
use crate::preferences::KpiSelection;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RowStatus {
    Imported { submission: Submission },
    Failed { error: RowError },
}

/// What happened to one data row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowOutcome {
    /// 1-based line in the file
    pub line: u64,
    pub date: Option<NaiveDate>,
    pub process_name: Option<String>,
    #[serde(flatten)]
    pub status: RowStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportSummary {
    pub rows: Vec<RowOutcome>,
}

impl ImportSummary {
    pub fn rows_imported(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| matches!(r.status, RowStatus::Imported { .. }))
            .count()
    }

    pub fn rows_failed(&self) -> usize {
        self.rows.len() - self.rows_imported()
    }

    pub fn entries_saved(&self) -> usize {
        self.rows
            .iter()
            .map(|r| match &r.status {
                RowStatus::Imported { submission } => submission.saved(),
                RowStatus::Failed { .. } => 0,
            })
            .sum()
    }
}

struct Columns {
    date: usize,
    process: usize,
    headers: StringRecord,
}

impl Columns {
    fn locate(headers: StringRecord) -> Result<Self, ImportError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(ImportError::MissingColumn(name))
        };
        Ok(Self {
            date: find(DATE_COLUMN)?,
            process: find(PROCESS_COLUMN)?,
            headers,
        })
    }
}

fn parse_row(
    columns: &Columns,
    record: &StringRecord,
) -> Result<(NaiveDate, String, InputRow), RowError> {
    let date_text = record.get(columns.date).unwrap_or_default();
    let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d")
        .map_err(|_| RowError::InvalidDate(date_text.to_string()))?;

    let process_name = record.get(columns.process).unwrap_or_default().to_string();
    if process_name.is_empty() {
        return Err(RowError::EmptyProcessName);
    }

    let mut row = InputRow::new();
    for (i, (field, text)) in columns.headers.iter().zip(record.iter()).enumerate() {
        if i == columns.date || i == columns.process || field.is_empty() {
            continue;
        }
        row.insert_text(field, text)?;
    }

    Ok((date, process_name, row))
}

/// Import measurements for one user from CSV data
pub fn import_csv<R: Read>(
    reader: R,
    username: &str,
    industry: &Industry,
    enabled: &KpiSelection,
    catalogue: &Catalogue,
    sink: &impl EntrySink,
) -> Result<ImportSummary, ImportError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let columns = Columns::locate(rdr.headers()?.clone())?;
    let mut summary = ImportSummary::default();

    for (index, result) in rdr.records().enumerate() {
        // header is line 1
        let fallback_line = index as u64 + 2;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e
                    .position()
                    .map(|p| p.line())
                    .unwrap_or(fallback_line);
                tracing::warn!("Skipping malformed CSV line {}: {}", line, e);
                summary.rows.push(RowOutcome {
                    line,
                    date: None,
                    process_name: None,
                    status: RowStatus::Failed {
                        error: RowError::Malformed(e.to_string()),
                    },
                });
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line())
            .unwrap_or(fallback_line);

        let outcome = match parse_row(&columns, &record) {
            Ok((date, process_name, row)) => {
                let header = EntryHeader {
                    username: username.to_string(),
                    field: industry.clone(),
                    date,
                    process_name: process_name.clone(),
                };
                let submission = submit(sink, &header, &row, enabled, catalogue);
                RowOutcome {
                    line,
                    date: Some(date),
                    process_name: Some(process_name),
                    status: RowStatus::Imported { submission },
                }
            }
            Err(error) => {
                tracing::warn!("Skipping CSV line {}: {}", line, error);
                RowOutcome {
                    line,
                    date: None,
                    process_name: None,
                    status: RowStatus::Failed { error },
                }
            }
        };
        summary.rows.push(outcome);
    }

    tracing::info!(
        "CSV import for {}: {} rows imported, {} failed, {} entries saved",
        username,
        summary.rows_imported(),
        summary.rows_failed(),
        summary.entries_saved()
    );

    Ok(summary)
}

/// Import measurements from a CSV file on disk
pub fn import_csv_file(
    path: &Path,
    username: &str,
    industry: &Industry,
    enabled: &KpiSelection,
    catalogue: &Catalogue,
    sink: &impl EntrySink,
) -> Result<ImportSummary, ImportError> {
    let file = File::open(path)?;
    import_csv(file, username, industry, enabled, catalogue, sink)
}
