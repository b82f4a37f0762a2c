//! Export module for CSV and JSON export functionality
//!
//! Flattens KPI entries and daily trends into exportable records and writes
//! them as CSV or JSON files.

pub mod csv_export;
pub mod json_export;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::kpi::Catalogue;
use crate::models::KpiEntry;
use crate::trends::DailyTrend;
use crate::CommandError;

/// Export format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(CommandError::InvalidInput(format!(
                "Invalid export format: {}. Use 'csv' or 'json'",
                s
            ))),
        }
    }
}

impl ExportFormat {
    /// Get file extension for format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }
}

/// One sub-metric of one KPI entry, the long-format row used for CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportableEntry {
    pub entry_id: i64,
    pub username: String,
    pub field: String,
    pub date: String,
    pub process_name: String,
    pub kpi_type: String,
    pub metric: String,
    pub value: f64,
    /// Whether this sub-metric is the KPI's headline value
    pub headline: bool,
}

impl ExportableEntry {
    /// One row per sub-metric of `entry`, in sub-metric name order
    pub fn rows(entry: &KpiEntry, catalogue: &Catalogue) -> Vec<Self> {
        let headline = catalogue.lookup(&entry.kpi_type).map(|def| def.headline);

        entry
            .values
            .iter()
            .map(|(metric, value)| Self {
                entry_id: entry.id,
                username: entry.username.clone(),
                field: entry.field.label().to_string(),
                date: entry.date.format("%Y-%m-%d").to_string(),
                process_name: entry.process_name.clone(),
                kpi_type: entry.kpi_type.clone(),
                metric: metric.clone(),
                value: *value,
                headline: headline == Some(metric.as_str()),
            })
            .collect()
    }
}

/// Flatten entries into long-format rows
pub fn flatten_entries(entries: &[KpiEntry], catalogue: &Catalogue) -> Vec<ExportableEntry> {
    entries
        .iter()
        .flat_map(|entry| ExportableEntry::rows(entry, catalogue))
        .collect()
}

/// Exportable trend data point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportableTrend {
    pub date: String,
    pub kpi_type: String,
    pub samples: u32,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl ExportableTrend {
    pub fn from_daily(kpi_type: &str, day: &DailyTrend) -> Self {
        Self {
            date: day.date.clone(),
            kpi_type: kpi_type.to_string(),
            samples: day.samples,
            avg_value: day.avg_value,
            min_value: day.min_value,
            max_value: day.max_value,
        }
    }
}

/// Get the default export directory (Downloads folder or temp dir)
pub fn get_export_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::document_dir)
        .unwrap_or_else(std::env::temp_dir)
}

/// Generate a timestamped filename for exports
pub fn generate_export_filename(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", prefix, timestamp, extension)
}

pub use csv_export::*;
pub use json_export::*;
