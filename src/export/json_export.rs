//! JSON export functionality
//!
//! Provides JSON serialization for KPI entries and trends with full
//! structure preservation.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use super::ExportableTrend;
use crate::models::KpiEntry;
use crate::trends::TrendSummary;
use crate::CommandError;

/// Complete export structure for JSON
#[derive(Debug, Clone, Serialize)]
pub struct EntriesExportJson {
    pub export_date: String,
    pub export_version: &'static str,
    pub total_entries: usize,
    pub entries: Vec<KpiEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<ExportSummary>,
}

/// Summary statistics for the export
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub kpi_types: Vec<String>,
    pub processes: Vec<String>,
    pub date_range: (String, String),
}

/// Trends export structure
#[derive(Debug, Clone, Serialize)]
pub struct TrendsExportJson {
    pub export_date: String,
    pub export_version: &'static str,
    pub kpi_type: String,
    pub days_included: usize,
    pub trends: Vec<ExportableTrend>,
    pub summary: TrendsSummary,
}

/// Summary of trend data
#[derive(Debug, Clone, Serialize)]
pub struct TrendsSummary {
    pub samples: u32,
    pub avg_value: f64,
    pub change_percent: f64,
}

const EXPORT_VERSION: &str = "1.0.0";

fn write_json<T: Serialize>(export: &T, path: &Path) -> Result<(), CommandError> {
    let json = serde_json::to_string_pretty(export)
        .map_err(|e| CommandError::Internal(format!("Failed to serialize JSON: {}", e)))?;

    let mut file = std::fs::File::create(path)
        .map_err(|e| CommandError::Internal(format!("Failed to create JSON file: {}", e)))?;

    file.write_all(json.as_bytes())
        .map_err(|e| CommandError::Internal(format!("Failed to write JSON file: {}", e)))?;

    Ok(())
}

fn summarize_entries(entries: &[KpiEntry]) -> Option<ExportSummary> {
    let first = entries.iter().map(|e| e.date).min()?;
    let last = entries.iter().map(|e| e.date).max()?;

    let kpi_types: BTreeSet<&str> = entries.iter().map(|e| e.kpi_type.as_str()).collect();
    let processes: BTreeSet<&str> = entries.iter().map(|e| e.process_name.as_str()).collect();

    Some(ExportSummary {
        kpi_types: kpi_types.into_iter().map(str::to_string).collect(),
        processes: processes.into_iter().map(str::to_string).collect(),
        date_range: (first.to_string(), last.to_string()),
    })
}

/// Write KPI entries to JSON, each entry with its full result mapping
pub fn write_entries_json(
    entries: &[KpiEntry],
    include_summary: bool,
    path: &Path,
) -> Result<(), CommandError> {
    let export = EntriesExportJson {
        export_date: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        total_entries: entries.len(),
        entries: entries.to_vec(),
        summary: if include_summary {
            summarize_entries(entries)
        } else {
            None
        },
    };

    write_json(&export, path)
}

/// Write a KPI's trend to JSON format
pub fn write_trends_json(summary: &TrendSummary, path: &Path) -> Result<(), CommandError> {
    let trends: Vec<ExportableTrend> = summary
        .daily
        .iter()
        .map(|day| ExportableTrend::from_daily(&summary.kpi_type, day))
        .collect();

    let export = TrendsExportJson {
        export_date: chrono::Utc::now().to_rfc3339(),
        export_version: EXPORT_VERSION,
        kpi_type: summary.kpi_type.clone(),
        days_included: trends.len(),
        trends,
        summary: TrendsSummary {
            samples: summary.samples,
            avg_value: summary.avg_value,
            change_percent: summary.change_percent,
        },
    };

    write_json(&export, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_entry;
    use crate::trends::DailyTrend;
    use std::fs;

    #[test]
    fn test_write_entries_json() {
        let path = std::env::temp_dir().join("kpiwatch_test_entries.json");

        write_entries_json(&[sample_entry()], true, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed["export_version"], "1.0.0");
        assert_eq!(parsed["total_entries"], 1);
        assert_eq!(parsed["entries"][0]["field"], "Food and Beverage");
        assert_eq!(parsed["entries"][0]["values"]["oee_value"], 81.0);
        assert_eq!(parsed["summary"]["kpi_types"][0], "oee");
        assert_eq!(parsed["summary"]["date_range"][0], "2026-03-04");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_entries_json_without_summary() {
        let path = std::env::temp_dir().join("kpiwatch_test_entries_nosummary.json");

        write_entries_json(&[], true, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["total_entries"], 0);
        assert!(parsed.get("summary").is_none());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_trends_json() {
        let path = std::env::temp_dir().join("kpiwatch_test_trends.json");

        let mut day = DailyTrend::new("2026-03-04".to_string());
        day.add_sample(80.0);
        let summary = TrendSummary::from_daily(
            "oee",
            vec![day, DailyTrend::new("2026-03-05".to_string())],
        );

        write_trends_json(&summary, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["kpi_type"], "oee");
        assert_eq!(parsed["days_included"], 2);
        assert_eq!(parsed["trends"][1]["samples"], 0);
        assert_eq!(parsed["summary"]["avg_value"], 80.0);

        fs::remove_file(&path).ok();
    }
}
