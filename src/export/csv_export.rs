//! CSV export functionality
//!
//! Provides CSV serialization for KPI entries and trends.

use std::path::Path;

use csv::Writer;
use serde::Serialize;

use super::{ExportableEntry, ExportableTrend};
use crate::CommandError;

/// Column order of [`ExportableEntry`]
const ENTRY_COLUMNS: [&str; 9] = [
    "entry_id",
    "username",
    "field",
    "date",
    "process_name",
    "kpi_type",
    "metric",
    "value",
    "headline",
];

/// Column order of [`ExportableTrend`]
const TREND_COLUMNS: [&str; 6] = [
    "date",
    "kpi_type",
    "samples",
    "avg_value",
    "min_value",
    "max_value",
];

fn write_records<T: Serialize>(
    records: &[T],
    columns: &[&str],
    path: &Path,
) -> Result<(), CommandError> {
    let file = std::fs::File::create(path)
        .map_err(|e| CommandError::Internal(format!("Failed to create CSV file: {}", e)))?;

    let mut writer = Writer::from_writer(file);

    // Headers come from the first record, or are written alone when there is none
    if records.is_empty() {
        writer
            .write_record(columns)
            .map_err(|e| CommandError::Internal(format!("Failed to write CSV header: {}", e)))?;
    }
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| CommandError::Internal(format!("Failed to write CSV record: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| CommandError::Internal(format!("Failed to flush CSV: {}", e)))?;

    Ok(())
}

/// Write KPI entries to CSV, one row per sub-metric
pub fn write_entries_csv(entries: &[ExportableEntry], path: &Path) -> Result<(), CommandError> {
    write_records(entries, &ENTRY_COLUMNS, path)
}

/// Write trends to CSV format
pub fn write_trends_csv(trends: &[ExportableTrend], path: &Path) -> Result<(), CommandError> {
    write_records(trends, &TREND_COLUMNS, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::tests::sample_entry;
    use crate::kpi::catalogue;
    use std::fs;

    #[test]
    fn test_write_entries_csv() {
        let path = std::env::temp_dir().join("kpiwatch_test_entries.csv");

        let rows = ExportableEntry::rows(&sample_entry(), catalogue());
        write_entries_csv(&rows, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("entry_id,username,field,date,process_name,kpi_type,metric,value,headline")
        );
        assert_eq!(content.lines().count(), 5);
        assert!(content.contains("7,alice,Food and Beverage,2026-03-04,Line A,oee,oee_value,81.0,true"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_trends_csv() {
        let path = std::env::temp_dir().join("kpiwatch_test_trends.csv");

        let trends = vec![ExportableTrend {
            date: "2026-03-04".to_string(),
            kpi_type: "oee".to_string(),
            samples: 2,
            avg_value: 85.0,
            min_value: 80.0,
            max_value: 90.0,
        }];
        write_trends_csv(&trends, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("date,kpi_type,samples,avg_value,min_value,max_value"));
        assert!(content.contains("2026-03-04,oee,2,85.0,80.0,90.0"));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_write_empty_csv() {
        let path = std::env::temp_dir().join("kpiwatch_test_empty.csv");

        write_entries_csv(&[], &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_empty_export_keeps_header() {
        let path = std::env::temp_dir().join("kpiwatch_test_entries_empty.csv");

        write_entries_csv(&[], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "entry_id,username,field,date,process_name,kpi_type,metric,value,headline\n"
        );

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_header_matches_serialized_columns() {
        let path = std::env::temp_dir().join("kpiwatch_test_trends_header.csv");

        let trend = ExportableTrend {
            date: "2026-03-04".to_string(),
            kpi_type: "oee".to_string(),
            samples: 0,
            avg_value: 0.0,
            min_value: 0.0,
            max_value: 0.0,
        };
        write_trends_csv(&[trend], &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().next(), Some(TREND_COLUMNS.join(",").as_str()));

        fs::remove_file(&path).ok();
    }
}
