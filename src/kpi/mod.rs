//! KPI definitions and computation
//!
//! This module holds everything needed to turn a row of raw process
//! measurements into derived KPI values:
//! - Zero-guarded formulas (one function per KPI)
//! - The static catalogue mapping identifiers to definitions
//! - The per-industry strategy table

pub mod catalogue;
pub mod formulas;
pub mod industry;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use catalogue::{catalogue, Catalogue, KpiDefinition, KpiScope};
pub use industry::Industry;

/// Result of one KPI computation: sub-metric name -> value
pub type KpiResult = BTreeMap<String, f64>;

/// KPI computation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KpiError {
    #[error("Unknown KPI: {0}")]
    UnknownKpi(String),

    #[error("KPI {kpi} requires field {field}")]
    MissingField { kpi: String, field: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// A transient row of named numeric measurements
///
/// Rows are built from form input or from a single CSV line. Every value is
/// finite; non-finite numbers are rejected on insert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputRow {
    values: BTreeMap<String, f64>,
}

impl InputRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(field, value)` pairs
    pub fn from_pairs<K: Into<String>>(
        pairs: impl IntoIterator<Item = (K, f64)>,
    ) -> Result<Self, KpiError> {
        let mut row = Self::new();
        for (field, value) in pairs {
            row.insert(field, value)?;
        }
        Ok(row)
    }

    /// Insert or replace a field value
    pub fn insert(&mut self, field: impl Into<String>, value: f64) -> Result<(), KpiError> {
        let field = field.into();
        if !value.is_finite() {
            return Err(KpiError::InvalidValue {
                field,
                value: value.to_string(),
            });
        }
        self.values.insert(field, value);
        Ok(())
    }

    /// Parse a textual value and insert it
    ///
    /// Blank text leaves the field absent.
    pub fn insert_text(&mut self, field: &str, text: &str) -> Result<(), KpiError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let value: f64 = text.parse().map_err(|_| KpiError::InvalidValue {
            field: field.to_string(),
            value: text.to_string(),
        })?;
        self.insert(field, value)
    }

    pub fn get(&self, field: &str) -> Option<f64> {
        self.values.get(field).copied()
    }

    /// Value of a field known to be present; absent fields read as 0.0
    pub fn value(&self, field: &str) -> f64 {
        self.get(field).unwrap_or(0.0)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Fields from `required` that this row does not carry, in order
    pub fn missing_fields(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|f| !self.contains(f))
            .map(|f| f.to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite_values() {
        let mut row = InputRow::new();
        assert!(row.insert("total_units", f64::NAN).is_err());
        assert!(row.insert("total_units", f64::INFINITY).is_err());
        assert!(row.is_empty());
    }

    #[test]
    fn test_insert_text() {
        let mut row = InputRow::new();
        row.insert_text("total_units", " 120 ").unwrap();
        row.insert_text("good_units", "").unwrap();

        assert_eq!(row.get("total_units"), Some(120.0));
        assert!(!row.contains("good_units"));
        assert!(row.insert_text("scrap_cost", "abc").is_err());
        assert!(row.insert_text("scrap_cost", "NaN").is_err());
    }

    #[test]
    fn test_missing_fields_preserves_order() {
        let row = InputRow::from_pairs([("good_units", 5.0)]).unwrap();
        let missing = row.missing_fields(&["total_units", "good_units", "theoretical_output"]);
        assert_eq!(missing, vec!["total_units", "theoretical_output"]);
    }
}
