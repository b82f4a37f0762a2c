//! KPI entry records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::kpi::{Catalogue, Industry, KpiResult};

/// One stored measurement event for a single KPI type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiEntry {
    pub id: i64,
    pub username: String,
    pub field: Industry,
    pub date: NaiveDate,
    pub process_name: String,
    pub kpi_type: String,
    /// Sub-metric name -> value
    pub values: KpiResult,
    pub created_at: String,
}

impl KpiEntry {
    /// Headline sub-metric value, if the KPI type is known
    pub fn headline(&self, catalogue: &Catalogue) -> Option<f64> {
        catalogue
            .lookup(&self.kpi_type)
            .and_then(|def| def.headline_value(&self.values))
    }
}

/// Entry about to be appended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKpiEntry {
    pub username: String,
    pub field: Industry,
    pub date: NaiveDate,
    pub process_name: String,
    pub kpi_type: String,
    pub values: KpiResult,
}
