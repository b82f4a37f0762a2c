//! KPI computation engine
//!
//! Turns one input row plus a user's enabled KPI identifiers into KPI
//! results. Every enabled KPI is evaluated independently: one whose
//! required fields are absent is left out of the results and reported in
//! the skipped list, as is any identifier the catalogue does not know.

pub mod persist;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::kpi::{Catalogue, InputRow, KpiResult};
use crate::preferences::KpiSelection;

pub use persist::{persist_report, submit, EntryHeader, EntrySink, PersistOutcome, PersistStatus, Submission};

/// Why an enabled KPI produced no result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// Identifier is not in the catalogue
    UnknownKpi,
    /// The row lacks these required fields
    MissingFields { fields: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedKpi {
    pub kpi: String,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// Output of [`compute_all`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComputationReport {
    /// KPI identifier -> sub-metric results
    pub computed: BTreeMap<String, KpiResult>,
    pub skipped: Vec<SkippedKpi>,
}

impl ComputationReport {
    pub fn is_empty(&self) -> bool {
        self.computed.is_empty()
    }

    /// Identifiers skipped because of missing fields
    pub fn incomplete(&self) -> impl Iterator<Item = &SkippedKpi> {
        self.skipped
            .iter()
            .filter(|s| matches!(s.reason, SkipReason::MissingFields { .. }))
    }
}

/// Compute every enabled KPI the row has inputs for
pub fn compute_all(
    row: &InputRow,
    enabled: &KpiSelection,
    catalogue: &Catalogue,
) -> ComputationReport {
    let mut report = ComputationReport::default();

    for id in enabled {
        let Some(def) = catalogue.lookup(id) else {
            tracing::debug!("Ignoring unknown KPI {}", id);
            report.skipped.push(SkippedKpi {
                kpi: id.clone(),
                reason: SkipReason::UnknownKpi,
            });
            continue;
        };

        match def.apply(row) {
            Ok(result) => {
                report.computed.insert(id.clone(), result);
            }
            Err(missing) => {
                tracing::debug!("Skipping {}: missing {}", id, missing.join(", "));
                report.skipped.push(SkippedKpi {
                    kpi: id.clone(),
                    reason: SkipReason::MissingFields { fields: missing },
                });
            }
        }
    }

    report
}
