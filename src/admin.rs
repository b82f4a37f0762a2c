//! Cross-user KPI overview for administrators
//!
//! Read-only aggregation over every user's entries, using each entry's
//! headline value.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::kpi::Catalogue;
use crate::models::KpiEntry;

/// Descriptive statistics of one KPI type's headline values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiStatistics {
    pub kpi_type: String,
    pub count: u32,
    pub mean: f64,
    /// Sample standard deviation, 0 below two values
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean headline value of one KPI type within a group (industry or user)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupAverage {
    pub group: String,
    pub kpi_type: String,
    pub samples: u32,
    pub avg_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    pub total_entries: usize,
    pub users: usize,
    pub statistics: Vec<KpiStatistics>,
    pub by_field: Vec<GroupAverage>,
    pub by_user: Vec<GroupAverage>,
}

fn statistics(kpi_type: &str, values: &[f64]) -> KpiStatistics {
    let count = values.len();
    let mean = values.iter().sum::<f64>() / count.max(1) as f64;
    let std_dev = if count > 1 {
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    } else {
        0.0
    };

    KpiStatistics {
        kpi_type: kpi_type.to_string(),
        count: count as u32,
        mean,
        std_dev,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

fn group_averages<'a, F>(points: &[(&'a KpiEntry, f64)], key: F) -> Vec<GroupAverage>
where
    F: Fn(&'a KpiEntry) -> &'a str,
{
    let mut sums: BTreeMap<(&str, &str), (f64, u32)> = BTreeMap::new();
    for (entry, value) in points {
        let sum = sums
            .entry((key(*entry), entry.kpi_type.as_str()))
            .or_insert((0.0, 0));
        sum.0 += value;
        sum.1 += 1;
    }

    sums.into_iter()
        .map(|((group, kpi_type), (total, samples))| GroupAverage {
            group: group.to_string(),
            kpi_type: kpi_type.to_string(),
            samples,
            avg_value: total / samples as f64,
        })
        .collect()
}

/// Overview of all entries; entries without a headline value are skipped
pub fn build_overview(entries: &[KpiEntry], catalogue: &Catalogue) -> AdminOverview {
    let points: Vec<(&KpiEntry, f64)> = entries
        .iter()
        .filter_map(|e| e.headline(catalogue).map(|v| (e, v)))
        .collect();

    let mut by_kpi: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for (entry, value) in &points {
        by_kpi.entry(entry.kpi_type.as_str()).or_default().push(*value);
    }

    let users: BTreeSet<&str> = entries.iter().map(|e| e.username.as_str()).collect();

    AdminOverview {
        total_entries: entries.len(),
        users: users.len(),
        statistics: by_kpi
            .iter()
            .map(|(kpi_type, values)| statistics(kpi_type, values))
            .collect(),
        by_field: group_averages(&points, |e| e.field.label()),
        by_user: group_averages(&points, |e| e.username.as_str()),
    }
}
