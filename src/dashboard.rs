//! Dashboard summaries
//!
//! Builds the per-KPI cards shown for a user: latest headline value, the one
//! before it, and the direction of the move. Also provides the per-process
//! comparison table.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::kpi::{Catalogue, Industry};
use crate::models::KpiEntry;
use crate::recommendations::{generate_alerts, KpiAlert, RecommendationInput};
use crate::trends::{percent_change, TrendDirection};

/// Latest state of one KPI type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardCard {
    pub kpi_type: String,
    pub name: String,
    pub unit: String,
    pub latest: f64,
    /// Value of the entry before the latest one, if any
    pub previous: Option<f64>,
    /// Absolute change from previous to latest, 0 without a previous value
    pub change: f64,
    pub percent_change: f64,
    pub direction: TrendDirection,
    pub arrow: String,
    pub date: NaiveDate,
    pub process_name: String,
}

/// Everything shown on a user's dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    /// Distinct process names across all of the user's entries
    pub processes: Vec<String>,
    /// Process the cards are restricted to, if any
    pub process_filter: Option<String>,
    pub cards: Vec<DashboardCard>,
    pub alerts: Vec<KpiAlert>,
    pub entries_analyzed: u32,
}

/// Mean headline value of one KPI type on one process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessComparison {
    pub process_name: String,
    pub kpi_type: String,
    pub samples: u32,
    pub avg_value: f64,
}

/// Entries sorted oldest first, ties broken by insertion order
fn chronological<'a>(entries: impl Iterator<Item = &'a KpiEntry>) -> Vec<&'a KpiEntry> {
    let mut sorted: Vec<&KpiEntry> = entries.collect();
    sorted.sort_by_key(|e| (e.date, e.id));
    sorted
}

/// One card per KPI type with a headline value, in catalogue order
pub fn build_cards(entries: &[KpiEntry], catalogue: &Catalogue) -> Vec<DashboardCard> {
    let mut by_type: BTreeMap<&str, Vec<(&KpiEntry, f64)>> = BTreeMap::new();
    for entry in chronological(entries.iter()) {
        if let Some(value) = entry.headline(catalogue) {
            by_type.entry(entry.kpi_type.as_str()).or_default().push((entry, value));
        }
    }

    catalogue
        .definitions()
        .filter_map(|def| {
            let series = by_type.get(def.id)?;
            let (entry, latest) = *series.last()?;
            let previous = series.len().checked_sub(2).map(|i| series[i].1);

            let (change, pct) = match previous {
                Some(prev) => (latest - prev, percent_change(latest, prev)),
                None => (0.0, 0.0),
            };
            let direction = TrendDirection::from_change_percent(pct);

            Some(DashboardCard {
                kpi_type: def.id.to_string(),
                name: def.name.to_string(),
                unit: def.unit.to_string(),
                latest,
                previous,
                change,
                percent_change: pct,
                direction,
                arrow: direction.arrow().to_string(),
                date: entry.date,
                process_name: entry.process_name.clone(),
            })
        })
        .collect()
}

/// Dashboard for a user's entries, optionally restricted to one process
pub fn build_dashboard(
    industry: &Industry,
    entries: &[KpiEntry],
    process: Option<&str>,
    catalogue: &Catalogue,
) -> Dashboard {
    let processes: BTreeSet<&str> = entries.iter().map(|e| e.process_name.as_str()).collect();

    let selected: Vec<KpiEntry> = entries
        .iter()
        .filter(|e| process.map_or(true, |p| e.process_name == p))
        .cloned()
        .collect();

    let input = RecommendationInput::from_entries(industry.clone(), &selected, catalogue);

    Dashboard {
        processes: processes.into_iter().map(str::to_string).collect(),
        process_filter: process.map(str::to_string),
        cards: build_cards(&selected, catalogue),
        alerts: generate_alerts(&input),
        entries_analyzed: input.entries_analyzed,
    }
}

/// Mean headline value per (process, KPI type), sorted by process then KPI
pub fn compare_processes(entries: &[KpiEntry], catalogue: &Catalogue) -> Vec<ProcessComparison> {
    let mut sums: BTreeMap<(&str, &str), (f64, u32)> = BTreeMap::new();

    for entry in entries {
        let Some(value) = entry.headline(catalogue) else {
            continue;
        };
        let sum = sums
            .entry((entry.process_name.as_str(), entry.kpi_type.as_str()))
            .or_insert((0.0, 0));
        sum.0 += value;
        sum.1 += 1;
    }

    sums.into_iter()
        .map(|((process_name, kpi_type), (total, samples))| ProcessComparison {
            process_name: process_name.to_string(),
            kpi_type: kpi_type.to_string(),
            samples,
            avg_value: total / samples as f64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kpi::catalogue;

    fn entry(id: i64, date: &str, process: &str, kpi_type: &str, metric: &str, value: f64) -> KpiEntry {
        let mut values = BTreeMap::new();
        values.insert(metric.to_string(), value);
        KpiEntry {
            id,
            username: "alice".to_string(),
            field: Industry::OilAndGas,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            process_name: process.to_string(),
            kpi_type: kpi_type.to_string(),
            values,
            created_at: String::new(),
        }
    }

    #[test]
    fn test_cards_latest_and_previous() {
        let entries = vec![
            entry(3, "2026-03-03", "Line A", "oee", "oee_value", 88.0),
            entry(1, "2026-03-01", "Line A", "oee", "oee_value", 80.0),
            entry(2, "2026-03-02", "Line B", "yield", "yield_rate", 95.0),
        ];

        let cards = build_cards(&entries, catalogue());
        assert_eq!(cards.len(), 2);

        let oee = cards.iter().find(|c| c.kpi_type == "oee").unwrap();
        assert_eq!(oee.latest, 88.0);
        assert_eq!(oee.previous, Some(80.0));
        assert!((oee.change - 8.0).abs() < 1e-9);
        assert!((oee.percent_change - 10.0).abs() < 1e-9);
        assert_eq!(oee.direction, TrendDirection::StrongUp);

        let yield_card = cards.iter().find(|c| c.kpi_type == "yield").unwrap();
        assert_eq!(yield_card.previous, None);
        assert_eq!(yield_card.direction, TrendDirection::Flat);
    }

    #[test]
    fn test_previous_zero_means_no_percent_change() {
        let entries = vec![
            entry(1, "2026-03-01", "Line A", "oee", "oee_value", 0.0),
            entry(2, "2026-03-02", "Line A", "oee", "oee_value", 50.0),
        ];
        let cards = build_cards(&entries, catalogue());
        assert_eq!(cards[0].percent_change, 0.0);
        assert_eq!(cards[0].direction, TrendDirection::Flat);
    }

    #[test]
    fn test_dashboard_process_filter() {
        let entries = vec![
            entry(1, "2026-03-01", "Line A", "flow_efficiency", "efficiency", 65.0),
            entry(2, "2026-03-02", "Line B", "flow_efficiency", "efficiency", 95.0),
        ];

        let all = build_dashboard(&Industry::OilAndGas, &entries, None, catalogue());
        assert_eq!(all.processes, vec!["Line A", "Line B"]);
        assert_eq!(all.cards[0].latest, 95.0);
        assert!(all.alerts.is_empty());

        let line_a = build_dashboard(&Industry::OilAndGas, &entries, Some("Line A"), catalogue());
        assert_eq!(line_a.processes.len(), 2);
        assert_eq!(line_a.cards[0].latest, 65.0);
        assert_eq!(line_a.alerts.len(), 1);
        assert_eq!(line_a.entries_analyzed, 1);
    }

    #[test]
    fn test_compare_processes() {
        let entries = vec![
            entry(1, "2026-03-01", "Line A", "oee", "oee_value", 80.0),
            entry(2, "2026-03-02", "Line A", "oee", "oee_value", 90.0),
            entry(3, "2026-03-02", "Line B", "oee", "oee_value", 70.0),
            entry(4, "2026-03-02", "Line B", "unknown", "x", 1.0),
        ];

        let rows = compare_processes(&entries, catalogue());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].process_name, "Line A");
        assert_eq!(rows[0].samples, 2);
        assert!((rows[0].avg_value - 85.0).abs() < 1e-9);
        assert_eq!(rows[1].avg_value, 70.0);
    }
}
