//! Recommendation types
//!
//! Data structures for representing improvement recommendations and KPI alerts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::kpi::{Catalogue, Industry};
use crate::models::KpiEntry;

/// Type of recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationType {
    FlowOptimization,
    EnergyEfficiency,
    YieldImprovement,
    WasteReduction,
    QualityImprovement,
    EfficiencyImprovement,
    DataCollection,
    ContinuousImprovement,
    EmployeeEngagement,
}

impl RecommendationType {
    /// Get display label for the recommendation type
    pub fn label(&self) -> &'static str {
        match self {
            Self::FlowOptimization => "Flow Optimization",
            Self::EnergyEfficiency => "Energy Efficiency",
            Self::YieldImprovement => "Yield Improvement",
            Self::WasteReduction => "Waste Reduction",
            Self::QualityImprovement => "Quality Improvement",
            Self::EfficiencyImprovement => "Efficiency Improvement",
            Self::DataCollection => "Data Collection",
            Self::ContinuousImprovement => "Continuous Improvement",
            Self::EmployeeEngagement => "Employee Engagement",
        }
    }

    /// Get priority weight (higher = more important)
    pub fn priority_weight(&self) -> f64 {
        match self {
            Self::QualityImprovement => 1.0,
            Self::YieldImprovement => 0.95,
            Self::WasteReduction => 0.9,
            Self::EfficiencyImprovement => 0.9,
            Self::FlowOptimization => 0.85,
            Self::EnergyEfficiency => 0.8,
            Self::DataCollection => 0.4,
            Self::ContinuousImprovement => 0.35,
            Self::EmployeeEngagement => 0.3,
        }
    }
}

/// A single recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub rec_type: RecommendationType,
    /// Short title for the recommendation
    pub title: String,
    pub description: String,
    /// Specific action items to implement this recommendation
    pub action_items: Vec<String>,
    /// KPI the recommendation is based on, if any
    pub based_on: Option<String>,
    /// Distance from the target, in percent of the target
    pub gap_percent: f64,
    /// Priority score for sorting (computed from type + gap)
    pub priority_score: f64,
}

impl Recommendation {
    /// Create a new recommendation with computed priority
    pub fn new(
        rec_type: RecommendationType,
        title: String,
        description: String,
        action_items: Vec<String>,
        based_on: Option<String>,
        gap_percent: f64,
    ) -> Self {
        let gap_factor = (gap_percent.abs() / 100.0).min(1.0);
        let priority_score = rec_type.priority_weight() * (0.5 + 0.5 * gap_factor);

        Self {
            rec_type,
            title,
            description,
            action_items,
            based_on,
            gap_percent,
            priority_score,
        }
    }
}

/// Summary of all recommendations for one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSummary {
    /// All recommendations sorted by priority
    pub recommendations: Vec<Recommendation>,
    /// Top priority recommendation (if any)
    pub top_priority: Option<Recommendation>,
    /// Number of recommendations triggered by a KPI threshold
    pub kpi_driven_count: u32,
    /// Number of entries analyzed
    pub entries_analyzed: u32,
}

impl RecommendationSummary {
    /// Create a new summary from a list of recommendations
    pub fn from_recommendations(mut recommendations: Vec<Recommendation>, entries_analyzed: u32) -> Self {
        // Sort by priority score (highest first)
        recommendations.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let kpi_driven_count = recommendations
            .iter()
            .filter(|r| r.based_on.is_some())
            .count() as u32;
        let top_priority = recommendations.first().cloned();

        Self {
            recommendations,
            top_priority,
            kpi_driven_count,
            entries_analyzed,
        }
    }

    /// Filter recommendations by type
    pub fn with_types(mut self, types: &[RecommendationType]) -> Self {
        self.recommendations.retain(|r| types.contains(&r.rec_type));
        Self::from_recommendations(self.recommendations, self.entries_analyzed)
    }

    /// Limit the number of recommendations
    pub fn limit(mut self, max: usize) -> Self {
        self.recommendations.truncate(max);
        Self::from_recommendations(self.recommendations, self.entries_analyzed)
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// A KPI value outside its target band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KpiAlert {
    pub kpi_type: String,
    pub severity: AlertSeverity,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
}

/// Aggregated KPI values used as recommendation input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationInput {
    pub industry: Industry,
    /// KPI id -> mean headline value
    pub means: BTreeMap<String, f64>,
    /// KPI id -> best (highest) headline value
    pub best: BTreeMap<String, f64>,
    /// KPI id -> headline value of the most recent entry
    pub latest: BTreeMap<String, f64>,
    pub entries_analyzed: u32,
}

impl RecommendationInput {
    /// Aggregate headline values of a user's entries
    pub fn from_entries(industry: Industry, entries: &[KpiEntry], catalogue: &Catalogue) -> Self {
        let mut sums: BTreeMap<String, (f64, u32)> = BTreeMap::new();
        let mut best: BTreeMap<String, f64> = BTreeMap::new();
        let mut latest: BTreeMap<String, (chrono::NaiveDate, i64, f64)> = BTreeMap::new();
        let mut entries_analyzed = 0;

        for entry in entries {
            let Some(value) = entry.headline(catalogue) else {
                continue;
            };
            entries_analyzed += 1;

            let sum = sums.entry(entry.kpi_type.clone()).or_insert((0.0, 0));
            sum.0 += value;
            sum.1 += 1;

            best.entry(entry.kpi_type.clone())
                .and_modify(|b| *b = b.max(value))
                .or_insert(value);

            let key = (entry.date, entry.id);
            latest
                .entry(entry.kpi_type.clone())
                .and_modify(|l| {
                    if key >= (l.0, l.1) {
                        *l = (entry.date, entry.id, value);
                    }
                })
                .or_insert((entry.date, entry.id, value));
        }

        Self {
            industry,
            means: sums
                .into_iter()
                .map(|(k, (total, n))| (k, total / n as f64))
                .collect(),
            best,
            latest: latest.into_iter().map(|(k, (_, _, v))| (k, v)).collect(),
            entries_analyzed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(rec_type: RecommendationType, gap: f64) -> Recommendation {
        Recommendation::new(
            rec_type,
            "title".to_string(),
            "description".to_string(),
            vec![],
            Some("oee".to_string()),
            gap,
        )
    }

    #[test]
    fn test_priority_score() {
        let r = rec(RecommendationType::QualityImprovement, 100.0);
        assert!((r.priority_score - 1.0).abs() < 1e-9);

        let r = rec(RecommendationType::QualityImprovement, 0.0);
        assert!((r.priority_score - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_summary_sorted_by_priority() {
        let summary = RecommendationSummary::from_recommendations(
            vec![
                rec(RecommendationType::EmployeeEngagement, 0.0),
                rec(RecommendationType::QualityImprovement, 40.0),
                rec(RecommendationType::EnergyEfficiency, 50.0),
            ],
            10,
        );

        assert_eq!(
            summary.top_priority.as_ref().map(|r| r.rec_type),
            Some(RecommendationType::QualityImprovement)
        );
        assert_eq!(
            summary.recommendations.last().map(|r| r.rec_type),
            Some(RecommendationType::EmployeeEngagement)
        );
        assert_eq!(summary.kpi_driven_count, 3);
    }

    #[test]
    fn test_with_types_and_limit() {
        let summary = RecommendationSummary::from_recommendations(
            vec![
                rec(RecommendationType::WasteReduction, 10.0),
                rec(RecommendationType::YieldImprovement, 10.0),
                rec(RecommendationType::DataCollection, 0.0),
            ],
            3,
        );

        let only_waste = summary.clone().with_types(&[RecommendationType::WasteReduction]);
        assert_eq!(only_waste.recommendations.len(), 1);

        let top = summary.limit(1);
        assert_eq!(top.recommendations.len(), 1);
        assert_eq!(top.recommendations[0].rec_type, RecommendationType::YieldImprovement);
    }
}
