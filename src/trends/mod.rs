//! Trend analysis module
//!
//! This module handles historical KPI trend calculations:
//! - Daily/weekly/monthly aggregation of headline KPI values
//! - Period-over-period comparisons
//! - Direction indicators for dashboard cards

pub mod daily;
pub mod monthly;
pub mod weekly;

use serde::{Deserialize, Serialize};

/// Represents a single day's aggregated KPI values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyTrend {
    /// Date in YYYY-MM-DD format
    pub date: String,
    /// Number of entries recorded on this day
    pub samples: u32,
    /// Mean headline value, 0 when there are no samples
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
}

impl DailyTrend {
    /// Create a new empty DailyTrend for a given date
    pub fn new(date: String) -> Self {
        Self {
            date,
            samples: 0,
            avg_value: 0.0,
            min_value: 0.0,
            max_value: 0.0,
        }
    }

    /// Add one headline value to this day's trend
    pub fn add_sample(&mut self, value: f64) {
        if self.samples == 0 {
            self.min_value = value;
            self.max_value = value;
        } else {
            self.min_value = self.min_value.min(value);
            self.max_value = self.max_value.max(value);
        }
        let prev_total = self.avg_value * self.samples as f64;
        self.samples += 1;
        // Update running average
        self.avg_value = (prev_total + value) / self.samples as f64;
    }
}

/// Represents a weekly aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyTrend {
    /// Week start date in YYYY-MM-DD format (Monday)
    pub week_start: String,
    /// Week end date in YYYY-MM-DD format (Sunday)
    pub week_end: String,
    /// ISO week number
    pub week_number: u32,
    pub samples: u32,
    /// Sample-weighted mean headline value
    pub avg_value: f64,
    /// Daily breakdown
    pub daily: Vec<DailyTrend>,
}

/// Represents a monthly aggregation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTrend {
    /// Month in YYYY-MM format
    pub month: String,
    pub samples: u32,
    pub avg_value: f64,
    /// Weekly breakdown
    pub weekly: Vec<WeeklyTrend>,
}

/// Summary of one KPI's trend with period-over-period comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    pub kpi_type: String,
    /// Daily trend data
    pub daily: Vec<DailyTrend>,
    /// Total entries in the period
    pub samples: u32,
    /// Sample-weighted mean for the period
    pub avg_value: f64,
    /// Mean change percentage vs previous period
    /// Positive = increase, Negative = decrease
    pub change_percent: f64,
}

impl TrendSummary {
    /// Create a new TrendSummary from daily data
    pub fn from_daily(kpi_type: &str, daily: Vec<DailyTrend>) -> Self {
        let samples: u32 = daily.iter().map(|d| d.samples).sum();

        // Calculate weighted average
        let weighted: f64 = daily
            .iter()
            .map(|d| d.avg_value * d.samples as f64)
            .sum();
        let avg_value = if samples > 0 {
            weighted / samples as f64
        } else {
            0.0
        };

        Self {
            kpi_type: kpi_type.to_string(),
            daily,
            samples,
            avg_value,
            change_percent: 0.0,
        }
    }

    /// Calculate period-over-period change by comparing with previous period data
    pub fn with_comparison(mut self, previous: &TrendSummary) -> Self {
        self.change_percent = if previous.samples == 0 || self.samples == 0 {
            0.0
        } else if previous.avg_value != 0.0 {
            ((self.avg_value - previous.avg_value) / previous.avg_value.abs()) * 100.0
        } else if self.avg_value != 0.0 {
            100.0
        } else {
            0.0
        };

        self
    }
}

/// Direction of a KPI between two consecutive values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    StrongUp,
    Up,
    Flat,
    Down,
    StrongDown,
}

impl TrendDirection {
    /// Percentage threshold beyond which a move counts as strong
    pub const STRONG_CHANGE_PERCENT: f64 = 5.0;

    pub fn from_change_percent(change: f64) -> Self {
        if change > Self::STRONG_CHANGE_PERCENT {
            TrendDirection::StrongUp
        } else if change > 0.0 {
            TrendDirection::Up
        } else if change < -Self::STRONG_CHANGE_PERCENT {
            TrendDirection::StrongDown
        } else if change < 0.0 {
            TrendDirection::Down
        } else {
            TrendDirection::Flat
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            TrendDirection::StrongUp => "↗",
            TrendDirection::Up => "↑",
            TrendDirection::Flat => "→",
            TrendDirection::Down => "↓",
            TrendDirection::StrongDown => "↘",
        }
    }
}

/// Percentage change from `previous` to `current`; 0 when previous is 0
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (current - previous) / previous.abs() * 100.0
    }
}

/// Granularity level for trend queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl From<&str> for Granularity {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "weekly" => Granularity::Weekly,
            "monthly" => Granularity::Monthly,
            _ => Granularity::Daily,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_trend_new() {
        let trend = DailyTrend::new("2026-02-05".to_string());
        assert_eq!(trend.date, "2026-02-05");
        assert_eq!(trend.samples, 0);
        assert_eq!(trend.avg_value, 0.0);
    }

    #[test]
    fn test_daily_trend_add_sample() {
        let mut trend = DailyTrend::new("2026-02-05".to_string());
        trend.add_sample(80.0);
        trend.add_sample(90.0);
        trend.add_sample(70.0);

        assert_eq!(trend.samples, 3);
        assert!((trend.avg_value - 80.0).abs() < 0.001);
        assert_eq!(trend.min_value, 70.0);
        assert_eq!(trend.max_value, 90.0);
    }

    #[test]
    fn test_trend_summary_from_daily() {
        let mut first = DailyTrend::new("2026-02-01".to_string());
        first.add_sample(80.0);
        let mut second = DailyTrend::new("2026-02-02".to_string());
        second.add_sample(90.0);
        second.add_sample(100.0);
        let empty = DailyTrend::new("2026-02-03".to_string());

        let summary = TrendSummary::from_daily("oee", vec![first, second, empty]);

        assert_eq!(summary.samples, 3);
        assert!((summary.avg_value - 90.0).abs() < 0.001);
    }

    #[test]
    fn test_trend_summary_with_comparison() {
        let mut current_day = DailyTrend::new("2026-02-08".to_string());
        current_day.add_sample(85.0);
        let mut previous_day = DailyTrend::new("2026-02-01".to_string());
        previous_day.add_sample(80.0);

        let current = TrendSummary::from_daily("oee", vec![current_day]);
        let previous = TrendSummary::from_daily("oee", vec![previous_day]);

        let compared = current.with_comparison(&previous);
        assert!((compared.change_percent - 6.25).abs() < 0.001);
    }

    #[test]
    fn test_comparison_without_previous_data() {
        let mut day = DailyTrend::new("2026-02-08".to_string());
        day.add_sample(85.0);
        let current = TrendSummary::from_daily("oee", vec![day]);
        let previous = TrendSummary::from_daily("oee", vec![]);

        assert_eq!(current.with_comparison(&previous).change_percent, 0.0);
    }

    #[test]
    fn test_trend_direction_bands() {
        assert_eq!(TrendDirection::from_change_percent(7.0), TrendDirection::StrongUp);
        assert_eq!(TrendDirection::from_change_percent(5.0), TrendDirection::Up);
        assert_eq!(TrendDirection::from_change_percent(0.0), TrendDirection::Flat);
        assert_eq!(TrendDirection::from_change_percent(-2.0), TrendDirection::Down);
        assert_eq!(TrendDirection::from_change_percent(-5.1), TrendDirection::StrongDown);
        assert_eq!(TrendDirection::StrongDown.arrow(), "↘");
    }

    #[test]
    fn test_percent_change() {
        assert!((percent_change(110.0, 100.0) - 10.0).abs() < 1e-9);
        assert_eq!(percent_change(50.0, 0.0), 0.0);
        assert!((percent_change(-5.0, -10.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_granularity_from_str() {
        assert_eq!(Granularity::from("WEEKLY"), Granularity::Weekly);
        assert_eq!(Granularity::from("monthly"), Granularity::Monthly);
        assert_eq!(Granularity::from("unknown"), Granularity::Daily);
        assert_eq!(Granularity::default(), Granularity::Daily);
    }
}
