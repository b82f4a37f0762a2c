//! Daily trend calculations
//!
//! Aggregates headline KPI values by day for trend analysis.

use std::collections::{HashMap, HashSet};

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::Serialize;

use super::{DailyTrend, TrendSummary};
use crate::kpi::Catalogue;
use crate::models::KpiEntry;

/// Parse a date string in YYYY-MM-DD format
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Get current UTC date
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Get the date N days before `from`, `None` outside the supported date range
pub fn days_before(from: NaiveDate, n: i64) -> Option<NaiveDate> {
    from.checked_sub_signed(ChronoDuration::try_days(n)?)
}

/// One headline value of one entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiPoint {
    pub date: NaiveDate,
    pub process_name: String,
    pub value: f64,
}

/// Headline values of `kpi_type` across entries, in entry order
///
/// Entries of other types, or whose stored result lacks the headline
/// sub-metric, are left out.
pub fn headline_series(entries: &[KpiEntry], kpi_type: &str, catalogue: &Catalogue) -> Vec<KpiPoint> {
    entries
        .iter()
        .filter(|e| e.kpi_type == kpi_type)
        .filter_map(|e| {
            e.headline(catalogue).map(|value| KpiPoint {
                date: e.date,
                process_name: e.process_name.clone(),
                value,
            })
        })
        .collect()
}

/// Aggregate points by day
///
/// Takes a list of points and returns a map of date -> DailyTrend
pub fn aggregate_by_day(points: &[KpiPoint]) -> HashMap<String, DailyTrend> {
    let mut daily_map: HashMap<String, DailyTrend> = HashMap::new();

    for point in points {
        let date = format_date(point.date);
        let trend = daily_map
            .entry(date.clone())
            .or_insert_with(|| DailyTrend::new(date));
        trend.add_sample(point.value);
    }

    daily_map
}

/// Convert daily map to sorted vector
pub fn daily_map_to_sorted_vec(map: HashMap<String, DailyTrend>) -> Vec<DailyTrend> {
    let mut trends: Vec<DailyTrend> = map.into_values().collect();
    trends.sort_by(|a, b| a.date.cmp(&b.date));
    trends
}

/// Filter daily trends by inclusive date range
pub fn filter_by_date_range(
    trends: Vec<DailyTrend>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<DailyTrend> {
    trends
        .into_iter()
        .filter(|t| {
            let Some(date) = parse_date(&t.date) else {
                return false;
            };
            start.map_or(true, |s| date >= s) && end.map_or(true, |e| date <= e)
        })
        .collect()
}

/// Daily trends between `start` and `end` inclusive, one per day
pub fn get_daily_trends(points: &[KpiPoint], start: NaiveDate, end: NaiveDate) -> Vec<DailyTrend> {
    let daily_map = aggregate_by_day(points);
    let mut trends = filter_by_date_range(daily_map_to_sorted_vec(daily_map), Some(start), Some(end));

    fill_missing_days(&mut trends, start, end);

    trends
}

/// Fill in missing days with empty trends
fn fill_missing_days(trends: &mut Vec<DailyTrend>, start: NaiveDate, end: NaiveDate) {
    let existing: HashSet<String> = trends.iter().map(|t| t.date.clone()).collect();

    let mut current = start;
    while current <= end {
        let date_str = format_date(current);
        if !existing.contains(&date_str) {
            trends.push(DailyTrend::new(date_str));
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    trends.sort_by(|a, b| a.date.cmp(&b.date));
}

/// Trend summary for `start..=end` compared with the equally long period before it
pub fn calculate_trend_summary(
    kpi_type: &str,
    points: &[KpiPoint],
    start: NaiveDate,
    end: NaiveDate,
) -> TrendSummary {
    let current = TrendSummary::from_daily(kpi_type, get_daily_trends(points, start, end));
    if end < start {
        return current;
    }

    let period_days = (end - start).num_days() + 1;
    let Some((prev_start, prev_end)) = days_before(start, 1)
        .and_then(|prev_end| days_before(prev_end, period_days - 1).map(|s| (s, prev_end)))
    else {
        return current;
    };

    let previous =
        TrendSummary::from_daily(kpi_type, get_daily_trends(points, prev_start, prev_end));

    current.with_comparison(&previous)
}
