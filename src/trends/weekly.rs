//! Weekly trend calculations
//!
//! Rolls daily KPI trends up into ISO weeks (Monday to Sunday).

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use super::daily::parse_date;
use super::{DailyTrend, WeeklyTrend};

/// Get the Monday of the week containing the given date
fn week_start(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday();
    date - chrono::Duration::days(days_from_monday as i64)
}

/// Get the Sunday of the week containing the given date
fn week_end(date: NaiveDate) -> NaiveDate {
    let days_to_sunday = 6 - date.weekday().num_days_from_monday();
    date + chrono::Duration::days(days_to_sunday as i64)
}

/// Aggregate daily trends into weekly trends
pub fn aggregate_to_weekly(daily_trends: Vec<DailyTrend>) -> Vec<WeeklyTrend> {
    let mut weekly_map: HashMap<NaiveDate, WeeklyTrend> = HashMap::new();

    for daily in daily_trends {
        let Some(date) = parse_date(&daily.date) else {
            continue;
        };
        let start = week_start(date);

        let weekly = weekly_map.entry(start).or_insert_with(|| WeeklyTrend {
            week_start: start.format("%Y-%m-%d").to_string(),
            week_end: week_end(date).format("%Y-%m-%d").to_string(),
            week_number: date.iso_week().week(),
            samples: 0,
            avg_value: 0.0,
            daily: Vec::new(),
        });

        // Update sample-weighted average
        let prev_total = weekly.avg_value * weekly.samples as f64;
        weekly.samples += daily.samples;
        if weekly.samples > 0 {
            weekly.avg_value =
                (prev_total + daily.avg_value * daily.samples as f64) / weekly.samples as f64;
        }

        weekly.daily.push(daily);
    }

    let mut weeks: Vec<WeeklyTrend> = weekly_map
        .into_values()
        .map(|mut w| {
            w.daily.sort_by(|a, b| a.date.cmp(&b.date));
            w
        })
        .collect();

    weeks.sort_by(|a, b| a.week_start.cmp(&b.week_start));

    weeks
}
