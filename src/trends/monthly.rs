//! Monthly trend calculations

use std::collections::HashMap;

use chrono::NaiveDate;

use super::daily::parse_date;
use super::weekly::aggregate_to_weekly;
use super::{DailyTrend, MonthlyTrend};

/// Get the month identifier (YYYY-MM) for a date
fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

/// Aggregate daily trends into monthly trends
///
/// Weeks are attached to the month their Monday falls in.
pub fn aggregate_to_monthly(daily_trends: Vec<DailyTrend>) -> Vec<MonthlyTrend> {
    let weekly = aggregate_to_weekly(daily_trends.clone());

    let mut monthly_map: HashMap<String, MonthlyTrend> = HashMap::new();

    for daily in daily_trends {
        let Some(date) = parse_date(&daily.date) else {
            continue;
        };
        let key = month_key(date);

        let monthly = monthly_map
            .entry(key.clone())
            .or_insert_with(|| MonthlyTrend {
                month: key,
                samples: 0,
                avg_value: 0.0,
                weekly: Vec::new(),
            });

        let prev_total = monthly.avg_value * monthly.samples as f64;
        monthly.samples += daily.samples;
        if monthly.samples > 0 {
            monthly.avg_value =
                (prev_total + daily.avg_value * daily.samples as f64) / monthly.samples as f64;
        }
    }

    for week in weekly {
        if let Some(date) = parse_date(&week.week_start) {
            if let Some(monthly) = monthly_map.get_mut(&month_key(date)) {
                monthly.weekly.push(week);
            }
        }
    }

    let mut months: Vec<MonthlyTrend> = monthly_map
        .into_values()
        .map(|mut m| {
            m.weekly.sort_by(|a, b| a.week_start.cmp(&b.week_start));
            m
        })
        .collect();

    months.sort_by(|a, b| a.month.cmp(&b.month));

    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, values: &[f64]) -> DailyTrend {
        let mut trend = DailyTrend::new(date.to_string());
        for v in values {
            trend.add_sample(*v);
        }
        trend
    }

    #[test]
    fn test_aggregate_to_monthly() {
        let daily = vec![
            day("2026-01-15", &[60.0]),
            day("2026-02-02", &[80.0]),
            day("2026-02-10", &[90.0, 100.0]),
        ];

        let months = aggregate_to_monthly(daily);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].month, "2026-01");
        assert_eq!(months[0].avg_value, 60.0);

        let feb = &months[1];
        assert_eq!(feb.samples, 3);
        assert!((feb.avg_value - 90.0).abs() < 0.001);
        assert_eq!(feb.weekly.len(), 2);
        assert_eq!(feb.weekly[0].week_start, "2026-02-02");
    }

    #[test]
    fn test_week_spanning_months_goes_to_its_monday() {
        // Monday 2026-03-30 .. Sunday 2026-04-05
        let months = aggregate_to_monthly(vec![day("2026-04-02", &[50.0])]);
        assert_eq!(months.len(), 1);
        assert_eq!(months[0].month, "2026-04");
        // the week starts in March, which has no data
        assert!(months[0].weekly.is_empty());
    }
}
