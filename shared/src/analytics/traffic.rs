//! Traffic and simple daily-series views.

use serde::{Deserialize, Serialize};

use crate::analytics::format::{ChangeDirection, StatCard};
use crate::analytics::series::{build_series, ChartKind, ChartSeries, Field};
use crate::models::metrics::{MetricPoint, MetricSeries, TrafficData, TrafficPoint};

const TRAFFIC_FIELDS: [Field<TrafficPoint>; 2] = [
    Field::new("Visits", |p: &TrafficPoint| p.visits as f64),
    Field::new("Unique Visitors", |p: &TrafficPoint| p.unique as f64),
];

/// Days per comparison window of the week-over-week change
const WEEK: usize = 7;

/// Integer percent change from `previous` to `latest`.
///
/// A zero baseline yields 100 when anything happened, otherwise 0.
pub fn percent_change(previous: u64, latest: u64) -> i64 {
    if previous == 0 {
        return if latest > 0 { 100 } else { 0 };
    }
    ((latest as f64 - previous as f64) / previous as f64 * 100.0).round() as i64
}

/// Derived hub traffic view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrafficView {
    pub total_visits: u64,
    pub unique_visitors: u64,
    pub average_daily_visits: u64,
    /// Latest day against the day before, in whole percent
    pub day_over_day_change: i64,
    pub change_direction: ChangeDirection,
    pub chart: ChartSeries,
}

pub fn derive_traffic_view(data: &TrafficData) -> TrafficView {
    let points = &data.timeseries;
    let total_visits = data.summary.visits;
    let average_daily_visits = (total_visits as f64 / points.len().max(1) as f64).round() as u64;

    let day_over_day_change = match points.as_slice() {
        [.., previous, latest] => percent_change(previous.visits, latest.visits),
        _ => 0,
    };

    TrafficView {
        total_visits,
        unique_visitors: data.summary.unique_visitors,
        average_daily_visits,
        day_over_day_change,
        change_direction: ChangeDirection::from_change(day_over_day_change as f64),
        chart: build_series(ChartKind::Line, points, &TRAFFIC_FIELDS),
    }
}

impl TrafficView {
    pub fn is_empty(&self) -> bool {
        self.total_visits == 0 && self.chart.is_empty()
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::number("Total Visits", self.total_visits as f64)
                .with_change(self.day_over_day_change as f64, "from yesterday"),
            StatCard::number("Unique Visitors", self.unique_visitors as f64),
            StatCard::number("Avg Daily Visits", self.average_daily_visits as f64),
        ]
    }
}

/// View over one of the `{series, total}` daily endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailySeriesView {
    pub title: String,
    pub total: u64,
    pub average_per_day: u64,
    /// Average of the last seven points
    pub last_week_average: u64,
    /// Last week's average against the seven points before it
    pub week_over_week_change: i64,
    pub chart: ChartSeries,
}

pub fn derive_daily_series_view(series: &MetricSeries, title: &str) -> DailySeriesView {
    let points = &series.points;
    let average_per_day = if points.is_empty() {
        0
    } else {
        (series.total as f64 / points.len() as f64).round() as u64
    };

    let split = points.len().saturating_sub(WEEK);
    let last_week_average = window_average(&points[split..]);
    let previous_week_average = window_average(&points[split.saturating_sub(WEEK)..split]);
    let week_over_week_change = if previous_week_average > 0 {
        percent_change(previous_week_average, last_week_average)
    } else {
        0
    };

    DailySeriesView {
        title: title.to_string(),
        total: series.total,
        average_per_day,
        last_week_average,
        week_over_week_change,
        chart: build_series(
            ChartKind::Line,
            points,
            &[Field::new("Count", |p: &MetricPoint| p.count as f64)],
        ),
    }
}

fn window_average(points: &[MetricPoint]) -> u64 {
    if points.is_empty() {
        return 0;
    }
    let sum: u64 = points.iter().map(|p| p.count).sum();
    (sum as f64 / points.len() as f64).round() as u64
}

impl DailySeriesView {
    pub fn is_empty(&self) -> bool {
        self.chart.is_empty()
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::number("Total", self.total as f64).with_change(self.week_over_week_change as f64, ""),
            StatCard::number("Daily Average", self.average_per_day as f64),
            StatCard::number("Weekly Average", self.last_week_average as f64)
                .with_change(self.week_over_week_change as f64, ""),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::metrics::TrafficSummary;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;

    fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap() + Duration::days(offset)
    }

    fn traffic(visits: &[u64]) -> TrafficData {
        TrafficData {
            summary: TrafficSummary {
                visits: visits.iter().sum(),
                unique_visitors: 7,
            },
            timeseries: visits
                .iter()
                .enumerate()
                .map(|(i, v)| TrafficPoint {
                    date: day(i as i64),
                    visits: *v,
                    unique: v / 2,
                })
                .collect(),
        }
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(100, 115), 15);
        assert_eq!(percent_change(100, 80), -20);
        assert_eq!(percent_change(0, 5), 100);
        assert_eq!(percent_change(0, 0), 0);
        assert_eq!(percent_change(3, 4), 33);
    }

    #[test]
    fn test_traffic_view() {
        let view = derive_traffic_view(&traffic(&[100, 100, 115]));
        assert_eq!(view.total_visits, 315);
        assert_eq!(view.average_daily_visits, 105);
        assert_eq!(view.day_over_day_change, 15);
        assert_eq!(view.change_direction, ChangeDirection::Positive);
        assert_eq!(view.chart.datasets.len(), 2);
        assert_eq!(view.chart.dataset("Unique Visitors").unwrap().values, vec![50.0, 50.0, 57.0]);
        assert_eq!(
            view.stat_cards()[0].change.as_deref(),
            Some("+15% from yesterday")
        );
    }

    #[test]
    fn test_traffic_single_point_has_no_change() {
        let view = derive_traffic_view(&traffic(&[40]));
        assert_eq!(view.day_over_day_change, 0);
        assert_eq!(view.change_direction, ChangeDirection::Neutral);
    }

    #[test]
    fn test_traffic_empty_timeseries_uses_summary() {
        let view = derive_traffic_view(&TrafficData {
            summary: TrafficSummary {
                visits: 12,
                unique_visitors: 3,
            },
            timeseries: vec![],
        });
        assert_eq!(view.average_daily_visits, 12);
        assert!(!view.is_empty());
        assert!(view.chart.labels.is_empty());
    }

    fn series(counts: &[u64]) -> MetricSeries {
        MetricSeries {
            points: counts
                .iter()
                .enumerate()
                .map(|(i, c)| MetricPoint {
                    date: day(i as i64),
                    count: *c,
                })
                .collect(),
            total: counts.iter().sum(),
        }
    }

    #[test]
    fn test_daily_series_week_over_week() {
        let counts: Vec<u64> = std::iter::repeat(10).take(7).chain(std::iter::repeat(12).take(7)).collect();
        let view = derive_daily_series_view(&series(&counts), "Daily Active Users");
        assert_eq!(view.total, 154);
        assert_eq!(view.average_per_day, 11);
        assert_eq!(view.last_week_average, 12);
        assert_eq!(view.week_over_week_change, 20);
        assert_eq!(view.chart.labels.len(), 14);
    }

    #[test]
    fn test_daily_series_short_history() {
        let view = derive_daily_series_view(&series(&[5, 7]), "Game Plays");
        assert_eq!(view.last_week_average, 6);
        assert_eq!(view.week_over_week_change, 0);
    }

    #[test]
    fn test_daily_series_empty() {
        let view = derive_daily_series_view(&MetricSeries::default(), "Game Plays");
        assert!(view.is_empty());
        assert_eq!(view.average_per_day, 0);
        assert_eq!(view.week_over_week_change, 0);
    }
}
