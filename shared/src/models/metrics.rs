use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One sample in a daily time series
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MetricPoint {
    /// Day the sample belongs to
    pub date: NaiveDate,

    /// Number of events counted on that day
    pub count: u64,
}

/// Daily series returned by the simple metric endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricSeries {
    /// Samples in upstream order
    pub points: Vec<MetricPoint>,

    /// Upstream total. Trusted as-is, never recomputed from `points`.
    pub total: u64,
}

impl MetricSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of the point counts, for comparison against the upstream total
    pub fn points_sum(&self) -> u64 {
        self.points.iter().map(|p| p.count).sum()
    }
}

/// Three-stage conversion funnel: hub visits, game starts, completions
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct FunnelSummary {
    pub hub_visits: u64,
    pub game_starts: u64,
    pub game_completions: u64,

    /// Fraction of visits that started a game (0.0 - 1.0)
    pub visit_to_play_rate: f64,

    /// Fraction of starts that completed (0.0 - 1.0)
    pub play_to_completion_rate: f64,

    /// Fraction of visits that completed (0.0 - 1.0)
    pub overall_conversion_rate: f64,
}

/// Daily conversion rate sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConversionPoint {
    pub date: NaiveDate,
    /// Conversion rate as a fraction (0.0 - 1.0)
    pub rate: f64,
}

/// Conversion payload after normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FunnelData {
    pub summary: FunnelSummary,
    pub timeseries: Vec<ConversionPoint>,
}

/// Session engagement summary
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct EngagementSummary {
    pub total_sessions: u64,
    pub completed_sessions: u64,
    pub avg_session_duration_ms: f64,

    /// Fraction of sessions completed (0.0 - 1.0)
    pub completion_rate: f64,
    pub avg_questions_per_session: f64,
}

/// Daily engagement sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EngagementPoint {
    pub date: NaiveDate,
    pub sessions: u64,
    /// Completion rate as a fraction (0.0 - 1.0)
    pub completion_rate: f64,
}

/// Categorical session split, e.g. completed vs abandoned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakdownItem {
    pub category: String,
    pub value: u64,
    /// Share of the total, already in percent
    pub percentage: f64,
}

/// Chart data source chosen once at the normalization boundary.
///
/// A timeseries wins over a breakdown when the payload carries both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ChartSource<T> {
    Timeseries(Vec<T>),
    Breakdown(Vec<BreakdownItem>),
    Empty,
}

impl<T> ChartSource<T> {
    pub fn select(timeseries: Vec<T>, breakdown: Vec<BreakdownItem>) -> Self {
        if !timeseries.is_empty() {
            ChartSource::Timeseries(timeseries)
        } else if !breakdown.is_empty() {
            ChartSource::Breakdown(breakdown)
        } else {
            ChartSource::Empty
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ChartSource::Empty)
    }
}

/// Engagement payload after normalization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngagementData {
    pub summary: EngagementSummary,
    pub source: ChartSource<EngagementPoint>,

    /// The breakdown is kept even when a timeseries drives the chart,
    /// since the detail view lists it below the chart.
    pub breakdown: Vec<BreakdownItem>,
}

/// Answer performance summary
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSummary {
    /// Fraction of correct answers (0.0 - 1.0)
    pub overall_accuracy: f64,
    pub avg_response_time_ms: f64,
    pub total_questions: u64,
    pub correct_answers: u64,

    /// Fraction of questions where a hint was used (0.0 - 1.0)
    pub hint_usage_rate: f64,
}

/// Daily accuracy sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PerformancePoint {
    pub date: NaiveDate,
    /// Accuracy as a fraction (0.0 - 1.0)
    pub accuracy: f64,
}

/// Performance payload after normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceData {
    pub summary: PerformanceSummary,
    pub timeseries: Vec<PerformancePoint>,
}

/// Hub traffic summary
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct TrafficSummary {
    pub visits: u64,
    pub unique_visitors: u64,
}

/// Daily traffic sample
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TrafficPoint {
    pub date: NaiveDate,
    pub visits: u64,
    pub unique: u64,
}

/// Traffic payload after normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrafficData {
    pub summary: TrafficSummary,
    pub timeseries: Vec<TrafficPoint>,
}

/// Canonical popularity entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRanking {
    pub name: String,
    pub plays: u64,
}

/// Popularity payload after normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PopularityData {
    /// Rankings in upstream order (assumed descending by plays)
    pub rankings: Vec<GameRanking>,

    /// Upstream game count, when the backend reports one
    pub total_games: Option<u64>,

    /// Upstream play count, when the backend reports one
    pub total_plays: Option<u64>,
}

/// Error-event summary of the reliability endpoint
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct ReliabilitySummary {
    pub total_events: u64,
    pub error_count: u64,
    /// Errors per hundred events, already in percent
    pub error_rate_pct: f64,
}

/// Reliability payload after normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReliabilityData {
    pub summary: ReliabilitySummary,
    /// Error events per day
    pub timeseries: Vec<MetricPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_series_total_is_trusted() {
        let series = MetricSeries {
            points: vec![
                MetricPoint { date: day(1), count: 3 },
                MetricPoint { date: day(2), count: 4 },
            ],
            total: 10,
        };
        assert_eq!(series.total, 10);
        assert_eq!(series.points_sum(), 7);
        assert!(!series.is_empty());
    }

    #[test]
    fn test_chart_source_prefers_timeseries() {
        let breakdown = vec![BreakdownItem {
            category: "completed".to_string(),
            value: 3,
            percentage: 75.0,
        }];
        let points = vec![EngagementPoint { date: day(1), sessions: 4, completion_rate: 0.75 }];

        let both = ChartSource::select(points.clone(), breakdown.clone());
        assert!(matches!(both, ChartSource::Timeseries(_)));

        let only_breakdown = ChartSource::<EngagementPoint>::select(vec![], breakdown);
        assert!(matches!(only_breakdown, ChartSource::Breakdown(_)));

        let neither = ChartSource::<EngagementPoint>::select(vec![], vec![]);
        assert!(neither.is_empty());
    }
}
