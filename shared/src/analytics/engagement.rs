use serde::{Deserialize, Serialize};

use crate::analytics::format::{ms_to_seconds, rate_to_percent, round_to, StatCard};
use crate::analytics::series::{build_series, capitalize, ChartKind, ChartSeries, Field};
use crate::models::metrics::{BreakdownItem, ChartSource, EngagementData, EngagementPoint, EngagementSummary};

const ENGAGEMENT_FIELDS: [Field<EngagementPoint>; 2] = [
    Field::new("Sessions", |p: &EngagementPoint| p.sessions as f64),
    Field::new("Completion Rate (%)", |p: &EngagementPoint| p.completion_rate * 100.0),
];

/// Derived engagement view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngagementView {
    pub summary: EngagementSummary,
    pub has_timeseries: bool,
    pub has_breakdown: bool,
    pub has_summary: bool,
    pub chart: ChartSeries,
    pub breakdown: Vec<BreakdownItem>,
}

/// Builds the engagement view from a normalized payload.
///
/// The chart follows the source chosen at normalization: line over the
/// timeseries, bar over the breakdown, or a "No Data" placeholder.
pub fn derive_engagement_view(data: &EngagementData) -> EngagementView {
    let chart = match &data.source {
        ChartSource::Timeseries(points) => build_series(ChartKind::Line, points, &ENGAGEMENT_FIELDS),
        ChartSource::Breakdown(items) => breakdown_chart(items),
        ChartSource::Empty => ChartSeries::placeholder(ChartKind::Line),
    };

    EngagementView {
        summary: data.summary,
        has_timeseries: matches!(data.source, ChartSource::Timeseries(_)),
        has_breakdown: !data.breakdown.is_empty(),
        has_summary: data.summary.total_sessions > 0,
        chart,
        breakdown: data.breakdown.clone(),
    }
}

fn breakdown_chart(items: &[BreakdownItem]) -> ChartSeries {
    ChartSeries::categorical(
        ChartKind::Bar,
        items.iter().map(|i| capitalize(&i.category)).collect(),
        "Sessions",
        items.iter().map(|i| i.value as f64).collect(),
    )
}

impl EngagementView {
    /// Nothing to chart and no summary to show
    pub fn is_empty(&self) -> bool {
        !self.has_timeseries && !self.has_breakdown && !self.has_summary
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::number("Total Sessions", self.summary.total_sessions as f64),
            StatCard::number("Completed Sessions", self.summary.completed_sessions as f64),
            StatCard::number("Completion Rate", rate_to_percent(self.summary.completion_rate)).with_suffix("%"),
            StatCard::number("Avg Session Duration", ms_to_seconds(self.summary.avg_session_duration_ms))
                .with_suffix("s"),
            StatCard::number("Avg Questions / Session", round_to(self.summary.avg_questions_per_session, 1)),
        ]
    }
}
