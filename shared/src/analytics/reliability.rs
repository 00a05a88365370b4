use serde::{Deserialize, Serialize};

use crate::analytics::format::{format_percent, StatCard};
use crate::analytics::series::{build_series, ChartKind, ChartSeries, Field};
use crate::analytics::threshold::{classify_error_count, classify_error_rate, Band};
use crate::models::metrics::{MetricPoint, ReliabilityData, ReliabilitySummary};

/// Derived reliability view with badge bands
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReliabilityView {
    pub summary: ReliabilitySummary,
    pub error_rate_band: Band,
    pub error_count_band: Band,
    pub chart: ChartSeries,
}

pub fn derive_reliability_view(data: &ReliabilityData) -> ReliabilityView {
    let chart = if data.timeseries.is_empty() {
        ChartSeries::placeholder(ChartKind::Line)
    } else {
        build_series(
            ChartKind::Line,
            &data.timeseries,
            &[Field::new("Errors", |p: &MetricPoint| p.count as f64)],
        )
    };

    ReliabilityView {
        summary: data.summary,
        error_rate_band: classify_error_rate(data.summary.error_rate_pct),
        error_count_band: classify_error_count(data.summary.error_count),
        chart,
    }
}

impl ReliabilityView {
    pub fn is_empty(&self) -> bool {
        self.summary.total_events == 0 && self.chart.is_placeholder()
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::number("Total Events", self.summary.total_events as f64),
            StatCard::number("Error Events", self.summary.error_count as f64),
            StatCard::text("Error Rate", format_percent(self.summary.error_rate_pct, 2)),
        ]
    }
}
