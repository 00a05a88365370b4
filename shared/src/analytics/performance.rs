use serde::{Deserialize, Serialize};

use crate::analytics::format::{rate_to_percent, rate_to_percent_1dp, round_to, StatCard};
use crate::analytics::series::{build_series, ChartKind, ChartSeries, Field};
use crate::analytics::threshold::{classify_accuracy, Band};
use crate::models::metrics::{PerformanceData, PerformancePoint, PerformanceSummary};

const SUMMARY_LABELS: [&str; 5] = [
    "Accuracy %",
    "Avg Response (ms)",
    "Total Questions",
    "Correct Answers",
    "Hint Usage %",
];

/// Derived performance view
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceView {
    pub summary: PerformanceSummary,
    pub has_timeseries: bool,
    pub has_summary: bool,
    /// Overall accuracy in percent, one decimal
    pub accuracy_pct: f64,
    pub accuracy_band: Band,
    pub chart: ChartSeries,
}

/// Builds the performance view.
///
/// Chart precedence: accuracy timeseries, then a bar over the summary
/// figures, then the "No Data" placeholder.
pub fn derive_performance_view(data: &PerformanceData) -> PerformanceView {
    let summary = data.summary;
    let has_timeseries = !data.timeseries.is_empty();
    let has_summary =
        summary.total_questions > 0 || summary.correct_answers > 0 || summary.overall_accuracy > 0.0;
    let accuracy_pct = rate_to_percent_1dp(summary.overall_accuracy);

    let chart = if has_timeseries {
        build_series(
            ChartKind::Line,
            &data.timeseries,
            &[Field::new("Accuracy (%)", |p: &PerformancePoint| p.accuracy * 100.0)],
        )
    } else if has_summary {
        ChartSeries::categorical(
            ChartKind::Bar,
            SUMMARY_LABELS.iter().map(|l| l.to_string()).collect(),
            "Value",
            vec![
                accuracy_pct,
                round_to(summary.avg_response_time_ms, 0),
                summary.total_questions as f64,
                summary.correct_answers as f64,
                rate_to_percent_1dp(summary.hint_usage_rate),
            ],
        )
    } else {
        ChartSeries::placeholder(ChartKind::Bar)
    };

    PerformanceView {
        summary,
        has_timeseries,
        has_summary,
        accuracy_pct,
        accuracy_band: classify_accuracy(accuracy_pct),
        chart,
    }
}

impl PerformanceView {
    pub fn is_empty(&self) -> bool {
        !self.has_timeseries && !self.has_summary
    }

    /// `"correct/total"`, e.g. `"45/60"`
    pub fn correct_ratio(&self) -> String {
        format!("{}/{}", self.summary.correct_answers, self.summary.total_questions)
    }

    pub fn stat_cards(&self) -> Vec<StatCard> {
        vec![
            StatCard::number("Accuracy", rate_to_percent(self.summary.overall_accuracy)).with_suffix("%"),
            StatCard::number("Avg Response Time", round_to(self.summary.avg_response_time_ms, 0))
                .with_suffix("ms"),
            StatCard::text("Correct Answers", self.correct_ratio()),
            StatCard::number("Hint Usage", rate_to_percent(self.summary.hint_usage_rate)).with_suffix("%"),
        ]
    }
}
