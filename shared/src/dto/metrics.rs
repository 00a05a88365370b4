//! Wire shapes of the metrics endpoints and their conversion into the
//! canonical models. Every field is optional on the wire; defaults are
//! filled here and nowhere else.

use chrono::{DateTime, NaiveDate};
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

use crate::analytics::popularity::normalize_rankings;
use crate::models::metrics::*;

/// `{ "data": ... }` envelope used by the aggregated metric types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsEnvelope<T> {
    #[serde(default = "Option::default")]
    pub data: Option<T>,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
}

impl<T> MetricsEnvelope<T> {
    pub fn into_data(self) -> Option<T> {
        self.data
    }
}

/// Health endpoint payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
}

/// Daily point as served by the simple series endpoints
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDailyPoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub count: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMetricSeries {
    #[serde(default)]
    pub series: Vec<RawDailyPoint>,
    #[serde(default)]
    pub total: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFunnelSummary {
    #[serde(default)]
    pub hub_visits: Option<f64>,
    #[serde(default)]
    pub game_starts: Option<f64>,
    #[serde(default)]
    pub game_completions: Option<f64>,
    #[serde(default)]
    pub visit_to_play_rate: Option<f64>,
    #[serde(default)]
    pub play_to_completion_rate: Option<f64>,
    #[serde(default)]
    pub overall_conversion_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConversionPoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub conversion_rate: Option<f64>,
    #[serde(default)]
    pub rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFunnelData {
    #[serde(default)]
    pub summary: Option<RawFunnelSummary>,
    #[serde(default)]
    pub timeseries: Option<Vec<RawConversionPoint>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEngagementSummary {
    #[serde(default)]
    pub total_sessions: Option<f64>,
    #[serde(default)]
    pub completed_sessions: Option<f64>,
    #[serde(default)]
    pub avg_session_duration_ms: Option<f64>,
    #[serde(default)]
    pub completion_rate: Option<f64>,
    #[serde(default)]
    pub avg_questions_per_session: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEngagementPoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub sessions: Option<f64>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub completion_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawBreakdownItem {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEngagementData {
    #[serde(default)]
    pub summary: Option<RawEngagementSummary>,
    #[serde(default)]
    pub timeseries: Option<Vec<RawEngagementPoint>>,
    #[serde(default)]
    pub breakdown: Option<Vec<RawBreakdownItem>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerformanceSummary {
    #[serde(default)]
    pub overall_accuracy: Option<f64>,
    #[serde(default)]
    pub avg_response_time_ms: Option<f64>,
    #[serde(default)]
    pub total_questions: Option<f64>,
    #[serde(default)]
    pub correct_answers: Option<f64>,
    #[serde(default)]
    pub hint_usage_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerformancePoint {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub overall_accuracy: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPerformanceData {
    #[serde(default)]
    pub summary: Option<RawPerformanceSummary>,
    #[serde(default)]
    pub timeseries: Option<Vec<RawPerformancePoint>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrafficSummary {
    #[serde(default)]
    pub visits: Option<f64>,
    #[serde(default)]
    pub unique_visitors: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrafficMetadata {
    #[serde(default)]
    pub unique: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrafficPoint {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub metadata: Option<RawTrafficMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTrafficData {
    #[serde(default)]
    pub summary: Option<RawTrafficSummary>,
    #[serde(default)]
    pub timeseries: Option<Vec<RawTrafficPoint>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReliabilitySummary {
    #[serde(default)]
    pub total_events: Option<f64>,
    #[serde(default)]
    pub error_count: Option<f64>,
    #[serde(default)]
    pub errors: Option<f64>,
    #[serde(default)]
    pub error_rate: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReliabilityData {
    #[serde(default)]
    pub summary: Option<RawReliabilitySummary>,
    #[serde(default)]
    pub timeseries: Option<Vec<RawDailyPoint>>,
}

/// Ranking entry as served by either generation of the popularity endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawRankingEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plays: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<f64>,
}

impl From<&GameRanking> for RawRankingEntry {
    /// Writes the canonical entry back through the fallback field names
    fn from(ranking: &GameRanking) -> Self {
        Self {
            name: None,
            game_name: Some(ranking.name.clone()),
            plays: None,
            play_count: Some(ranking.plays as f64),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPopularitySummary {
    #[serde(default)]
    pub total_games: Option<f64>,
    #[serde(default)]
    pub total_plays: Option<f64>,
    #[serde(default)]
    pub most_popular_game: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPopularityData {
    #[serde(default)]
    pub rankings: Option<Vec<RawRankingEntry>>,
    #[serde(default)]
    pub summary: Option<RawPopularitySummary>,
}

/// Converts an optional wire number into a count. Missing, negative and
/// non-finite values become 0.
pub fn to_count(value: Option<f64>) -> u64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.round() as u64,
        Some(v) if v < 0.0 => {
            warn!("Negative count {} in metrics payload, clamping to 0", v);
            0
        }
        _ => 0,
    }
}

/// Converts an optional wire number into a finite float, defaulting to 0
pub fn to_number(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parses a point date from either the `date` or the `timestamp` field.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps (date part kept).
pub fn parse_point_date(date: Option<&str>, timestamp: Option<&str>) -> Option<NaiveDate> {
    let raw = date.or(timestamp)?.trim();
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.date_naive());
    }
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

fn point_date(date: &Option<String>, timestamp: &Option<String>) -> Option<NaiveDate> {
    let parsed = parse_point_date(date.as_deref(), timestamp.as_deref());
    if parsed.is_none() {
        warn!(
            "Dropping metrics point with unparseable date (date={:?}, timestamp={:?})",
            date, timestamp
        );
    }
    parsed
}

impl From<RawMetricSeries> for MetricSeries {
    fn from(raw: RawMetricSeries) -> Self {
        let points = raw
            .series
            .iter()
            .filter_map(|p| {
                point_date(&p.date, &p.timestamp).map(|date| MetricPoint {
                    date,
                    count: to_count(p.count.or(p.value)),
                })
            })
            .collect();
        Self {
            points,
            total: to_count(raw.total),
        }
    }
}

impl From<RawFunnelSummary> for FunnelSummary {
    fn from(raw: RawFunnelSummary) -> Self {
        Self {
            hub_visits: to_count(raw.hub_visits),
            game_starts: to_count(raw.game_starts),
            game_completions: to_count(raw.game_completions),
            visit_to_play_rate: to_number(raw.visit_to_play_rate),
            play_to_completion_rate: to_number(raw.play_to_completion_rate),
            overall_conversion_rate: to_number(raw.overall_conversion_rate),
        }
    }
}

impl From<RawFunnelData> for FunnelData {
    fn from(raw: RawFunnelData) -> Self {
        let timeseries = raw
            .timeseries
            .unwrap_or_default()
            .iter()
            .filter_map(|p| {
                point_date(&p.date, &p.timestamp).map(|date| ConversionPoint {
                    date,
                    rate: to_number(p.conversion_rate.or(p.rate)),
                })
            })
            .collect();
        Self {
            summary: raw.summary.unwrap_or_default().into(),
            timeseries,
        }
    }
}

impl From<RawEngagementSummary> for EngagementSummary {
    fn from(raw: RawEngagementSummary) -> Self {
        Self {
            total_sessions: to_count(raw.total_sessions),
            completed_sessions: to_count(raw.completed_sessions),
            avg_session_duration_ms: to_number(raw.avg_session_duration_ms),
            completion_rate: to_number(raw.completion_rate),
            avg_questions_per_session: to_number(raw.avg_questions_per_session),
        }
    }
}

impl From<RawBreakdownItem> for BreakdownItem {
    fn from(raw: RawBreakdownItem) -> Self {
        Self {
            category: raw.category.unwrap_or_else(|| "unknown".to_string()),
            value: to_count(raw.value),
            percentage: to_number(raw.percentage),
        }
    }
}

impl From<RawEngagementData> for EngagementData {
    fn from(raw: RawEngagementData) -> Self {
        let timeseries: Vec<EngagementPoint> = raw
            .timeseries
            .unwrap_or_default()
            .iter()
            .filter_map(|p| {
                point_date(&p.date, &p.timestamp).map(|date| EngagementPoint {
                    date,
                    sessions: to_count(p.sessions.or(p.value)),
                    completion_rate: to_number(p.completion_rate),
                })
            })
            .collect();
        let breakdown: Vec<BreakdownItem> = raw
            .breakdown
            .unwrap_or_default()
            .into_iter()
            .map(BreakdownItem::from)
            .collect();

        Self {
            summary: raw.summary.unwrap_or_default().into(),
            source: ChartSource::select(timeseries, breakdown.clone()),
            breakdown,
        }
    }
}

impl From<RawPerformanceSummary> for PerformanceSummary {
    fn from(raw: RawPerformanceSummary) -> Self {
        Self {
            overall_accuracy: to_number(raw.overall_accuracy),
            avg_response_time_ms: to_number(raw.avg_response_time_ms),
            total_questions: to_count(raw.total_questions),
            correct_answers: to_count(raw.correct_answers),
            hint_usage_rate: to_number(raw.hint_usage_rate),
        }
    }
}

impl From<RawPerformanceData> for PerformanceData {
    fn from(raw: RawPerformanceData) -> Self {
        let timeseries = raw
            .timeseries
            .unwrap_or_default()
            .iter()
            .filter_map(|p| {
                point_date(&p.date, &p.timestamp).map(|date| PerformancePoint {
                    date,
                    accuracy: to_number(p.accuracy.or(p.overall_accuracy)),
                })
            })
            .collect();
        Self {
            summary: raw.summary.unwrap_or_default().into(),
            timeseries,
        }
    }
}

impl From<RawTrafficData> for TrafficData {
    fn from(raw: RawTrafficData) -> Self {
        let summary = raw.summary.unwrap_or_default();
        let timeseries = raw
            .timeseries
            .unwrap_or_default()
            .iter()
            .filter_map(|p| {
                point_date(&p.date, &p.timestamp).map(|date| TrafficPoint {
                    date,
                    visits: to_count(p.value),
                    unique: to_count(p.metadata.as_ref().and_then(|m| m.unique)),
                })
            })
            .collect();
        Self {
            summary: TrafficSummary {
                visits: to_count(summary.visits),
                unique_visitors: to_count(summary.unique_visitors),
            },
            timeseries,
        }
    }
}

impl From<RawReliabilityData> for ReliabilityData {
    fn from(raw: RawReliabilityData) -> Self {
        let summary = raw.summary.unwrap_or_default();
        let total_events = to_count(summary.total_events);
        let error_count = to_count(summary.error_count.or(summary.errors));
        let error_rate_pct = match summary.error_rate {
            Some(rate) => to_number(Some(rate)),
            None if total_events > 0 => error_count as f64 * 100.0 / total_events as f64,
            None => 0.0,
        };
        let timeseries = raw
            .timeseries
            .unwrap_or_default()
            .iter()
            .filter_map(|p| {
                point_date(&p.date, &p.timestamp).map(|date| MetricPoint {
                    date,
                    count: to_count(p.count.or(p.value)),
                })
            })
            .collect();
        Self {
            summary: ReliabilitySummary {
                total_events,
                error_count,
                error_rate_pct,
            },
            timeseries,
        }
    }
}

impl From<RawPopularityData> for PopularityData {
    fn from(raw: RawPopularityData) -> Self {
        let summary = raw.summary.unwrap_or_default();
        Self {
            rankings: normalize_rankings(&raw.rankings.unwrap_or_default()),
            total_games: summary.total_games.map(|v| to_count(Some(v))),
            total_plays: summary.total_plays.map(|v| to_count(Some(v))),
        }
    }
}

/// Accepts a JSON string or number and yields its string form
pub fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Int(n) => n.to_string(),
        Id::Float(f) => f.to_string(),
    })
}
