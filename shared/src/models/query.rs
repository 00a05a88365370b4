use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::{Result, SharedError};

/// Default number of games requested from the popularity endpoint
pub const DEFAULT_POPULARITY_LIMIT: u32 = 10;

/// Metric families served by `GET /metrics?type=...`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    DailyActiveUsers,
    GamePlays,
    GameCompletions,
    AverageSessionTime,
    AnswerAccuracy,
    EventsByType,
    Traffic,
    Engagement,
    Performance,
    Popularity,
    Conversion,
    Reliability,
}

impl MetricKind {
    pub const ALL: [MetricKind; 12] = [
        MetricKind::DailyActiveUsers,
        MetricKind::GamePlays,
        MetricKind::GameCompletions,
        MetricKind::AverageSessionTime,
        MetricKind::AnswerAccuracy,
        MetricKind::EventsByType,
        MetricKind::Traffic,
        MetricKind::Engagement,
        MetricKind::Performance,
        MetricKind::Popularity,
        MetricKind::Conversion,
        MetricKind::Reliability,
    ];

    /// Value of the `type` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::DailyActiveUsers => "daily-active-users",
            MetricKind::GamePlays => "game-plays",
            MetricKind::GameCompletions => "game-completions",
            MetricKind::AverageSessionTime => "average-session-time",
            MetricKind::AnswerAccuracy => "answer-accuracy",
            MetricKind::EventsByType => "events-by-type",
            MetricKind::Traffic => "traffic",
            MetricKind::Engagement => "engagement",
            MetricKind::Performance => "performance",
            MetricKind::Popularity => "popularity",
            MetricKind::Conversion => "conversion",
            MetricKind::Reliability => "reliability",
        }
    }

    /// Human title used for headings
    pub fn title(&self) -> &'static str {
        match self {
            MetricKind::DailyActiveUsers => "Daily Active Users",
            MetricKind::GamePlays => "Game Plays",
            MetricKind::GameCompletions => "Game Completions",
            MetricKind::AverageSessionTime => "Average Session Time",
            MetricKind::AnswerAccuracy => "Answer Accuracy",
            MetricKind::EventsByType => "Events By Type",
            MetricKind::Traffic => "Traffic",
            MetricKind::Engagement => "Engagement",
            MetricKind::Performance => "Performance",
            MetricKind::Popularity => "Popular Games",
            MetricKind::Conversion => "Conversion Funnel",
            MetricKind::Reliability => "Reliability",
        }
    }

    /// Kinds answered with a plain `{series, total}` daily series
    pub fn is_daily_series(&self) -> bool {
        matches!(
            self,
            MetricKind::DailyActiveUsers
                | MetricKind::GamePlays
                | MetricKind::GameCompletions
                | MetricKind::AverageSessionTime
                | MetricKind::AnswerAccuracy
                | MetricKind::EventsByType
        )
    }

    /// Aggregated kinds are requested per day with the timeseries included
    pub fn wants_timeseries(&self) -> bool {
        matches!(
            self,
            MetricKind::Traffic
                | MetricKind::Engagement
                | MetricKind::Performance
                | MetricKind::Conversion
                | MetricKind::Reliability
        )
    }

    /// Kinds that are only meaningful for a single game
    pub fn requires_game(&self) -> bool {
        matches!(self, MetricKind::Engagement)
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self> {
        MetricKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SharedError::UnknownMetric(s.to_string()))
    }
}

/// Parameters shared by every metric query
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq, Hash)]
pub struct AnalyticsQuery {
    /// Tenant the metrics belong to
    #[validate(length(min = 1, message = "Tenant id is required"))]
    pub tenant_id: String,

    /// Restricts the metrics to one game
    pub game_id: Option<String>,

    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,

    /// Number of ranked games (popularity only)
    #[validate(range(min = 1, max = 100, message = "Limit must be between 1 and 100"))]
    pub limit: Option<u32>,
}

impl AnalyticsQuery {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            game_id: None,
            date_from: None,
            date_to: None,
            limit: None,
        }
    }

    pub fn with_game(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_from = Some(from);
        self.date_to = Some(to);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Range ending at `today` and spanning `days` days inclusive
    pub fn last_days(mut self, today: NaiveDate, days: u32) -> Result<Self> {
        let span = u64::from(days.max(1)) - 1;
        let start = today
            .checked_sub_days(Days::new(span))
            .ok_or(SharedError::DateOutOfRange { end: today, days })?;
        self.date_from = Some(start);
        self.date_to = Some(today);
        Ok(self)
    }

    /// Field validation plus the cross-field date order check
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        if self.tenant_id.trim().is_empty() {
            return Err(SharedError::MissingField("tenant_id".to_string()));
        }
        if let (Some(start), Some(end)) = (self.date_from, self.date_to) {
            if start > end {
                return Err(SharedError::InvalidDateRange { start, end });
            }
        }
        Ok(())
    }

    /// Query pairs for `GET /metrics`, in a stable order
    pub fn to_params(&self, kind: MetricKind) -> Vec<(String, String)> {
        let mut params = vec![
            ("type".to_string(), kind.as_str().to_string()),
            ("tenantId".to_string(), self.tenant_id.clone()),
        ];
        if let Some(game_id) = &self.game_id {
            params.push(("gameId".to_string(), game_id.clone()));
        }
        if let Some(from) = self.date_from {
            params.push(("dateFrom".to_string(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.date_to {
            params.push(("dateTo".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        if kind.wants_timeseries() {
            params.push(("granularity".to_string(), "day".to_string()));
            params.push(("includeTimeseries".to_string(), "true".to_string()));
        }
        if kind == MetricKind::Popularity {
            let limit = self.limit.unwrap_or(DEFAULT_POPULARITY_LIMIT);
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Parses an ISO `YYYY-MM-DD` date
pub fn parse_iso_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| SharedError::InvalidDate(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        parse_iso_date(s).unwrap()
    }

    #[test]
    fn test_metric_kind_round_trip_names() {
        for kind in MetricKind::ALL {
            assert_eq!(kind.as_str().parse::<MetricKind>().unwrap(), kind);
        }
        assert!("bounce-rate".parse::<MetricKind>().is_err());
    }

    #[test]
    fn test_query_requires_tenant() {
        let query = AnalyticsQuery::new("");
        assert!(matches!(query.check(), Err(SharedError::Validation(_))));

        let blank = AnalyticsQuery::new("   ");
        assert!(matches!(blank.check(), Err(SharedError::MissingField(_))));
    }

    #[test]
    fn test_query_rejects_reversed_range() {
        let query = AnalyticsQuery::new("acme").with_range(date("2024-05-10"), date("2024-05-01"));
        assert!(matches!(query.check(), Err(SharedError::InvalidDateRange { .. })));

        let same_day = AnalyticsQuery::new("acme").with_range(date("2024-05-01"), date("2024-05-01"));
        assert!(same_day.check().is_ok());
    }

    #[test]
    fn test_query_rejects_out_of_range_limit() {
        let query = AnalyticsQuery::new("acme").with_limit(0);
        assert!(query.check().is_err());
    }

    #[test]
    fn test_last_days_is_inclusive() {
        let query = AnalyticsQuery::new("acme").last_days(date("2024-05-30"), 30).unwrap();
        assert_eq!(query.date_from, Some(date("2024-05-01")));
        assert_eq!(query.date_to, Some(date("2024-05-30")));

        let single = AnalyticsQuery::new("acme").last_days(date("2024-05-30"), 0).unwrap();
        assert_eq!(single.date_from, Some(date("2024-05-30")));
    }

    #[test]
    fn test_last_days_overflow_is_an_error() {
        let result = AnalyticsQuery::new("acme").last_days(date("2024-05-30"), 100_000_000);
        assert_eq!(
            result,
            Err(SharedError::DateOutOfRange {
                end: date("2024-05-30"),
                days: 100_000_000
            })
        );
    }

    #[test]
    fn test_params_for_aggregated_kind() {
        let query = AnalyticsQuery::new("acme")
            .with_game("g-1")
            .with_range(date("2024-05-01"), date("2024-05-07"));
        let params = query.to_params(MetricKind::Engagement);
        let pairs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();

        assert_eq!(
            pairs,
            vec![
                ("type", "engagement"),
                ("tenantId", "acme"),
                ("gameId", "g-1"),
                ("dateFrom", "2024-05-01"),
                ("dateTo", "2024-05-07"),
                ("granularity", "day"),
                ("includeTimeseries", "true"),
            ]
        );
    }

    #[test]
    fn test_params_for_popularity_default_limit() {
        let params = AnalyticsQuery::new("acme").to_params(MetricKind::Popularity);
        assert!(params.contains(&("limit".to_string(), "10".to_string())));
        assert!(!params.iter().any(|(k, _)| k == "granularity"));
    }
}
