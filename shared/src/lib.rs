pub mod models {
    pub mod game;
    pub mod metrics;
    pub mod query;
}

pub mod dto {
    pub mod common;
    pub mod game;
    pub mod metrics;
}

pub mod analytics {
    pub mod engagement;
    pub mod format;
    pub mod funnel;
    pub mod performance;
    pub mod popularity;
    pub mod reliability;
    pub mod series;
    pub mod threshold;
    pub mod traffic;
    pub mod tween;
}

pub mod error;

#[cfg(test)]
mod analytics_tests;

// Re-export commonly used items
pub use error::{Result, SharedError};

// Re-export models
pub use models::{
    game::{ClientGame, Game, GameStatus, GameType, Tenant, TenantRef},
    metrics::{
        BreakdownItem, ChartSource, ConversionPoint, EngagementData, EngagementPoint, EngagementSummary,
        FunnelData, FunnelSummary, GameRanking, MetricPoint, MetricSeries, PerformanceData,
        PerformancePoint, PerformanceSummary, PopularityData, ReliabilityData, ReliabilitySummary, TrafficData,
        TrafficPoint, TrafficSummary,
    },
    query::{AnalyticsQuery, MetricKind, DEFAULT_POPULARITY_LIMIT},
};

// Re-export DTOs
pub use dto::{
    common::{ErrorResponse, SuccessResponse},
    game::{ClientGameInfoUpdate, ClientGameStatusUpdate, CreateGameRequest, GameStatusUpdate, UpdateGameRequest},
    metrics::{
        HealthStatus, MetricsEnvelope, RawEngagementData, RawFunnelData, RawMetricSeries, RawPerformanceData,
        RawPopularityData, RawRankingEntry, RawReliabilityData, RawTrafficData,
    },
};

// Re-export derivations
pub use analytics::{
    engagement::{derive_engagement_view, EngagementView},
    format::{ChangeDirection, StatCard, StatValue},
    funnel::{derive_conversion_view, derive_funnel, ConversionView, FunnelStep, FunnelView},
    performance::{derive_performance_view, PerformanceView},
    popularity::{derive_popularity_view, normalize_rankings, PopularityView, RankingRow},
    reliability::{derive_reliability_view, ReliabilityView},
    series::{build_series, ChartKind, ChartSeries, Dataset},
    threshold::{classify_accuracy, classify_error_count, classify_error_rate, Band},
    traffic::{derive_daily_series_view, derive_traffic_view, DailySeriesView, TrafficView},
    tween::{AnimatedValue, CancelHandle, Clock, CounterAnimation, FrameStatus, ManualClock, Rounding, SystemClock},
};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_game_creation() {
        let game = Game {
            game_id: "3f2b8c1e-5d4a-4e7b-9c2d-1a2b3c4d5e6f".to_string(),
            title: Some("Trivia Rush".to_string()),
            description: None,
            game_type: GameType::HostedLink,
            url: "https://games.example.com/trivia".to_string(),
            status: GameStatus::Active,
            created_at: chrono::Utc::now().fixed_offset(),
        };

        assert_eq!(game.display_title(), "Trivia Rush");
        assert!(game.status.is_active());
    }

    #[test]
    fn test_query_creation() {
        let query = AnalyticsQuery::new("tenant-1").with_game("game-1").with_limit(5);
        assert!(query.check().is_ok());
        assert_eq!(query.game_id.as_deref(), Some("game-1"));
    }
}
