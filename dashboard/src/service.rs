//! Loads metrics through the API client and turns them into view states
//! of the derived analytics views.

use log::debug;
use shared::{
    derive_conversion_view, derive_daily_series_view, derive_engagement_view, derive_performance_view,
    derive_popularity_view, derive_reliability_view, derive_traffic_view, AnalyticsQuery, ConversionView,
    DailySeriesView, EngagementView, MetricKind, MetricSeries, PerformanceView, PopularityView, ReliabilityView,
    TrafficView,
};

use crate::api::client::ApiClient;
use crate::api::metrics::MetricPayload;
use crate::view::ViewState;

/// Every panel of the overview page
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub traffic: ViewState<TrafficView>,
    /// Only loaded when the query names a game
    pub engagement: Option<ViewState<EngagementView>>,
    pub performance: ViewState<PerformanceView>,
    pub popularity: ViewState<PopularityView>,
    pub conversion: ViewState<ConversionView>,
}

#[derive(Clone)]
pub struct AnalyticsService {
    client: ApiClient,
}

impl AnalyticsService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn load<T, V, F>(&self, kind: MetricKind, query: &AnalyticsQuery, derive: F) -> ViewState<V>
    where
        T: MetricPayload,
        F: FnOnce(&T) -> V,
    {
        debug!("Loading {} for tenant {}", kind, query.tenant_id);
        let result = self.client.metric::<T>(kind, query).await;
        let cached = match &result {
            Ok(_) => None,
            Err(_) => self.client.cached_metric::<T>(kind, query).await,
        };
        let what = format!("{} data", kind.title().to_lowercase());
        ViewState::settle(result, cached, &what).map(|data| derive(&data))
    }

    pub async fn traffic(&self, query: &AnalyticsQuery) -> ViewState<TrafficView> {
        self.load(MetricKind::Traffic, query, derive_traffic_view).await
    }

    pub async fn engagement(&self, query: &AnalyticsQuery) -> ViewState<EngagementView> {
        self.load(MetricKind::Engagement, query, derive_engagement_view).await
    }

    pub async fn performance(&self, query: &AnalyticsQuery) -> ViewState<PerformanceView> {
        self.load(MetricKind::Performance, query, derive_performance_view).await
    }

    pub async fn popularity(&self, query: &AnalyticsQuery) -> ViewState<PopularityView> {
        self.load(MetricKind::Popularity, query, derive_popularity_view).await
    }

    pub async fn conversion(&self, query: &AnalyticsQuery) -> ViewState<ConversionView> {
        self.load(MetricKind::Conversion, query, derive_conversion_view).await
    }

    pub async fn reliability(&self, query: &AnalyticsQuery) -> ViewState<ReliabilityView> {
        self.load(MetricKind::Reliability, query, derive_reliability_view).await
    }

    /// One of the plain daily series, titled after its kind
    pub async fn daily_series(&self, kind: MetricKind, query: &AnalyticsQuery) -> ViewState<DailySeriesView> {
        if !kind.is_daily_series() {
            return ViewState::Failed(format!("Failed to load {}: not a daily series", kind.title().to_lowercase()));
        }
        self.load(kind, query, |series: &MetricSeries| derive_daily_series_view(series, kind.title()))
            .await
    }

    /// Loads all overview panels concurrently
    pub async fn overview(&self, query: &AnalyticsQuery) -> Overview {
        let engagement = async {
            match query.game_id {
                Some(_) => Some(self.engagement(query).await),
                None => None,
            }
        };
        let (traffic, engagement, performance, popularity, conversion) = tokio::join!(
            self.traffic(query),
            engagement,
            self.performance(query),
            self.popularity(query),
            self.conversion(query),
        );

        Overview {
            traffic,
            engagement,
            performance,
            popularity,
            conversion,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::cache::RequestCache;
    use crate::api::transport::{HttpTransport, ScriptedTransport};
    use crate::error::ApiError;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn service(transport: &Arc<ScriptedTransport>) -> AnalyticsService {
        AnalyticsService::new(ApiClient::new(
            "https://api.example.com/api",
            None,
            Arc::clone(transport) as Arc<dyn HttpTransport>,
            Arc::new(RequestCache::new_default()),
        ))
    }

    #[tokio::test]
    async fn test_conversion_view_from_payload() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({"data": {"summary": {
                "hub_visits": 1000,
                "game_starts": 400,
                "game_completions": 250,
                "overall_conversion_rate": 0.25
            }}}),
        );

        let state = service(&transport).conversion(&AnalyticsQuery::new("t1")).await;
        let view = state.ready().unwrap();
        assert_eq!(view.funnel.overall_conversion_pct, 25.0);
        assert_eq!(view.funnel.drop_off_pct, 75.0);
        assert_eq!(view.funnel.steps[1].conversion_from_start, 40.0);
    }

    #[tokio::test]
    async fn test_failure_without_cache_is_failed_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_error(ApiError::Transport("connection refused".to_string()));

        let state = service(&transport).traffic(&AnalyticsQuery::new("t1")).await;
        assert_eq!(
            state,
            ViewState::Failed("Failed to load traffic data: Request failed: connection refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_failure_with_cache_shows_last_value() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"data": {"rankings": [{"name": "Quiz", "plays": 12}]}}));
        transport.push_json(500, json!({"error": "database unavailable"}));
        let service = service(&transport);
        let query = AnalyticsQuery::new("t1");

        service.popularity(&query).await;
        service.client().refresh_analytics().await;
        let state = service.popularity(&query).await;

        let view = state.ready().unwrap();
        assert_eq!(view.total_plays, 12);
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_payload_is_empty_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"data": {}}));

        let state = service(&transport).performance(&AnalyticsQuery::new("t1")).await;
        assert!(state.is_empty());
    }

    #[tokio::test]
    async fn test_daily_series_titles_view() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({"series": [{"date": "2024-03-01", "count": 3}], "total": 3}));

        let state = service(&transport)
            .daily_series(MetricKind::DailyActiveUsers, &AnalyticsQuery::new("t1"))
            .await;
        assert_eq!(state.ready().map(|v| v.title.as_str()), Some("Daily Active Users"));
    }

    #[tokio::test]
    async fn test_overview_skips_engagement_without_game() {
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..4 {
            transport.push_json(200, json!({"data": {}}));
        }

        let overview = service(&transport).overview(&AnalyticsQuery::new("t1")).await;
        assert_eq!(overview.engagement, None);
        assert_eq!(transport.request_count(), 4);
        assert!(matches!(overview.traffic, ViewState::Ready(_)));
    }
}
