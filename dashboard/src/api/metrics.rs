//! Analytics endpoints. Every metric is served by `GET /metrics?type=...`;
//! the wire payload is converted to its canonical model here.

use log::info;
use reqwest::Method;
use serde::de::DeserializeOwned;
use shared::{
    AnalyticsQuery, EngagementData, FunnelData, HealthStatus, MetricKind, MetricSeries, MetricsEnvelope,
    PerformanceData, PopularityData, RawEngagementData, RawFunnelData, RawMetricSeries, RawPerformanceData,
    RawPopularityData, RawReliabilityData, RawTrafficData, ReliabilityData, TrafficData,
};

use crate::api::cache::CacheTag;
use crate::api::client::ApiClient;
use crate::error::{ApiError, Result};

const METRICS_PATH: &str = "metrics";

/// Canonical model of one metric response and the wire shape it comes in
pub trait MetricPayload: Sized {
    type Wire: DeserializeOwned;

    fn from_wire(wire: Self::Wire) -> Self;
}

impl MetricPayload for MetricSeries {
    type Wire = RawMetricSeries;

    fn from_wire(wire: Self::Wire) -> Self {
        wire.into()
    }
}

macro_rules! enveloped_payload {
    ($model:ty, $raw:ty) => {
        impl MetricPayload for $model {
            type Wire = MetricsEnvelope<$raw>;

            fn from_wire(wire: Self::Wire) -> Self {
                wire.into_data().unwrap_or_default().into()
            }
        }
    };
}

enveloped_payload!(TrafficData, RawTrafficData);
enveloped_payload!(EngagementData, RawEngagementData);
enveloped_payload!(PerformanceData, RawPerformanceData);
enveloped_payload!(PopularityData, RawPopularityData);
enveloped_payload!(FunnelData, RawFunnelData);
enveloped_payload!(ReliabilityData, RawReliabilityData);

fn check_query(kind: MetricKind, query: &AnalyticsQuery) -> Result<()> {
    query.check()?;
    if kind.requires_game() && query.game_id.as_deref().map_or(true, |g| g.trim().is_empty()) {
        return Err(ApiError::Validation(format!("{} metrics require a game id", kind.title())));
    }
    Ok(())
}

impl ApiClient {
    /// Fetches one metric kind through the request cache
    pub async fn metric<T: MetricPayload>(&self, kind: MetricKind, query: &AnalyticsQuery) -> Result<T> {
        check_query(kind, query)?;
        let wire: T::Wire = self
            .get_json(METRICS_PATH, query.to_params(kind), vec![CacheTag::Analytics])
            .await?;
        Ok(T::from_wire(wire))
    }

    /// Last value fetched for the same kind and query, however old
    pub async fn cached_metric<T: MetricPayload>(&self, kind: MetricKind, query: &AnalyticsQuery) -> Option<T> {
        let wire: T::Wire = self.last_good(METRICS_PATH, query.to_params(kind)).await?;
        Some(T::from_wire(wire))
    }

    pub async fn daily_series(&self, kind: MetricKind, query: &AnalyticsQuery) -> Result<MetricSeries> {
        if !kind.is_daily_series() {
            return Err(ApiError::Validation(format!("{} is not a daily series", kind)));
        }
        self.metric(kind, query).await
    }

    pub async fn traffic(&self, query: &AnalyticsQuery) -> Result<TrafficData> {
        self.metric(MetricKind::Traffic, query).await
    }

    pub async fn engagement(&self, query: &AnalyticsQuery) -> Result<EngagementData> {
        self.metric(MetricKind::Engagement, query).await
    }

    pub async fn performance(&self, query: &AnalyticsQuery) -> Result<PerformanceData> {
        self.metric(MetricKind::Performance, query).await
    }

    pub async fn popularity(&self, query: &AnalyticsQuery) -> Result<PopularityData> {
        self.metric(MetricKind::Popularity, query).await
    }

    pub async fn conversion(&self, query: &AnalyticsQuery) -> Result<FunnelData> {
        self.metric(MetricKind::Conversion, query).await
    }

    pub async fn reliability(&self, query: &AnalyticsQuery) -> Result<ReliabilityData> {
        self.metric(MetricKind::Reliability, query).await
    }

    /// Backend liveness, never cached
    pub async fn health(&self) -> Result<HealthStatus> {
        let status: HealthStatus = self.send_json(Method::GET, "health", None, &[]).await?;
        info!("Backend health: {}", status.status);
        Ok(status)
    }

    /// Drops every cached analytics response so the next read refetches
    pub async fn refresh_analytics(&self) -> usize {
        self.cache().invalidate_tags(&[CacheTag::Analytics]).await
    }
}
