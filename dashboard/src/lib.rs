pub mod api {
    pub mod cache;
    pub mod client;
    pub mod games;
    pub mod metrics;
    pub mod tenants;
    pub mod transport;

    pub use cache::{CacheStats, CacheTag, RequestCache};
    pub use client::ApiClient;
    pub use metrics::MetricPayload;
    pub use transport::{ApiRequest, ApiResponse, HttpTransport, ReqwestTransport, ScriptedTransport};

    #[cfg(test)]
    mod cache_tests;
    #[cfg(test)]
    mod games_tests;
}

pub mod config;
pub mod error;
pub mod preferences;
pub mod render;
pub mod service;
pub mod view;


pub use config::{Config, Environment};
pub use error::{ApiError, Result};
pub use preferences::{ContextChange, DashboardContext, FileStore, MemoryStore, PreferenceStore};
pub use service::{AnalyticsService, Overview};
pub use view::{Emptiness, ViewState};
