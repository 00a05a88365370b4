use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use reqwest::Method;
use serde::de::DeserializeOwned;
use shared::ErrorResponse;

use crate::api::cache::{CacheTag, RequestCache};
use crate::api::transport::{ApiRequest, HttpTransport, ReqwestTransport};
use crate::config::Config;
use crate::error::{ApiError, Result};

/// REST client for the admin backend. Reads go through the request cache;
/// mutations invalidate the tags they affect.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    transport: Arc<dyn HttpTransport>,
    cache: Arc<RequestCache>,
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        transport: Arc<dyn HttpTransport>,
        cache: Arc<RequestCache>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            transport,
            cache,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.api.timeout_seconds))?;
        let cache = RequestCache::new(Duration::from_secs(config.cache.ttl_seconds));
        Ok(Self::new(
            config.api.base_url.clone(),
            config.api.token.clone(),
            Arc::new(transport),
            Arc::new(cache),
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn cache(&self) -> &Arc<RequestCache> {
        &self.cache
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn build_request(&self, method: Method, path: &str) -> ApiRequest {
        let mut request = ApiRequest::new(method, self.endpoint(path))
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
            .with_header("ngrok-skip-browser-warning", "true");

        if let Some(token) = &self.token {
            request = request.with_header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    /// Sends the request and returns the body of a 2xx response
    async fn execute(&self, request: ApiRequest) -> Result<String> {
        let method = request.method.clone();
        let url = request.full_url();
        let response = self.transport.send(request).await?;

        if response.is_success() {
            return Ok(response.body);
        }

        let message = serde_json::from_str::<ErrorResponse>(&response.body)
            .map(|e| e.error)
            .unwrap_or_else(|_| {
                if response.body.trim().is_empty() {
                    format!("HTTP {}", response.status)
                } else {
                    response.body.clone()
                }
            });
        warn!("{} {} failed with {}: {}", method, url, response.status, message);
        Err(ApiError::status(response.status, message))
    }

    /// Cached GET decoded as `T`
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(String, String)>,
        tags: Vec<CacheTag>,
    ) -> Result<T> {
        let request = self.build_request(Method::GET, path).with_query(query);
        let key = request.full_url();
        let body = self
            .cache
            .get_or_fetch(&key, tags, || self.execute(request))
            .await?;
        decode(&body)
    }

    /// Last successfully fetched value for a GET, ignoring freshness
    pub async fn last_good<T: DeserializeOwned>(&self, path: &str, query: Vec<(String, String)>) -> Option<T> {
        let key = self.build_request(Method::GET, path).with_query(query).full_url();
        let body = self.cache.last_good(&key).await?;
        decode(&body).ok()
    }

    /// Uncached request with an optional JSON body. On success every tag
    /// in `invalidates` is marked stale.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        invalidates: &[CacheTag],
    ) -> Result<T> {
        let mut request = self.build_request(method, path);
        if let Some(body) = body {
            request = request.with_body(body);
        }

        let body = self.execute(request).await?;
        if !invalidates.is_empty() {
            self.cache.invalidate_tags(invalidates).await;
        }

        // Empty acknowledgements decode as an empty object
        if body.trim().is_empty() {
            return decode("{}");
        }
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| {
        debug!("Undecodable response body: {}", body);
        ApiError::Decode(e.to_string())
    })
}

/// Percent-encodes one path segment
pub fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
