use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::debug;
use tokio::sync::RwLock;

use crate::error::Result;

/// Labels attached to cached responses; mutations invalidate by label
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Analytics,
    Game(String),
    GameList,
    /// One game's configuration for one tenant
    ClientGameConfig { tenant_id: String, game_id: String },
    ClientGameList,
    TenantList,
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTag::Analytics => f.write_str("Analytics"),
            CacheTag::Game(id) => write!(f, "Game:{}", id),
            CacheTag::GameList => f.write_str("Game:LIST"),
            CacheTag::ClientGameConfig { tenant_id, game_id } => write!(f, "Game:client-{}-{}", tenant_id, game_id),
            CacheTag::ClientGameList => f.write_str("Game:CLIENT_LIST"),
            CacheTag::TenantList => f.write_str("Tenant:LIST"),
        }
    }
}

/// Cache entry with expiration
#[derive(Clone)]
struct CacheEntry {
    data: String,
    expires_at: Instant,
    tags: Vec<CacheTag>,
    stale: bool,
}

impl CacheEntry {
    fn new(data: String, ttl: Duration, tags: Vec<CacheTag>) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
            tags,
            stale: false,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    fn is_fresh(&self) -> bool {
        !self.stale && !self.is_expired()
    }
}

/// Response cache keyed by request URL.
///
/// At most one fetch per key runs at a time; callers arriving meanwhile
/// wait for it and are served its result. Invalidated or expired entries
/// stay readable through [`RequestCache::last_good`] until removed.
pub struct RequestCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RequestCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Creates a new request cache with 5 minute default TTL
    pub fn new_default() -> Self {
        Self::new(Duration::from_secs(300))
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key).filter(|e| e.is_fresh()).map(|e| e.data.clone())
    }

    /// Most recent value for `key`, fresh or not
    pub async fn last_good(&self, key: &str) -> Option<String> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| e.data.clone())
    }

    pub async fn set(&self, key: &str, data: String, tags: Vec<CacheTag>) {
        self.set_with_ttl(key, data, tags, self.default_ttl).await;
    }

    pub async fn set_with_ttl(&self, key: &str, data: String, tags: Vec<CacheTag>, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), CacheEntry::new(data, ttl, tags));
    }

    /// Gets a fresh cached value or runs `fetcher`, one fetch per key at a time
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, tags: Vec<CacheTag>, fetcher: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        if let Some(data) = self.get(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit for key: {}", key);
            return Ok(data);
        }

        let key_lock = self.key_lock(key);
        let result = {
            let _guard = key_lock.lock().await;
            self.fetch_locked(key, tags, fetcher).await
        };
        self.release_key_lock(key, key_lock);
        result
    }

    async fn fetch_locked<F, Fut>(&self, key: &str, tags: Vec<CacheTag>, fetcher: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        // Another caller may have filled the entry while we waited
        if let Some(data) = self.get(key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Cache hit after waiting on in-flight fetch for key: {}", key);
            return Ok(data);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for key: {}, fetching...", key);
        let data = fetcher().await?;
        self.set(key, data.clone(), tags).await;
        Ok(data)
    }

    fn key_lock(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            in_flight
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        )
    }

    /// Drops the per-key lock once the map and `held` are its only owners
    fn release_key_lock(&self, key: &str, held: Arc<tokio::sync::Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        let unused = in_flight
            .get(key)
            .map(|lock| Arc::ptr_eq(lock, &held) && Arc::strong_count(&held) == 2)
            .unwrap_or(false);
        if unused {
            in_flight.remove(key);
        }
        // Released under the map lock so the last waiter always sees a count of 2
        drop(held);
    }

    /// Marks every entry carrying one of `tags` stale. Returns how many matched.
    pub async fn invalidate_tags(&self, tags: &[CacheTag]) -> usize {
        let mut entries = self.entries.write().await;
        let mut count = 0;
        for entry in entries.values_mut() {
            if entry.tags.iter().any(|t| tags.contains(t)) {
                entry.stale = true;
                count += 1;
            }
        }
        debug!(
            "Invalidated {} cache entries for tags [{}]",
            count,
            tags.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(", ")
        );
        count
    }

    pub async fn remove(&self, key: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let total_entries = entries.len();
        let valid_entries = entries.values().filter(|e| e.is_fresh()).count();
        let in_flight_keys = self.in_flight.lock().unwrap_or_else(|e| e.into_inner()).len();

        CacheStats {
            total_entries,
            valid_entries,
            expired_entries: total_entries - valid_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            in_flight_keys,
        }
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new_default()
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
    pub hits: u64,
    pub misses: u64,
    /// Keys with a fetch running or callers waiting on one
    pub in_flight_keys: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_entry_expiration() {
        let entry = CacheEntry::new("test_value".to_string(), Duration::from_millis(100), vec![]);
        assert!(entry.is_fresh());

        std::thread::sleep(Duration::from_millis(150));
        assert!(entry.is_expired());
    }

    #[test]
    fn test_tag_display() {
        let tag = CacheTag::ClientGameConfig {
            tenant_id: "t1".to_string(),
            game_id: "g1".to_string(),
        };
        assert_eq!(tag.to_string(), "Game:client-t1-g1");
        assert_eq!(CacheTag::GameList.to_string(), "Game:LIST");
    }
}
