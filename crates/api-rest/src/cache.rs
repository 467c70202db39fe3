//! In-process response cache for read endpoints.
//!
//! Successful GET bodies are stored under `METHOD:path?query` with a per-entry lifetime. Writes
//! drop every key containing a pattern (see [`ResponseCache::invalidate`]).

use api_shared::{CacheConfigRes, CacheStats};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Lifetime of cached report listings.
pub const LIST_REPORTS_TTL: Duration = Duration::from_secs(300);
/// Lifetime of a cached single report.
pub const REPORT_BY_ID_TTL: Duration = Duration::from_secs(600);
/// Key prefix shared by every cached report response.
pub const REPORTS_KEY_PATTERN: &str = "GET:/api/v1/reports";

pub const DEFAULT_MAX_ITEMS: usize = 1000;
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl: Duration,
    pub max_items: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: DEFAULT_TTL,
            max_items: DEFAULT_MAX_ITEMS,
        }
    }
}

impl CacheConfig {
    /// Builds the cache configuration from raw `CACHE_ENABLED` and `CACHE_TTL` values.
    ///
    /// The cache is enabled only by the exact value `true`. `CACHE_TTL` is in seconds.
    ///
    /// # Errors
    /// Returns an error if `CACHE_TTL` is present but not a whole number of seconds.
    pub fn from_env_values(enabled: Option<String>, ttl: Option<String>) -> anyhow::Result<Self> {
        let enabled = enabled.as_deref().map(str::trim) == Some("true");
        let ttl = match ttl.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            None => DEFAULT_TTL,
            Some(raw) => Duration::from_secs(
                raw.parse()
                    .map_err(|e| anyhow::anyhow!("CACHE_TTL must be seconds, got '{raw}': {e}"))?,
            ),
        };

        Ok(Self {
            enabled,
            ttl,
            max_items: DEFAULT_MAX_ITEMS,
        })
    }
}

#[derive(Clone, Debug)]
struct CacheEntry {
    body: Value,
    expires_at: Instant,
}

pub struct ResponseCache {
    config: CacheConfig,
    entries: Mutex<HashMap<String, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Cache key for a request, e.g. `GET:/api/v1/reports?limit=3`.
    pub fn key(method: &str, path_and_query: &str) -> String {
        format!("{method}:{path_and_query}")
    }

    /// Returns the live entry for `key`, counting a hit or a miss. Expired entries are dropped.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let mut entries = self.entries();
        let found = match entries.get(key) {
            Some(entry) if entry.expires_at > now => Some(entry.body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        };

        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores `body` under `key` for `ttl`. Returns false when the cache is full.
    pub fn set(&self, key: impl Into<String>, body: Value, ttl: Duration) -> bool {
        self.set_at(key.into(), body, ttl, Instant::now())
    }

    fn set_at(&self, key: String, body: Value, ttl: Duration, now: Instant) -> bool {
        let mut entries = self.entries();

        if !entries.contains_key(&key) && entries.len() >= self.config.max_items {
            entries.retain(|_, entry| entry.expires_at > now);
            if entries.len() >= self.config.max_items {
                tracing::warn!("response cache full, not caching {key}");
                return false;
            }
        }

        entries.insert(
            key,
            CacheEntry {
                body,
                expires_at: now + ttl,
            },
        );
        true
    }

    /// Removes every key containing `pattern`; returns how many were removed.
    pub fn invalidate(&self, pattern: &str) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|key, _| !key.contains(pattern));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!("invalidated {removed} cache entries matching {pattern}");
        }
        removed
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            keys: self.entries().len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    pub fn config_res(&self) -> CacheConfigRes {
        CacheConfigRes {
            ttl: self.config.ttl.as_secs(),
            max_items: self.config.max_items,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
