//! Short-lived in-memory cache for trend reports.
//!
//! Keys carry the timestamp of the newest response in scope, so a fresh submission
//! changes the key and older entries simply age out.

use crate::analytics::trend::TrendScope;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrendCacheKey {
    pub scope: TrendScope,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub locale: String,
    pub latest_response_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct TrendCache<V> {
    entries: Arc<RwLock<HashMap<TrendCacheKey, (Instant, V)>>>,
    ttl: Duration,
}

impl<V: Clone> TrendCache<V> {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    pub async fn get(&self, key: &TrendCacheKey) -> Option<V> {
        let entries = self.entries.read().await;
        let (stored_at, value) = entries.get(key)?;
        if stored_at.elapsed() < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    pub async fn insert(&self, key: TrendCacheKey, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(key, (Instant::now(), value));
    }

    /// Drop expired entries (called from the scheduler).
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, (stored_at, _)| now.duration_since(*stored_at) < self.ttl);
        let removed = before - entries.len();

        tracing::debug!(
            "Trend cache purge: removed {}, {} entries remain",
            removed,
            entries.len()
        );
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}
