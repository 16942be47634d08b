use crate::cache::{CacheStats, DescriptionCache};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory description cache backed by moka with TTL and bounded capacity.
/// All methods are `&self`, no locking needed.
pub struct MemoryDescriptionCache {
    descriptions: Cache<String, Arc<str>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryDescriptionCache {
    pub fn new(ttl_seconds: u64, max_capacity: u64) -> Self {
        let descriptions = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_seconds))
            .max_capacity(max_capacity)
            .build();

        MemoryDescriptionCache {
            descriptions,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl DescriptionCache for MemoryDescriptionCache {
    async fn get_description(&self, key: &str) -> Option<String> {
        match self.descriptions.get(key).await {
            Some(description) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Description cache hit: {}", key);
                Some(description.to_string())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Description cache miss: {}", key);
                None
            }
        }
    }

    async fn cache_description(&self, key: &str, description: &str) {
        self.descriptions
            .insert(key.to_string(), Arc::from(description))
            .await;
    }

    async fn get_stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let hit_rate = if hits + misses > 0 {
            (hits as f64 / (hits + misses) as f64) * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits,
            misses,
            hit_rate,
            entries: self.descriptions.entry_count(),
        }
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
