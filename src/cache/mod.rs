pub mod memory;

pub use memory::MemoryDescriptionCache;

use crate::constants::COORDINATE_MATCH_DECIMALS;
use crate::models::Coordinates;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Store for generated stop descriptions, keyed by [`description_cache_key`].
#[async_trait]
pub trait DescriptionCache: Send + Sync {
    async fn get_description(&self, key: &str) -> Option<String>;

    async fn cache_description(&self, key: &str, description: &str);

    async fn get_stats(&self) -> CacheStats;

    fn backend_name(&self) -> &'static str;
}

/// Cache key for a stop description.
///
/// Coordinates are rounded to 6 decimals (~0.1 m); interests are trimmed and
/// lowercased so "Museums " and "museums" share an entry.
pub fn description_cache_key(
    name: &str,
    coordinates: &Coordinates,
    locale: &str,
    interests: &str,
) -> String {
    let (lat, lon) = coordinates.grid_key(COORDINATE_MATCH_DECIMALS);
    format!(
        "desc:{}:{}:{}:{}:{}",
        name.trim(),
        lat,
        lon,
        locale.trim().to_lowercase(),
        interests.trim().to_lowercase()
    )
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub entries: u64,
}
