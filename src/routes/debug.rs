use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Report configured collaborators and cache stats
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let backends = state.planner.backends();

    let mut status = json!({
        "status": "ok",
        "checks": {
            "poi_provider": backends.poi_provider,
            "optimizer": backends.optimizer.unwrap_or("disabled"),
            "travel_times": backends.travel_times.unwrap_or("disabled"),
            "enricher": backends.enricher.unwrap_or("disabled"),
        }
    });

    match &state.description_cache {
        Some(cache) => {
            let stats = cache.get_stats().await;
            status["checks"]["description_cache"] = json!({
                "backend": cache.backend_name(),
                "hits": stats.hits,
                "misses": stats.misses,
                "hit_rate": stats.hit_rate,
                "entries": stats.entries,
            });
        }
        None => {
            status["checks"]["description_cache"] = json!("disabled");
        }
    }

    Json(status)
}
