// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use error::{AppError, Result};

use axum::Router;
use cache::{DescriptionCache, MemoryDescriptionCache};
use config::Config;
use services::enricher::{LlmEnricher, TemplateEnricher};
use services::optimizer::IonetOptimizer;
use services::osrm::OsrmClient;
use services::places::GeoapifyClient;
use services::route_planner::RoutePlanner;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// App state for sharing across the application
pub struct AppState {
    pub planner: RoutePlanner,
    pub description_cache: Option<Arc<dyn DescriptionCache>>,
}

impl AppState {
    /// Wire the HTTP clients described by `config` into a planner.
    pub fn from_config(config: &Config) -> Self {
        let planner_config = config.planner.clone();
        let poi_provider = Arc::new(GeoapifyClient::with_base_url(
            config.geoapify_api_key.clone(),
            config.geoapify_base_url.clone(),
        ));
        let mut planner = RoutePlanner::new(poi_provider, planner_config.clone());

        let description_cache: Option<Arc<dyn DescriptionCache>> =
            if config.description_cache_max_entries > 0 {
                Some(Arc::new(MemoryDescriptionCache::new(
                    config.description_cache_ttl,
                    config.description_cache_max_entries,
                )))
            } else {
                tracing::info!("Description cache disabled");
                None
            };

        match &config.ionet_api_key {
            Some(api_key) => {
                tracing::info!(model = %config.ionet_model, "External route optimizer enabled");
                planner = planner.with_optimizer(Arc::new(IonetOptimizer::new(
                    api_key.clone(),
                    config.ionet_base_url.clone(),
                    config.ionet_model.clone(),
                )));

                let mut enricher = LlmEnricher::new(
                    api_key.clone(),
                    config.ionet_base_url.clone(),
                    config.enrich_model.clone(),
                )
                .with_max_per_call(planner_config.enrich_max_per_call);
                if let Some(cache) = &description_cache {
                    enricher = enricher.with_cache(cache.clone());
                }
                planner = planner.with_enricher(Arc::new(enricher));
            }
            None => {
                tracing::info!("IONET_API_KEY not set. Using local sequencing and template descriptions.");
                planner = planner.with_enricher(Arc::new(TemplateEnricher::new(
                    planner_config.enrich_max_per_call,
                )));
            }
        }

        if let Some(base_url) = &config.osrm_base_url {
            tracing::info!("Travel time matrix enabled: {}", base_url);
            planner = planner.with_travel_times(Arc::new(
                OsrmClient::new(base_url.clone()).with_timeout(planner_config.matrix_timeout),
            ));
        }

        AppState {
            planner,
            description_cache,
        }
    }
}

/// Full HTTP application: API routes under `/api/v1` with CORS and tracing.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", routes::create_router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
