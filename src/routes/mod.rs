pub mod debug;
pub mod itinerary;

use axum::{routing::{get, post}, Router};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/itineraries", post(itinerary::create_itinerary))
        .route("/itineraries/normalize", post(itinerary::normalize_itinerary))
        .route("/debug/health", get(debug::health_check))
        .with_state(state)
}
