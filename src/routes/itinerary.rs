use crate::error::{AppError, Result};
use crate::models::{Coordinates, Itinerary, ItineraryRequest, RouteMeta, TransportMode};
use crate::services::route_planner::normalizer::{normalize_value, NormalizeContext};
use crate::services::route_planner::DEFAULT_START_LABEL;
use crate::AppState;
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// POST /itineraries
/// Build a route for the given start point, interests and time budget
pub async fn create_itinerary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ItineraryRequest>,
) -> Result<Json<Itinerary>> {
    request.validate().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        lat = request.lat,
        lon = request.lon,
        time_hours = request.time_hours,
        transport = %request.transport,
        "Itinerary request: ({:.4}, {:.4}), {:.1}h, transport={}",
        request.lat, request.lon, request.time_hours, request.transport
    );

    let itinerary = state.planner.plan(&request).await?;
    Ok(Json(itinerary))
}

#[derive(Debug, Deserialize)]
pub struct NormalizeRequest {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub start_label: Option<String>,
    #[serde(default)]
    pub transport: Option<String>,
    /// Upstream route in either the canonical or the flat `steps` shape
    pub payload: Value,
}

/// POST /itineraries/normalize
/// Coerce an upstream route payload into the canonical itinerary shape
pub async fn normalize_itinerary(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NormalizeRequest>,
) -> Result<Json<Itinerary>> {
    let start = Coordinates::new(request.lat, request.lon).map_err(AppError::InvalidRequest)?;

    let ctx = NormalizeContext {
        start,
        start_label: request
            .start_label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_START_LABEL.to_string()),
        transport: request
            .transport
            .as_deref()
            .map(TransportMode::parse_or_walk)
            .unwrap_or_default(),
        base_dwell_min: state.planner.config().base_dwell_min,
        meta: RouteMeta::external(),
    };

    let itinerary = normalize_value(request.payload, &ctx).map_err(AppError::InvalidRequest)?;

    tracing::debug!(
        stops = itinerary.stops.len(),
        "Normalized upstream route with {} stops",
        itinerary.stops.len()
    );

    Ok(Json(itinerary))
}
