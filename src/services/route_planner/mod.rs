pub mod budget;
pub mod candidate_filter;
pub mod diversity;
mod external;
pub mod normalizer;
pub mod sequencing;

use crate::config::PlannerConfig;
use crate::error::{AppError, Result};
use crate::models::{
    Coordinates, FallbackReason, Itinerary, ItineraryRequest, Poi, RouteMeta, RouteSummary, Stop,
    TransportMode,
};
use crate::services::enricher::DescriptionEnricher;
use crate::services::optimizer::{OptimizeRequest, RouteOptimizer};
use crate::services::osrm::TravelTimeProvider;
use crate::services::places::PoiProvider;
use std::sync::Arc;
use time::OffsetDateTime;

use budget::{allocate, assign_legs};
use candidate_filter::filter_generic;
use diversity::{diversity_seed, pick};
use external::reattach_steps;
use normalizer::{START_STOP_DESCRIPTION, START_STOP_NAME};
use sequencing::{nearest_neighbor_order, two_opt};

/// Label shown for the route start when the request has none.
pub const DEFAULT_START_LABEL: &str = "Start";

/// Names of the configured collaborators, for health reporting.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlannerBackends {
    pub poi_provider: &'static str,
    pub optimizer: Option<&'static str>,
    pub travel_times: Option<&'static str>,
    pub enricher: Option<&'static str>,
}

/// Builds itineraries: candidate discovery, selection, ordering, timing and
/// description enrichment, degrading step by step when collaborators fail.
pub struct RoutePlanner {
    poi_provider: Arc<dyn PoiProvider>,
    optimizer: Option<Arc<dyn RouteOptimizer>>,
    travel_times: Option<Arc<dyn TravelTimeProvider>>,
    enricher: Option<Arc<dyn DescriptionEnricher>>,
    config: PlannerConfig,
}

impl RoutePlanner {
    pub fn new(poi_provider: Arc<dyn PoiProvider>, config: PlannerConfig) -> Self {
        RoutePlanner {
            poi_provider,
            optimizer: None,
            travel_times: None,
            enricher: None,
            config,
        }
    }

    pub fn with_optimizer(mut self, optimizer: Arc<dyn RouteOptimizer>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn with_travel_times(mut self, travel_times: Arc<dyn TravelTimeProvider>) -> Self {
        self.travel_times = Some(travel_times);
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn DescriptionEnricher>) -> Self {
        self.enricher = Some(enricher);
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn backends(&self) -> PlannerBackends {
        PlannerBackends {
            poi_provider: self.poi_provider.backend_name(),
            optimizer: self.optimizer.as_ref().map(|o| o.backend_name()),
            travel_times: self.travel_times.as_ref().map(|t| t.backend_name()),
            enricher: self.enricher.as_ref().map(|e| e.backend_name()),
        }
    }

    /// Build an itinerary for `request`.
    ///
    /// Collaborator failures never surface as errors: no candidates gives a
    /// single-stop route at the start, and a missing, slow or failing
    /// optimizer gives a locally sequenced route. Only invalid input is
    /// rejected.
    pub async fn plan(&self, request: &ItineraryRequest) -> Result<Itinerary> {
        request.validate().map_err(AppError::InvalidRequest)?;
        let origin = request.origin().map_err(AppError::InvalidRequest)?;
        let mode = request.transport_mode();
        let total_minutes = request.total_minutes();
        let start_label = request
            .start_label
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_START_LABEL)
            .to_string();

        tracing::info!(
            lat = origin.lat,
            lon = origin.lon,
            transport = %mode,
            minutes = total_minutes,
            "Planning itinerary: {} minutes by {}",
            total_minutes, mode
        );

        let candidates = self
            .discover_candidates(&origin, &request.interests, mode, request.time_hours)
            .await;

        if candidates.is_empty() {
            tracing::warn!(
                lat = origin.lat,
                lon = origin.lon,
                "No candidates found, returning a walk around the start"
            );
            return Ok(degraded_route(
                origin,
                start_label,
                mode,
                total_minutes,
                request.start_time,
            ));
        }

        let filtered = filter_generic(candidates);
        let entropy = request.seed.unwrap_or_else(now_millis);
        let seed = diversity_seed(entropy, &request.interests);
        let max_stops = self.config.max_stops_for(request.time_hours);
        let selected = pick(&filtered, seed, max_stops);

        tracing::debug!(
            filtered = filtered.len(),
            selected = selected.len(),
            seed = seed,
            "Selected {} of {} candidates",
            selected.len(), filtered.len()
        );

        let optimize_request = OptimizeRequest {
            start: origin,
            start_label: start_label.clone(),
            transport: mode,
            total_minutes,
            interests: request.interests.clone(),
            candidates: selected.clone(),
            locale: request.locale().to_string(),
        };

        let (mut stops, meta) = match self.external_stops(&optimize_request).await {
            Ok(stops) => (stops, RouteMeta::external()),
            Err(reason) => {
                tracing::info!(reason = %reason, "Using local sequencing ({})", reason);
                (
                    self.local_stops(&origin, &selected, mode).await,
                    RouteMeta::fallback(reason),
                )
            }
        };

        if stops.is_empty() {
            return Err(AppError::Internal(
                "Route construction produced no stops".to_string(),
            ));
        }

        let total_km = assign_legs(&origin, &mut stops, mode);
        let allocation = allocate(&mut stops, total_minutes, self.config.base_dwell_min);
        let stops = self
            .enrich_descriptions(stops, &request.interests, request.locale())
            .await;

        tracing::info!(
            stops = stops.len(),
            total_km = total_km,
            eta_min = allocation.eta_min,
            source = %meta.source,
            "Itinerary ready: {} stops, {:.1} km, {} min",
            stops.len(), total_km, allocation.eta_min
        );

        Ok(Itinerary {
            stops,
            summary: RouteSummary {
                transport: mode,
                start_lat: origin.lat,
                start_lon: origin.lon,
                start_label,
                total_km,
                eta_min: allocation.eta_min,
                start_time: None,
                end_time: None,
            }
            .with_start_time(request.start_time),
            meta,
        })
    }

    async fn discover_candidates(
        &self,
        origin: &Coordinates,
        interests: &str,
        mode: TransportMode,
        time_hours: f64,
    ) -> Vec<Poi> {
        let radius_m = self.config.search_radius_m(mode.speed_kmh(), time_hours);

        match self
            .poi_provider
            .fetch_candidates(origin, interests, radius_m, self.config.poi_limit)
            .await
        {
            Ok(pois) => {
                tracing::debug!(
                    candidates = pois.len(),
                    radius_m = radius_m,
                    "POI discovery: {} candidates within {}m",
                    pois.len(), radius_m
                );
                pois
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    radius_m = radius_m,
                    "POI provider failed, treating as no candidates"
                );
                Vec::new()
            }
        }
    }

    /// Ask the external optimizer for an ordering, bounded by the configured
    /// timeout. Any failure is reported as the reason to fall back.
    async fn external_stops(
        &self,
        request: &OptimizeRequest,
    ) -> std::result::Result<Vec<Stop>, FallbackReason> {
        let optimizer = self
            .optimizer
            .as_ref()
            .ok_or(FallbackReason::OptimizerDisabled)?;

        let outcome =
            tokio::time::timeout(self.config.optimizer_timeout, optimizer.optimize(request)).await;

        let route = match outcome {
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.optimizer_timeout.as_secs_f64(),
                    "Route optimizer timed out"
                );
                return Err(FallbackReason::OptimizerTimeout);
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Route optimizer failed");
                return Err(FallbackReason::OptimizerError);
            }
            Ok(Ok(None)) => return Err(FallbackReason::OptimizerEmpty),
            Ok(Ok(Some(route))) if route.steps.is_empty() => {
                return Err(FallbackReason::OptimizerEmpty)
            }
            Ok(Ok(Some(route))) => route,
        };

        let stops = reattach_steps(&route.steps, &request.candidates);
        if stops.is_empty() {
            tracing::warn!(
                steps = route.steps.len(),
                "Every optimizer step was discarded"
            );
            return Err(FallbackReason::AllStepsDiscarded);
        }
        Ok(stops)
    }

    /// Nearest-neighbour order, refined by 2-opt when a travel-time matrix
    /// is available.
    async fn local_stops(
        &self,
        origin: &Coordinates,
        selected: &[Poi],
        mode: TransportMode,
    ) -> Vec<Stop> {
        let points: Vec<Coordinates> = selected.iter().map(|poi| poi.coordinates).collect();
        let mut order = nearest_neighbor_order(origin, &points);

        if let Some(travel_times) = &self.travel_times {
            if order.len() > 1 {
                let mut matrix_points = Vec::with_capacity(points.len() + 1);
                matrix_points.push(*origin);
                matrix_points.extend_from_slice(&points);

                match tokio::time::timeout(
                    self.config.matrix_timeout,
                    travel_times.matrix(&matrix_points, mode),
                )
                .await
                {
                    Ok(Ok(matrix)) => order = two_opt(order, &matrix),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Travel time matrix unavailable, keeping greedy order")
                    }
                    Err(_) => tracing::warn!("Travel time matrix timed out, keeping greedy order"),
                }
            }
        }

        order
            .into_iter()
            .map(|idx| {
                let poi = &selected[idx];
                let mut stop = Stop::new(poi.display_name(), poi.description.clone(), poi.coordinates);
                stop.category = poi.category.clone();
                stop
            })
            .collect()
    }

    /// Best-effort description pass; the unenriched stops are kept on any
    /// failure or timeout.
    async fn enrich_descriptions(&self, stops: Vec<Stop>, interests: &str, locale: &str) -> Vec<Stop> {
        let Some(enricher) = &self.enricher else {
            return stops;
        };

        match tokio::time::timeout(
            self.config.enrich_timeout,
            enricher.enrich(stops.clone(), interests, locale),
        )
        .await
        {
            Ok(Ok(enriched)) if enriched.len() == stops.len() => stops
                .into_iter()
                .zip(enriched)
                .map(|(mut stop, enriched)| {
                    stop.description = enriched.description;
                    stop
                })
                .collect(),
            Ok(Ok(enriched)) => {
                tracing::warn!(
                    expected = stops.len(),
                    got = enriched.len(),
                    "Enricher changed the stop count, ignoring its output"
                );
                stops
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Description enrichment failed");
                stops
            }
            Err(_) => {
                tracing::warn!("Description enrichment timed out");
                stops
            }
        }
    }
}

/// Single stop at the start that spends the whole budget there.
fn degraded_route(
    origin: Coordinates,
    start_label: String,
    mode: TransportMode,
    total_minutes: u32,
    start_time: Option<OffsetDateTime>,
) -> Itinerary {
    let mut stop = Stop::new(START_STOP_NAME, START_STOP_DESCRIPTION, origin);
    stop.stay_min = total_minutes;

    Itinerary {
        stops: vec![stop],
        summary: RouteSummary {
            transport: mode,
            start_lat: origin.lat,
            start_lon: origin.lon,
            start_label,
            total_km: 0.0,
            eta_min: total_minutes,
            start_time: None,
            end_time: None,
        }
        .with_start_time(start_time),
        meta: RouteMeta::fallback(FallbackReason::NoPoi),
    }
}

fn now_millis() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_route_shape() {
        let origin = Coordinates::new(56.3269, 44.0059).unwrap();
        let route = degraded_route(origin, "Minin Square".to_string(), TransportMode::Walk, 90, None);

        assert_eq!(route.stops.len(), 1);
        assert_eq!(route.stops[0].coordinates, origin);
        assert_eq!(route.stops[0].leg_min, 0);
        assert_eq!(route.stops[0].stay_min, 90);
        assert_eq!(route.summary.total_km, 0.0);
        assert_eq!(route.summary.eta_min, 90);
        assert_eq!(route.summary.start_label, "Minin Square");
        assert_eq!(route.meta, RouteMeta::fallback(FallbackReason::NoPoi));
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01 in milliseconds
        assert!(now_millis() > 1_577_836_800_000);
    }
}
