//! Coerce loosely-shaped route payloads into the canonical [`Itinerary`].
//!
//! Two upstream shapes are accepted: the canonical `stops` + `summary` form
//! with any field missing, and the flat `steps` form returned by chat-based
//! optimizers. Normalizing an already canonical itinerary is a no-op.

use crate::models::distance::{distance_km, leg_distances_km, round_km, travel_minutes};
use crate::models::{Coordinates, Itinerary, RouteMeta, RouteSummary, Stop, TransportMode};
use serde::Deserialize;
use time::OffsetDateTime;

/// Name of the synthetic stop used when a route has nowhere to go.
pub const START_STOP_NAME: &str = "Starting point";
pub const START_STOP_DESCRIPTION: &str = "A walk around the starting point.";

/// Stop as it may arrive from an upstream source.
#[derive(Debug, Clone, Deserialize)]
pub struct PartialStop {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub leg_min: Option<u32>,
    #[serde(default)]
    pub stay_min: Option<u32>,
}

impl PartialStop {
    fn resolved_name(&self) -> Option<&str> {
        [&self.name, &self.title, &self.label]
            .into_iter()
            .filter_map(|field| field.as_deref())
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

impl From<Stop> for PartialStop {
    fn from(stop: Stop) -> Self {
        PartialStop {
            name: Some(stop.name),
            title: None,
            label: None,
            description: Some(stop.description),
            coordinates: stop.coordinates,
            category: stop.category,
            leg_min: Some(stop.leg_min),
            stay_min: Some(stop.stay_min),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartialSummary {
    #[serde(default)]
    pub transport: Option<String>,
    #[serde(default)]
    pub start_lat: Option<f64>,
    #[serde(default)]
    pub start_lon: Option<f64>,
    #[serde(default)]
    pub start_label: Option<String>,
    #[serde(default)]
    pub total_km: Option<f64>,
    #[serde(default)]
    pub eta_min: Option<u32>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CanonicalPayload {
    pub stops: Vec<PartialStop>,
    #[serde(default)]
    pub summary: PartialSummary,
    #[serde(default)]
    pub meta: Option<RouteMeta>,
}

/// `{"transport", "duration_min", "distance_km", "steps": [...]}`
#[derive(Debug, Clone, Deserialize)]
pub struct StepsPayload {
    pub steps: Vec<PartialStop>,
    #[serde(default)]
    pub transport: Option<String>,
    /// Reported by the upstream but not trusted; the ETA is recomputed.
    #[serde(default)]
    pub duration_min: Option<f64>,
    #[serde(default)]
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UpstreamRoute {
    Canonical(CanonicalPayload),
    Steps(StepsPayload),
}

impl From<Itinerary> for UpstreamRoute {
    fn from(itinerary: Itinerary) -> Self {
        let summary = itinerary.summary;
        UpstreamRoute::Canonical(CanonicalPayload {
            stops: itinerary.stops.into_iter().map(PartialStop::from).collect(),
            summary: PartialSummary {
                transport: Some(summary.transport.to_string()),
                start_lat: Some(summary.start_lat),
                start_lon: Some(summary.start_lon),
                start_label: Some(summary.start_label),
                total_km: Some(summary.total_km),
                eta_min: Some(summary.eta_min),
                start_time: summary.start_time,
                end_time: summary.end_time,
            },
            meta: Some(itinerary.meta),
        })
    }
}

/// Values used wherever the payload is silent.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    pub start: Coordinates,
    pub start_label: String,
    pub transport: TransportMode,
    pub base_dwell_min: u32,
    pub meta: RouteMeta,
}

/// Parse a JSON payload in either accepted shape and normalize it.
pub fn normalize_value(
    payload: serde_json::Value,
    ctx: &NormalizeContext,
) -> Result<Itinerary, String> {
    let upstream: UpstreamRoute = serde_json::from_value(payload)
        .map_err(|e| format!("Unrecognised route payload: {}", e))?;
    Ok(normalize(upstream, ctx))
}

pub fn normalize(upstream: UpstreamRoute, ctx: &NormalizeContext) -> Itinerary {
    match upstream {
        UpstreamRoute::Canonical(payload) => normalize_canonical(payload, ctx),
        UpstreamRoute::Steps(payload) => normalize_steps(payload, ctx),
    }
}

fn normalize_canonical(payload: CanonicalPayload, ctx: &NormalizeContext) -> Itinerary {
    let summary = payload.summary;
    let start = match (summary.start_lat, summary.start_lon) {
        (Some(lat), Some(lon)) => Coordinates::new(lat, lon).unwrap_or(ctx.start),
        _ => ctx.start,
    };
    let transport = summary
        .transport
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(ctx.transport);

    let fallback_minutes = summary.eta_min.unwrap_or(ctx.base_dwell_min);
    let stops = complete_stops(payload.stops, &start, transport, ctx.base_dwell_min, fallback_minutes);

    let total_km = match summary.total_km {
        Some(km) if km.is_finite() && km >= 0.0 => round_km(km),
        _ => route_km(&start, &stops),
    };
    let eta_min = summary
        .eta_min
        .unwrap_or_else(|| stops.iter().map(|s| s.leg_min + s.stay_min).sum());

    let summary = RouteSummary {
        transport,
        start_lat: start.lat,
        start_lon: start.lon,
        start_label: summary
            .start_label
            .filter(|l| !l.trim().is_empty())
            .unwrap_or_else(|| ctx.start_label.clone()),
        total_km,
        eta_min,
        start_time: summary.start_time,
        end_time: summary.end_time,
    };
    let summary = match (summary.start_time, summary.end_time) {
        (Some(start_time), None) => summary.with_start_time(Some(start_time)),
        _ => summary,
    };

    Itinerary {
        stops,
        summary,
        meta: payload.meta.unwrap_or_else(|| ctx.meta.clone()),
    }
}

fn normalize_steps(payload: StepsPayload, ctx: &NormalizeContext) -> Itinerary {
    let transport = payload
        .transport
        .as_deref()
        .and_then(|t| t.parse().ok())
        .unwrap_or(ctx.transport);

    let fallback_minutes = payload
        .duration_min
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.round() as u32)
        .unwrap_or(ctx.base_dwell_min);
    let stops = complete_stops(payload.steps, &ctx.start, transport, ctx.base_dwell_min, fallback_minutes);

    let total_km = match payload.distance_km {
        Some(km) if km.is_finite() && km > 0.0 => round_km(km),
        _ => route_km(&ctx.start, &stops),
    };
    let eta_min = stops.iter().map(|s| s.leg_min + s.stay_min).sum();

    Itinerary {
        stops,
        summary: RouteSummary {
            transport,
            start_lat: ctx.start.lat,
            start_lon: ctx.start.lon,
            start_label: ctx.start_label.clone(),
            total_km,
            eta_min,
            start_time: None,
            end_time: None,
        },
        meta: ctx.meta.clone(),
    }
}

/// Fill names, legs and dwell for every stop. An empty list becomes a single
/// stop at the start so the result is never empty.
fn complete_stops(
    partial: Vec<PartialStop>,
    start: &Coordinates,
    transport: TransportMode,
    base_dwell_min: u32,
    fallback_minutes: u32,
) -> Vec<Stop> {
    if partial.is_empty() {
        let mut stop = Stop::new(START_STOP_NAME, START_STOP_DESCRIPTION, *start);
        stop.stay_min = fallback_minutes;
        return vec![stop];
    }

    let mut prev = *start;
    partial
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let name = p
                .resolved_name()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Stop {}", i + 1));
            let leg_min = p
                .leg_min
                .unwrap_or_else(|| travel_minutes(distance_km(&prev, &p.coordinates), transport));
            prev = p.coordinates;

            Stop {
                name,
                description: p.description.unwrap_or_default(),
                coordinates: p.coordinates,
                category: p.category,
                leg_min,
                stay_min: p.stay_min.unwrap_or(base_dwell_min),
            }
        })
        .collect()
}

fn route_km(start: &Coordinates, stops: &[Stop]) -> f64 {
    round_km(leg_distances_km(start, stops.iter().map(|s| &s.coordinates)).iter().sum())
}
