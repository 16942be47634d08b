use crate::constants::*;
use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Walk,
    Bike,
    Scooter,
    Car,
    Transit,
}

impl TransportMode {
    /// Nominal door-to-door speed used for straight-line time estimates.
    pub fn speed_kmh(&self) -> f64 {
        match self {
            TransportMode::Walk => SPEED_WALK_KMH,
            TransportMode::Bike => SPEED_BIKE_KMH,
            TransportMode::Scooter => SPEED_SCOOTER_KMH,
            TransportMode::Car => SPEED_CAR_KMH,
            TransportMode::Transit => SPEED_TRANSIT_KMH,
        }
    }

    /// Returns the OSRM profile name for this transport mode
    pub fn osrm_profile(&self) -> &'static str {
        match self {
            TransportMode::Walk => "foot",
            TransportMode::Bike | TransportMode::Scooter => "bike",
            TransportMode::Car | TransportMode::Transit => "car",
        }
    }

    /// Lenient parse for free-text input; anything unrecognised is walking.
    pub fn parse_or_walk(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Walk => write!(f, "walk"),
            TransportMode::Bike => write!(f, "bike"),
            TransportMode::Scooter => write!(f, "scooter"),
            TransportMode::Car => write!(f, "car"),
            TransportMode::Transit => write!(f, "transit"),
        }
    }
}

impl FromStr for TransportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_lowercase();
        match t.as_str() {
            "walk" | "walking" | "foot" | "пешком" => return Ok(TransportMode::Walk),
            "bike" | "cycling" | "bicycle" => return Ok(TransportMode::Bike),
            "scooter" | "e-scooter" => return Ok(TransportMode::Scooter),
            "car" | "driving" | "taxi" => return Ok(TransportMode::Car),
            "transit" | "bus" | "metro" | "tram" | "public" => return Ok(TransportMode::Transit),
            _ => {}
        }

        // Free-text answers such as "на велосипеде" or "общественный транспорт"
        if t.contains("самокат") {
            Ok(TransportMode::Scooter)
        } else if t.contains("вел") {
            Ok(TransportMode::Bike)
        } else if (t.contains("авто") && !t.contains("автобус"))
            || t.contains("маш")
            || t.contains("такси")
        {
            Ok(TransportMode::Car)
        } else if t.contains("обществ") || t.contains("автобус") || t.contains("метро") || t.contains("трамв") {
            Ok(TransportMode::Transit)
        } else if t.contains("пеш") {
            Ok(TransportMode::Walk)
        } else {
            Err(format!("Invalid transport mode: '{}'", s))
        }
    }
}

/// A POI placed into a route, with its computed leg and dwell minutes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Stop {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Travel minutes from the previous stop (or the start).
    pub leg_min: u32,
    /// Minutes planned at this stop.
    pub stay_min: u32,
}

impl Stop {
    pub fn new(name: impl Into<String>, description: impl Into<String>, coordinates: Coordinates) -> Self {
        Stop {
            name: name.into(),
            description: description.into(),
            coordinates,
            category: None,
            leg_min: 0,
            stay_min: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteSummary {
    pub transport: TransportMode,
    pub start_lat: f64,
    pub start_lon: f64,
    pub start_label: String,
    /// Sum of great-circle leg distances, one decimal place.
    pub total_km: f64,
    /// Total travel plus dwell minutes.
    pub eta_min: u32,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_time: Option<OffsetDateTime>,
}

impl RouteSummary {
    /// Set `start_time` and derive `end_time` from the current `eta_min`.
    pub fn with_start_time(mut self, start_time: Option<OffsetDateTime>) -> Self {
        self.start_time = start_time;
        self.end_time = start_time.map(|t| t + time::Duration::minutes(i64::from(self.eta_min)));
        self
    }
}

/// Where the stop ordering came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RouteSource {
    External,
    Fallback,
}

impl fmt::Display for RouteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteSource::External => write!(f, "external"),
            RouteSource::Fallback => write!(f, "fallback"),
        }
    }
}

/// Why the planner did not use an external ordering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// The POI provider returned nothing (or failed).
    NoPoi,
    /// No external optimizer is configured.
    OptimizerDisabled,
    /// The optimizer call exceeded its time budget.
    OptimizerTimeout,
    /// Transport failure, non-2xx status or unparseable body.
    OptimizerError,
    /// The optimizer answered without usable steps.
    OptimizerEmpty,
    /// Every external step was discarded as a generic label.
    AllStepsDiscarded,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FallbackReason::NoPoi => "no POI",
            FallbackReason::OptimizerDisabled => "external disabled",
            FallbackReason::OptimizerTimeout => "external timeout",
            FallbackReason::OptimizerError => "external error",
            FallbackReason::OptimizerEmpty => "external empty",
            FallbackReason::AllStepsDiscarded => "external steps all generic",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteMeta {
    pub source: RouteSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<FallbackReason>,
}

impl RouteMeta {
    pub fn external() -> Self {
        RouteMeta {
            source: RouteSource::External,
            reason: None,
        }
    }

    pub fn fallback(reason: FallbackReason) -> Self {
        RouteMeta {
            source: RouteSource::Fallback,
            reason: Some(reason),
        }
    }
}

/// The canonical route: ordered stops plus summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Itinerary {
    pub stops: Vec<Stop>,
    pub summary: RouteSummary,
    pub meta: RouteMeta,
}

impl Itinerary {
    pub fn travel_minutes(&self) -> u32 {
        self.stops.iter().map(|s| s.leg_min).sum()
    }

    pub fn stay_minutes(&self) -> u32 {
        self.stops.iter().map(|s| s.stay_min).sum()
    }
}

// Request types for API endpoints

#[derive(Debug, Clone, Deserialize)]
pub struct ItineraryRequest {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub start_label: Option<String>,
    pub interests: String,
    pub time_hours: f64,
    #[serde(default = "default_transport")]
    pub transport: String,
    /// Caller-supplied entropy; varies the candidate subset on "regenerate".
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default)]
    pub locale: Option<String>,
}

fn default_transport() -> String {
    "walk".to_string()
}

impl ItineraryRequest {
    pub fn new(origin: Coordinates, interests: impl Into<String>, time_hours: f64, transport: TransportMode) -> Self {
        ItineraryRequest {
            lat: origin.lat,
            lon: origin.lon,
            start_label: None,
            interests: interests.into(),
            time_hours,
            transport: transport.to_string(),
            seed: None,
            start_time: None,
            locale: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.start_label = Some(label.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validated origin.
    pub fn origin(&self) -> Result<Coordinates, String> {
        Coordinates::new(self.lat, self.lon)
    }

    pub fn transport_mode(&self) -> TransportMode {
        TransportMode::parse_or_walk(&self.transport)
    }

    pub fn total_minutes(&self) -> u32 {
        (self.time_hours * 60.0) as u32
    }

    pub fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.origin()?;
        if !(MIN_TIME_HOURS..=MAX_TIME_HOURS).contains(&self.time_hours) {
            return Err(format!(
                "time_hours must be between {} and {}",
                MIN_TIME_HOURS, MAX_TIME_HOURS
            ));
        }
        if self.interests.trim().chars().count() < MIN_INTERESTS_CHARS {
            return Err(format!(
                "interests must be at least {} characters",
                MIN_INTERESTS_CHARS
            ));
        }
        Ok(())
    }
}
