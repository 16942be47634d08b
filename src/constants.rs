//! Stable application-wide constants.
//!
//! Values here are structural invariants, algorithm coefficients, and default
//! fallbacks for env-var-based configuration. They should rarely change.
//! For tuning knobs that benefit from runtime experimentation, see
//! [`PlannerConfig`](crate::config::PlannerConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Nominal transport speeds (km/h) ---
// One canonical table. Car and transit use the faster of the two historical
// variants (40 / 25 km/h), which only shifts ETA minutes.

pub const SPEED_WALK_KMH: f64 = 4.5;
pub const SPEED_BIKE_KMH: f64 = 14.0;
pub const SPEED_SCOOTER_KMH: f64 = 18.0;
pub const SPEED_CAR_KMH: f64 = 40.0;
pub const SPEED_TRANSIT_KMH: f64 = 25.0;

// --- Request limits ---

pub const MIN_TIME_HOURS: f64 = 0.5;
pub const MAX_TIME_HOURS: f64 = 8.0;
pub const MIN_INTERESTS_CHARS: usize = 3;
pub const DEFAULT_LOCALE: &str = "ru";

// --- Route planning defaults (overridable through PlannerConfig) ---

/// Minutes every stop gets before slack is distributed.
pub const DEFAULT_BASE_DWELL_MIN: u32 = 10;
pub const DEFAULT_MIN_STOPS: usize = 3;
pub const DEFAULT_MAX_STOPS: usize = 12;
pub const DEFAULT_STOPS_PER_HOUR: f64 = 2.0;
/// Fixed stops added on top of the per-hour count.
pub const STOPS_BASE: usize = 2;
/// Share of the maximum reachable distance used as the POI search radius.
pub const DEFAULT_RADIUS_FACTOR: f64 = 0.6;
pub const DEFAULT_MIN_RADIUS_M: f64 = 800.0;
pub const DEFAULT_MAX_RADIUS_M: f64 = 15_000.0;
/// Maximum candidates requested from the POI provider.
pub const DEFAULT_POI_LIMIT: usize = 20;
/// Only the low 31 bits of the interest hash enter the diversity seed.
pub const INTEREST_HASH_MASK: u64 = 0x7FFF_FFFF;
/// Decimal places used when matching external steps back to candidates.
pub const COORDINATE_MATCH_DECIMALS: u32 = 6;

// --- Collaborator timeouts (seconds) ---

pub const DEFAULT_OPTIMIZER_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_ENRICH_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MATRIX_TIMEOUT_SECS: u64 = 25;
pub const POI_PROVIDER_TIMEOUT_SECS: u64 = 10;
pub const LLM_REQUEST_TIMEOUT_SECS: u64 = 60;

// --- Sequencer ---

/// A 2-opt reversal is accepted only when it saves more than this (seconds).
pub const TWO_OPT_EPSILON: f64 = 1e-9;
/// Cost assigned to a matrix pair with no known travel time.
pub const UNREACHABLE_LEG_COST: f64 = 1e12;

// --- External services ---

pub const GEOAPIFY_BASE_URL: &str = "https://api.geoapify.com";
pub const IONET_BASE_URL: &str = "https://api.intelligence.io.solutions/api/v1";
pub const DEFAULT_OPTIMIZER_MODEL: &str = "mistralai/Mistral-Large-Instruct-2411";
/// Fallback models tried after the configured enrichment model.
pub const ENRICH_FALLBACK_MODELS: &[&str] = &[
    "meta-llama/Llama-3.3-70B-Instruct",
    "mistralai/Mistral-Large-Instruct-2411",
    "mistralai/Mistral-Nemo-Instruct-2407",
];

// --- Description enrichment ---

pub const DEFAULT_ENRICH_MAX_PER_CALL: usize = 4;
/// Passes over the model pool before giving up.
pub const ENRICH_ROUNDS: usize = 2;
pub const ENRICH_INITIAL_BACKOFF_MS: u64 = 600;
pub const ENRICH_BACKOFF_GROWTH: f64 = 1.7;
pub const ENRICH_MAX_JITTER_MS: f64 = 400.0;
/// Descriptions shorter than this are considered weak.
pub const MIN_GOOD_DESCRIPTION_CHARS: usize = 20;
/// Model answers shorter than this are ignored.
pub const MIN_ACCEPTED_DESCRIPTION_CHARS: usize = 8;

// --- Description cache defaults ---

pub const DEFAULT_DESCRIPTION_CACHE_MAX_ENTRIES: u64 = 1_000;
/// 24 hours.
pub const DEFAULT_DESCRIPTION_CACHE_TTL_SECONDS: u64 = 86_400;
