use crate::constants::*;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub geoapify_api_key: String,
    pub geoapify_base_url: String,
    /// Without a key the external optimizer and LLM enrichment are disabled.
    pub ionet_api_key: Option<String>,
    pub ionet_base_url: String,
    pub ionet_model: String,
    pub enrich_model: Option<String>,
    pub osrm_base_url: Option<String>,
    pub description_cache_max_entries: u64,
    pub description_cache_ttl: u64,
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Minutes every stop receives before slack is distributed
    pub base_dwell_min: u32,

    /// Floor on the number of selected stops
    pub min_stops: usize,

    /// Ceiling on the number of selected stops
    pub max_stops: usize,

    /// Stops added per hour of requested time
    pub stops_per_hour: f64,

    /// Share of `speed * hours` used as the POI search radius
    pub radius_factor: f64,

    pub min_radius_m: f64,
    pub max_radius_m: f64,

    /// Candidate count requested from the POI provider
    pub poi_limit: usize,

    pub optimizer_timeout: Duration,
    pub enrich_timeout: Duration,
    pub matrix_timeout: Duration,

    /// Stops sent for enrichment in one call
    pub enrich_max_per_call: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_dwell_min: DEFAULT_BASE_DWELL_MIN,
            min_stops: DEFAULT_MIN_STOPS,
            max_stops: DEFAULT_MAX_STOPS,
            stops_per_hour: DEFAULT_STOPS_PER_HOUR,
            radius_factor: DEFAULT_RADIUS_FACTOR,
            min_radius_m: DEFAULT_MIN_RADIUS_M,
            max_radius_m: DEFAULT_MAX_RADIUS_M,
            poi_limit: DEFAULT_POI_LIMIT,
            optimizer_timeout: Duration::from_secs(DEFAULT_OPTIMIZER_TIMEOUT_SECS),
            enrich_timeout: Duration::from_secs(DEFAULT_ENRICH_TIMEOUT_SECS),
            matrix_timeout: Duration::from_secs(DEFAULT_MATRIX_TIMEOUT_SECS),
            enrich_max_per_call: DEFAULT_ENRICH_MAX_PER_CALL,
        }
    }
}

/// Read `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: FromStr + ToString,
{
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| format!("Invalid {}", key))
}

fn env_secs(key: &str, default: u64) -> Result<Duration, String> {
    env_or(key, default).map(Duration::from_secs)
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let config = Self {
            base_dwell_min: env_or("PLANNER_BASE_DWELL_MIN", defaults.base_dwell_min)?,
            min_stops: env_or("PLANNER_MIN_STOPS", defaults.min_stops)?,
            max_stops: env_or("PLANNER_MAX_STOPS", defaults.max_stops)?,
            stops_per_hour: env_or("PLANNER_STOPS_PER_HOUR", defaults.stops_per_hour)?,
            radius_factor: env_or("PLANNER_RADIUS_FACTOR", defaults.radius_factor)?,
            min_radius_m: env_or("PLANNER_MIN_RADIUS_M", defaults.min_radius_m)?,
            max_radius_m: env_or("PLANNER_MAX_RADIUS_M", defaults.max_radius_m)?,
            poi_limit: env_or("PLANNER_POI_LIMIT", defaults.poi_limit)?,
            optimizer_timeout: env_secs(
                "PLANNER_OPTIMIZER_TIMEOUT_SECS",
                DEFAULT_OPTIMIZER_TIMEOUT_SECS,
            )?,
            enrich_timeout: env_secs("PLANNER_ENRICH_TIMEOUT_SECS", DEFAULT_ENRICH_TIMEOUT_SECS)?,
            matrix_timeout: env_secs("PLANNER_MATRIX_TIMEOUT_SECS", DEFAULT_MATRIX_TIMEOUT_SECS)?,
            enrich_max_per_call: env_or("POI_ENRICH_MAX", defaults.enrich_max_per_call)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_stops == 0 || self.min_stops > self.max_stops {
            return Err("PLANNER_MIN_STOPS must be between 1 and PLANNER_MAX_STOPS".to_string());
        }
        if self.min_radius_m <= 0.0 || self.min_radius_m > self.max_radius_m {
            return Err(
                "PLANNER_MIN_RADIUS_M must be positive and at most PLANNER_MAX_RADIUS_M"
                    .to_string(),
            );
        }
        if self.poi_limit == 0 {
            return Err("PLANNER_POI_LIMIT must be positive".to_string());
        }
        Ok(())
    }

    /// Roughly two stops per hour on top of a fixed base, clamped to
    /// `[min_stops, max_stops]`.
    pub fn max_stops_for(&self, time_hours: f64) -> usize {
        let wanted = STOPS_BASE as f64 + (time_hours * self.stops_per_hour).round();
        (wanted.max(0.0) as usize).clamp(self.min_stops, self.max_stops)
    }

    /// POI search radius in meters for the given mode speed and time budget.
    pub fn search_radius_m(&self, speed_kmh: f64, time_hours: f64) -> u32 {
        let reachable_m = speed_kmh * time_hours * self.radius_factor * 1000.0;
        reachable_m.clamp(self.min_radius_m, self.max_radius_m).round() as u32
    }
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| "Invalid PORT")?,
            geoapify_api_key: env::var("GEOAPIFY_API_KEY")
                .map_err(|_| "GEOAPIFY_API_KEY must be set")?,
            geoapify_base_url: env::var("GEOAPIFY_BASE_URL")
                .unwrap_or_else(|_| GEOAPIFY_BASE_URL.to_string()),
            ionet_api_key: env::var("IONET_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            ionet_base_url: env::var("IONET_BASE_URL")
                .unwrap_or_else(|_| IONET_BASE_URL.to_string()),
            ionet_model: env::var("IONET_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPTIMIZER_MODEL.to_string()),
            enrich_model: env::var("POI_ENRICH_MODEL").ok(),
            osrm_base_url: env::var("OSRM_BASE_URL").ok(),
            description_cache_max_entries: env_or(
                "DESCRIPTION_CACHE_MAX_ENTRIES",
                DEFAULT_DESCRIPTION_CACHE_MAX_ENTRIES,
            )?,
            description_cache_ttl: env_or(
                "DESCRIPTION_CACHE_TTL",
                DEFAULT_DESCRIPTION_CACHE_TTL_SECONDS,
            )?,
            planner: PlannerConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_max_stops_policy() {
        let config = PlannerConfig::default();
        // 2 + round(2h * 2) = 6
        assert_eq!(config.max_stops_for(2.0), 6);
        // 2 + 1 = 3
        assert_eq!(config.max_stops_for(0.5), 3);
        // 2 + round(0.2) = 2 -> floor 3
        assert_eq!(config.max_stops_for(0.1), 3);
        // 2 + 16 = 18 -> ceiling 12
        assert_eq!(config.max_stops_for(8.0), 12);
        // 2 + round(3.0) = 5
        assert_eq!(config.max_stops_for(1.5), 5);
    }

    #[test]
    fn test_search_radius_policy() {
        let config = PlannerConfig::default();
        // 4.5 km/h * 2h * 0.6 = 5.4 km
        assert_eq!(config.search_radius_m(4.5, 2.0), 5400);
        // 4.5 * 0.25 * 0.6 = 675 m -> floor 800
        assert_eq!(config.search_radius_m(4.5, 0.25), 800);
        // 40 * 4 * 0.6 = 96 km -> ceiling 15 km
        assert_eq!(config.search_radius_m(40.0, 4.0), 15_000);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let mut config = PlannerConfig::default();
        assert!(config.validate().is_ok());

        config.min_stops = 20;
        assert!(config.validate().is_err());

        config = PlannerConfig {
            min_radius_m: 20_000.0,
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_planner_config_from_env_overrides() {
        unsafe {
            env::set_var("PLANNER_BASE_DWELL_MIN", "15");
            env::set_var("PLANNER_OPTIMIZER_TIMEOUT_SECS", "5");
        }
        let config = PlannerConfig::from_env().unwrap();
        assert_eq!(config.base_dwell_min, 15);
        assert_eq!(config.optimizer_timeout, Duration::from_secs(5));
        assert_eq!(config.max_stops, DEFAULT_MAX_STOPS);
        unsafe {
            env::remove_var("PLANNER_BASE_DWELL_MIN");
            env::remove_var("PLANNER_OPTIMIZER_TIMEOUT_SECS");
        }
    }

    #[test]
    #[serial]
    fn test_planner_config_invalid_number() {
        unsafe { env::set_var("PLANNER_MAX_STOPS", "many") };
        let err = PlannerConfig::from_env().unwrap_err();
        assert!(err.contains("PLANNER_MAX_STOPS"));
        unsafe { env::remove_var("PLANNER_MAX_STOPS") };
    }

    #[test]
    #[serial]
    fn test_config_requires_geoapify_key() {
        unsafe { env::remove_var("GEOAPIFY_API_KEY") };
        assert!(Config::from_env().is_err());

        unsafe {
            env::set_var("GEOAPIFY_API_KEY", "geo-test");
            env::set_var("IONET_API_KEY", "  ");
        }
        let config = Config::from_env().unwrap();
        assert_eq!(config.geoapify_api_key, "geo-test");
        assert!(config.ionet_api_key.is_none());
        assert_eq!(config.planner, PlannerConfig::default());
        unsafe {
            env::remove_var("GEOAPIFY_API_KEY");
            env::remove_var("IONET_API_KEY");
        }
    }
}
