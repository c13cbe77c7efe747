//! Server configuration from environment.

use relay_core::PlannerConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    /// GeoJSON or JSON tower file; the server runs with an empty inventory without one
    pub towers_path: Option<PathBuf>,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    pub planner: PlannerConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let mut planner = PlannerConfig::default();
        if let Some(range) = parse_env("RELAY_LINK_RANGE_KM") {
            planner.link_range_km = range;
        }
        if let Some(extra) = parse_env("RELAY_RING_MAX_EXTRA_EDGES") {
            planner.ring.max_extra_edges = extra;
        }
        if let Some(fraction) = parse_env("RELAY_INTERPOLATION_STEP_FRACTION") {
            planner.interpolation.step_fraction = fraction;
        }

        Self {
            server_port: parse_env("RELAY_PORT").unwrap_or(3000),
            towers_path: env::var("RELAY_TOWERS_PATH")
                .ok()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            log_json: env::var("RELAY_LOG_JSON")
                .map(|value| matches!(value.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            planner,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            towers_path: None,
            log_json: false,
            planner: PlannerConfig::default(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_trims_and_rejects_garbage() {
        env::set_var("RELAY_CONFIG_TEST_RANGE", " 8.5 ");
        env::set_var("RELAY_CONFIG_TEST_PORT", "eighty");
        assert_eq!(parse_env::<f64>("RELAY_CONFIG_TEST_RANGE"), Some(8.5));
        assert_eq!(parse_env::<u16>("RELAY_CONFIG_TEST_PORT"), None);
        assert_eq!(parse_env::<u16>("RELAY_CONFIG_TEST_UNSET"), None);
    }

    #[test]
    fn defaults_match_planner_defaults() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert!(config.towers_path.is_none());
        assert_eq!(config.planner.link_range_km, 10.1);
    }
}
