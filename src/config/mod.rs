//! Configuration module for the PinCo core engine.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::time::Duration;

/// Engine configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the PinCo REST backend, including any path prefix
    pub api_base_url: String,
    /// Debounce window applied to map-movement events
    pub debounce: Duration,
    /// Minimum center change (degrees, either axis) that triggers a re-fetch
    pub min_center_delta_deg: f64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("PINCO_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8080/api".to_string());

        let debounce_ms = env::var("PINCO_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500u64);

        let min_center_delta_deg = env::var("PINCO_MIN_CENTER_DELTA")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0.0001);

        let log_level = env::var("PINCO_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            api_base_url,
            debounce: Duration::from_millis(debounce_ms),
            min_center_delta_deg,
            log_level,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8080/api".to_string(),
            debounce: Duration::from_millis(500),
            min_center_delta_deg: 0.0001,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("PINCO_API_URL");
        env::remove_var("PINCO_DEBOUNCE_MS");
        env::remove_var("PINCO_MIN_CENTER_DELTA");
        env::remove_var("PINCO_LOG_LEVEL");

        let config = Config::from_env();

        assert_eq!(config.api_base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.debounce, Duration::from_millis(500));
        assert_eq!(config.min_center_delta_deg, 0.0001);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_unparseable_debounce_falls_back() {
        env::set_var("PINCO_DEBOUNCE_MS", "not-a-number");
        let config = Config::from_env();
        assert_eq!(config.debounce, Duration::from_millis(500));
        env::remove_var("PINCO_DEBOUNCE_MS");
    }
}
