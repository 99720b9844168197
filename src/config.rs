use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config read failed: {}", e),
            ConfigError::Parse(msg) => write!(f, "config parse failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime parameters for the tracker. Unset fields in a config file fall
/// back to the defaults below.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Base URL of the PHP backend, without a trailing slash.
    pub backend_url: String,
    /// Seconds between location reads.
    pub location_interval_secs: u64,
    /// Bounded capacity of the location channel; excess fixes are dropped.
    pub channel_capacity: usize,
    /// Minimum milliseconds between alerts for one event source.
    pub debounce_window_ms: u64,
    /// Overspeed threshold in m/s (38.9 is roughly 140 km/h).
    pub overspeed_threshold_ms: f64,
    /// Magnetic anomaly threshold in microtesla above ambient.
    pub magnetic_threshold_ut: f64,
    /// Seconds the SOS countdown runs before dispatching.
    pub sos_countdown_secs: u64,
    /// Fixed number of SOS delivery attempts.
    pub sos_max_attempts: u32,
    /// Fixed delay between SOS attempts, in seconds.
    pub sos_retry_delay_secs: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            backend_url: "http://127.0.0.1:8080".to_string(),
            location_interval_secs: 5,
            channel_capacity: 100,
            debounce_window_ms: 5_000,
            overspeed_threshold_ms: 38.9,
            magnetic_threshold_ut: 25.0,
            sos_countdown_secs: 5,
            sos_max_attempts: 3,
            sos_retry_delay_secs: 2,
        }
    }
}

impl TrackerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&text).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, json).map_err(ConfigError::Io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.debounce_window_ms, 5_000);
        assert_eq!(config.sos_max_attempts, 3);
        assert_eq!(config.location_interval_secs, 5);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let config: TrackerConfig =
            serde_json::from_str(r#"{"backend_url": "https://api.test", "sos_countdown_secs": 10}"#)
                .unwrap();
        assert_eq!(config.backend_url, "https://api.test");
        assert_eq!(config.sos_countdown_secs, 10);
        assert_eq!(config.channel_capacity, 100);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let mut config = TrackerConfig::default();
        config.overspeed_threshold_ms = 25.0;

        let path = std::env::temp_dir().join("safety_tracker_config_test.json");
        config.save(&path).unwrap();
        let loaded = TrackerConfig::load(&path).unwrap();
        assert_eq!(loaded.overspeed_threshold_ms, 25.0);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let path = std::env::temp_dir().join("safety_tracker_config_bad.json");
        fs::write(&path, "not json").unwrap();
        match TrackerConfig::load(&path) {
            Err(ConfigError::Parse(_)) => {}
            other => panic!("expected parse error, got {:?}", other.map(|_| ())),
        }
        let _ = fs::remove_file(&path);
    }
}
