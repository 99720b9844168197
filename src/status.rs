use serde::{Deserialize, Serialize};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

/// Snapshot of the tracker written to disk every couple of seconds so an
/// outside process (or a person with `cat`) can see what it is doing.
#[derive(Serialize, Deserialize, Clone)]
pub struct LiveStatus {
    pub timestamp: f64,
    pub uptime_seconds: u64,
    // Zone monitoring
    pub zones_loaded: usize,
    pub zone_records_rejected: usize,
    pub updates_processed: u64,
    pub current_zone_code: Option<String>,
    pub zone_alerts_fired: u64,
    // Emergency path
    pub detector_events: u64,
    pub sos_triggered: u64,
    // Last fix
    pub last_latitude: f64,
    pub last_longitude: f64,
    pub last_fix_age_secs: f64,
    pub location_permission_ok: bool,
}

impl LiveStatus {
    pub fn new() -> Self {
        Self {
            timestamp: current_timestamp(),
            uptime_seconds: 0,
            zones_loaded: 0,
            zone_records_rejected: 0,
            updates_processed: 0,
            current_zone_code: None,
            zone_alerts_fired: 0,
            detector_events: 0,
            sos_triggered: 0,
            last_latitude: 0.0,
            last_longitude: 0.0,
            last_fix_age_secs: 0.0,
            location_permission_ok: true,
        }
    }

    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl Default for LiveStatus {
    fn default() -> Self {
        Self::new()
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_writes_readable_json() {
        let mut status = LiveStatus::new();
        status.zones_loaded = 4;
        status.current_zone_code = Some("Z-012".to_string());

        let path = std::env::temp_dir().join("safety_tracker_status_test.json");
        status.save(path.to_str().unwrap()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let parsed: LiveStatus = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.zones_loaded, 4);
        assert_eq!(parsed.current_zone_code.as_deref(), Some("Z-012"));
        let _ = fs::remove_file(&path);
    }
}
