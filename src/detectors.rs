use serde::{Deserialize, Serialize};

use crate::debounce::AlertDebouncer;
use crate::geo::Position;

/// Ambient geomagnetic field magnitude near the equator, in microtesla.
const MAGNETIC_BASELINE_UT: f64 = 33.0;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DetectedEvent {
    pub timestamp_ms: u64,
    pub kind: String, // "magnetic", "overspeed"
    pub magnitude: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Background emergency detection over the sensor stream.
///
/// Two checks, most severe first: a magnetic-field anomaly (strong
/// deviation from the ambient field, a proxy for being near heavy metal
/// masses or electrical faults) and sustained overspeed. Each event kind
/// is rate-limited independently so one noisy sensor cannot flood alerts.
pub struct SafetyDetector {
    overspeed_threshold: f64, // m/s
    magnetic_threshold: f64,  // microtesla above baseline
    debouncer: AlertDebouncer,
}

impl SafetyDetector {
    pub fn new(overspeed_threshold: f64, magnetic_threshold: f64, window_ms: u64) -> Self {
        SafetyDetector {
            overspeed_threshold,
            magnetic_threshold,
            debouncer: AlertDebouncer::new(window_ms),
        }
    }

    /// Evaluate one tick of sensor data. At most one event per call.
    pub fn detect(
        &mut self,
        speed: Option<f64>,
        magnetic_field_ut: Option<f64>,
        timestamp_ms: u64,
        position: Option<Position>,
    ) -> Option<DetectedEvent> {
        let (latitude, longitude) = match position {
            Some(p) => (Some(p.latitude), Some(p.longitude)),
            None => (None, None),
        };

        if let Some(field) = magnetic_field_ut {
            let deviation = (field - MAGNETIC_BASELINE_UT).abs();
            if deviation > self.magnetic_threshold && self.debouncer.fire("magnetic", timestamp_ms)
            {
                return Some(DetectedEvent {
                    timestamp_ms,
                    kind: "magnetic".to_string(),
                    magnitude: deviation,
                    latitude,
                    longitude,
                });
            }
        }

        if let Some(speed) = speed {
            if speed > self.overspeed_threshold
                && self.debouncer.fire("overspeed", timestamp_ms)
            {
                return Some(DetectedEvent {
                    timestamp_ms,
                    kind: "overspeed".to_string(),
                    magnitude: speed,
                    latitude,
                    longitude,
                });
            }
        }

        None
    }
}
