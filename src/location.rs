use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration};

use crate::geo::Position;

/// One reading from the device location service.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LocationUpdate {
    /// Epoch seconds at the time of the fix.
    pub timestamp: f64,
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy estimate in meters.
    pub accuracy: f64,
    /// Ground speed in m/s.
    pub speed: f64,
    pub altitude: f64,
}

impl LocationUpdate {
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone)]
pub enum LocationError {
    /// The user denied location access. The feature does not activate;
    /// the fix is a blocking notice pointing at system settings.
    PermissionDenied,
    Unavailable(String),
}

impl Display for LocationError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            LocationError::PermissionDenied => {
                write!(f, "location permission denied, enable it in system settings")
            }
            LocationError::Unavailable(msg) => write!(f, "location unavailable: {}", msg),
        }
    }
}

impl std::error::Error for LocationError {}

/// Source of location fixes. Implementations wrap whatever the platform
/// provides; the simulated source below stands in during development.
pub trait LocationSource: Send {
    /// Checked once when the subscription starts, before any read.
    fn ensure_permission(&mut self) -> Result<(), LocationError>;

    /// One reading. `Ok(None)` means no fix was available this tick.
    fn read(&mut self) -> Result<Option<LocationUpdate>, LocationError>;
}

/// Deterministic walk drifting north-east from a starting point, with a
/// gentle speed oscillation. Stands in for the device GPS.
pub struct SimulatedSource {
    latitude: f64,
    longitude: f64,
    step_deg: f64,
    ticks: u64,
}

impl SimulatedSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        SimulatedSource {
            latitude,
            longitude,
            step_deg: 0.0001, // ~11 m per tick
            ticks: 0,
        }
    }
}

impl LocationSource for SimulatedSource {
    fn ensure_permission(&mut self) -> Result<(), LocationError> {
        Ok(())
    }

    fn read(&mut self) -> Result<Option<LocationUpdate>, LocationError> {
        let seq = self.ticks as f64;
        self.ticks += 1;
        Ok(Some(LocationUpdate {
            timestamp: current_timestamp(),
            latitude: self.latitude + seq * self.step_deg,
            longitude: self.longitude + seq * self.step_deg,
            accuracy: 5.0 + (seq * 0.1).sin() * 2.0,
            speed: 10.0 + (seq * 0.5).sin() * 5.0,
            altitude: 20.0,
        }))
    }
}

/// Subscription loop: reads the source on a fixed interval and pushes into
/// a bounded channel. Drops fixes when the channel is full; terminates when
/// the receiver goes away, so the subscription's lifetime is bound to its
/// consumer's.
pub async fn location_loop<S: LocationSource>(
    mut source: S,
    tx: Sender<LocationUpdate>,
    period: Duration,
) -> Result<(), LocationError> {
    source.ensure_permission()?;

    let mut ticker = interval(period);
    let mut fix_count = 0u64;

    loop {
        ticker.tick().await;

        let update = match source.read() {
            Ok(Some(update)) => update,
            Ok(None) => continue,
            Err(e) => {
                log::warn!("location read failed: {}", e);
                continue;
            }
        };

        match tx.try_send(update) {
            Ok(_) => {
                fix_count += 1;
                if fix_count % 10 == 0 {
                    eprintln!("[location] {} fixes", fix_count);
                }
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(_)) => {
                eprintln!("[location] consumer gone after {} fixes", fix_count);
                break;
            }
            Err(tokio::sync::mpsc::error::TrySendError::Full(_)) => {
                // Consumer is behind, drop this fix
            }
        }
    }

    Ok(())
}

fn current_timestamp() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    struct DeniedSource;

    impl LocationSource for DeniedSource {
        fn ensure_permission(&mut self) -> Result<(), LocationError> {
            Err(LocationError::PermissionDenied)
        }

        fn read(&mut self) -> Result<Option<LocationUpdate>, LocationError> {
            panic!("read must not be called without permission");
        }
    }

    #[test]
    fn test_simulated_source_drifts() {
        let mut source = SimulatedSource::new(5.300, -4.000);
        let first = source.read().unwrap().unwrap();
        let second = source.read().unwrap().unwrap();
        assert_eq!(first.latitude, 5.300);
        assert!(second.latitude > first.latitude);
        assert!(second.longitude > first.longitude);
    }

    #[tokio::test]
    async fn test_permission_denied_deactivates_loop() {
        let (tx, mut rx) = mpsc::channel(4);
        let result = location_loop(DeniedSource, tx, Duration::from_millis(10)).await;
        assert!(matches!(result, Err(LocationError::PermissionDenied)));
        // Nothing was ever produced
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_loop_ends_when_consumer_drops() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let result = location_loop(
            SimulatedSource::new(5.300, -4.000),
            tx,
            Duration::from_millis(1),
        )
        .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_fixes_arrive_in_order() {
        let (tx, mut rx) = mpsc::channel(16);
        let handle = tokio::spawn(location_loop(
            SimulatedSource::new(5.300, -4.000),
            tx,
            Duration::from_millis(1),
        ));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second.latitude > first.latitude);

        drop(rx);
        let _ = handle.await;
    }
}
