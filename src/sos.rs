use crate::debounce::AlertDebouncer;

/// Countdown armed when the user presses the SOS control or a detector
/// trips. Gives the user a short window to cancel a false alarm before
/// anything leaves the device.
///
/// Completion is edge-triggered: `poll` returns true at most once per
/// arming, and completions are additionally debounced so a panicked
/// arm/complete/arm cycle cannot spam the backend.
pub struct SosCountdown {
    duration_ms: u64,
    armed_at_ms: Option<u64>,
    completion_guard: AlertDebouncer,
}

impl SosCountdown {
    pub fn new(duration_ms: u64, guard_window_ms: u64) -> Self {
        SosCountdown {
            duration_ms,
            armed_at_ms: None,
            completion_guard: AlertDebouncer::new(guard_window_ms),
        }
    }

    /// Starts (or restarts) the countdown.
    pub fn arm(&mut self, now_ms: u64) {
        self.armed_at_ms = Some(now_ms);
    }

    /// Disarms without dispatching.
    pub fn cancel(&mut self) {
        self.armed_at_ms = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at_ms.is_some()
    }

    /// Milliseconds left, or None when not armed.
    pub fn remaining_ms(&self, now_ms: u64) -> Option<u64> {
        self.armed_at_ms
            .map(|armed_at| (armed_at + self.duration_ms).saturating_sub(now_ms))
    }

    /// True exactly when the countdown has just expired and the completion
    /// window allows a dispatch. Disarms on expiry either way.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let armed_at = match self.armed_at_ms {
            Some(t) => t,
            None => return false,
        };
        if now_ms < armed_at + self.duration_ms {
            return false;
        }
        self.armed_at_ms = None;
        self.completion_guard.fire("sos-countdown", now_ms)
    }
}
