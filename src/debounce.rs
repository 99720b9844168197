use std::collections::HashMap;

/// Minimum time between two alerts for the same logical event source.
pub const DEFAULT_WINDOW_MS: u64 = 5_000;

/// Pure debounce predicate: has the window elapsed since the last firing?
///
/// The caller must advance `last_fired_ms` only when a notification is
/// actually dispatched. Advancing it on every evaluation collapses the
/// window and the alert fires on every tick.
pub fn should_fire(now_ms: u64, last_fired_ms: u64, window_ms: u64) -> bool {
    now_ms.saturating_sub(last_fired_ms) >= window_ms
}

/// Rate limiter shared by every alert source in the process.
///
/// Keyed by an event-source string so unrelated alert types (zone entry,
/// overspeed, countdown completion) each get their own window instead of
/// one ad-hoc timer per call site. A key that has never fired fires
/// immediately.
#[derive(Debug)]
pub struct AlertDebouncer {
    window_ms: u64,
    last_fired: HashMap<String, u64>,
}

impl AlertDebouncer {
    pub fn new(window_ms: u64) -> Self {
        AlertDebouncer {
            window_ms,
            last_fired: HashMap::new(),
        }
    }

    /// Read-only check; does not consume the window.
    pub fn check(&self, key: &str, now_ms: u64) -> bool {
        match self.last_fired.get(key) {
            None => true,
            Some(&last) => should_fire(now_ms, last, self.window_ms),
        }
    }

    /// Record an actual dispatch. Call only after the alert went out.
    pub fn mark_fired(&mut self, key: &str, now_ms: u64) {
        self.last_fired.insert(key.to_string(), now_ms);
    }

    /// Check-then-mark convenience: true means "dispatch now" and the
    /// window for `key` has been consumed.
    pub fn fire(&mut self, key: &str, now_ms: u64) -> bool {
        if self.check(key, now_ms) {
            self.mark_fired(key, now_ms);
            true
        } else {
            false
        }
    }
}

impl Default for AlertDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_MS)
    }
}
