use crate::debounce::AlertDebouncer;
use crate::zones::ZoneTransition;

/// Vibration pattern as alternating off/on millisecond durations.
pub const ALERT_VIBRATION_PATTERN: [u64; 6] = [0, 400, 200, 400, 200, 600];

/// Device vibration motor. Fire-and-forget pulse.
pub trait HapticSink: Send {
    fn pulse(&mut self, pattern: &[u64]) -> Result<(), String>;
}

/// Alert sound playback. Loaded once, replayed per alert.
pub trait AlertSounder: Send {
    fn play(&mut self) -> Result<(), String>;
}

/// User-facing message presentation (modal with a single dismiss action).
pub trait MessageSink: Send {
    fn show(&mut self, title: &str, body: &str) -> Result<(), String>;
}

/// Drives device feedback on zone transitions.
///
/// The three channels are independently best-effort: a failed sound must
/// not block the haptic pulse or the message, and vice versa. Failures are
/// logged and swallowed, never surfaced; a missing vibration is cosmetic.
/// Dispatch is rate-limited per transition kind.
pub struct TransitionNotifier {
    haptics: Box<dyn HapticSink>,
    sounder: Box<dyn AlertSounder>,
    messages: Box<dyn MessageSink>,
    debouncer: AlertDebouncer,
}

impl TransitionNotifier {
    pub fn new(
        haptics: Box<dyn HapticSink>,
        sounder: Box<dyn AlertSounder>,
        messages: Box<dyn MessageSink>,
        window_ms: u64,
    ) -> Self {
        TransitionNotifier {
            haptics,
            sounder,
            messages,
            debouncer: AlertDebouncer::new(window_ms),
        }
    }

    /// Returns true when feedback was actually dispatched.
    pub fn notify(&mut self, transition: &ZoneTransition, now_ms: u64) -> bool {
        let (title, body) = match transition {
            ZoneTransition::Unchanged => return false,
            ZoneTransition::Entered(zone) => (
                "Danger zone".to_string(),
                format!("Entering {}. {}", zone.label, zone.observation),
            ),
            ZoneTransition::Exited(zone) => (
                "Danger zone cleared".to_string(),
                format!("Leaving {}.", zone.label),
            ),
            ZoneTransition::Switched { from, to } => (
                "Danger zone".to_string(),
                format!("Leaving {}, entering {}. {}", from.label, to.label, to.observation),
            ),
        };

        if !self.debouncer.fire(transition.kind(), now_ms) {
            return false;
        }

        if let Err(e) = self.haptics.pulse(&ALERT_VIBRATION_PATTERN) {
            log::warn!("haptic pulse failed: {}", e);
        }
        if let Err(e) = self.sounder.play() {
            log::warn!("alert sound failed: {}", e);
        }
        if let Err(e) = self.messages.show(&title, &body) {
            log::warn!("alert message failed: {}", e);
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Position;
    use crate::zones::DangerZone;
    use std::sync::{Arc, Mutex};

    fn zone(code: &str) -> DangerZone {
        DangerZone {
            code: code.to_string(),
            center: Position::new(5.300, -4.000),
            radius_m: 100.0,
            label: format!("zone {}", code),
            observation: "flooded crossing".to_string(),
            color: "#ff0000".to_string(),
        }
    }

    #[derive(Clone, Default)]
    struct Recorder {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl Recorder {
        fn failing() -> Self {
            Recorder {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail: true,
            }
        }

        fn record(&self, entry: String) -> Result<(), String> {
            self.calls.lock().unwrap().push(entry);
            if self.fail {
                Err("device error".to_string())
            } else {
                Ok(())
            }
        }

        fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    impl HapticSink for Recorder {
        fn pulse(&mut self, pattern: &[u64]) -> Result<(), String> {
            self.record(format!("pulse {:?}", pattern))
        }
    }

    impl AlertSounder for Recorder {
        fn play(&mut self) -> Result<(), String> {
            self.record("play".to_string())
        }
    }

    impl MessageSink for Recorder {
        fn show(&mut self, title: &str, body: &str) -> Result<(), String> {
            self.record(format!("{}: {}", title, body))
        }
    }

    fn notifier_with(
        haptics: Recorder,
        sounder: Recorder,
        messages: Recorder,
    ) -> TransitionNotifier {
        TransitionNotifier::new(
            Box::new(haptics),
            Box::new(sounder),
            Box::new(messages),
            5_000,
        )
    }

    #[test]
    fn test_entry_drives_all_three_channels() {
        let haptics = Recorder::default();
        let sounder = Recorder::default();
        let messages = Recorder::default();
        let mut notifier =
            notifier_with(haptics.clone(), sounder.clone(), messages.clone());

        assert!(notifier.notify(&ZoneTransition::Entered(zone("Z1")), 0));
        assert_eq!(haptics.count(), 1);
        assert_eq!(sounder.count(), 1);
        assert_eq!(messages.count(), 1);

        let shown = messages.calls.lock().unwrap().join("");
        assert!(shown.contains("zone Z1"));
        assert!(shown.contains("flooded crossing"));
    }

    #[test]
    fn test_sound_failure_does_not_block_other_channels() {
        let haptics = Recorder::default();
        let sounder = Recorder::failing();
        let messages = Recorder::default();
        let mut notifier =
            notifier_with(haptics.clone(), sounder.clone(), messages.clone());

        // Still counts as dispatched: playback failure is cosmetic
        assert!(notifier.notify(&ZoneTransition::Entered(zone("Z1")), 0));
        assert_eq!(haptics.count(), 1);
        assert_eq!(sounder.count(), 1);
        assert_eq!(messages.count(), 1);
    }

    #[test]
    fn test_unchanged_is_silent() {
        let haptics = Recorder::default();
        let sounder = Recorder::default();
        let messages = Recorder::default();
        let mut notifier =
            notifier_with(haptics.clone(), sounder.clone(), messages.clone());

        assert!(!notifier.notify(&ZoneTransition::Unchanged, 0));
        assert_eq!(haptics.count(), 0);
        assert_eq!(sounder.count(), 0);
        assert_eq!(messages.count(), 0);
    }

    #[test]
    fn test_repeat_within_window_is_suppressed() {
        let messages = Recorder::default();
        let mut notifier = notifier_with(
            Recorder::default(),
            Recorder::default(),
            messages.clone(),
        );

        assert!(notifier.notify(&ZoneTransition::Entered(zone("Z1")), 1_000));
        assert!(!notifier.notify(&ZoneTransition::Entered(zone("Z2")), 3_000));
        assert!(notifier.notify(&ZoneTransition::Entered(zone("Z2")), 6_000));
        assert_eq!(messages.count(), 2);
    }

    #[test]
    fn test_exit_message_names_the_zone_left() {
        let messages = Recorder::default();
        let mut notifier = notifier_with(
            Recorder::default(),
            Recorder::default(),
            messages.clone(),
        );

        assert!(notifier.notify(&ZoneTransition::Exited(zone("Z9")), 0));
        let shown = messages.calls.lock().unwrap().join("");
        assert!(shown.contains("Leaving zone Z9"));
    }
}
