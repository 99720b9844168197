use tokio::sync::mpsc::Receiver;
use tokio::sync::watch;

use crate::location::LocationUpdate;
use crate::notifier::TransitionNotifier;
use crate::status::epoch_ms;
use crate::zones::{evaluate, DangerZone, ZoneMatchState, ZoneTransition};

/// Counters exposed to the live-status snapshot.
#[derive(Clone, Debug, Default)]
pub struct MonitorStats {
    pub updates_processed: u64,
    pub alerts_fired: u64,
    pub current_zone: Option<String>,
    pub last_fix: Option<LocationUpdate>,
}

/// Owns the zone list fetched at startup, the match state, and the
/// notifier. One instance per consumer; nothing here is shared across
/// screens or tasks.
pub struct ZoneMonitor {
    zones: Vec<DangerZone>,
    state: ZoneMatchState,
    notifier: TransitionNotifier,
    stats: MonitorStats,
}

impl ZoneMonitor {
    pub fn new(zones: Vec<DangerZone>, notifier: TransitionNotifier) -> Self {
        ZoneMonitor {
            zones,
            state: ZoneMatchState::new(),
            notifier,
            stats: MonitorStats::default(),
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    pub fn zone_count(&self) -> usize {
        self.zones.len()
    }

    /// Seconds since the last fix was taken, for staleness reporting.
    pub fn last_fix_age_secs(&self, now_secs: f64) -> Option<f64> {
        self.stats
            .last_fix
            .map(|fix| (now_secs - fix.timestamp).max(0.0))
    }

    /// Evaluate one update: match against the zone list, classify the
    /// transition, and hand it to the notifier. The clock is explicit so
    /// debounce behavior is testable.
    pub fn process_update(&mut self, update: &LocationUpdate, now_ms: u64) -> ZoneTransition {
        let matched = evaluate(update.position(), &self.zones);
        let transition = self.state.update(matched);

        self.stats.updates_processed += 1;
        self.stats.last_fix = Some(*update);
        self.stats.current_zone = self.state.current().map(|zone| zone.code.clone());

        if self.notifier.notify(&transition, now_ms) {
            self.stats.alerts_fired += 1;
        }

        transition
    }

    /// Consumes the location stream until it ends or shutdown is signaled.
    /// The first signal on the shutdown channel (or its sender going away)
    /// stops the loop; a pending update is never applied after that.
    pub async fn run(
        &mut self,
        mut rx: Receiver<LocationUpdate>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    eprintln!(
                        "[monitor] shutdown after {} updates",
                        self.stats.updates_processed
                    );
                    break;
                }
                maybe = rx.recv() => {
                    match maybe {
                        Some(update) => {
                            self.process_update(&update, epoch_ms());
                        }
                        None => {
                            eprintln!(
                                "[monitor] location stream ended after {} updates",
                                self.stats.updates_processed
                            );
                            break;
                        }
                    }
                }
            }
        }
    }
}
