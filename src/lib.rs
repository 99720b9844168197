pub mod backend;
pub mod config;
pub mod debounce;
pub mod detectors;
pub mod geo;
pub mod location;
pub mod monitor;
pub mod notifier;
pub mod session;
pub mod sos;
pub mod status;
pub mod zones;

pub use geo::{distance_meters, Position};
pub use zones::{evaluate, DangerZone, ZoneMatchState, ZoneTransition};
