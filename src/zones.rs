use serde::{Deserialize, Serialize};

use crate::geo::{distance_meters, Position};

/// A circular geofence flagged as dangerous by the backend.
///
/// Zones are fetched wholesale at startup and treated as immutable for the
/// session. Overlapping zones are allowed; containment ties are broken by
/// list order (see [`evaluate`]).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DangerZone {
    /// Unique zone identifier assigned by the backend.
    pub code: String,
    pub center: Position,
    pub radius_m: f64,
    /// Short human-readable name, usually the address.
    pub label: String,
    /// Free-text note shown alongside alerts.
    pub observation: String,
    /// Display color for map rendering.
    pub color: String,
}

impl DangerZone {
    /// Inclusive containment: a point at exactly `radius_m` from the center
    /// counts as inside.
    pub fn contains(&self, position: Position) -> bool {
        distance_meters(position, self.center) <= self.radius_m
    }
}

/// Returns the first zone in list order that contains the position.
///
/// First-match is the contract, not nearest-center or smallest-radius: the
/// backend's ordering decides ties between overlapping zones. O(zones) per
/// call, which is fine for the tens of zones a deployment carries.
pub fn evaluate(position: Position, zones: &[DangerZone]) -> Option<&DangerZone> {
    zones.iter().find(|zone| zone.contains(position))
}

/// Classified change in the matched zone between two consecutive updates.
#[derive(Clone, Debug, PartialEq)]
pub enum ZoneTransition {
    /// Outside everywhere, now inside a zone.
    Entered(DangerZone),
    /// Was inside a zone, now outside everywhere.
    Exited(DangerZone),
    /// Moved directly between two overlapping or adjacent zones.
    Switched { from: DangerZone, to: DangerZone },
    /// Same zone (or still no zone) as before.
    Unchanged,
}

impl ZoneTransition {
    /// Stable key for rate-limiting per logical event type.
    pub fn kind(&self) -> &'static str {
        match self {
            ZoneTransition::Entered(_) => "zone-entered",
            ZoneTransition::Exited(_) => "zone-exited",
            ZoneTransition::Switched { .. } => "zone-switched",
            ZoneTransition::Unchanged => "zone-unchanged",
        }
    }
}

/// Tracks which zone (if any) the last update landed in.
///
/// Owned by a single monitor instance; never shared across consumers.
#[derive(Debug, Default)]
pub struct ZoneMatchState {
    current: Option<DangerZone>,
}

impl ZoneMatchState {
    pub fn new() -> Self {
        ZoneMatchState { current: None }
    }

    pub fn current(&self) -> Option<&DangerZone> {
        self.current.as_ref()
    }

    /// Applies the evaluator's result and classifies the transition.
    pub fn update(&mut self, matched: Option<&DangerZone>) -> ZoneTransition {
        let transition = match (&self.current, matched) {
            (None, None) => ZoneTransition::Unchanged,
            (None, Some(zone)) => ZoneTransition::Entered(zone.clone()),
            (Some(prev), None) => ZoneTransition::Exited(prev.clone()),
            (Some(prev), Some(zone)) if prev.code == zone.code => ZoneTransition::Unchanged,
            (Some(prev), Some(zone)) => ZoneTransition::Switched {
                from: prev.clone(),
                to: zone.clone(),
            },
        };
        self.current = matched.cloned();
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone(code: &str, lat: f64, lon: f64, radius_m: f64) -> DangerZone {
        DangerZone {
            code: code.to_string(),
            center: Position::new(lat, lon),
            radius_m,
            label: format!("zone {}", code),
            observation: "test".to_string(),
            color: "#ff0000".to_string(),
        }
    }

    #[test]
    fn test_point_at_center_is_inside() {
        let zones = vec![zone("Z1", 5.300, -4.000, 100.0)];
        let hit = evaluate(Position::new(5.300, -4.000), &zones);
        assert_eq!(hit.map(|z| z.code.as_str()), Some("Z1"));
    }

    #[test]
    fn test_far_point_is_outside() {
        // 0.1 deg of latitude away is ~11.1 km, far beyond a 100 m radius
        let zones = vec![zone("Z1", 5.400, -4.000, 100.0)];
        assert!(evaluate(Position::new(5.300, -4.000), &zones).is_none());
    }

    #[test]
    fn test_containment_boundary_is_inclusive() {
        let center = Position::new(5.300, -4.000);
        let point = Position::new(5.3005, -4.000);
        let d = distance_meters(point, center);

        let at_boundary = vec![zone("Z1", 5.300, -4.000, d)];
        assert!(evaluate(point, &at_boundary).is_some());

        let just_inside_radius = vec![zone("Z1", 5.300, -4.000, d - 0.01)];
        assert!(evaluate(point, &just_inside_radius).is_none());
    }

    #[test]
    fn test_first_match_wins_for_overlapping_zones() {
        let point = Position::new(5.300, -4.000);
        let zones = vec![
            zone("A", 5.300, -4.000, 500.0),
            zone("B", 5.300, -4.000, 500.0),
        ];
        assert_eq!(evaluate(point, &zones).map(|z| z.code.as_str()), Some("A"));

        let reversed = vec![
            zone("B", 5.300, -4.000, 500.0),
            zone("A", 5.300, -4.000, 500.0),
        ];
        assert_eq!(
            evaluate(point, &reversed).map(|z| z.code.as_str()),
            Some("B")
        );
    }

    #[test]
    fn test_empty_zone_list_never_matches() {
        assert!(evaluate(Position::new(5.300, -4.000), &[]).is_none());
    }

    #[test]
    fn test_transition_entry_exit() {
        let z1 = zone("Z1", 5.300, -4.000, 100.0);
        let mut state = ZoneMatchState::new();

        assert_eq!(state.update(None), ZoneTransition::Unchanged);
        assert_eq!(state.update(Some(&z1)), ZoneTransition::Entered(z1.clone()));
        assert_eq!(state.update(Some(&z1)), ZoneTransition::Unchanged);
        assert_eq!(state.update(None), ZoneTransition::Exited(z1));
        assert!(state.current().is_none());
    }

    #[test]
    fn test_transition_switch_between_zones() {
        let z1 = zone("Z1", 5.300, -4.000, 100.0);
        let z2 = zone("Z2", 5.301, -4.000, 100.0);
        let mut state = ZoneMatchState::new();

        state.update(Some(&z1));
        let transition = state.update(Some(&z2));
        assert_eq!(
            transition,
            ZoneTransition::Switched {
                from: z1,
                to: z2.clone()
            }
        );
        assert_eq!(state.current().map(|z| z.code.as_str()), Some("Z2"));
    }
}
