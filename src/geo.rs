use serde::{Deserialize, Serialize};

/// Mean Earth radius for the spherical approximation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A latitude/longitude reading in decimal degrees.
///
/// Positions are ephemeral: each location tick produces a fresh value and
/// nothing holds on to stale ones. Inputs are not range-checked; a NaN
/// coordinate yields a NaN distance, which callers must treat as
/// "not contained" rather than crash on.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance in meters between two positions (Haversine).
///
/// Pure and deterministic, no I/O. The `max(0.0)` guard keeps the sqrt
/// argument non-negative when floating error pushes `1 - a` slightly below
/// zero for near-antipodal pairs.
pub fn distance_meters(a: Position, b: Position) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());
    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_zero_distance_identity() {
        let p = Position::new(5.300, -4.000);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let a = Position::new(5.300, -4.000);
        let b = Position::new(5.412, -3.871);
        assert_relative_eq!(
            distance_meters(a, b),
            distance_meters(b, a),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_tenth_degree_of_latitude() {
        // 0.1 deg of latitude is about 11.1 km on a 6371 km sphere
        let a = Position::new(5.300, -4.000);
        let b = Position::new(5.400, -4.000);
        let d = distance_meters(a, b);
        assert_relative_eq!(d, 11_119.5, epsilon = 1.0);
    }

    #[test]
    fn test_nan_propagates_without_panic() {
        let a = Position::new(f64::NAN, -4.000);
        let b = Position::new(5.300, -4.000);
        let d = distance_meters(a, b);
        assert!(d.is_nan());
        // A NaN distance never satisfies a containment comparison
        assert!(!(d <= 100.0));
    }

    #[test]
    fn test_longitude_scaled_by_latitude() {
        // A degree of longitude shrinks with latitude
        let eq_a = Position::new(0.0, 10.0);
        let eq_b = Position::new(0.0, 11.0);
        let hi_a = Position::new(60.0, 10.0);
        let hi_b = Position::new(60.0, 11.0);
        assert!(distance_meters(hi_a, hi_b) < distance_meters(eq_a, eq_b));
    }
}
