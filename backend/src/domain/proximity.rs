//! Geofence check that a check-in/check-out happens near the area.
//!
//! Distances use the haversine great-circle formula on a spherical Earth
//! with a 6371 km radius.

use tracing::debug;

use crate::domain::error::ParkingError;
use crate::domain::models::GeoPoint;

pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;
pub const DEFAULT_MAX_DISTANCE_METERS: f64 = 300.0;

// Absorbs degree/radian round-off so a point on the boundary is accepted.
const BOUNDARY_SLACK_METERS: f64 = 1e-6;

/// Great-circle distance between two points in meters
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_METERS * c
}

#[derive(Debug, Clone, Copy)]
pub struct ProximityGuard {
    max_distance_meters: f64,
}

impl Default for ProximityGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTANCE_METERS)
    }
}

impl ProximityGuard {
    pub fn new(max_distance_meters: f64) -> Self {
        Self { max_distance_meters }
    }

    pub fn max_distance_meters(&self) -> f64 {
        self.max_distance_meters
    }

    /// Returns the measured distance, or `OutOfRange` when it exceeds the limit
    pub fn check(&self, claimed: GeoPoint, area: GeoPoint) -> Result<f64, ParkingError> {
        if !claimed.is_valid() {
            return Err(ParkingError::validation(
                "Latitude must be within ±90 and longitude within ±180",
            ));
        }

        let distance = haversine_distance_meters(claimed, area);
        debug!(
            "Proximity check: {:.2} m from area (limit {:.0} m)",
            distance, self.max_distance_meters
        );

        if distance > self.max_distance_meters + BOUNDARY_SLACK_METERS {
            return Err(ParkingError::OutOfRange {
                distance_meters: distance,
                max_meters: self.max_distance_meters,
            });
        }
        Ok(distance)
    }

    /// Runs the check only when coordinates were supplied
    pub fn check_optional(&self, claimed: Option<GeoPoint>, area: GeoPoint) -> Result<(), ParkingError> {
        match claimed {
            Some(point) => self.check(point, area).map(|_| ()),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
pub(crate) fn point_north_of(origin: GeoPoint, meters: f64) -> GeoPoint {
    let d_lat = (meters / EARTH_RADIUS_METERS).to_degrees();
    GeoPoint::new(origin.latitude + d_lat, origin.longitude)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monas() -> GeoPoint {
        GeoPoint::new(-6.175392, 106.827153)
    }

    #[test]
    fn test_zero_distance() {
        assert_eq!(haversine_distance_meters(monas(), monas()), 0.0);
    }

    #[test]
    fn test_known_city_distance() {
        // Jakarta (Monas) to Bandung (Gedung Sate), roughly 119 km
        let gedung_sate = GeoPoint::new(-6.902464, 107.618781);
        let distance = haversine_distance_meters(monas(), gedung_sate);
        assert!((distance - 119_100.0).abs() < 500.0, "got {}", distance);
    }

    #[test]
    fn test_point_exactly_on_boundary_is_accepted() {
        let guard = ProximityGuard::default();
        let edge = point_north_of(monas(), 300.0);
        let distance = guard.check(edge, monas()).unwrap();
        assert!((distance - 300.0).abs() < 1e-3);
    }

    #[test]
    fn test_point_one_meter_beyond_is_rejected() {
        let guard = ProximityGuard::default();
        let outside = point_north_of(monas(), 301.0);
        match guard.check(outside, monas()) {
            Err(ParkingError::OutOfRange { distance_meters, max_meters }) => {
                assert!((distance_meters - 301.0).abs() < 1e-3);
                assert_eq!(max_meters, 300.0);
            }
            other => panic!("expected OutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_coordinates_skip_the_guard() {
        let guard = ProximityGuard::new(1.0);
        assert!(guard.check_optional(None, monas()).is_ok());
    }

    #[test]
    fn test_invalid_coordinates_are_validation_errors() {
        let guard = ProximityGuard::default();
        let err = guard.check(GeoPoint::new(91.0, 0.0), monas()).unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
        let err = guard.check(GeoPoint::new(f64::NAN, 0.0), monas()).unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));
    }
}
