//! Domain model for a billing area.
use serde::{Deserialize, Serialize};
use shared::VehicleType;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Coordinates must be finite and inside the usual degree ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Area {
    pub id: String,
    pub name: String,
    pub region: String,
    pub location: GeoPoint,
    pub car_capacity: u32,
    pub motorcycle_capacity: u32,
    /// Flat charge per car session (named hourly in the admin UI)
    pub car_rate: f64,
    /// Flat charge per motorcycle session
    pub motorcycle_rate: f64,
    pub is_active: bool,
}

impl Area {
    pub fn rate_for(&self, vehicle_type: VehicleType) -> f64 {
        match vehicle_type {
            VehicleType::Car => self.car_rate,
            VehicleType::Motorcycle => self.motorcycle_rate,
        }
    }
}
