//! Flat-rate pricing.
//!
//! A session costs the area's rate for its vehicle class, whatever its
//! length. The rate is read at the moment the price is computed, so a
//! check-out after an area rate change charges the new rate.
//! Revenue estimates for open sessions use a per-minute projection of the
//! same rate instead; the two figures are not expected to agree.

use shared::VehicleType;

use crate::domain::models::Area;

#[derive(Debug, Clone, Copy, Default)]
pub struct BillingCalculator;

impl BillingCalculator {
    pub fn rate(&self, area: &Area, vehicle_type: VehicleType) -> f64 {
        area.rate_for(vehicle_type)
    }

    /// Accrual projection for a session that has been open `elapsed_minutes`
    pub fn projected_cost(&self, area: &Area, vehicle_type: VehicleType, elapsed_minutes: i64) -> f64 {
        elapsed_minutes.max(0) as f64 / 60.0 * self.rate(area, vehicle_type)
    }
}

#[cfg(test)]
pub(crate) fn test_area(id: &str, car_rate: f64, motorcycle_rate: f64) -> Area {
    use crate::domain::models::GeoPoint;
    Area {
        id: id.to_string(),
        name: format!("Area {}", id),
        region: "Jakarta Pusat".to_string(),
        location: GeoPoint::new(-6.175392, 106.827153),
        car_capacity: 20,
        motorcycle_capacity: 50,
        car_rate,
        motorcycle_rate,
        is_active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_is_per_vehicle_class() {
        let area = test_area("a1", 5000.0, 3000.0);
        let billing = BillingCalculator;
        assert_eq!(billing.rate(&area, VehicleType::Car), 5000.0);
        assert_eq!(billing.rate(&area, VehicleType::Motorcycle), 3000.0);
    }

    #[test]
    fn test_projection_scales_with_minutes() {
        let area = test_area("a1", 6000.0, 2000.0);
        let billing = BillingCalculator;
        assert_eq!(billing.projected_cost(&area, VehicleType::Car, 30), 3000.0);
        assert_eq!(billing.projected_cost(&area, VehicleType::Car, 0), 0.0);
        assert_eq!(billing.projected_cost(&area, VehicleType::Car, -5), 0.0);
        assert_eq!(billing.projected_cost(&area, VehicleType::Motorcycle, 90), 3000.0);
    }
}
