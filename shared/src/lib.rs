use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Vehicle class a session is billed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Car,
    Motorcycle,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Car => "car",
            VehicleType::Motorcycle => "motorcycle",
        }
    }
}

impl fmt::Display for VehicleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a vehicle class string is not recognised
#[derive(Debug, Clone, PartialEq)]
pub struct ParseVehicleTypeError(pub String);

impl fmt::Display for ParseVehicleTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown vehicle type '{}', expected 'car' or 'motorcycle'", self.0)
    }
}

impl std::error::Error for ParseVehicleTypeError {}

impl FromStr for VehicleType {
    type Err = ParseVehicleTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "car" => Ok(VehicleType::Car),
            "motorcycle" => Ok(VehicleType::Motorcycle),
            _ => Err(ParseVehicleTypeError(s.to_string())),
        }
    }
}

/// Request body for a scanned check-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinRequest {
    /// Attendant-bound token presented by the customer
    pub token: String,
    /// "car" or "motorcycle"
    pub vehicle_type: String,
    pub plate_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckinResponse {
    pub session_id: String,
    pub checkin_time: DateTime<Utc>,
    pub area_name: String,
    pub vehicle_type: VehicleType,
    /// Flat rate charged up front for the vehicle class
    pub rate_charged: f64,
}

/// Request body for a scanned check-out.
///
/// The session is selected by `session_id`, then `plate_number`, then the
/// active session bound to `token`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub token: String,
    pub session_id: Option<String>,
    pub plate_number: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub checkout_time: DateTime<Utc>,
    pub duration_minutes: i64,
    pub total_cost: f64,
    pub payment_status: String,
}

/// Request body for a check-in typed in by the attendant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualCheckinRequest {
    pub attendant_id: String,
    pub plate_number: String,
    pub vehicle_type: String,
    pub checkin_time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Request body for a check-out typed in by the attendant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualCheckoutRequest {
    pub attendant_id: String,
    pub session_id: String,
    pub checkout_time: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Optional filters shared by every revenue query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevenueFilterParams {
    pub vehicle_type: Option<String>,
    pub region: Option<String>,
    pub area_id: Option<String>,
    pub attendant_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueResponse {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub actual_revenue: f64,
    pub estimated_revenue: f64,
    pub total_revenue: f64,
}

/// One calendar bucket of a period report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRevenueEntry {
    /// "Mon", "Week 23" or "Jan" depending on granularity
    pub label: String,
    /// First calendar day of the bucket
    pub date: NaiveDate,
    pub actual_revenue: f64,
    pub estimated_revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRevenueResponse {
    pub granularity: String,
    pub periods: Vec<PeriodRevenueEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueOverviewResponse {
    pub today: RevenueResponse,
    pub active_sessions: usize,
    pub completed_sessions_today: usize,
}

/// Envelope pushed to attendant dashboards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: serde_json::Value,
}

impl SessionEvent {
    pub const SESSION_CREATED: &'static str = "session_created";
    pub const SESSION_UPDATE: &'static str = "session_update";

    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }
}

/// Error body returned by every failing endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// validation, business_rule, not_found or infrastructure
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vehicle_type_parsing() {
        assert_eq!("car".parse::<VehicleType>().unwrap(), VehicleType::Car);
        assert_eq!(" Motorcycle ".parse::<VehicleType>().unwrap(), VehicleType::Motorcycle);
        assert!("truck".parse::<VehicleType>().is_err());
    }

    #[test]
    fn test_session_event_serializes_type_field() {
        let event = SessionEvent::new(SessionEvent::SESSION_UPDATE, serde_json::json!({"id": "s1"}));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_update");
        assert_eq!(json["data"]["id"], "s1");
    }
}
