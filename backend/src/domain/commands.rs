//! Domain-level command and query types
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the DTOs defined in the
//! `shared` crate to these internal types.

pub mod sessions {
    use chrono::{DateTime, Utc};
    use shared::VehicleType;

    use crate::domain::models::{GeoPoint, PaymentStatus};

    /// Scanned check-in with the attendant token
    #[derive(Debug, Clone)]
    pub struct CheckinCommand {
        pub token: String,
        pub vehicle_type: VehicleType,
        pub plate_number: Option<String>,
        pub location: Option<GeoPoint>,
    }

    /// Which session a scanned check-out targets, in priority order
    #[derive(Debug, Clone, PartialEq)]
    pub enum SessionSelector {
        Id(String),
        Plate(String),
        Token,
    }

    impl SessionSelector {
        /// Explicit id wins over plate, plate over the token's active session
        pub fn resolve(session_id: Option<String>, plate_number: Option<String>) -> Self {
            let non_blank = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
            match (non_blank(session_id), non_blank(plate_number)) {
                (Some(id), _) => SessionSelector::Id(id.trim().to_string()),
                (None, Some(plate)) => SessionSelector::Plate(plate),
                (None, None) => SessionSelector::Token,
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct CheckoutCommand {
        pub token: String,
        pub selector: SessionSelector,
        pub location: Option<GeoPoint>,
    }

    /// Check-in typed in by the attendant; location is mandatory
    #[derive(Debug, Clone)]
    pub struct ManualCheckinCommand {
        pub attendant_id: String,
        pub plate_number: String,
        pub vehicle_type: VehicleType,
        pub checkin_time: DateTime<Utc>,
        pub location: GeoPoint,
    }

    /// Check-out typed in by the attendant; location is mandatory
    #[derive(Debug, Clone)]
    pub struct ManualCheckoutCommand {
        pub attendant_id: String,
        pub session_id: String,
        pub checkout_time: DateTime<Utc>,
        pub location: GeoPoint,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CheckinResult {
        pub session_id: String,
        pub checkin_time: DateTime<Utc>,
        pub area_name: String,
        pub vehicle_type: VehicleType,
        pub rate_charged: f64,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct CheckoutResult {
        pub session_id: String,
        pub checkout_time: DateTime<Utc>,
        pub duration_minutes: i64,
        pub total_cost: f64,
        pub payment_status: PaymentStatus,
    }
}

pub mod revenue {
    use chrono::{DateTime, NaiveDate, Utc};
    use shared::VehicleType;

    use crate::domain::models::{Area, Session};
    use crate::domain::period::RevenueWindow;

    /// Conjunctive filters for revenue queries
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct RevenueFilter {
        pub vehicle_type: Option<VehicleType>,
        pub region: Option<String>,
        pub area_id: Option<String>,
        pub attendant_id: Option<String>,
    }

    impl RevenueFilter {
        pub fn matches_area(&self, area: &Area) -> bool {
            self.area_id.as_deref().map_or(true, |id| id == area.id)
                && self
                    .region
                    .as_deref()
                    .map_or(true, |region| region.eq_ignore_ascii_case(&area.region))
        }

        pub fn matches_session(&self, session: &Session) -> bool {
            self.vehicle_type.map_or(true, |v| v == session.vehicle_type)
                && self
                    .attendant_id
                    .as_deref()
                    .map_or(true, |id| session.attendant_id.as_deref() == Some(id))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct RevenueSummary {
        pub actual_revenue: f64,
        pub estimated_revenue: f64,
        pub total_revenue: f64,
    }

    impl RevenueSummary {
        pub fn new(actual_revenue: f64, estimated_revenue: f64) -> Self {
            Self {
                actual_revenue,
                estimated_revenue,
                total_revenue: actual_revenue + estimated_revenue,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct PeriodRevenue {
        pub label: String,
        pub date: NaiveDate,
        pub start: DateTime<Utc>,
        pub end: DateTime<Utc>,
        pub summary: RevenueSummary,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RevenueOverview {
        pub window: RevenueWindow,
        pub today: RevenueSummary,
        pub active_sessions: usize,
        pub completed_sessions_today: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::sessions::SessionSelector;

    #[test]
    fn test_selector_priority() {
        assert_eq!(
            SessionSelector::resolve(Some("s1".into()), Some("B1".into())),
            SessionSelector::Id("s1".into())
        );
        assert_eq!(
            SessionSelector::resolve(None, Some("B1".into())),
            SessionSelector::Plate("B1".into())
        );
        assert_eq!(
            SessionSelector::resolve(Some("  ".into()), Some("".into())),
            SessionSelector::Token
        );
    }
}
