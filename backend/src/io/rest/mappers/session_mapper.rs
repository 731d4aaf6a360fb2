use shared::{
    CheckinRequest, CheckinResponse, CheckoutRequest, CheckoutResponse, ManualCheckinRequest,
    ManualCheckoutRequest, VehicleType,
};

use crate::domain::commands::sessions::{
    CheckinCommand, CheckinResult, CheckoutCommand, CheckoutResult, ManualCheckinCommand,
    ManualCheckoutCommand, SessionSelector,
};
use crate::domain::models::GeoPoint;
use crate::domain::{ParkingError, ParkingResult};

pub struct SessionMapper;

impl SessionMapper {
    pub fn parse_vehicle_type(value: &str) -> ParkingResult<VehicleType> {
        value
            .parse::<VehicleType>()
            .map_err(|e| ParkingError::Validation(e.to_string()))
    }

    /// Both coordinates or neither
    pub fn optional_location(latitude: Option<f64>, longitude: Option<f64>) -> ParkingResult<Option<GeoPoint>> {
        match (latitude, longitude) {
            (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng))),
            (None, None) => Ok(None),
            _ => Err(ParkingError::validation(
                "Latitude and longitude must be provided together",
            )),
        }
    }

    fn required_location(latitude: Option<f64>, longitude: Option<f64>) -> ParkingResult<GeoPoint> {
        Self::optional_location(latitude, longitude)?
            .ok_or_else(|| ParkingError::validation("Location is required for manual entries"))
    }

    pub fn to_checkin_command(request: CheckinRequest) -> ParkingResult<CheckinCommand> {
        Ok(CheckinCommand {
            vehicle_type: Self::parse_vehicle_type(&request.vehicle_type)?,
            location: Self::optional_location(request.latitude, request.longitude)?,
            token: request.token,
            plate_number: request.plate_number,
        })
    }

    pub fn to_checkout_command(request: CheckoutRequest) -> ParkingResult<CheckoutCommand> {
        Ok(CheckoutCommand {
            location: Self::optional_location(request.latitude, request.longitude)?,
            selector: SessionSelector::resolve(request.session_id, request.plate_number),
            token: request.token,
        })
    }

    pub fn to_manual_checkin_command(request: ManualCheckinRequest) -> ParkingResult<ManualCheckinCommand> {
        Ok(ManualCheckinCommand {
            vehicle_type: Self::parse_vehicle_type(&request.vehicle_type)?,
            location: Self::required_location(request.latitude, request.longitude)?,
            attendant_id: request.attendant_id,
            plate_number: request.plate_number,
            checkin_time: request.checkin_time,
        })
    }

    pub fn to_manual_checkout_command(request: ManualCheckoutRequest) -> ParkingResult<ManualCheckoutCommand> {
        Ok(ManualCheckoutCommand {
            location: Self::required_location(request.latitude, request.longitude)?,
            attendant_id: request.attendant_id,
            session_id: request.session_id,
            checkout_time: request.checkout_time,
        })
    }

    pub fn to_checkin_response(result: CheckinResult) -> CheckinResponse {
        CheckinResponse {
            session_id: result.session_id,
            checkin_time: result.checkin_time,
            area_name: result.area_name,
            vehicle_type: result.vehicle_type,
            rate_charged: result.rate_charged,
        }
    }

    pub fn to_checkout_response(result: CheckoutResult) -> CheckoutResponse {
        CheckoutResponse {
            session_id: result.session_id,
            checkout_time: result.checkout_time,
            duration_minutes: result.duration_minutes,
            total_cost: result.total_cost,
            payment_status: result.payment_status.to_string(),
        }
    }
}
