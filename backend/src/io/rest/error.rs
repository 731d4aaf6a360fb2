//! Translation of domain errors into HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use shared::ErrorResponse;
use tracing::{error, warn};

use crate::domain::{ErrorKind, ParkingError};

#[derive(Debug)]
pub struct ApiError(pub ParkingError);

impl From<ParkingError> for ApiError {
    fn from(err: ParkingError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match (&self.0, self.0.kind()) {
            (_, ErrorKind::Validation) => StatusCode::BAD_REQUEST,
            (_, ErrorKind::NotFound) => StatusCode::NOT_FOUND,
            (_, ErrorKind::Infrastructure) => StatusCode::INTERNAL_SERVER_ERROR,
            (
                ParkingError::AttendantInactive
                | ParkingError::OutOfRange { .. }
                | ParkingError::CrossAreaMismatch
                | ParkingError::AttendantMismatch,
                ErrorKind::BusinessRule,
            ) => StatusCode::FORBIDDEN,
            (_, ErrorKind::BusinessRule) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();

        let message = match kind {
            ErrorKind::Infrastructure => {
                error!("Request failed: {:#}", self.0);
                "Internal storage error".to_string()
            }
            _ => {
                warn!("Request rejected ({}): {}", kind.as_str(), self.0);
                self.0.to_string()
            }
        };

        let body = ErrorResponse {
            error: message,
            kind: kind.as_str().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
