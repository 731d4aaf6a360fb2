//! # REST API for Parking Sessions
//!
//! Scanned and manual check-in / check-out endpoints.

use axum::{extract::State, http::StatusCode, response::Json};
use shared::{
    CheckinRequest, CheckinResponse, CheckoutRequest, CheckoutResponse, ManualCheckinRequest,
    ManualCheckoutRequest,
};
use tracing::info;

use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::session_mapper::SessionMapper;
use crate::AppState;

/// Check a vehicle in with the attendant's token
pub async fn checkin(
    State(state): State<AppState>,
    Json(request): Json<CheckinRequest>,
) -> Result<(StatusCode, Json<CheckinResponse>), ApiError> {
    info!("POST /api/sessions/checkin - vehicle: {}", request.vehicle_type);

    let command = SessionMapper::to_checkin_command(request)?;
    let result = state.session_service.checkin(command).await?;
    Ok((StatusCode::CREATED, Json(SessionMapper::to_checkin_response(result))))
}

/// Check a vehicle out by session id, plate or the token's active session
pub async fn checkout(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    info!("POST /api/sessions/checkout");

    let command = SessionMapper::to_checkout_command(request)?;
    let result = state.session_service.checkout(command).await?;
    Ok(Json(SessionMapper::to_checkout_response(result)))
}

pub async fn manual_checkin(
    State(state): State<AppState>,
    Json(request): Json<ManualCheckinRequest>,
) -> Result<(StatusCode, Json<CheckinResponse>), ApiError> {
    info!("POST /api/sessions/manual/checkin - attendant: {}", request.attendant_id);

    let command = SessionMapper::to_manual_checkin_command(request)?;
    let result = state.session_service.manual_checkin(command).await?;
    Ok((StatusCode::CREATED, Json(SessionMapper::to_checkin_response(result))))
}

pub async fn manual_checkout(
    State(state): State<AppState>,
    Json(request): Json<ManualCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    info!("POST /api/sessions/manual/checkout - attendant: {}", request.attendant_id);

    let command = SessionMapper::to_manual_checkout_command(request)?;
    let result = state.session_service.manual_checkout(command).await?;
    Ok(Json(SessionMapper::to_checkout_response(result)))
}
