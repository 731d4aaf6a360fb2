//! # REST API for Revenue Reports
//!
//! Actual and estimated revenue over a window, per period, and today's
//! overview. Every query accepts the same optional filters.

use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::{PeriodRevenueResponse, RevenueFilterParams, RevenueOverviewResponse, RevenueResponse};
use tracing::info;

use crate::domain::{ParkingError, PeriodGranularity, RevenueWindow, WindowPreset};
use crate::io::rest::error::ApiError;
use crate::io::rest::mappers::revenue_mapper::RevenueMapper;
use crate::AppState;

/// Either an explicit `start`/`end` pair or a named `period` (default today)
#[derive(Debug, Default, Deserialize)]
pub struct RevenueQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub period: Option<String>,
    pub vehicle_type: Option<String>,
    pub region: Option<String>,
    pub area_id: Option<String>,
    pub attendant_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PeriodsQuery {
    pub granularity: Option<String>,
    pub vehicle_type: Option<String>,
    pub region: Option<String>,
    pub area_id: Option<String>,
    pub attendant_id: Option<String>,
}

pub async fn get_revenue(
    State(state): State<AppState>,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<RevenueResponse>, ApiError> {
    info!("GET /api/revenue - {:?}", query);

    let window = match (query.start, query.end) {
        (Some(start), Some(end)) => RevenueWindow::new(start, end)?,
        (None, None) => {
            let preset = match query.period.as_deref() {
                Some(period) => period.parse::<WindowPreset>()?,
                None => WindowPreset::Today,
            };
            state.revenue_service.window(preset)?
        }
        _ => {
            return Err(ParkingError::validation("Both start and end are required for a custom window").into())
        }
    };

    let filter = RevenueMapper::to_filter(RevenueFilterParams {
        vehicle_type: query.vehicle_type,
        region: query.region,
        area_id: query.area_id,
        attendant_id: query.attendant_id,
    })?;

    let summary = state.revenue_service.get_revenue(window, &filter).await?;
    Ok(Json(RevenueMapper::to_revenue_response(window, summary)))
}

/// Seven daily, weekly or monthly buckets (default daily)
pub async fn get_revenue_periods(
    State(state): State<AppState>,
    Query(query): Query<PeriodsQuery>,
) -> Result<Json<PeriodRevenueResponse>, ApiError> {
    info!("GET /api/revenue/periods - {:?}", query);

    let granularity = match query.granularity.as_deref() {
        Some(value) => value.parse::<PeriodGranularity>()?,
        None => PeriodGranularity::Daily,
    };
    let filter = RevenueMapper::to_filter(RevenueFilterParams {
        vehicle_type: query.vehicle_type,
        region: query.region,
        area_id: query.area_id,
        attendant_id: query.attendant_id,
    })?;

    let periods = state.revenue_service.get_periods(granularity, &filter).await?;
    Ok(Json(RevenueMapper::to_period_response(granularity, periods)))
}

pub async fn get_revenue_overview(
    State(state): State<AppState>,
    Query(params): Query<RevenueFilterParams>,
) -> Result<Json<RevenueOverviewResponse>, ApiError> {
    info!("GET /api/revenue/overview - {:?}", params);

    let filter = RevenueMapper::to_filter(params)?;
    let overview = state.revenue_service.get_overview(&filter).await?;
    Ok(Json(RevenueMapper::to_overview_response(overview)))
}
