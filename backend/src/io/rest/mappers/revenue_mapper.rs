use shared::{PeriodRevenueEntry, PeriodRevenueResponse, RevenueFilterParams, RevenueOverviewResponse, RevenueResponse};

use crate::domain::commands::revenue::{PeriodRevenue, RevenueFilter, RevenueOverview, RevenueSummary};
use crate::domain::{ParkingResult, PeriodGranularity, RevenueWindow};
use crate::io::rest::mappers::session_mapper::SessionMapper;

pub struct RevenueMapper;

impl RevenueMapper {
    /// Blank parameters count as absent
    pub fn to_filter(params: RevenueFilterParams) -> ParkingResult<RevenueFilter> {
        let present = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Ok(RevenueFilter {
            vehicle_type: present(params.vehicle_type)
                .map(|v| SessionMapper::parse_vehicle_type(&v))
                .transpose()?,
            region: present(params.region),
            area_id: present(params.area_id),
            attendant_id: present(params.attendant_id),
        })
    }

    pub fn to_revenue_response(window: RevenueWindow, summary: RevenueSummary) -> RevenueResponse {
        RevenueResponse {
            start: window.start,
            end: window.end,
            actual_revenue: summary.actual_revenue,
            estimated_revenue: summary.estimated_revenue,
            total_revenue: summary.total_revenue,
        }
    }

    pub fn to_period_response(granularity: PeriodGranularity, periods: Vec<PeriodRevenue>) -> PeriodRevenueResponse {
        PeriodRevenueResponse {
            granularity: granularity.to_string(),
            periods: periods
                .into_iter()
                .map(|p| PeriodRevenueEntry {
                    label: p.label,
                    date: p.date,
                    actual_revenue: p.summary.actual_revenue,
                    estimated_revenue: p.summary.estimated_revenue,
                })
                .collect(),
        }
    }

    pub fn to_overview_response(overview: RevenueOverview) -> RevenueOverviewResponse {
        RevenueOverviewResponse {
            today: Self::to_revenue_response(overview.window, overview.today),
            active_sessions: overview.active_sessions,
            completed_sessions_today: overview.completed_sessions_today,
        }
    }
}
