//! Revenue and estimation aggregator.
//!
//! Every call rescans the sessions in scope; nothing is cached, so identical
//! queries over unchanged data give identical results.
//!
//! - **Actual**: paid payments confirmed inside the window, for sessions that
//!   have been completed
//! - **Estimated**: active sessions checked in inside the window, projected
//!   per minute at the area's current rate, plus the recorded cost of
//!   `pending_payment` sessions settled inside the window
//!
//! The per-minute projection and the flat amount charged at check-out are
//! different formulas and are not expected to agree.

use chrono::{DateTime, FixedOffset, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

use crate::domain::billing::BillingCalculator;
use crate::domain::clock::Clock;
use crate::domain::commands::revenue::{PeriodRevenue, RevenueFilter, RevenueOverview, RevenueSummary};
use crate::domain::error::{ParkingError, ParkingResult};
use crate::domain::models::{Area, Session, SessionStatus};
use crate::domain::period::{period_buckets, PeriodGranularity, RevenueWindow, WindowPreset};
use crate::storage::{AreaStorage, Connection, PaymentStorage, SessionStorage};

#[derive(Clone)]
pub struct RevenueService<C: Connection> {
    session_repository: C::SessionRepository,
    area_repository: C::AreaRepository,
    payment_repository: C::PaymentRepository,
    billing: BillingCalculator,
    clock: Arc<dyn Clock>,
    utc_offset: FixedOffset,
}

impl<C: Connection> RevenueService<C> {
    pub fn new(connection: &C, clock: Arc<dyn Clock>, utc_offset: FixedOffset) -> Self {
        Self {
            session_repository: connection.create_session_repository(),
            area_repository: connection.create_area_repository(),
            payment_repository: connection.create_payment_repository(),
            billing: BillingCalculator,
            clock,
            utc_offset,
        }
    }

    /// Resolve a named window against the current time
    pub fn window(&self, preset: WindowPreset) -> ParkingResult<RevenueWindow> {
        RevenueWindow::preset(preset, self.clock.now(), self.utc_offset)
    }

    pub async fn get_revenue(
        &self,
        window: RevenueWindow,
        filter: &RevenueFilter,
    ) -> ParkingResult<RevenueSummary> {
        let now = self.clock.now();
        let areas = self.scope(filter).await?;
        let sessions = self.sessions_in(&areas, filter, window).await?;
        self.summarize(window, &sessions, &areas, now).await
    }

    /// Last seven days, weeks or months, oldest first
    pub async fn get_periods(
        &self,
        granularity: PeriodGranularity,
        filter: &RevenueFilter,
    ) -> ParkingResult<Vec<PeriodRevenue>> {
        let now = self.clock.now();
        let areas = self.scope(filter).await?;

        let mut periods = Vec::new();
        for bucket in period_buckets(granularity, now, self.utc_offset)? {
            let sessions = self.sessions_in(&areas, filter, bucket.window).await?;
            let summary = self.summarize(bucket.window, &sessions, &areas, now).await?;
            periods.push(PeriodRevenue {
                label: bucket.label,
                date: bucket.date,
                start: bucket.window.start,
                end: bucket.window.end,
                summary,
            });
        }
        debug!("Computed {} {} revenue buckets", periods.len(), granularity);
        Ok(periods)
    }

    pub async fn get_overview(&self, filter: &RevenueFilter) -> ParkingResult<RevenueOverview> {
        let now = self.clock.now();
        let today = RevenueWindow::today(now, self.utc_offset);
        let areas = self.scope(filter).await?;
        let sessions = self.sessions_in(&areas, filter, today).await?;

        let active_sessions = sessions.iter().filter(|s| s.is_active()).count();
        let completed_sessions_today = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Completed)
            .filter(|s| s.checkout_time.is_some_and(|t| today.contains(t)))
            .count();

        Ok(RevenueOverview {
            window: today,
            today: self.summarize(today, &sessions, &areas, now).await?,
            active_sessions,
            completed_sessions_today,
        })
    }

    /// Areas the filter reaches, keyed and ordered by id
    async fn scope(&self, filter: &RevenueFilter) -> ParkingResult<BTreeMap<String, Area>> {
        let areas = match &filter.area_id {
            Some(area_id) => vec![self
                .area_repository
                .get_area(area_id)
                .await?
                .ok_or_else(|| ParkingError::AreaNotFound(area_id.clone()))?],
            None => self.area_repository.get_active_areas().await?,
        };

        Ok(areas
            .into_iter()
            .filter(|area| filter.matches_area(area))
            .map(|area| (area.id.clone(), area))
            .collect())
    }

    async fn sessions_in(
        &self,
        areas: &BTreeMap<String, Area>,
        filter: &RevenueFilter,
        window: RevenueWindow,
    ) -> ParkingResult<Vec<Session>> {
        let mut sessions = match &filter.attendant_id {
            Some(attendant_id) => self
                .session_repository
                .get_sessions_by_attendant(attendant_id, window.start, window.end)
                .await?
                .into_iter()
                .filter(|s| areas.contains_key(&s.area_id))
                .collect(),
            None => {
                let mut all = Vec::new();
                for area_id in areas.keys() {
                    all.extend(
                        self.session_repository
                            .get_sessions_by_area(area_id, window.start, window.end)
                            .await?,
                    );
                }
                all
            }
        };
        sessions.retain(|s| filter.matches_session(s));
        Ok(sessions)
    }

    async fn summarize(
        &self,
        window: RevenueWindow,
        sessions: &[Session],
        areas: &BTreeMap<String, Area>,
        now: DateTime<Utc>,
    ) -> ParkingResult<RevenueSummary> {
        let paid: HashMap<String, f64> = self
            .payment_repository
            .get_revenue_by_date_range(window.start, window.end)
            .await?
            .into_iter()
            .map(|p| (p.session_id, p.amount))
            .collect();

        let mut actual = 0.0;
        let mut estimated = 0.0;
        for session in sessions {
            match session.status {
                SessionStatus::Completed => {
                    actual += paid.get(&session.id).copied().unwrap_or(0.0);
                }
                SessionStatus::Active if session.is_active() && window.contains(session.checkin_time) => {
                    if let Some(area) = areas.get(&session.area_id) {
                        estimated += self.billing.projected_cost(
                            area,
                            session.vehicle_type,
                            session.elapsed_minutes(now),
                        );
                    }
                }
                SessionStatus::PendingPayment => {
                    if let Some(cost) = session.total_cost {
                        if window.contains(session.settlement_time()) {
                            estimated += cost;
                        }
                    }
                }
                _ => {}
            }
        }

        Ok(RevenueSummary::new(actual, estimated))
    }
}
