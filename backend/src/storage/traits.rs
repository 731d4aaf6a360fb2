//! # Storage Traits
//!
//! Repository interfaces consumed by the domain services. Any backend that
//! implements them (SQL, an external service, an in-memory fake) can be
//! plugged in through [`Connection`].

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::models::{Area, Attendant, AttendantStatus, Payment, Session};

/// Session persistence
#[async_trait]
pub trait SessionStorage: Send + Sync {
    /// Insert a new session row
    async fn create_session(&self, session: &Session) -> Result<()>;

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>>;

    /// The active session for a plate, if any
    async fn get_active_by_plate(&self, plate_number: &str) -> Result<Option<Session>>;

    /// The most recent active session opened with this attendant token, if any
    async fn get_active_by_token(&self, token: &str) -> Result<Option<Session>>;

    /// Overwrite every mutable column of an existing session
    async fn update_session(&self, session: &Session) -> Result<()>;

    /// Sessions in an area that overlap `[start, end)`: checked in before
    /// `end` and not checked out before `start`
    async fn get_sessions_by_area(
        &self,
        area_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>>;

    /// Same overlap rule as [`SessionStorage::get_sessions_by_area`], scoped to an attendant
    async fn get_sessions_by_attendant(
        &self,
        attendant_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Session>>;

    async fn count_active_by_attendant(&self, attendant_id: &str) -> Result<u64>;

    /// Insert a session and its payment atomically
    async fn record_checkin(&self, session: &Session, payment: &Payment) -> Result<()>;

    /// Update a session and upsert its payment (keyed by session id) atomically
    async fn record_checkout(&self, session: &Session, payment: &Payment) -> Result<()>;
}

/// Area persistence (read-only for the core; `store_area` serves administration)
#[async_trait]
pub trait AreaStorage: Send + Sync {
    async fn store_area(&self, area: &Area) -> Result<()>;

    async fn get_area(&self, area_id: &str) -> Result<Option<Area>>;

    /// Areas currently open for business, ordered by name
    async fn get_active_areas(&self) -> Result<Vec<Area>>;
}

/// Attendant persistence
#[async_trait]
pub trait AttendantStorage: Send + Sync {
    async fn store_attendant(&self, attendant: &Attendant) -> Result<()>;

    async fn get_attendant(&self, attendant_id: &str) -> Result<Option<Attendant>>;

    async fn get_attendant_by_token(&self, token: &str) -> Result<Option<Attendant>>;

    async fn update_attendant_status(&self, attendant_id: &str, status: AttendantStatus) -> Result<()>;
}

/// Payment persistence
#[async_trait]
pub trait PaymentStorage: Send + Sync {
    async fn create_payment(&self, payment: &Payment) -> Result<()>;

    async fn get_payment_by_session(&self, session_id: &str) -> Result<Option<Payment>>;

    async fn update_payment(&self, payment: &Payment) -> Result<()>;

    /// Paid payments confirmed inside `[start, end)`
    async fn get_revenue_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Payment>>;
}

/// Factory for the repositories of one storage backend
pub trait Connection: Send + Sync + Clone + 'static {
    type SessionRepository: SessionStorage + Clone + 'static;
    type AreaRepository: AreaStorage + Clone + 'static;
    type AttendantRepository: AttendantStorage + Clone + 'static;
    type PaymentRepository: PaymentStorage + Clone + 'static;

    fn create_session_repository(&self) -> Self::SessionRepository;
    fn create_area_repository(&self) -> Self::AreaRepository;
    fn create_attendant_repository(&self) -> Self::AttendantRepository;
    fn create_payment_repository(&self) -> Self::PaymentRepository;
}
