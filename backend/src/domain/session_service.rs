//! Session lifecycle: check-in and check-out, scanned and manual.
//!
//! ```text
//! [none] --checkin--> active --checkout--> completed
//! ```
//!
//! ## Business Rules
//!
//! - The attendant is resolved from the scanned token (or by id for manual
//!   entries) and must be active to check vehicles in
//! - GPS is optional for scanned flows and mandatory for manual ones; when
//!   given it must be within the area's geofence
//! - A session costs the area's flat rate for its vehicle class. Payment is
//!   taken at check-in and re-priced at check-out from the current rate
//! - Check-out must happen in the same area and by the same attendant as the
//!   check-in; duration is clamped at zero
//! - One active session per plate (or per token for plate-less check-ins)
//! - The owning attendant's dashboard is notified, best effort
//!
//! Work on one plate, token or session is serialised with [`SessionLocks`],
//! so concurrent duplicate check-ins or check-outs in this process are
//! rejected instead of double-charging. A duplicate plate written by another
//! process is caught by the storage unique index and reported the same way. Session and payment rows are written
//! together through the storage unit of work.

use serde_json::json;
use shared::SessionEvent;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::billing::BillingCalculator;
use crate::domain::clock::Clock;
use crate::domain::commands::sessions::{
    CheckinCommand, CheckinResult, CheckoutCommand, CheckoutResult, ManualCheckinCommand,
    ManualCheckoutCommand, SessionSelector,
};
use crate::domain::error::{ParkingError, ParkingResult};
use crate::domain::event_broadcaster::EventBroadcaster;
use crate::domain::models::{Area, Attendant, Payment, PaymentStatus, Session, SessionStatus};
use crate::domain::proximity::ProximityGuard;
use crate::domain::session_locks::SessionLocks;
use crate::storage::{
    is_unique_violation, AreaStorage, AttendantStorage, Connection, PaymentStorage, SessionStorage,
};

/// Trimmed, upper-cased plate; blank means no plate
pub fn normalize_plate(plate: Option<&str>) -> Option<String> {
    plate
        .map(|p| p.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase())
        .filter(|p| !p.is_empty())
}

#[derive(Clone)]
pub struct SessionService<C: Connection> {
    session_repository: C::SessionRepository,
    area_repository: C::AreaRepository,
    attendant_repository: C::AttendantRepository,
    payment_repository: C::PaymentRepository,
    broadcaster: EventBroadcaster,
    proximity_guard: ProximityGuard,
    billing: BillingCalculator,
    clock: Arc<dyn Clock>,
    locks: SessionLocks,
}

impl<C: Connection> SessionService<C> {
    pub fn new(
        connection: &C,
        broadcaster: EventBroadcaster,
        proximity_guard: ProximityGuard,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            session_repository: connection.create_session_repository(),
            area_repository: connection.create_area_repository(),
            attendant_repository: connection.create_attendant_repository(),
            payment_repository: connection.create_payment_repository(),
            broadcaster,
            proximity_guard,
            billing: BillingCalculator,
            clock,
            locks: SessionLocks::new(),
        }
    }

    /// Start a session from a scanned attendant token
    pub async fn checkin(&self, command: CheckinCommand) -> ParkingResult<CheckinResult> {
        let plate = normalize_plate(command.plate_number.as_deref());
        let attendant = self.attendant_by_token(&command.token).await?;
        Self::ensure_attendant_active(&attendant)?;

        let area = self.area(&attendant.area_id).await?;
        self.proximity_guard
            .check_optional(command.location, area.location)?;

        let session = Session {
            id: Session::generate_id(),
            area_id: area.id.clone(),
            attendant_id: Some(attendant.id.clone()),
            token: Some(attendant.token.clone()),
            vehicle_type: command.vehicle_type,
            plate_number: plate,
            is_manual: false,
            checkin_time: self.clock.now(),
            checkout_time: None,
            duration_minutes: None,
            total_cost: None,
            payment_status: PaymentStatus::Paid,
            status: SessionStatus::Active,
        };
        self.open_session(session, &attendant, &area).await
    }

    /// Start a session typed in by the attendant
    pub async fn manual_checkin(&self, command: ManualCheckinCommand) -> ParkingResult<CheckinResult> {
        let plate = normalize_plate(Some(&command.plate_number))
            .ok_or_else(|| ParkingError::validation("Plate number is required for manual check-in"))?;
        let attendant = self.attendant_by_id(&command.attendant_id).await?;
        Self::ensure_attendant_active(&attendant)?;

        let area = self.area(&attendant.area_id).await?;
        self.proximity_guard.check(command.location, area.location)?;

        let session = Session {
            id: Session::generate_id(),
            area_id: area.id.clone(),
            attendant_id: Some(attendant.id.clone()),
            token: None,
            vehicle_type: command.vehicle_type,
            plate_number: Some(plate),
            is_manual: true,
            checkin_time: command.checkin_time,
            checkout_time: None,
            duration_minutes: None,
            total_cost: None,
            payment_status: PaymentStatus::Paid,
            status: SessionStatus::Active,
        };
        self.open_session(session, &attendant, &area).await
    }

    /// End a session selected by id, plate or the token's active session
    pub async fn checkout(&self, command: CheckoutCommand) -> ParkingResult<CheckoutResult> {
        let attendant = self.attendant_by_token(&command.token).await?;

        let session = match &command.selector {
            SessionSelector::Id(id) => self.session_repository.get_session(id).await?,
            SessionSelector::Plate(plate) => match normalize_plate(Some(plate)) {
                Some(plate) => self.session_repository.get_active_by_plate(&plate).await?,
                None => None,
            },
            SessionSelector::Token => {
                self.session_repository
                    .get_active_by_token(&attendant.token)
                    .await?
            }
        }
        .ok_or(ParkingError::SessionNotFound)?;

        Self::ensure_open(&session, false)?;
        Self::ensure_same_post(&session, &attendant)?;

        let area = self.area(&session.area_id).await?;
        self.proximity_guard
            .check_optional(command.location, area.location)?;

        let checkout_time = self.clock.now();
        self.settle(&session.id, false, &attendant, &area, checkout_time)
            .await
    }

    /// End a manually created session
    pub async fn manual_checkout(&self, command: ManualCheckoutCommand) -> ParkingResult<CheckoutResult> {
        let attendant = self.attendant_by_id(&command.attendant_id).await?;
        let session = self
            .session_repository
            .get_session(&command.session_id)
            .await?
            .ok_or(ParkingError::SessionNotFound)?;

        if !session.is_manual {
            warn!("Manual check-out refused for scanned session {}", session.id);
            return Err(ParkingError::NotManualRecord);
        }
        Self::ensure_open(&session, true)?;
        Self::ensure_same_post(&session, &attendant)?;

        let area = self.area(&session.area_id).await?;
        self.proximity_guard.check(command.location, area.location)?;

        self.settle(&session.id, true, &attendant, &area, command.checkout_time)
            .await
    }

    /// Rejects removal of an attendant who still owns active sessions
    pub async fn ensure_attendant_removable(&self, attendant_id: &str) -> ParkingResult<()> {
        let active = self
            .session_repository
            .count_active_by_attendant(attendant_id)
            .await?;
        if active > 0 {
            warn!("Attendant {} still has {} active sessions", attendant_id, active);
            return Err(ParkingError::AttendantHasActiveSessions);
        }
        Ok(())
    }

    async fn open_session(
        &self,
        session: Session,
        attendant: &Attendant,
        area: &Area,
    ) -> ParkingResult<CheckinResult> {
        let lock_key = match &session.plate_number {
            Some(plate) => format!("plate:{}", plate),
            None => format!("token:{}", attendant.token),
        };
        let guard = self.locks.lock(&lock_key).await;

        let existing = match &session.plate_number {
            Some(plate) => self.session_repository.get_active_by_plate(plate).await?,
            None => {
                self.session_repository
                    .get_active_by_token(&attendant.token)
                    .await?
            }
        };
        if let Some(existing) = existing {
            warn!("Check-in refused, session {} is still active", existing.id);
            return Err(ParkingError::ActiveSessionExists);
        }

        let rate = self.billing.rate(area, session.vehicle_type);
        let payment = Payment::collected(&session.id, rate, &attendant.id, session.checkin_time);
        self.session_repository
            .record_checkin(&session, &payment)
            .await
            .map_err(|err| {
                if is_unique_violation(&err) {
                    warn!("Check-in refused by storage, plate already has an active session");
                    ParkingError::ActiveSessionExists
                } else {
                    ParkingError::Storage(err)
                }
            })?;
        drop(guard);

        info!(
            "Checked in {} {} at area {} for {:.0} (session {})",
            session.vehicle_type,
            session.plate_number.as_deref().unwrap_or("-"),
            area.id,
            rate,
            session.id
        );
        self.broadcaster.notify(
            &attendant.id,
            SessionEvent::SESSION_CREATED,
            Self::event_payload(&session, Some(rate)),
        );

        Ok(CheckinResult {
            session_id: session.id,
            checkin_time: session.checkin_time,
            area_name: area.name.clone(),
            vehicle_type: session.vehicle_type,
            rate_charged: rate,
        })
    }

    async fn settle(
        &self,
        session_id: &str,
        manual: bool,
        attendant: &Attendant,
        area: &Area,
        checkout_time: chrono::DateTime<chrono::Utc>,
    ) -> ParkingResult<CheckoutResult> {
        let guard = self.locks.lock(&format!("session:{}", session_id)).await;

        // A concurrent check-out may have finished while we waited
        let mut session = self
            .session_repository
            .get_session(session_id)
            .await?
            .ok_or(ParkingError::SessionNotFound)?;
        Self::ensure_open(&session, manual)?;

        let cost = self.billing.rate(area, session.vehicle_type);
        session.complete(checkout_time, cost);

        let payment = match self
            .payment_repository
            .get_payment_by_session(&session.id)
            .await?
        {
            Some(mut payment) => {
                payment.amount = cost;
                payment.confirmed_by = Some(attendant.id.clone());
                payment.confirmed_at = Some(checkout_time);
                payment.status = PaymentStatus::Paid;
                payment
            }
            None => {
                warn!("Session {} had no payment row, creating one", session.id);
                Payment::collected(&session.id, cost, &attendant.id, checkout_time)
            }
        };

        self.session_repository
            .record_checkout(&session, &payment)
            .await?;
        drop(guard);

        let duration_minutes = session.duration_minutes.unwrap_or(0);
        info!(
            "Checked out session {} after {} min for {:.0}",
            session.id, duration_minutes, cost
        );

        if let Some(owner) = session.attendant_id.as_deref() {
            self.broadcaster.notify(
                owner,
                SessionEvent::SESSION_UPDATE,
                Self::event_payload(&session, None),
            );
        }

        Ok(CheckoutResult {
            session_id: session.id,
            checkout_time,
            duration_minutes,
            total_cost: cost,
            payment_status: session.payment_status,
        })
    }

    async fn attendant_by_token(&self, token: &str) -> ParkingResult<Attendant> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ParkingError::InvalidToken);
        }
        self.attendant_repository
            .get_attendant_by_token(token)
            .await?
            .ok_or_else(|| {
                warn!("Unknown attendant token presented");
                ParkingError::InvalidToken
            })
    }

    async fn attendant_by_id(&self, attendant_id: &str) -> ParkingResult<Attendant> {
        self.attendant_repository
            .get_attendant(attendant_id)
            .await?
            .ok_or_else(|| ParkingError::AttendantNotFound(attendant_id.to_string()))
    }

    async fn area(&self, area_id: &str) -> ParkingResult<Area> {
        self.area_repository
            .get_area(area_id)
            .await?
            .ok_or_else(|| ParkingError::AreaNotFound(area_id.to_string()))
    }

    fn ensure_attendant_active(attendant: &Attendant) -> ParkingResult<()> {
        if !attendant.is_active() {
            warn!("Attendant {} is {}, refusing check-in", attendant.id, attendant.status);
            return Err(ParkingError::AttendantInactive);
        }
        Ok(())
    }

    fn ensure_open(session: &Session, manual: bool) -> ParkingResult<()> {
        match session.status {
            SessionStatus::Active if session.checkout_time.is_none() => Ok(()),
            SessionStatus::Completed if !manual => Err(ParkingError::SessionAlreadyCompleted),
            _ => Err(ParkingError::SessionNotActive),
        }
    }

    fn ensure_same_post(session: &Session, attendant: &Attendant) -> ParkingResult<()> {
        if session.area_id != attendant.area_id {
            warn!(
                "Session {} is in area {}, attendant {} works area {}",
                session.id, session.area_id, attendant.id, attendant.area_id
            );
            return Err(ParkingError::CrossAreaMismatch);
        }
        if session.attendant_id.as_deref() != Some(attendant.id.as_str()) {
            warn!("Session {} belongs to another attendant than {}", session.id, attendant.id);
            return Err(ParkingError::AttendantMismatch);
        }
        Ok(())
    }

    fn event_payload(session: &Session, rate_charged: Option<f64>) -> serde_json::Value {
        json!({
            "session_id": session.id,
            "area_id": session.area_id,
            "vehicle_type": session.vehicle_type,
            "plate_number": session.plate_number,
            "is_manual": session.is_manual,
            "status": session.status,
            "payment_status": session.payment_status,
            "checkin_time": session.checkin_time,
            "checkout_time": session.checkout_time,
            "duration_minutes": session.duration_minutes,
            "total_cost": session.total_cost.or(rate_charged),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::domain::billing::test_area;
    use crate::domain::clock::ManualClock;
    use crate::domain::models::{AttendantStatus, GeoPoint};
    use crate::domain::proximity::point_north_of;
    use crate::storage::DbConnection;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use shared::VehicleType;

    pub(crate) struct Fixture {
        pub service: SessionService<DbConnection>,
        pub db: DbConnection,
        pub clock: ManualClock,
        pub broadcaster: EventBroadcaster,
    }

    pub(crate) fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 12, 2, 0, 0).unwrap()
    }

    pub(crate) fn attendant(id: &str, area_id: &str, status: AttendantStatus) -> Attendant {
        Attendant {
            id: id.to_string(),
            code: format!("JKR-{}", id),
            name: format!("Jukir {}", id),
            area_id: area_id.to_string(),
            token: format!("tok-{}", id),
            status,
        }
    }

    /// Areas a1 (car 5000 / motorcycle 3000) and a2; attendants j1, j2 in a1,
    /// j3 in a2 and pending j4 in a1
    pub(crate) async fn fixture() -> Fixture {
        let db = DbConnection::init_test().await.unwrap();
        let areas = db.create_area_repository();
        areas.store_area(&test_area("a1", 5000.0, 3000.0)).await.unwrap();
        areas.store_area(&test_area("a2", 4000.0, 2000.0)).await.unwrap();

        let attendants = db.create_attendant_repository();
        for a in [
            attendant("j1", "a1", AttendantStatus::Active),
            attendant("j2", "a1", AttendantStatus::Active),
            attendant("j3", "a2", AttendantStatus::Active),
            attendant("j4", "a1", AttendantStatus::Pending),
        ] {
            attendants.store_attendant(&a).await.unwrap();
        }

        let clock = ManualClock::new(start_time());
        let broadcaster = EventBroadcaster::default();
        let service = SessionService::new(
            &db,
            broadcaster.clone(),
            ProximityGuard::default(),
            Arc::new(clock.clone()),
        );
        Fixture {
            service,
            db,
            clock,
            broadcaster,
        }
    }

    fn area_center() -> GeoPoint {
        test_area("a1", 0.0, 0.0).location
    }

    fn scan_in(token: &str, vehicle_type: VehicleType, plate: Option<&str>) -> CheckinCommand {
        CheckinCommand {
            token: token.to_string(),
            vehicle_type,
            plate_number: plate.map(str::to_string),
            location: None,
        }
    }

    fn scan_out(token: &str, selector: SessionSelector) -> CheckoutCommand {
        CheckoutCommand {
            token: token.to_string(),
            selector,
            location: None,
        }
    }

    async fn stored_session(f: &Fixture, id: &str) -> Session {
        f.db.create_session_repository()
            .get_session(id)
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_motorcycle_session_is_flat_rate_end_to_end() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Motorcycle, None))
            .await
            .unwrap();
        assert_eq!(checkin.rate_charged, 3000.0);
        assert_eq!(checkin.area_name, "Area a1");
        assert_eq!(checkin.checkin_time, start_time());
        assert_eq!(stored_session(&f, &checkin.session_id).await.status, SessionStatus::Active);

        f.clock.advance(Duration::minutes(47));
        let checkout = f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .unwrap();

        assert_eq!(checkout.session_id, checkin.session_id);
        assert_eq!(checkout.duration_minutes, 47);
        assert_eq!(checkout.total_cost, 3000.0);
        assert_eq!(checkout.payment_status, PaymentStatus::Paid);

        let session = stored_session(&f, &checkin.session_id).await;
        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.payment_status, PaymentStatus::Paid);
        assert_eq!(session.total_cost, Some(3000.0));
        assert_eq!(session.checkout_time, Some(start_time() + Duration::minutes(47)));
    }

    #[tokio::test]
    async fn test_duration_does_not_change_cost() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("b 1234 xyz")))
            .await
            .unwrap();

        f.clock.advance(Duration::hours(10));
        let checkout = f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Plate("B 1234 XYZ".into())))
            .await
            .unwrap();

        assert_eq!(checkout.session_id, checkin.session_id);
        assert_eq!(checkout.duration_minutes, 600);
        assert_eq!(checkout.total_cost, 5000.0);
    }

    #[tokio::test]
    async fn test_checkout_charges_rate_current_at_checkout() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();
        assert_eq!(checkin.rate_charged, 5000.0);

        f.db.create_area_repository()
            .store_area(&test_area("a1", 7000.0, 3000.0))
            .await
            .unwrap();
        f.clock.advance(Duration::minutes(20));

        let checkout = f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Id(checkin.session_id.clone())))
            .await
            .unwrap();
        assert_eq!(checkout.total_cost, 7000.0);

        let payment = f
            .db
            .create_payment_repository()
            .get_payment_by_session(&checkin.session_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payment.amount, 7000.0);
        assert_eq!(payment.confirmed_at, Some(start_time() + Duration::minutes(20)));
    }

    #[tokio::test]
    async fn test_clock_skew_is_clamped_to_zero_minutes() {
        let f = fixture().await;
        f.service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();

        f.clock.set(start_time() - Duration::minutes(5));
        let checkout = f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .unwrap();
        assert_eq!(checkout.duration_minutes, 0);
        assert_eq!(checkout.total_cost, 5000.0);
    }

    #[tokio::test]
    async fn test_gps_inside_and_outside_geofence() {
        let f = fixture().await;
        let mut at_center = scan_in("tok-j1", VehicleType::Car, Some("B1"));
        at_center.location = Some(area_center());
        assert!(f.service.checkin(at_center).await.is_ok());

        let mut too_far = scan_in("tok-j1", VehicleType::Car, Some("B2"));
        too_far.location = Some(point_north_of(area_center(), 350.0));
        let err = f.service.checkin(too_far).await.unwrap_err();
        assert!(matches!(err, ParkingError::OutOfRange { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_checkout_outside_geofence_is_rejected_without_changes() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();

        let mut command = scan_out("tok-j1", SessionSelector::Token);
        command.location = Some(point_north_of(area_center(), 500.0));
        let err = f.service.checkout(command).await.unwrap_err();
        assert!(matches!(err, ParkingError::OutOfRange { .. }));
        assert_eq!(stored_session(&f, &checkin.session_id).await.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_unknown_token_and_inactive_attendant() {
        let f = fixture().await;
        let err = f
            .service
            .checkin(scan_in("nope", VehicleType::Car, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::InvalidToken));

        let err = f
            .service
            .checkin(scan_in("   ", VehicleType::Car, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::InvalidToken));

        let err = f
            .service
            .checkin(scan_in("tok-j4", VehicleType::Car, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::AttendantInactive));

        let err = f
            .service
            .checkout(scan_out("nope", SessionSelector::Token))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::InvalidToken));
    }

    #[tokio::test]
    async fn test_checkout_requires_same_area_and_attendant() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();
        let by_id = || SessionSelector::Id(checkin.session_id.clone());

        let err = f.service.checkout(scan_out("tok-j3", by_id())).await.unwrap_err();
        assert!(matches!(err, ParkingError::CrossAreaMismatch));

        let err = f.service.checkout(scan_out("tok-j2", by_id())).await.unwrap_err();
        assert!(matches!(err, ParkingError::AttendantMismatch));

        assert!(f.service.checkout(scan_out("tok-j1", by_id())).await.is_ok());
    }

    #[tokio::test]
    async fn test_second_checkout_reports_already_completed() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();
        let command = scan_out("tok-j1", SessionSelector::Id(checkin.session_id.clone()));

        f.service.checkout(command.clone()).await.unwrap();
        let err = f.service.checkout(command).await.unwrap_err();
        assert!(matches!(err, ParkingError::SessionAlreadyCompleted));

        let err = f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::SessionNotFound));
    }

    #[tokio::test]
    async fn test_session_id_takes_priority_over_plate() {
        let f = fixture().await;
        let first = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("B1")))
            .await
            .unwrap();
        let second = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("B2")))
            .await
            .unwrap();

        let selector = SessionSelector::resolve(Some(first.session_id.clone()), Some("B2".into()));
        let checkout = f.service.checkout(scan_out("tok-j1", selector)).await.unwrap();

        assert_eq!(checkout.session_id, first.session_id);
        assert_eq!(stored_session(&f, &second.session_id).await.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_one_active_session_per_plate_and_per_token() {
        let f = fixture().await;
        f.service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("B1")))
            .await
            .unwrap();
        let err = f
            .service
            .checkin(scan_in("tok-j2", VehicleType::Car, Some(" b1 ")))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::ActiveSessionExists));

        f.service
            .checkin(scan_in("tok-j2", VehicleType::Motorcycle, None))
            .await
            .unwrap();
        let err = f
            .service
            .checkin(scan_in("tok-j2", VehicleType::Motorcycle, None))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::ActiveSessionExists));
    }

    #[tokio::test]
    async fn test_concurrent_checkins_for_same_plate_admit_one() {
        let f = fixture().await;
        let (a, b) = tokio::join!(
            f.service.checkin(scan_in("tok-j1", VehicleType::Car, Some("B7"))),
            f.service.checkin(scan_in("tok-j2", VehicleType::Car, Some("B7"))),
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(ParkingError::ActiveSessionExists))));
    }

    #[tokio::test]
    async fn test_duplicate_plate_from_another_service_is_a_business_rule() {
        let f = fixture().await;
        // Separate lock tables, as two processes sharing one database would have
        let other = SessionService::new(
            &f.db,
            f.broadcaster.clone(),
            ProximityGuard::default(),
            Arc::new(f.clock.clone()),
        );

        let (a, b) = tokio::join!(
            f.service.checkin(scan_in("tok-j1", VehicleType::Car, Some("B7"))),
            other.checkin(scan_in("tok-j2", VehicleType::Car, Some("B7"))),
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let err = outcomes
            .into_iter()
            .find_map(Result::err)
            .unwrap();
        assert!(matches!(err, ParkingError::ActiveSessionExists), "got {:?}", err);
        assert_eq!(err.kind(), crate::domain::ErrorKind::BusinessRule);
    }

    #[tokio::test]
    async fn test_concurrent_checkouts_settle_once() {
        let f = fixture().await;
        let mut subscription = f.broadcaster.register("j1");
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();
        assert_eq!(subscription.try_recv().unwrap().event_type, "session_created");

        let command = scan_out("tok-j1", SessionSelector::Id(checkin.session_id.clone()));
        let (a, b) = tokio::join!(
            f.service.checkout(command.clone()),
            f.service.checkout(command)
        );
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(ParkingError::SessionAlreadyCompleted))));

        assert_eq!(subscription.try_recv().unwrap().event_type, "session_update");
        assert!(subscription.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_checkout_notifies_owning_attendant() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Motorcycle, Some("B5")))
            .await
            .unwrap();

        let mut mine = f.broadcaster.register("j1");
        let mut other = f.broadcaster.register("j2");
        f.clock.advance(Duration::minutes(12));
        f.service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .unwrap();

        let event = mine.recv().await.unwrap();
        assert_eq!(event.event_type, SessionEvent::SESSION_UPDATE);
        assert_eq!(event.data["session_id"], checkin.session_id);
        assert_eq!(event.data["status"], "completed");
        assert_eq!(event.data["duration_minutes"], 12);
        assert_eq!(event.data["total_cost"], 3000.0);
        assert!(other.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_checkout_succeeds_without_subscriber_or_with_full_queue() {
        let f = fixture().await;
        f.service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("B1")))
            .await
            .unwrap();
        assert!(f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .is_ok());

        let _stalled = f.broadcaster.register("j1");
        for _ in 0..20 {
            f.broadcaster.notify("j1", "filler", json!({}));
        }
        f.service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("B2")))
            .await
            .unwrap();
        assert!(f
            .service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .is_ok());
    }

    fn manual_in(attendant_id: &str, plate: &str, location: GeoPoint) -> ManualCheckinCommand {
        ManualCheckinCommand {
            attendant_id: attendant_id.to_string(),
            plate_number: plate.to_string(),
            vehicle_type: VehicleType::Car,
            checkin_time: start_time() - Duration::minutes(30),
            location,
        }
    }

    #[tokio::test]
    async fn test_manual_session_round_trip() {
        let f = fixture().await;
        let checkin = f
            .service
            .manual_checkin(manual_in("j1", "d 4321 ab", area_center()))
            .await
            .unwrap();
        assert_eq!(checkin.checkin_time, start_time() - Duration::minutes(30));
        assert_eq!(checkin.rate_charged, 5000.0);

        let session = stored_session(&f, &checkin.session_id).await;
        assert!(session.is_manual);
        assert_eq!(session.plate_number.as_deref(), Some("D 4321 AB"));

        let checkout = f
            .service
            .manual_checkout(ManualCheckoutCommand {
                attendant_id: "j1".into(),
                session_id: checkin.session_id.clone(),
                checkout_time: start_time() + Duration::minutes(60),
                location: point_north_of(area_center(), 120.0),
            })
            .await
            .unwrap();
        assert_eq!(checkout.duration_minutes, 90);
        assert_eq!(checkout.total_cost, 5000.0);

        let err = f
            .service
            .manual_checkout(ManualCheckoutCommand {
                attendant_id: "j1".into(),
                session_id: checkin.session_id,
                checkout_time: start_time() + Duration::minutes(61),
                location: area_center(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::SessionNotActive));
    }

    #[tokio::test]
    async fn test_manual_checkin_validation() {
        let f = fixture().await;
        let err = f
            .service
            .manual_checkin(manual_in("j1", "  ", area_center()))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::Validation(_)));

        let err = f
            .service
            .manual_checkin(manual_in("ghost", "B1", area_center()))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::AttendantNotFound(_)));

        let err = f
            .service
            .manual_checkin(manual_in("j1", "B1", point_north_of(area_center(), 301.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::OutOfRange { .. }));
    }

    #[tokio::test]
    async fn test_manual_checkout_refuses_scanned_session() {
        let f = fixture().await;
        let checkin = f
            .service
            .checkin(scan_in("tok-j1", VehicleType::Car, Some("B1")))
            .await
            .unwrap();

        let err = f
            .service
            .manual_checkout(ManualCheckoutCommand {
                attendant_id: "j1".into(),
                session_id: checkin.session_id,
                checkout_time: start_time(),
                location: area_center(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::NotManualRecord));
    }

    async fn manual_session_of_j1(f: &Fixture) -> String {
        f.service
            .manual_checkin(manual_in("j1", "B 9 KL", area_center()))
            .await
            .unwrap()
            .session_id
    }

    fn manual_out(attendant_id: &str, session_id: &str, location: GeoPoint) -> ManualCheckoutCommand {
        ManualCheckoutCommand {
            attendant_id: attendant_id.to_string(),
            session_id: session_id.to_string(),
            checkout_time: start_time(),
            location,
        }
    }

    #[tokio::test]
    async fn test_manual_checkout_from_another_area_is_rejected() {
        let f = fixture().await;
        let session_id = manual_session_of_j1(&f).await;

        let err = f
            .service
            .manual_checkout(manual_out("j3", &session_id, area_center()))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::CrossAreaMismatch), "got {:?}", err);
        assert_eq!(stored_session(&f, &session_id).await.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_manual_checkout_by_other_attendant_is_rejected() {
        let f = fixture().await;
        let session_id = manual_session_of_j1(&f).await;

        let err = f
            .service
            .manual_checkout(manual_out("j2", &session_id, area_center()))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::AttendantMismatch), "got {:?}", err);
        assert_eq!(stored_session(&f, &session_id).await.status, SessionStatus::Active);
    }

    #[tokio::test]
    async fn test_manual_checkout_just_outside_geofence_is_rejected() {
        let f = fixture().await;
        let session_id = manual_session_of_j1(&f).await;

        let err = f
            .service
            .manual_checkout(manual_out("j1", &session_id, point_north_of(area_center(), 301.0)))
            .await
            .unwrap_err();
        assert!(matches!(err, ParkingError::OutOfRange { .. }), "got {:?}", err);
        assert_eq!(stored_session(&f, &session_id).await.status, SessionStatus::Active);

        f.service
            .manual_checkout(manual_out("j1", &session_id, point_north_of(area_center(), 299.0)))
            .await
            .unwrap();
        assert_eq!(stored_session(&f, &session_id).await.status, SessionStatus::Completed);
    }

    #[tokio::test]
    async fn test_attendant_removal_guard() {
        let f = fixture().await;
        f.service.ensure_attendant_removable("j1").await.unwrap();

        f.service
            .checkin(scan_in("tok-j1", VehicleType::Car, None))
            .await
            .unwrap();
        let err = f.service.ensure_attendant_removable("j1").await.unwrap_err();
        assert!(matches!(err, ParkingError::AttendantHasActiveSessions));

        f.service
            .checkout(scan_out("tok-j1", SessionSelector::Token))
            .await
            .unwrap();
        f.service.ensure_attendant_removable("j1").await.unwrap();
    }
}
