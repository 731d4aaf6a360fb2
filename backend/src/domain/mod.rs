//! # Domain Module
//!
//! Business logic for the parking attendant service.
//!
//! This module holds the rules for pricing, geofencing and the session
//! lifecycle, plus the revenue reports built from session history. It only
//! talks to persistence through the traits in [`crate::storage`].
//!
//! ## Module Organization
//!
//! - **session_service**: Scanned and manual check-in / check-out
//! - **revenue_service**: Actual and estimated revenue over windows and periods
//! - **period**: Calendar windows and 7-bucket period reports
//! - **proximity**: Haversine geofence around an area
//! - **billing**: Flat per-session rates and the per-minute estimate
//! - **event_broadcaster**: Live notifications to attendant dashboards
//! - **session_locks**: Keyed async locks for check-in / check-out
//! - **commands**: Inputs and results of the services
//!
//! ## Core Concepts
//!
//! - **Attendant**: Operator bound to one area, identified by a long-lived token
//! - **Area**: Billing zone with a flat rate per vehicle class
//! - **Session**: One vehicle's stay, from check-in to check-out
//! - **Payment**: Taken at check-in, settled at check-out
//!
//! ## Business Rules
//!
//! - A session costs the flat area rate for its vehicle class, whatever its duration
//! - Operations with coordinates must happen within 300 m of the area
//! - Only the attendant who checked a vehicle in, in the same area, checks it out
//! - At most one active session per plate, or per token for plate-less check-ins

pub mod billing;
pub mod clock;
pub mod commands;
pub mod error;
pub mod event_broadcaster;
pub mod models;
pub mod period;
pub mod proximity;
pub mod revenue_service;
pub mod session_locks;
pub mod session_service;

pub use billing::BillingCalculator;
pub use clock::{Clock, SystemClock};
pub use error::{ErrorKind, ParkingError, ParkingResult};
pub use event_broadcaster::{EventBroadcaster, EventSubscription};
pub use period::{PeriodGranularity, RevenueWindow, WindowPreset};
pub use proximity::ProximityGuard;
pub use revenue_service::RevenueService;
pub use session_locks::SessionLocks;
pub use session_service::SessionService;
