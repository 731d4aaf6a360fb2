//! # REST API Interface Layer
//!
//! JSON endpoints and event streams over axum. This layer holds no business
//! rules: it parses and validates request shapes, delegates to the domain
//! services and maps errors to HTTP statuses with an [`shared::ErrorResponse`]
//! body.

pub mod error;
pub mod event_apis;
pub mod mappers;
pub mod revenue_apis;
pub mod session_apis;

pub use error::ApiError;
pub use event_apis::{subscribe_events, unsubscribe_events};
pub use revenue_apis::{get_revenue, get_revenue_overview, get_revenue_periods};
pub use session_apis::{checkin, checkout, manual_checkin, manual_checkout};
