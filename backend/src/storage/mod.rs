//! # Storage Module
//!
//! Persistence for the parking core, behind repository traits.
//!
//! The domain layer only sees the traits in [`traits`]; the bundled
//! implementation keeps areas, attendants, sessions and payments in SQLite
//! through `sqlx`. Timestamps are stored as epoch milliseconds so window
//! queries compare integers.
//!
//! Check-in and check-out each write a session row and a payment row. Those
//! pairs go through `record_checkin` / `record_checkout`, which run inside a
//! single database transaction.

pub mod connection;
pub mod repositories;
pub mod traits;

pub use connection::{is_unique_violation, DbConnection};
pub use repositories::{AreaRepository, AttendantRepository, PaymentRepository, SessionRepository};
pub use traits::{AreaStorage, AttendantStorage, Connection, PaymentStorage, SessionStorage};
