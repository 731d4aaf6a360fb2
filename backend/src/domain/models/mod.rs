//! Domain models for the parking core.
pub mod area;
pub mod attendant;
pub mod payment;
pub mod session;

pub use area::{Area, GeoPoint};
pub use attendant::{Attendant, AttendantStatus};
pub use payment::{Payment, PaymentStatus};
pub use session::{Session, SessionStatus};
