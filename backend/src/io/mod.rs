//! # IO Module
//!
//! Adapter layer between HTTP clients and the domain services.
//!
//! Handlers translate `shared` DTOs into domain commands, call the services
//! and translate results and [`ParkingError`](crate::domain::ParkingError)s
//! back into JSON responses. Attendant dashboards receive live session
//! events over server-sent events.
//!
//! ## Supported Operations
//!
//! - **POST /api/sessions/checkin**, **POST /api/sessions/checkout**
//! - **POST /api/sessions/manual/checkin**, **POST /api/sessions/manual/checkout**
//! - **GET /api/revenue**, **GET /api/revenue/periods**, **GET /api/revenue/overview**
//! - **GET /api/attendants/:id/events**, **DELETE /api/attendants/:id/events**

pub mod rest;

pub use rest::*;
