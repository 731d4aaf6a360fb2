//! # Jukir Backend
//!
//! Parking attendant ("jukir") check-in / check-out service.
//!
//! This crate brings together:
//! - **Domain**: Session lifecycle, pricing, geofencing and revenue reporting
//! - **Storage**: SQLite persistence behind repository traits
//! - **IO**: REST endpoints and live event streams for dashboards
//!
//! ## Architecture
//!
//! ```text
//! Attendant app / admin dashboard
//!     ↓
//! IO Layer (REST API, SSE)
//!     ↓
//! Domain Layer (services, rules)
//!     ↓
//! Storage Layer (SQLite)
//! ```

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::{EventBroadcaster, ProximityGuard, RevenueService, SessionService, SystemClock};
use crate::storage::DbConnection;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub session_service: SessionService<DbConnection>,
    pub revenue_service: RevenueService<DbConnection>,
    pub broadcaster: EventBroadcaster,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database");
    let db_conn = DbConnection::new(&config.database_url).await?;
    build_state(db_conn, config)
}

/// Wire services on top of an open connection
pub fn build_state(db_conn: DbConnection, config: &AppConfig) -> Result<AppState> {
    info!("Setting up domain model");
    let clock = Arc::new(SystemClock);
    let broadcaster = EventBroadcaster::new(config.event_queue_capacity);
    let session_service = SessionService::new(
        &db_conn,
        broadcaster.clone(),
        ProximityGuard::new(config.geofence_radius_meters),
        clock.clone(),
    );
    let revenue_service = RevenueService::new(&db_conn, clock, config.utc_offset()?);

    Ok(AppState {
        session_service,
        revenue_service,
        broadcaster,
    })
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid CORS origin '{}'", cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/sessions/checkin", post(io::checkin))
        .route("/sessions/checkout", post(io::checkout))
        .route("/sessions/manual/checkin", post(io::manual_checkin))
        .route("/sessions/manual/checkout", post(io::manual_checkout))
        .route("/revenue", get(io::get_revenue))
        .route("/revenue/periods", get(io::get_revenue_periods))
        .route("/revenue/overview", get(io::get_revenue_overview))
        .route(
            "/attendants/:attendant_id/events",
            get(io::subscribe_events).delete(io::unsubscribe_events),
        );

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}
