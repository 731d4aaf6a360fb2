//! # Live Session Events
//!
//! Server-sent event stream per attendant. Each SSE message carries the
//! event type as its `event` field and the `{type, data}` envelope as JSON.
//! When the client disconnects the stream is dropped, which releases the
//! attendant's subscription.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tracing::info;

use crate::AppState;

pub async fn subscribe_events(
    State(state): State<AppState>,
    Path(attendant_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    info!("GET /api/attendants/{}/events", attendant_id);

    let stream = state
        .broadcaster
        .register(&attendant_id)
        .into_stream()
        .map(|event| Event::default().event(event.event_type.as_str()).json_data(&event));

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn unsubscribe_events(
    State(state): State<AppState>,
    Path(attendant_id): Path<String>,
) -> StatusCode {
    info!("DELETE /api/attendants/{}/events", attendant_id);
    state.broadcaster.unregister(&attendant_id);
    StatusCode::NO_CONTENT
}
