//! WebSocket upgrade handlers (spec.md §6 "WebSocket upgrade routes").
//!
//! Thin extractor glue: pull `meeting_id`/`access_code`/`session` out of the
//! request and hand the raw socket to the matching `realtime` endpoint. Auth,
//! the state machine, and close codes all live there, not here.

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::realtime::{host_endpoint, participant_endpoint};

#[derive(Debug, Deserialize)]
pub struct HostQuery {
    session: Option<String>,
}

/// `/ws/meeting/<meeting_id:uuid>/host/?session=<session_token>`
pub async fn host_ws(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
    Query(q): Query<HostQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| host_endpoint::run(socket, state, meeting_id, q.session))
}

/// `/ws/meeting/<access_code:string>/participant/`
pub async fn participant_ws(
    State(state): State<AppState>,
    Path(access_code): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| participant_endpoint::run(socket, state, access_code))
}
