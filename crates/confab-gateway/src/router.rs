//! Axum router wiring (HTTP/WS routes -> handlers), spec.md §6.

use axum::routing::{get, post};
use axum::Router;

use crate::{app_state::AppState, http, transport};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws/meeting/:meeting_id/host/", get(transport::ws::host_ws))
        .route("/ws/meeting/:access_code/participant/", get(transport::ws::participant_ws))
        .route("/api/:meeting_id/summarize/", post(http::summarize))
        .route("/api/:meeting_id/export/", post(http::export))
        .route("/download/:filename", get(http::download))
        .with_state(state)
}
