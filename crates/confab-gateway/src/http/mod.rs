//! HTTP/JSON surface consumed by the core (spec.md §6).
//!
//! Thin glue over `summarize`/`export`: parse the request, call into the
//! pipeline, map the result to the frontend's fixed response shapes. This is
//! the only module in the crate that knows about Axum's HTTP types.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use confab_core::domain::SummaryBlob;
use confab_core::error::{ClientCode, GatewayError, Result};

use crate::app_state::AppState;
use crate::export::{ExportFormat, ExportRenderer};
use crate::summarize::SummaryOrchestrator;

fn http_status(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::AuthFailed => StatusCode::UNAUTHORIZED,
        ClientCode::NotFound => StatusCode::NOT_FOUND,
        ClientCode::Locked | ClientCode::Conflict => StatusCode::CONFLICT,
        ClientCode::Validation | ClientCode::NoUrlRoute | ClientCode::NoSession | ClientCode::NoAccessCode => {
            StatusCode::BAD_REQUEST
        }
        ClientCode::TransientIo => StatusCode::BAD_GATEWAY,
        ClientCode::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `POST /api/<meeting_id>/summarize/`
pub async fn summarize(State(state): State<AppState>, Path(meeting_id): Path<Uuid>) -> Response {
    match SummaryOrchestrator::summarize(state.repo(), state.llm(), meeting_id).await {
        Ok(_) => Json(json!({})).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, %meeting_id, "summarize failed");
            (http_status(e.client_code()), Json(json!({"type": "error"}))).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(rename = "type")]
    format: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ExportResponse {
    Success { download_url: String },
    Error,
}

/// `POST /api/<meeting_id>/export/`
pub async fn export(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
    Json(body): Json<ExportRequest>,
) -> Response {
    match export_inner(&state, meeting_id, &body.format).await {
        Ok(download_url) => Json(ExportResponse::Success { download_url }).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, %meeting_id, "export failed");
            (http_status(e.client_code()), Json(ExportResponse::Error)).into_response()
        }
    }
}

async fn export_inner(state: &AppState, meeting_id: Uuid, format: &str) -> Result<String> {
    let format = ExportFormat::parse(format)?;
    let (meeting, _) = state
        .repo()
        .get_meeting_with_questions(meeting_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound("meeting".into()))?;
    let raw = meeting
        .summary
        .clone()
        .filter(|_| meeting.has_summary())
        .ok_or_else(|| GatewayError::Validation("meeting has no summary yet".into()))?;
    let summary: SummaryBlob = serde_json::from_value(raw)
        .map_err(|e| GatewayError::Validation(format!("stored summary unparsable: {e}")))?;

    let cfg = state.cfg();
    let filename = ExportRenderer::render(
        cfg.export.dir.clone(),
        cfg.export.font_path.clone(),
        meeting_id,
        summary,
        format,
    )
    .await?;
    Ok(state.download_url(&filename))
}

/// `GET /download/<filename>`
pub async fn download(State(state): State<AppState>, Path(filename): Path<String>) -> Response {
    // `filename` is attacker-controlled and may carry a percent-decoded `..`
    // even though the raw URL had no literal slash; only accept the exact
    // shape `export::filename` produces (spec.md §6 "Export file naming").
    if std::path::Path::new(&filename).file_name().map(|n| n.to_string_lossy().into_owned()) != Some(filename.clone()) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let path = std::path::Path::new(&state.cfg().export.dir).join(&filename);
    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let content_type = if filename.ends_with(".pdf") {
                "application/pdf"
            } else {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            };
            (
                [
                    (header::CONTENT_TYPE, content_type.to_string()),
                    (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{filename}\"")),
                ],
                bytes,
            )
                .into_response()
        }
        Err(_) => StatusCode::NOT_FOUND.into_response(),
    }
}
