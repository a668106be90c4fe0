//! Participant bidirectional session endpoint (spec.md §4.4).
//!
//! CONNECTING → JOINED → ACTIVE → CLOSED, or CONNECTING → REJECTED_LOCKED
//! (close 4401). One cooperative task per participant, same shape as
//! [`host_endpoint`](super::host_endpoint).

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio::time::timeout;
use uuid::Uuid;

use confab_core::domain::{validate_participant_name, validate_response_text};
use confab_core::error::{GatewayError, Result};
use confab_core::protocol::ws::{ParticipantStatus, ParticipantToServer, ServerToHost, ServerToParticipant};

use crate::app_state::AppState;
use crate::realtime::broker::Subscriber;
use crate::realtime::session_state::{HostFanIn, SessionState};

pub async fn run(socket: WebSocket, state: AppState, access_code: String) {
    if let Err(e) = run_inner(socket, state, access_code).await {
        tracing::debug!(error = %e, "participant session ended with error");
    }
}

async fn run_inner(socket: WebSocket, state: AppState, access_code: String) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // CONNECTING
    let session = state
        .registry()
        .lookup(&access_code)
        .ok_or_else(|| GatewayError::NotFound("meeting".into()))?;
    if session.is_locked() {
        let _ = ws_tx
            .send(Message::Close(Some(CloseFrame {
                code: 4401,
                reason: "meeting_locked".into(),
            })))
            .await;
        return Err(GatewayError::Locked);
    }

    // CONNECTING -> JOINED: first message must be `participant_joined` within
    // the handshake window, else spec.md §5 mandates closing as NO_URL_ROUTE.
    let handshake_window = Duration::from_millis(state.cfg().gateway.join_handshake_ms);
    let requested_name = match timeout(handshake_window, ws_rx.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ParticipantToServer>(&text) {
            Ok(ParticipantToServer::ParticipantJoined { name }) => match validate_participant_name(&name) {
                Ok(valid) => valid,
                Err(_) => return Err(GatewayError::NoUrlRoute),
            },
            _ => return Err(GatewayError::NoUrlRoute),
        },
        _ => return Err(GatewayError::NoUrlRoute),
    };
    let adopted_name = session.adopt_name(&requested_name).await;

    let conn_id = Uuid::new_v4();
    let (out_tx, mut out_rx) = mpsc::channel::<Message>(state.cfg().gateway.outbound_queue_depth);
    let force_close = Arc::new(Notify::new());
    session.broker.group_add_participant(
        conn_id,
        Subscriber {
            tx: out_tx,
            force_close: force_close.clone(),
        },
    );

    if adopted_name != requested_name {
        send(&mut ws_tx, &ServerToParticipant::UpdateName { name: adopted_name.clone() }).await;
    }
    notify_joined(&session, &adopted_name);

    let outcome = drive(&mut ws_tx, &mut ws_rx, &mut out_rx, &force_close, &state, &session).await;

    session.broker.group_discard_participant(conn_id);
    notify_left(&session, &adopted_name);

    match &outcome {
        Ok(()) => {
            let _ = ws_tx
                .send(Message::Close(Some(CloseFrame {
                    code: 1000,
                    reason: "normal".into(),
                })))
                .await;
        }
        Err(e) => {
            let code = e.client_code().ws_close_code().unwrap_or(1011);
            let _ = ws_tx
                .send(Message::Close(Some(CloseFrame {
                    code,
                    reason: e.client_code().as_str().into(),
                })))
                .await;
        }
    }
    outcome
}

/// ACTIVE: relays broker broadcasts out, handles `submit_answer` inbound.
async fn drive(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    ws_rx: &mut SplitStream<WebSocket>,
    out_rx: &mut mpsc::Receiver<Message>,
    force_close: &Notify,
    state: &AppState,
    session: &Arc<SessionState>,
) -> Result<()> {
    loop {
        tokio::select! {
            biased;

            _ = force_close.notified() => {
                return Err(GatewayError::Backpressure("participant outbound queue overflow".into()));
            }

            outgoing = out_rx.recv() => {
                match outgoing {
                    Some(msg) => {
                        let is_end = matches!(&msg, Message::Text(text) if is_end_meeting(text));
                        if ws_tx.send(msg).await.is_err() {
                            return Err(GatewayError::TransientIo("participant socket write failed".into()));
                        }
                        if is_end {
                            return Ok(());
                        }
                    }
                    None => return Ok(()),
                }
            }

            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_submit(&text, state, session).await {
                            send(ws_tx, &reply).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        return Err(GatewayError::TransientIo(format!("participant socket read failed: {e}")));
                    }
                }
            }
        }
    }
}

fn is_end_meeting(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("type").and_then(|t| t.as_str()).map(str::to_string))
        .is_some_and(|t| t == "end_meeting")
}

/// `submit_answer` procedure, spec.md §4.4 ACTIVE. Returns the typed reply to
/// send back over this connection, if any; success has no direct reply
/// (the host is notified instead).
async fn handle_submit(text: &str, state: &AppState, session: &Arc<SessionState>) -> Option<ServerToParticipant> {
    let (question_text, answer) = match serde_json::from_str::<ParticipantToServer>(text) {
        Ok(ParticipantToServer::SubmitAnswer { question, answer }) => (question, answer),
        _ => return Some(ServerToParticipant::SubmitError),
    };
    if question_text.trim().is_empty() || answer.trim().is_empty() {
        return Some(ServerToParticipant::SubmitError);
    }

    let meeting = match state.repo().get_meeting_by_access_code(&session.access_code).await {
        Ok(Some(m)) => m,
        _ => return Some(ServerToParticipant::SubmitError),
    };
    let question = match state.repo().get_question_by_description(meeting.id, &question_text).await {
        Ok(Some(q)) => q,
        _ => return Some(ServerToParticipant::SubmitError),
    };

    let validated = match validate_response_text(&answer) {
        Ok(text) => text,
        Err(_) => return Some(ServerToParticipant::InvalidAnswer),
    };

    match state.repo().create_response(meeting.id, question.id, &validated).await {
        Ok(_) => {
            session.broker.send_to_host(build_host_message(&ServerToHost::AnswerSubmitted));
            session.notify_host(HostFanIn::AnswerSubmitted);
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, meeting_id = %meeting.id, "failed to persist response");
            Some(ServerToParticipant::SubmitError)
        }
    }
}

async fn send(ws_tx: &mut SplitSink<WebSocket, Message>, msg: &ServerToParticipant) {
    if let Ok(text) = serde_json::to_string(msg) {
        let _ = ws_tx.send(Message::Text(text)).await;
    }
}

fn notify_joined(session: &SessionState, adopted_name: &str) {
    session.broker.send_to_host(build_host_message(&ServerToHost::ParticipantJoined {
        participant: ParticipantStatus::connected(adopted_name),
    }));
    session.notify_host(HostFanIn::ParticipantJoined);
}

fn notify_left(session: &SessionState, adopted_name: &str) {
    session.broker.send_to_host(build_host_message(&ServerToHost::ParticipantLeft {
        name: adopted_name.to_string(),
    }));
    session.notify_host(HostFanIn::ParticipantLeft);
}

fn build_host_message(msg: &ServerToHost) -> Message {
    Message::Text(serde_json::to_string(msg).unwrap_or_default())
}
