//! Host bidirectional session endpoint (spec.md §4.3).
//!
//! Runs the CONNECTING → AUTHENTICATED → QUESTIONS_SENT → RUNNING → ENDED
//! state machine as a single cooperative task (spec.md §5), same as the
//! teacher's `transport/ws` handler: one `tokio::select!` loop over the raw
//! socket, a fan-in channel, and the session's timers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep};
use uuid::Uuid;

use confab_core::domain::User;
use confab_core::error::{GatewayError, Result};
use confab_core::protocol::ws::{HostToServer, ServerToHost, ServerToParticipant};

use crate::app_state::AppState;
use crate::auth::AuthBridge;
use crate::realtime::broker::Subscriber;
use crate::realtime::session_state::{HostFanIn, SessionState};

pub async fn run(socket: WebSocket, state: AppState, meeting_id: Uuid, session_token: Option<String>) {
    if let Err(e) = run_inner(socket, state, meeting_id, session_token).await {
        tracing::warn!(error = %e, %meeting_id, "host session ended with error");
    }
}

async fn run_inner(
    socket: WebSocket,
    state: AppState,
    meeting_id: Uuid,
    session_token: Option<String>,
) -> Result<()> {
    let (mut ws_tx, mut ws_rx) = socket.split();

    // CONNECTING -> AUTHENTICATED
    let token = session_token.unwrap_or_default();
    let director = AuthBridge::resolve_user(state.repo(), &token).await?;

    // AUTHENTICATED -> QUESTIONS_SENT
    let (meeting, questions) = state
        .repo()
        .get_meeting_with_questions(meeting_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound("meeting".into()))?;
    if meeting.director_id != director.id {
        // Not itself in spec.md's close-code table; a host URL for someone
        // else's meeting is treated the same as a bad credential.
        return Err(GatewayError::AuthFailed);
    }
    if questions.is_empty() {
        return Err(GatewayError::NotFound("questions".into()));
    }

    let (session, fan_in_rx) = SessionState::new(
        meeting.id,
        meeting.access_code.clone(),
        meeting.director_id,
        meeting.duration_minutes,
        questions.clone(),
    );
    let session = Arc::new(session);
    state
        .registry()
        .register(meeting.access_code.clone(), session.clone())
        .map_err(|_| GatewayError::Conflict("meeting already has a live host session".into()))?;

    let (out_tx, out_rx) = mpsc::channel::<Message>(state.cfg().gateway.outbound_queue_depth);
    let force_close = Arc::new(Notify::new());
    session.broker.group_add_host(Subscriber {
        tx: out_tx,
        force_close: force_close.clone(),
    });

    send_to_host(
        &mut ws_tx,
        &ServerToHost::StartMeeting {
            questions: questions.iter().map(|q| q.description.clone()).collect(),
            access_code: meeting.access_code.clone(),
        },
    )
    .await;

    let outcome = drive(
        &mut ws_tx,
        &mut ws_rx,
        out_rx,
        fan_in_rx,
        &force_close,
        &state,
        &session,
        &director,
    )
    .await;

    session.broker.group_discard_host();
    state.registry().unregister(&meeting.access_code);

    match &outcome {
        Ok(()) => {
            let _ = ws_tx
                .send(Message::Close(Some(axum::extract::ws::CloseFrame {
                    code: 1000,
                    reason: "normal".into(),
                })))
                .await;
        }
        Err(e) => {
            let _ = ws_tx.send(Message::Close(Some(close_frame(e)))).await;
        }
    }
    outcome
}

/// Drives the QUESTIONS_SENT/RUNNING select loop until the session ends,
/// for whatever reason (host request, auto-end timer, or disconnect).
async fn drive(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    ws_rx: &mut SplitStream<WebSocket>,
    mut out_rx: mpsc::Receiver<Message>,
    mut fan_in_rx: mpsc::Receiver<HostFanIn>,
    force_close: &Notify,
    state: &AppState,
    session: &Arc<SessionState>,
    director: &User,
) -> Result<()> {
    let mut started = false;
    let mut auto_end_handle: Option<JoinHandle<()>> = None;
    let mut duration_handle: Option<JoinHandle<()>> = None;
    let (auto_end_tx, mut auto_end_rx) = tokio::sync::oneshot::channel::<()>();
    let mut auto_end_tx = Some(auto_end_tx);

    let end_result = loop {
        tokio::select! {
            biased;

            _ = force_close.notified() => {
                break Err(GatewayError::Backpressure("host outbound queue overflow".into()));
            }

            Some(msg) = out_rx.recv() => {
                if ws_tx.send(msg).await.is_err() {
                    break Err(GatewayError::TransientIo("host socket write failed".into()));
                }
            }

            Some(event) = fan_in_rx.recv() => {
                match event {
                    HostFanIn::ParticipantJoined => { session.inc_participant_count(); }
                    HostFanIn::ParticipantLeft => {}
                    HostFanIn::AnswerSubmitted => { session.inc_responses_count(); }
                }
            }

            _ = &mut auto_end_rx, if started => {
                break Ok(EndCause::AutoEnd);
            }

            incoming = ws_rx.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<HostToServer>(&text) {
                            Ok(HostToServer::StartMeeting { question }) if !started => {
                                started = true;
                                // `session` is the exact Arc<SessionState> the registry holds,
                                // so locking it here is immediately visible to participant joins.
                                session.lock();

                                let deadline = Duration::from_secs(
                                    session.allocated_duration_minutes.max(0) as u64 * 60,
                                );
                                if let Some(tx) = auto_end_tx.take() {
                                    auto_end_handle = Some(tokio::spawn(async move {
                                        sleep(deadline).await;
                                        let _ = tx.send(());
                                    }));
                                }
                                let counter_session = Arc::clone(session);
                                duration_handle = Some(tokio::spawn(async move {
                                    let mut tick = interval(Duration::from_secs(1));
                                    let mut elapsed = 0i64;
                                    loop {
                                        tick.tick().await;
                                        elapsed += 1;
                                        counter_session.set_duration_seconds(elapsed);
                                    }
                                }));

                                broadcast_to_participants(session, &ServerToParticipant::StartMeeting { question });
                            }
                            Ok(HostToServer::StartMeeting { .. }) => {}
                            Ok(HostToServer::NextQuestion { question }) if started => {
                                session.inc_questions_presented();
                                broadcast_to_participants(session, &ServerToParticipant::NextQuestion { question });
                            }
                            Ok(HostToServer::NextQuestion { .. }) => {}
                            Ok(HostToServer::EndMeeting) => {
                                break Ok(EndCause::HostRequested);
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "host sent an unparsable envelope");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        break Ok(EndCause::Disconnect);
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        break Err(GatewayError::TransientIo(format!("host socket read failed: {e}")));
                    }
                }
            }
        }
    };

    if let Some(h) = auto_end_handle.take() {
        h.abort();
    }
    if let Some(h) = duration_handle.take() {
        h.abort();
    }

    match end_result {
        Ok(cause) => {
            if started {
                finalize(ws_tx, state, session, director, cause).await;
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone, Copy)]
enum EndCause {
    HostRequested,
    AutoEnd,
    Disconnect,
}

/// RUNNING → ENDED, spec.md §4.3 steps 2-6. Persistence failures are logged
/// but never abort the remaining steps (spec.md §4.3 "Failure semantics").
async fn finalize(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    state: &AppState,
    session: &Arc<SessionState>,
    director: &User,
    cause: EndCause,
) {
    let duration_seconds = session.duration_seconds().clamp(0, i32::MAX as i64) as i32;
    let participants = session.participant_count();
    let questions_asked = session.questions_presented();

    if let Err(e) = state
        .repo()
        .set_meeting_stats(session.meeting_id, duration_seconds, participants, questions_asked)
        .await
    {
        tracing::warn!(error = %e, meeting_id = %session.meeting_id, "failed to persist meeting stats at end");
    }

    if let Err(e) = state
        .repo()
        .increment_user_counters(director.id, 1, participants as i64, session.responses_count() as i64)
        .await
    {
        tracing::warn!(error = %e, user_id = %director.id, "failed to increment user counters at end");
    }

    tracing::info!(
        meeting_id = %session.meeting_id,
        ?cause,
        duration_seconds,
        participants,
        questions_asked,
        "meeting ended"
    );

    let url = state.post_meeting_url(session.meeting_id);
    send_to_host(ws_tx, &ServerToHost::EndMeeting { url: url.clone() }).await;
    broadcast_to_participants(session, &ServerToParticipant::EndMeeting { url });
}

async fn send_to_host(ws_tx: &mut SplitSink<WebSocket, Message>, msg: &ServerToHost) {
    if let Ok(text) = serde_json::to_string(msg) {
        let _ = ws_tx.send(Message::Text(text)).await;
    }
}

fn broadcast_to_participants(session: &SessionState, msg: &ServerToParticipant) {
    if let Ok(text) = serde_json::to_string(msg) {
        session.broker.broadcast_to_participants(Message::Text(text));
    }
}

fn close_frame(err: &GatewayError) -> axum::extract::ws::CloseFrame<'static> {
    let code = err.client_code().ws_close_code().unwrap_or(1011);
    axum::extract::ws::CloseFrame {
        code,
        reason: err.client_code().as_str().into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// spec.md §5/§6: a backpressured subscriber must be force-closed with
    /// 1013, not the generic 1011 fallback other transient errors get.
    #[test]
    fn close_frame_uses_1013_for_backpressure() {
        let err = GatewayError::Backpressure("host outbound queue overflow".into());
        assert_eq!(close_frame(&err).code, 1013);
    }

    #[test]
    fn close_frame_falls_back_to_1011_for_unmapped_errors() {
        let err = GatewayError::TransientIo("socket write failed".into());
        assert_eq!(close_frame(&err).code, 1011);
    }
}
