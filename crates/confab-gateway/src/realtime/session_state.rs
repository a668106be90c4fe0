//! Ephemeral, in-memory per-meeting runtime state (spec.md §3 "SessionState").
//!
//! Owned exclusively by the host endpoint task; participants observe it only
//! through the [`Broker`](super::broker::Broker) and through the handful of
//! read-only accessors below (`is_locked`, `adopt_name`).

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, Ordering};

use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use confab_core::domain::Question;

use super::broker::Broker;

/// Counter-mutating events a participant task reports to the host task.
///
/// Deliberately payload-free: the notification the host *frontend* sees for
/// each of these travels separately via [`Broker::send_to_host`], already
/// built by the participant task. This channel exists only so that
/// `participant_count`/`responses_count` (spec.md §5: "owned by the host
/// task; participants increment via message fan-in, never direct write")
/// are mutated exclusively from inside the host task's own select loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostFanIn {
    ParticipantJoined,
    ParticipantLeft,
    AnswerSubmitted,
}

/// Depth chosen generously: fan-in events are tiny and the host task drains
/// them promptly, so this is never expected to approach saturation.
const FAN_IN_CHANNEL_DEPTH: usize = 1024;

pub struct SessionState {
    pub meeting_id: Uuid,
    pub access_code: String,
    pub director_id: Uuid,
    pub allocated_duration_minutes: i32,
    /// Ordered by `position`, fetched once at host connect.
    pub questions: Vec<Question>,

    locked: AtomicBool,
    usernames: Mutex<Vec<String>>,
    participant_count: AtomicI32,
    responses_count: AtomicI32,
    questions_presented: AtomicI32,
    /// Ticked by the duration-counter task; read directly by the host task
    /// on END instead of awaiting the task's return value, so a clean
    /// cancellation and a read-then-abort race the same way.
    duration_seconds: AtomicI64,

    pub broker: Broker,
    fan_in_tx: mpsc::Sender<HostFanIn>,
}

impl SessionState {
    /// Returns the state plus the receiving half of the fan-in channel; the
    /// caller (the host task, which is the only legitimate consumer) keeps
    /// the receiver for itself while `Arc<SessionState>` is shared with
    /// participant tasks so they can only send, never mutate, the counters.
    pub fn new(
        meeting_id: Uuid,
        access_code: String,
        director_id: Uuid,
        allocated_duration_minutes: i32,
        questions: Vec<Question>,
    ) -> (Self, mpsc::Receiver<HostFanIn>) {
        let (fan_in_tx, fan_in_rx) = mpsc::channel(FAN_IN_CHANNEL_DEPTH);
        (
            Self {
                meeting_id,
                access_code,
                director_id,
                allocated_duration_minutes,
                questions,
                locked: AtomicBool::new(false),
                usernames: Mutex::new(Vec::new()),
                participant_count: AtomicI32::new(0),
                responses_count: AtomicI32::new(0),
                questions_presented: AtomicI32::new(1),
                duration_seconds: AtomicI64::new(0),
                broker: Broker::new(),
                fan_in_tx,
            },
            fan_in_rx,
        )
    }

    /// Reports a counter-mutating event to the host task. Best-effort: if
    /// the host has already torn down its receiver the session is ending
    /// anyway, so a dropped notification here is harmless.
    pub fn notify_host(&self, event: HostFanIn) {
        let _ = self.fan_in_tx.try_send(event);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    /// Adopts a unique display name under the session's exclusive username
    /// lock (spec.md §4.4). Given `k` existing entries equal to `name` or
    /// matching the prefix `name(`, adopts `name` itself when `k == 0`, else
    /// `name(k)`. The adopted name is appended before the lock is released so
    /// concurrent joiners observe a consistent count.
    pub async fn adopt_name(&self, requested: &str) -> String {
        let mut names = self.usernames.lock().await;
        let prefix = format!("{requested}(");
        let k = names
            .iter()
            .filter(|n| n.as_str() == requested || n.starts_with(&prefix))
            .count();
        let adopted = if k == 0 {
            requested.to_string()
        } else {
            format!("{requested}({k})")
        };
        names.push(adopted.clone());
        adopted
    }

    pub fn inc_participant_count(&self) -> i32 {
        self.participant_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn participant_count(&self) -> i32 {
        self.participant_count.load(Ordering::Acquire)
    }

    pub fn inc_responses_count(&self) -> i32 {
        self.responses_count.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn responses_count(&self) -> i32 {
        self.responses_count.load(Ordering::Acquire)
    }

    pub fn inc_questions_presented(&self) -> i32 {
        self.questions_presented.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn questions_presented(&self) -> i32 {
        self.questions_presented.load(Ordering::Acquire)
    }

    pub fn set_duration_seconds(&self, secs: i64) {
        self.duration_seconds.store(secs, Ordering::Release);
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_seconds.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> SessionState {
        SessionState::new(Uuid::new_v4(), "12345678".into(), Uuid::new_v4(), 5, vec![]).0
    }

    #[tokio::test]
    async fn notify_host_is_best_effort() {
        let (s, mut rx) = SessionState::new(Uuid::new_v4(), "12345678".into(), Uuid::new_v4(), 5, vec![]);
        s.notify_host(HostFanIn::ParticipantJoined);
        assert_eq!(rx.recv().await, Some(HostFanIn::ParticipantJoined));
    }

    #[tokio::test]
    async fn adopt_name_disambiguates_duplicates_in_order() {
        let s = state();
        assert_eq!(s.adopt_name("Ada").await, "Ada");
        assert_eq!(s.adopt_name("Ada").await, "Ada(1)");
        assert_eq!(s.adopt_name("Ada").await, "Ada(2)");
        assert_eq!(s.adopt_name("Ben").await, "Ben");
    }

    #[test]
    fn counters_start_correctly_seeded() {
        let s = state();
        assert_eq!(s.questions_presented(), 1);
        assert_eq!(s.participant_count(), 0);
        assert_eq!(s.responses_count(), 0);
        assert_eq!(s.inc_participant_count(), 1);
        assert_eq!(s.inc_responses_count(), 1);
        assert_eq!(s.inc_questions_presented(), 2);
    }
}
