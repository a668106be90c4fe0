//! Pub/sub fan-out between one host endpoint and its participant endpoints
//! (spec.md §4.5). Two channel groups per session: a singleton host group and
//! an N-subscriber participant group, plus backpressure enforcement.

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{mpsc, Notify};
use uuid::Uuid;

/// One participant's outbound queue and a forced-close signal the
/// participant endpoint task observes when its queue overflows (spec.md §5:
/// "if a subscriber's outbound queue is full, the subscriber is force-closed
/// with code 1013").
#[derive(Clone)]
pub struct Subscriber {
    pub tx: mpsc::Sender<Message>,
    pub force_close: Arc<Notify>,
}

/// Per-session pub/sub groups: one host, many participants.
#[derive(Default)]
pub struct Broker {
    host: DashMap<(), Subscriber>,
    participants: DashMap<Uuid, Subscriber>,
}

impl Broker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group_add_host(&self, sub: Subscriber) {
        self.host.insert((), sub);
    }

    pub fn group_discard_host(&self) {
        self.host.remove(&());
    }

    pub fn group_add_participant(&self, conn_id: Uuid, sub: Subscriber) {
        self.participants.insert(conn_id, sub);
    }

    pub fn group_discard_participant(&self, conn_id: Uuid) {
        self.participants.remove(&conn_id);
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// `GroupSend` to the host group. No-op (silently dropped) if the host
    /// has already disconnected; callers that need delivery guarantees check
    /// session lifecycle state separately.
    pub fn send_to_host(&self, msg: Message) {
        if let Some(sub) = self.host.get(&()) {
            if sub.tx.try_send(msg).is_err() {
                sub.force_close.notify_one();
            }
        }
    }

    /// `GroupSend` to every currently-subscribed participant. Ordering is
    /// preserved per-publisher-per-subscriber via the bounded mpsc channel.
    pub fn broadcast_to_participants(&self, msg: Message) {
        for entry in self.participants.iter() {
            let sub = entry.value();
            if sub.tx.try_send(msg.clone()).is_err() {
                sub.force_close.notify_one();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(depth: usize) -> (Subscriber, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(depth);
        (Subscriber { tx, force_close: Arc::new(Notify::new()) }, rx)
    }

    /// spec.md §5 "Backpressure": a full outbound queue must signal
    /// `force_close` rather than silently dropping the message or blocking
    /// the broker.
    #[tokio::test]
    async fn broadcast_to_participants_signals_force_close_on_overflow() {
        let broker = Broker::new();
        let (sub, _rx) = subscriber(1);
        let force_close = sub.force_close.clone();
        broker.group_add_participant(Uuid::new_v4(), sub);

        broker.broadcast_to_participants(Message::Text("1".into()));
        broker.broadcast_to_participants(Message::Text("2".into()));

        tokio::time::timeout(std::time::Duration::from_millis(100), force_close.notified())
            .await
            .expect("force_close must fire once the queue is full");
    }

    #[tokio::test]
    async fn send_to_host_signals_force_close_on_overflow() {
        let broker = Broker::new();
        let (sub, _rx) = subscriber(1);
        let force_close = sub.force_close.clone();
        broker.group_add_host(sub);

        broker.send_to_host(Message::Text("1".into()));
        broker.send_to_host(Message::Text("2".into()));

        tokio::time::timeout(std::time::Duration::from_millis(100), force_close.notified())
            .await
            .expect("force_close must fire once the queue is full");
    }

    #[tokio::test]
    async fn broadcast_does_not_signal_force_close_while_queue_has_room() {
        let broker = Broker::new();
        let (sub, _rx) = subscriber(4);
        let force_close = sub.force_close.clone();
        broker.group_add_participant(Uuid::new_v4(), sub);

        broker.broadcast_to_participants(Message::Text("1".into()));

        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(50), force_close.notified())
                .await
                .is_err(),
            "force_close must not fire while the queue has free capacity"
        );
    }
}
