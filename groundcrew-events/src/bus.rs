//! ABOUTME: Per-session broadcast bus routing turn events to subscribers
//! ABOUTME: Trimmed from a pattern-matching pub/sub bus to session-scoped broadcast channels

use crate::event::{CorrelatedEvent, TurnEvent};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

const CHANNEL_CAPACITY: usize = 1024;

struct SessionChannel {
    sender: broadcast::Sender<CorrelatedEvent>,
    sequence: AtomicU64,
}

/// Routes `TurnEvent`s to every subscriber of a session, tagging each with
/// a correlation id and a monotonically increasing per-session sequence
/// number so consumers can detect gaps after a reconnect.
#[derive(Clone)]
pub struct EventBus {
    sessions: Arc<DashMap<String, Arc<SessionChannel>>>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }

    fn channel_for(&self, session_id: &str) -> Arc<SessionChannel> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
                Arc::new(SessionChannel {
                    sender,
                    sequence: AtomicU64::new(0),
                })
            })
            .clone()
    }

    /// Publish an event for `session_id`/`turn`. Returns the number of
    /// active subscribers it reached; zero is not an error, matching the
    /// source event bus's "no receivers" is not a publish failure.
    pub fn publish(&self, session_id: &str, turn: u32, event: TurnEvent) -> usize {
        let channel = self.channel_for(session_id);
        let sequence = channel.sequence.fetch_add(1, Ordering::SeqCst);
        let correlated = CorrelatedEvent {
            correlation_id: Uuid::new_v4(),
            session_id: session_id.to_string(),
            turn,
            sequence,
            event,
        };
        match channel.sender.send(correlated) {
            Ok(count) => count,
            Err(_) => {
                debug!(session_id, "no subscribers for event");
                0
            }
        }
    }

    /// Subscribe to every event published for `session_id` from this point
    /// forward.
    #[must_use]
    pub fn subscribe(&self, session_id: &str) -> broadcast::Receiver<CorrelatedEvent> {
        self.channel_for(session_id).sender.subscribe()
    }

    /// Drop the channel for a finished session once no subscribers remain.
    pub fn retire(&self, session_id: &str) {
        if let Some(entry) = self.sessions.get(session_id) {
            if entry.sender.receiver_count() == 0 {
                drop(entry);
                self.sessions.remove(session_id);
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe("session-1");
        bus.publish("session-1", 1, TurnEvent::Status { message: "a".into() });
        bus.publish("session-1", 1, TurnEvent::Status { message: "b".into() });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(second.sequence, 1);
    }

    #[tokio::test]
    async fn sessions_are_isolated_from_each_other() {
        let bus = EventBus::new();
        let mut rx_a = bus.subscribe("a");
        let _rx_b = bus.subscribe("b");
        bus.publish("b", 1, TurnEvent::Done);
        assert!(rx_a.try_recv().is_err());
    }

    #[test]
    fn publish_with_no_subscribers_reports_zero_reached() {
        let bus = EventBus::new();
        assert_eq!(bus.publish("lonely", 1, TurnEvent::Done), 0);
    }
}
