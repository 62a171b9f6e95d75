// src/engine/hub.rs — Per-run event fan-out

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::types::RunEvent;

/// Buffered events per subscriber. A consumer that falls further behind
/// loses events rather than slowing the run down.
pub const INBOX_CAPACITY: usize = 16;

struct Topic {
    senders: Vec<mpsc::Sender<RunEvent>>,
    closed: bool,
}

/// Fan-out of run events to any number of live subscribers.
///
/// Publishing never waits on consumers: each subscriber owns a bounded
/// inbox, and overflow drops the event for that subscriber only. Closing a
/// topic ends every subscriber feed once its inbox is drained.
#[derive(Default)]
pub struct EventHub {
    topics: Mutex<HashMap<String, Topic>>,
}

/// A live event feed for one run. Dropping it unsubscribes; the hub prunes
/// the dead inbox on the next publish.
pub struct Subscription {
    rx: mpsc::Receiver<RunEvent>,
}

impl Subscription {
    /// Next event, or None once the topic is closed and the inbox drained.
    pub async fn recv(&mut self) -> Option<RunEvent> {
        self.rx.recv().await
    }

    fn ended() -> Self {
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        Self { rx }
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Topic>> {
        self.topics.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Create the topic for a run. Exists from run start so subscribers can
    /// attach before the first iteration lands.
    pub fn open(&self, run_id: &str) {
        self.lock()
            .entry(run_id.to_string())
            .or_insert_with(|| Topic {
                senders: Vec::new(),
                closed: false,
            });
    }

    /// Subscribe to a run's events. None when the topic never existed; an
    /// already-ended feed when the run has finished.
    pub fn subscribe(&self, run_id: &str) -> Option<Subscription> {
        let mut topics = self.lock();
        let topic = topics.get_mut(run_id)?;
        if topic.closed {
            return Some(Subscription::ended());
        }
        let (tx, rx) = mpsc::channel(INBOX_CAPACITY);
        topic.senders.push(tx);
        Some(Subscription { rx })
    }

    /// Deliver an event to every current subscriber. Returns how many
    /// inboxes accepted it.
    pub fn publish(&self, run_id: &str, event: &RunEvent) -> usize {
        // Senders are cloned out so no send happens under the lock.
        let senders: Vec<mpsc::Sender<RunEvent>> = {
            let mut topics = self.lock();
            match topics.get_mut(run_id) {
                Some(topic) => {
                    topic.senders.retain(|tx| !tx.is_closed());
                    topic.senders.clone()
                }
                None => return 0,
            }
        };

        let mut delivered = 0;
        for tx in senders {
            match tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::trace!(run_id, "subscriber inbox full, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    /// End the topic: live feeds finish after draining, late subscribers get
    /// an already-ended feed.
    pub fn close(&self, run_id: &str) {
        let mut topics = self.lock();
        if let Some(topic) = topics.get_mut(run_id) {
            topic.closed = true;
            topic.senders.clear();
        }
    }

    pub fn subscriber_count(&self, run_id: &str) -> usize {
        let mut topics = self.lock();
        topics
            .get_mut(run_id)
            .map(|topic| {
                topic.senders.retain(|tx| !tx.is_closed());
                topic.senders.len()
            })
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::types::IterationRecord;

    fn iter_event(k: u32) -> RunEvent {
        RunEvent::Iteration {
            iter: IterationRecord {
                k,
                a: 0.0,
                b: 1.0,
                x_mid: 0.5,
                fx_mid: 0.25,
                len: 1.0,
            },
        }
    }

    async fn drain(sub: &mut Subscription) -> Vec<RunEvent> {
        let mut events = Vec::new();
        while let Some(ev) = sub.recv().await {
            events.push(ev);
        }
        events
    }

    fn ks(events: &[RunEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|ev| match ev {
                RunEvent::Iteration { iter } => Some(iter.k),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_subscriber_sees_events_in_order() {
        let hub = EventHub::new();
        hub.open("r1");
        let mut sub = hub.subscribe("r1").unwrap();

        for k in 1..=3 {
            assert_eq!(hub.publish("r1", &iter_event(k)), 1);
        }
        hub.close("r1");

        let events = drain(&mut sub).await;
        assert_eq!(ks(&events), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_each_subscriber_gets_its_own_copy() {
        let hub = EventHub::new();
        hub.open("r1");
        let mut first = hub.subscribe("r1").unwrap();
        let mut second = hub.subscribe("r1").unwrap();

        assert_eq!(hub.publish("r1", &iter_event(1)), 2);
        assert_eq!(hub.publish("r1", &iter_event(2)), 2);
        hub.close("r1");

        assert_eq!(ks(&drain(&mut first).await), vec![1, 2]);
        assert_eq!(ks(&drain(&mut second).await), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_overflow_drops_newest_events() {
        let hub = EventHub::new();
        hub.open("r1");
        let mut sub = hub.subscribe("r1").unwrap();

        for k in 1..=20 {
            let delivered = hub.publish("r1", &iter_event(k));
            if k <= INBOX_CAPACITY as u32 {
                assert_eq!(delivered, 1, "event {k} should fit");
            } else {
                assert_eq!(delivered, 0, "event {k} should overflow");
            }
        }
        hub.close("r1");

        let events = drain(&mut sub).await;
        let expected: Vec<u32> = (1..=INBOX_CAPACITY as u32).collect();
        assert_eq!(ks(&events), expected);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_pruned() {
        let hub = EventHub::new();
        hub.open("r1");
        let sub = hub.subscribe("r1").unwrap();
        assert_eq!(hub.subscriber_count("r1"), 1);

        drop(sub);
        assert_eq!(hub.publish("r1", &iter_event(1)), 0);
        assert_eq!(hub.subscriber_count("r1"), 0);
    }

    #[tokio::test]
    async fn test_no_replay_for_late_subscribers() {
        let hub = EventHub::new();
        hub.open("r1");
        assert_eq!(hub.publish("r1", &iter_event(1)), 0);

        let mut sub = hub.subscribe("r1").unwrap();
        hub.publish("r1", &iter_event(2));
        hub.close("r1");

        assert_eq!(ks(&drain(&mut sub).await), vec![2]);
    }

    #[tokio::test]
    async fn test_subscribe_after_close_ends_immediately() {
        let hub = EventHub::new();
        hub.open("r1");
        hub.close("r1");

        let mut sub = hub.subscribe("r1").unwrap();
        assert!(sub.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_topic() {
        let hub = EventHub::new();
        assert!(hub.subscribe("nope").is_none());
        assert_eq!(hub.publish("nope", &RunEvent::Stopped), 0);
        hub.close("nope");
    }

    #[tokio::test]
    async fn test_publish_after_close_reaches_nobody() {
        let hub = EventHub::new();
        hub.open("r1");
        let mut sub = hub.subscribe("r1").unwrap();
        hub.publish("r1", &iter_event(1));
        hub.close("r1");

        assert_eq!(hub.publish("r1", &iter_event(2)), 0);
        assert_eq!(ks(&drain(&mut sub).await), vec![1]);
    }
}
