//! Mixer event hub.
//!
//! The hub multiplexes fade, volume and lifecycle events into a bounded
//! history plus an async broadcast stream. Every engine owns one hub;
//! subscribers (CLI streams, tests) attach through the handle.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::broadcast;

pub mod events;

pub use events::{MixerEvent, MixerEventKind};

/// Snapshot of hub state for CLI reporting.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventSnapshot {
    pub recent: Vec<MixerEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
}

/// Broadcast-based hub retaining a bounded history of events.
pub struct EventHub {
    tx: broadcast::Sender<MixerEvent>,
    history: Mutex<VecDeque<MixerEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl EventHub {
    pub fn new(buffer: usize, history_capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(buffer.max(1));
        Self {
            tx,
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MixerEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        {
            let mut history = self.history.lock().expect("history poisoned");
            if history.len() == self.history_capacity {
                history.pop_front();
                self.dropped_history.fetch_add(1, Ordering::Relaxed);
            }
            history.push_back(event.clone());
        }

        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<MixerEvent> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> EventSnapshot {
        let history = self.history.lock().expect("history poisoned");
        EventSnapshot {
            recent: history.iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(128, 64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mixer::BusKind;

    fn volume_event(timestamp_ms: u64, volume: f32) -> MixerEvent {
        MixerEvent {
            timestamp_ms,
            kind: MixerEventKind::VolumeSet {
                bus: "Music".to_string(),
                kind: BusKind::SoundClass,
                volume,
            },
            detail: None,
        }
    }

    #[test]
    fn hub_preserves_order_within_history() {
        let hub = EventHub::new(8, 3);
        hub.publish(volume_event(1, 0.1));
        hub.publish(volume_event(2, 0.2));
        hub.publish(volume_event(3, 0.3));

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.recent.len(), 3);
        assert_eq!(snapshot.recent[0].timestamp_ms, 1);
        assert_eq!(snapshot.recent[2].timestamp_ms, 3);
        assert_eq!(snapshot.dropped_events, 0);
    }

    #[test]
    fn hub_drops_oldest_when_history_is_full() {
        let hub = EventHub::new(8, 2);
        hub.publish(volume_event(1, 0.1));
        hub.publish(volume_event(2, 0.2));
        hub.publish(volume_event(3, 0.3));

        let snapshot = hub.snapshot();
        assert_eq!(snapshot.recent.len(), 2);
        assert_eq!(snapshot.recent[0].timestamp_ms, 2);
        assert_eq!(snapshot.total_events, 3);
        assert_eq!(snapshot.dropped_events, 1);
    }

    #[test]
    fn subscribers_receive_published_events() {
        let hub = EventHub::new(8, 4);
        let mut rx = hub.subscribe();
        hub.publish(volume_event(7, 0.5));

        let received = rx.try_recv().expect("event should be waiting");
        assert_eq!(received.timestamp_ms, 7);
    }

    #[test]
    fn publish_without_subscribers_does_not_fail() {
        let hub = EventHub::default();
        hub.publish(volume_event(1, 1.0));
        assert_eq!(hub.snapshot().total_events, 1);
    }

    #[test]
    fn event_json_shape_is_tagged() {
        let event = volume_event(5, 0.25);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"volume_set\""));
        assert!(json.contains("\"payload\""));

        let parsed: MixerEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
