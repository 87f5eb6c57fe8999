//! Broadcast channel for newly inserted points.
//!
//! Every accepted insert is published here; SSE clients hold a receiver each.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::domain::models::PointEvent;

/// A published insert, tagged with its position in the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub sequence: u64,
    #[serde(flatten)]
    pub event: PointEvent,
}

#[derive(Debug, Clone)]
pub struct LiveUpdateConfig {
    /// Messages buffered per receiver before it starts lagging.
    pub channel_capacity: usize,
}

impl Default for LiveUpdateConfig {
    fn default() -> Self {
        Self { channel_capacity: 256 }
    }
}

pub struct LiveUpdateBus {
    sender: broadcast::Sender<LiveUpdate>,
    sequence: AtomicU64,
}

impl LiveUpdateBus {
    pub fn new(config: LiveUpdateConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            sender,
            sequence: AtomicU64::new(0),
        }
    }

    /// Publish an insert to every current subscriber.
    pub fn publish(&self, event: PointEvent) -> LiveUpdate {
        let update = LiveUpdate {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            event,
        };

        // no subscribers is not an error
        let _ = self.sender.send(update.clone());
        update
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveUpdate> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LiveUpdateBus {
    fn default() -> Self {
        Self::new(LiveUpdateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Category;

    fn event(x: i64) -> PointEvent {
        PointEvent {
            x,
            y: 1,
            timestamp: "2024-03-01 00:00:00".to_string(),
            graph_type: Category::Line,
        }
    }

    #[tokio::test]
    async fn test_publish_reaches_subscribers_in_order() {
        let bus = LiveUpdateBus::default();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(event(1));
        bus.publish(event(2));

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!((first.sequence, first.event.x), (0, 1));
        assert_eq!((second.sequence, second.event.x), (1, 2));
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = LiveUpdateBus::default();
        let update = bus.publish(event(5));
        assert_eq!(update.sequence, 0);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_update_serializes_flat() {
        let update = LiveUpdate {
            sequence: 3,
            event: event(4),
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["sequence"], 3);
        assert_eq!(json["type"], "line");
        assert_eq!(json["x"], 4);
    }
}
