use crate::domain::ports::{EventPublisher, RealtimeEvent};
use tokio::sync::broadcast;
use tracing::trace;

/// An event addressed to one user.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub user_id: String,
    pub event: RealtimeEvent,
}

/// In-process fan-out. A transport (websocket, SSE) subscribes and forwards
/// envelopes to the matching connection.
pub struct BroadcastPublisher {
    sender: broadcast::Sender<Envelope>,
}

impl BroadcastPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }
}

impl EventPublisher for BroadcastPublisher {
    fn publish(&self, user_id: &str, event: RealtimeEvent) {
        let envelope = Envelope { user_id: user_id.to_string(), event };
        // No subscribers is normal when nobody is connected.
        if self.sender.send(envelope).is_err() {
            trace!("No realtime subscribers for {}", user_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let publisher = BroadcastPublisher::new(8);
        let mut rx = publisher.subscribe();

        publisher.publish("u1", RealtimeEvent { title: "Nueva sesión".into(), message: "hola".into() });

        let envelope = rx.recv().await.unwrap();
        assert_eq!(envelope.user_id, "u1");
        assert_eq!(envelope.event.title, "Nueva sesión");
    }

    #[test]
    fn publishing_without_subscribers_is_silent() {
        let publisher = BroadcastPublisher::new(8);
        publisher.publish("nobody", RealtimeEvent { title: "t".into(), message: "m".into() });
    }
}
