use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::EventNotifier;

/// In-process broadcast publisher for production events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<PublishedEvent>,
}

/// Event that has been published
#[derive(Debug, Clone)]
pub struct PublishedEvent {
    pub name: String,
    pub payload: Value,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event with the given name and payload
    pub fn publish(&self, event_name: impl Into<String>, payload: Value) -> Result<(), PublishError> {
        let event = PublishedEvent {
            name: event_name.into(),
            payload,
            published_at: chrono::Utc::now(),
        };

        // send() only fails when nobody is subscribed, which is not an error here
        match self.sender.send(event) {
            Ok(_) => Ok(()),
            Err(broadcast::error::SendError(_)) => Ok(()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventNotifier for EventPublisher {
    async fn notify(&self, event_type: &str, payload: Value) -> Result<(), PublishError> {
        self.publish(event_type, payload)
    }
}

/// Error types for event publishing
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Event sink rejected {event_type}: {reason}")]
    Rejected { event_type: String, reason: String },
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::new(8);
        assert_eq!(publisher.subscriber_count(), 0);
        assert!(publisher.publish("operation.started", json!({})).is_ok());
    }

    #[tokio::test]
    async fn test_subscriber_receives_notification() {
        let publisher = EventPublisher::new(8);
        let mut receiver = publisher.subscribe();

        publisher
            .notify("part.completed", json!({ "part_id": "p-1" }))
            .await
            .unwrap();

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.name, "part.completed");
        assert_eq!(event.payload["part_id"], "p-1");
    }
}
