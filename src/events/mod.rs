//! # Event Notifier
//!
//! Fire-and-forget notifications on key production transitions. Implementations
//! must not block; the engine logs and discards any notification failure so a
//! transition is never rolled back because a listener misbehaved.

pub mod payloads;
pub mod publisher;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

pub use publisher::{EventPublisher, PublishError, PublishedEvent};

/// Sink for production events
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, event_type: &str, payload: Value) -> Result<(), PublishError>;
}

/// Deliver a notification, logging and swallowing any failure
pub async fn notify_quietly(notifier: &dyn EventNotifier, event_type: &str, payload: Value) {
    if let Err(e) = notifier.notify(event_type, payload).await {
        warn!(
            event_type = event_type,
            error = %e,
            "Event notification failed; continuing"
        );
    }
}
