use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;

use crate::clock::Clock;
use crate::events::{EventNotifier, PublishError};

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// 08:00 UTC on a fixed weekday
    pub fn at_shift_start() -> Self {
        Self::new(Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).single().unwrap_or_default())
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(Duration::minutes(minutes));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Notifier that keeps every event it receives, optionally passing each one on
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, Value)>>,
    downstream: Option<Arc<dyn EventNotifier>>,
}

impl std::fmt::Debug for RecordingNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingNotifier")
            .field("events", &self.events.lock().len())
            .field("forwarding", &self.downstream.is_some())
            .finish()
    }
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record, then hand each event to `downstream` and report its outcome
    pub fn forwarding_to(downstream: Arc<dyn EventNotifier>) -> Self {
        Self {
            events: Mutex::default(),
            downstream: Some(downstream),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.events.lock().iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events.lock().iter().filter(|(name, _)| name == event_type).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify(&self, event_type: &str, payload: Value) -> Result<(), PublishError> {
        self.events.lock().push((event_type.to_string(), payload.clone()));
        match &self.downstream {
            Some(downstream) => downstream.notify(event_type, payload).await,
            None => Ok(()),
        }
    }
}

/// Notifier that rejects everything
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl EventNotifier for FailingNotifier {
    async fn notify(&self, event_type: &str, _payload: Value) -> Result<(), PublishError> {
        Err(PublishError::Rejected {
            event_type: event_type.to_string(),
            reason: "listener unavailable".to_string(),
        })
    }
}
