use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One operator's timer on one operation. `end_time == None` means open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TimeEntry {
    pub id: Uuid,
    pub operation_id: Uuid,
    pub operator_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Effective minutes, set when the entry is closed
    pub duration: Option<i32>,
    pub is_paused: bool,
}

impl TimeEntry {
    pub fn open(operation_id: Uuid, operator_id: Uuid, start_time: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            operation_id,
            operator_id,
            start_time,
            end_time: None,
            duration: None,
            is_paused: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

/// A pause interval inside a time entry. `resumed_at == None` means active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TimeEntryPause {
    pub id: Uuid,
    pub time_entry_id: Uuid,
    pub paused_at: DateTime<Utc>,
    pub resumed_at: Option<DateTime<Utc>>,
    /// Whole seconds, set on resume
    pub duration: Option<i32>,
}

impl TimeEntryPause {
    pub fn begin(time_entry_id: Uuid, paused_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            time_entry_id,
            paused_at,
            resumed_at: None,
            duration: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.resumed_at.is_none()
    }
}
