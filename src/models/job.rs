use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state_machine::JobStatus;

/// A customer job; the root of the part tree.
///
/// `status` and `current_cell_id` are written only by the propagation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub job_number: String,
    pub status: JobStatus,
    pub current_cell_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(job_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_number: job_number.into(),
            status: JobStatus::NotStarted,
            current_cell_id: None,
            due_date: None,
        }
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}
