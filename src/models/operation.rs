use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state_machine::OperationStatus;

/// One unit of work on a part, performed at a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Operation {
    pub id: Uuid,
    pub part_id: Uuid,
    pub cell_id: Uuid,
    pub operation_name: String,
    /// Processing order within the part
    pub sequence: i32,
    pub status: OperationStatus,
    /// Minutes
    pub estimated_time: i32,
    /// Cumulative effective minutes across all closed time entries
    pub actual_time: i32,
    pub assigned_operator_id: Option<Uuid>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completion_percentage: i32,
}

impl Operation {
    pub fn new(part_id: Uuid, cell_id: Uuid, operation_name: impl Into<String>, sequence: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            part_id,
            cell_id,
            operation_name: operation_name.into(),
            sequence,
            status: OperationStatus::NotStarted,
            estimated_time: 0,
            actual_time: 0,
            assigned_operator_id: None,
            completed_at: None,
            completion_percentage: 0,
        }
    }

    pub fn with_estimated_time(mut self, minutes: i32) -> Self {
        self.estimated_time = minutes;
        self
    }

    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }
}
