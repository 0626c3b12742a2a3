use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::state_machine::PartStatus;

/// A part of a job. `parent_part_id` links a sub-component to its assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Part {
    pub id: Uuid,
    pub job_id: Uuid,
    pub part_number: String,
    pub parent_part_id: Option<Uuid>,
    pub status: PartStatus,
    pub current_cell_id: Option<Uuid>,
}

impl Part {
    pub fn new(job_id: Uuid, part_number: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_id,
            part_number: part_number.into(),
            parent_part_id: None,
            status: PartStatus::NotStarted,
            current_cell_id: None,
        }
    }

    pub fn with_parent(mut self, parent_part_id: Uuid) -> Self {
        self.parent_part_id = Some(parent_part_id);
        self
    }
}
