//! Pure per-level recomputation.
//!
//! Each function takes the authoritative child set as read from the store and
//! returns the new parent progress. Nothing here applies deltas, so running a
//! roll-up again on unchanged input yields the same answer.

use uuid::Uuid;

use super::cell_priority::{frontier_cell, CellSequences};
use crate::models::{Job, Operation, Part};
use crate::constants::status_groups::REMAINING_OPERATION_STATES;
use crate::state_machine::{JobStatus, PartStatus};

/// Status and current cell of a part or job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<S> {
    pub status: S,
    pub current_cell_id: Option<Uuid>,
}

pub type PartProgress = Progress<PartStatus>;
pub type JobProgress = Progress<JobStatus>;

impl PartProgress {
    pub fn of(part: &Part) -> Self {
        Self {
            status: part.status,
            current_cell_id: part.current_cell_id,
        }
    }

    pub fn apply_to(&self, part: &mut Part) {
        part.status = self.status;
        part.current_cell_id = self.current_cell_id;
    }
}

impl JobProgress {
    pub fn of(job: &Job) -> Self {
        Self {
            status: job.status,
            current_cell_id: job.current_cell_id,
        }
    }

    pub fn apply_to(&self, job: &mut Job) {
        job.status = self.status;
        job.current_cell_id = self.current_cell_id;
    }
}

/// What completing an operation did to its part
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartCompletionEffect {
    /// No operation of the part remains
    Completed,
    /// Work remains and some of it is in progress
    FrontierMoved,
    /// Work remains but none of it is in progress; progress left untouched
    NoActiveWork,
}

/// Part roll-up after `trigger` entered in progress
pub fn part_after_start(
    part: &Part,
    trigger: &Operation,
    part_operations: &[Operation],
    sequences: &CellSequences,
) -> PartProgress {
    if part.status == PartStatus::NotStarted {
        return PartProgress {
            status: PartStatus::InProgress,
            current_cell_id: Some(trigger.cell_id),
        };
    }

    if part.current_cell_id != Some(trigger.cell_id) {
        return PartProgress {
            status: part.status,
            current_cell_id: frontier_cell(part_operations, sequences).or(part.current_cell_id),
        };
    }

    PartProgress::of(part)
}

/// Job roll-up after one of its operations entered in progress
pub fn job_after_start(job: &Job, job_operations: &[Operation], sequences: &CellSequences) -> JobProgress {
    let status = if job.status == JobStatus::NotStarted {
        JobStatus::InProgress
    } else {
        job.status
    };

    JobProgress {
        status,
        current_cell_id: frontier_cell(job_operations, sequences).or(job.current_cell_id),
    }
}

/// Part roll-up after one of its operations was completed
pub fn part_after_completion(
    part: &Part,
    part_operations: &[Operation],
    sequences: &CellSequences,
) -> (PartProgress, PartCompletionEffect) {
    let remaining: Vec<&Operation> = part_operations
        .iter()
        .filter(|operation| REMAINING_OPERATION_STATES.contains(&operation.status))
        .collect();

    if remaining.is_empty() {
        let progress = PartProgress {
            status: PartStatus::Completed,
            current_cell_id: None,
        };
        return (progress, PartCompletionEffect::Completed);
    }

    match frontier_cell(remaining.iter().copied(), sequences) {
        Some(cell_id) => (
            PartProgress {
                status: part.status,
                current_cell_id: Some(cell_id),
            },
            PartCompletionEffect::FrontierMoved,
        ),
        None => (PartProgress::of(part), PartCompletionEffect::NoActiveWork),
    }
}

/// Job roll-up after a part roll-up with the given effect.
///
/// `job_parts` must already reflect the part write.
pub fn job_after_completion(
    job: &Job,
    effect: PartCompletionEffect,
    job_parts: &[Part],
    job_operations: &[Operation],
    sequences: &CellSequences,
) -> JobProgress {
    match effect {
        PartCompletionEffect::Completed
            if job_parts.iter().all(|part| part.status.is_terminal()) =>
        {
            JobProgress {
                status: JobStatus::Completed,
                current_cell_id: None,
            }
        }
        PartCompletionEffect::Completed | PartCompletionEffect::FrontierMoved => JobProgress {
            status: job.status,
            current_cell_id: frontier_cell(job_operations, sequences),
        },
        PartCompletionEffect::NoActiveWork => JobProgress::of(job),
    }
}
