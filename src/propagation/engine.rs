//! Status Propagation Engine
//!
//! Applies the roll-ups in [`super::rollup`] to the store in the fixed order
//! Operation, Part, Job. Any store failure aborts the remaining writes and is
//! returned as-is; retrying the triggering call recomputes from current state.

use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::cell_priority::CellSequences;
use super::rollup::{
    job_after_completion, job_after_start, part_after_completion, part_after_start, JobProgress,
    PartCompletionEffect, PartProgress,
};
use crate::clock::Clock;
use crate::constants::events;
use crate::error::{conflict, not_found, ProductionError, Result};
use crate::events::{notify_quietly, payloads, EventNotifier};
use crate::models::{Cell, Job, Operation, Part};
use crate::state_machine::{JobStatus, OperationStatus};
use crate::store::{EntityStore, StoreResult};

/// Part and job state after an "entered in progress" cascade
#[derive(Debug, Clone, PartialEq)]
pub struct StartCascade {
    pub part: Part,
    pub job: Job,
}

/// Result of completing an operation and cascading upwards
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionCascade {
    pub operation: Operation,
    pub part: Part,
    pub job: Job,
    pub part_completed: bool,
    pub job_completed: bool,
}

#[derive(Clone)]
pub struct StatusPropagationEngine {
    store: Arc<dyn EntityStore>,
    notifier: Arc<dyn EventNotifier>,
    clock: Arc<dyn Clock>,
}

impl StatusPropagationEngine {
    pub fn new(store: Arc<dyn EntityStore>, notifier: Arc<dyn EventNotifier>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            notifier,
            clock,
        }
    }

    /// Cascade for an operation that is in progress.
    ///
    /// The operation write has already been applied by the caller. Runs on every
    /// timer start; on consistent state the roll-ups change nothing, otherwise the
    /// part and job are brought up to date.
    pub async fn on_entered_in_progress(&self, operation: &Operation) -> Result<StartCascade> {
        let mut part = self.load_part(operation.part_id).await?;
        let part_operations = self.store.list_operations_for_part(part.id).await?;
        let sequences = self.cell_sequences(&part_operations).await?;

        let before = PartProgress::of(&part);
        let after = part_after_start(&part, operation, &part_operations, &sequences);
        if after != before {
            after.apply_to(&mut part);
            cascade_step("part", part.id, self.store.update_part_progress(&part).await)?;
            info!(
                part_id = %part.id,
                status = %part.status,
                current_cell_id = ?part.current_cell_id,
                "Part progress updated after operation start"
            );
        }

        let mut job = self.load_job(part.job_id).await?;
        let (_, job_operations) = self.job_work(job.id).await?;
        let job_sequences = self.cell_sequences(&job_operations).await?;

        let before = JobProgress::of(&job);
        let after = job_after_start(&job, &job_operations, &job_sequences);
        if after != before {
            after.apply_to(&mut job);
            cascade_step("job", job.id, self.store.update_job_progress(&job).await)?;
            info!(
                job_id = %job.id,
                status = %job.status,
                current_cell_id = ?job.current_cell_id,
                "Job progress updated after operation start"
            );
            if before.status == JobStatus::NotStarted && job.status == JobStatus::InProgress {
                notify_quietly(
                    self.notifier.as_ref(),
                    events::JOB_STARTED,
                    payloads::job_transition(&job, self.clock.now()),
                )
                .await;
            }
        }

        Ok(StartCascade { part, job })
    }

    /// Explicitly complete an operation and cascade to its part and job.
    ///
    /// Fails with `Conflict` while any timer on the operation is open. An
    /// operation that is already completed is not rewritten; the part and job
    /// roll-ups are recomputed, which reconciles a previously aborted cascade.
    pub async fn complete_operation(&self, operation_id: Uuid) -> Result<CompletionCascade> {
        let mut operation = self
            .store
            .get_operation(operation_id)
            .await?
            .ok_or_else(|| not_found("operation", operation_id))?;

        let open_entries = self.store.list_open_time_entries_for_operation(operation_id).await?;
        if let Some(open) = open_entries.first() {
            return Err(conflict(
                operation.id,
                operation.operation_name.clone(),
                format!(
                    "operator {} still has an open timer (time entry {}); stop it before completing",
                    open.operator_id, open.id
                ),
            ));
        }

        if operation.status.is_terminal() {
            debug!(
                operation_id = %operation.id,
                "Operation already completed; recomputing part and job"
            );
        } else {
            let now = self.clock.now();
            operation.status = OperationStatus::Completed;
            operation.completed_at = Some(now);
            operation.completion_percentage = 100;
            cascade_step(
                "operation",
                operation.id,
                self.store.update_operation_progress(&operation).await,
            )?;
            info!(
                operation_id = %operation.id,
                operation_name = %operation.operation_name,
                "Operation completed"
            );
            notify_quietly(
                self.notifier.as_ref(),
                events::OPERATION_COMPLETED,
                payloads::operation_completed(&operation, now),
            )
            .await;
        }

        self.propagate_completion(operation).await
    }

    async fn propagate_completion(&self, operation: Operation) -> Result<CompletionCascade> {
        let mut part = self.load_part(operation.part_id).await?;

        // Re-read after the operation write so concurrent completions see each other
        let part_operations = self.store.list_operations_for_part(part.id).await?;
        let sequences = self.cell_sequences(&part_operations).await?;

        let before = PartProgress::of(&part);
        let (after, effect) = part_after_completion(&part, &part_operations, &sequences);
        let part_completed = effect == PartCompletionEffect::Completed;
        if after != before {
            after.apply_to(&mut part);
            cascade_step("part", part.id, self.store.update_part_progress(&part).await)?;
            info!(
                part_id = %part.id,
                status = %part.status,
                current_cell_id = ?part.current_cell_id,
                "Part progress updated after operation completion"
            );
            if part_completed {
                notify_quietly(
                    self.notifier.as_ref(),
                    events::PART_COMPLETED,
                    payloads::part_completed(&part, self.clock.now()),
                )
                .await;
            }
        }

        let mut job = self.load_job(part.job_id).await?;
        let (job_parts, job_operations) = self.job_work(job.id).await?;
        let job_sequences = self.cell_sequences(&job_operations).await?;

        let before = JobProgress::of(&job);
        let after = job_after_completion(&job, effect, &job_parts, &job_operations, &job_sequences);
        let job_completed = after.status == JobStatus::Completed;
        if after != before {
            after.apply_to(&mut job);
            cascade_step("job", job.id, self.store.update_job_progress(&job).await)?;
            info!(
                job_id = %job.id,
                status = %job.status,
                current_cell_id = ?job.current_cell_id,
                "Job progress updated after operation completion"
            );
            if job_completed && !before.status.is_terminal() {
                notify_quietly(
                    self.notifier.as_ref(),
                    events::JOB_COMPLETED,
                    payloads::job_transition(&job, self.clock.now()),
                )
                .await;
            }
        }

        Ok(CompletionCascade {
            operation,
            part,
            job,
            part_completed,
            job_completed,
        })
    }

    async fn load_part(&self, part_id: Uuid) -> Result<Part> {
        self.store
            .get_part(part_id)
            .await?
            .ok_or_else(|| not_found("part", part_id))
    }

    async fn load_job(&self, job_id: Uuid) -> Result<Job> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or_else(|| not_found("job", job_id))
    }

    async fn load_cell(&self, cell_id: Uuid) -> Result<Cell> {
        self.store
            .get_cell(cell_id)
            .await?
            .ok_or_else(|| not_found("cell", cell_id))
    }

    /// Every part of a job and every operation under those parts
    async fn job_work(&self, job_id: Uuid) -> Result<(Vec<Part>, Vec<Operation>)> {
        let parts = self.store.list_parts_for_job(job_id).await?;
        let per_part = try_join_all(
            parts
                .iter()
                .map(|part| self.store.list_operations_for_part(part.id)),
        )
        .await?;
        Ok((parts, per_part.into_iter().flatten().collect()))
    }

    /// Sequences of the cells referenced by in-progress operations
    async fn cell_sequences(&self, operations: &[Operation]) -> Result<CellSequences> {
        let cell_ids: HashSet<Uuid> = operations
            .iter()
            .filter(|operation| operation.status.is_active())
            .map(|operation| operation.cell_id)
            .collect();

        let cells = try_join_all(cell_ids.into_iter().map(|cell_id| self.load_cell(cell_id))).await?;

        Ok(cells.into_iter().map(|cell| (cell.id, cell.sequence)).collect())
    }
}

/// Surface a failed cascade write, logging which level it stopped at
fn cascade_step(level: &'static str, id: Uuid, result: StoreResult<()>) -> Result<()> {
    result.map_err(|e| {
        error!(
            level = level,
            id = %id,
            error = %e,
            "Cascade write failed; remaining writes aborted"
        );
        ProductionError::from(e)
    })
}
