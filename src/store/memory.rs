//! In-process [`EntityStore`] used by tests and embedded deployments.
//!
//! Job, part, operation and cell rows live in `DashMap`s, giving row-level
//! locking. Time entries and pauses share one mutex so the uniqueness checks
//! run atomically with the insert, matching the partial unique indexes of the
//! Postgres schema.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::{
    EntityStore, StoreError, StoreResult, StoreTable, ACTIVE_PAUSE_CONSTRAINT,
    OPEN_TIMER_CONSTRAINT,
};
use crate::models::{Cell, Job, Operation, Part, TimeEntry, TimeEntryPause};
use crate::state_machine::OperationStatus;

#[derive(Debug, Default)]
struct TimerTables {
    entries: HashMap<Uuid, TimeEntry>,
    pauses: HashMap<Uuid, TimeEntryPause>,
}

#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    jobs: DashMap<Uuid, Job>,
    parts: DashMap<Uuid, Part>,
    operations: DashMap<Uuid, Operation>,
    cells: DashMap<Uuid, Cell>,
    timers: Mutex<TimerTables>,
    failing_writes: RwLock<HashSet<StoreTable>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write to `table` fail with `StoreError::Unavailable`
    pub fn fail_writes_to(&self, table: StoreTable) {
        self.failing_writes.write().insert(table);
    }

    /// Clear all injected write failures
    pub fn heal(&self) {
        self.failing_writes.write().clear();
    }

    fn check_writable(&self, table: StoreTable) -> StoreResult<()> {
        if self.failing_writes.read().contains(&table) {
            return Err(StoreError::Unavailable(format!(
                "writes to {table} are failing"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        Ok(self.jobs.get(&id).map(|row| row.value().clone()))
    }

    async fn insert_job(&self, job: &Job) -> StoreResult<()> {
        self.check_writable(StoreTable::Jobs)?;
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn update_job_progress(&self, job: &Job) -> StoreResult<()> {
        self.check_writable(StoreTable::Jobs)?;
        let mut row = self.jobs.get_mut(&job.id).ok_or(StoreError::RowNotFound {
            table: StoreTable::Jobs,
            id: job.id,
        })?;
        row.status = job.status;
        row.current_cell_id = job.current_cell_id;
        Ok(())
    }

    async fn get_part(&self, id: Uuid) -> StoreResult<Option<Part>> {
        Ok(self.parts.get(&id).map(|row| row.value().clone()))
    }

    async fn insert_part(&self, part: &Part) -> StoreResult<()> {
        self.check_writable(StoreTable::Parts)?;
        self.parts.insert(part.id, part.clone());
        Ok(())
    }

    async fn update_part_progress(&self, part: &Part) -> StoreResult<()> {
        self.check_writable(StoreTable::Parts)?;
        let mut row = self.parts.get_mut(&part.id).ok_or(StoreError::RowNotFound {
            table: StoreTable::Parts,
            id: part.id,
        })?;
        row.status = part.status;
        row.current_cell_id = part.current_cell_id;
        Ok(())
    }

    async fn set_part_parent(&self, part_id: Uuid, parent_part_id: Option<Uuid>) -> StoreResult<()> {
        self.check_writable(StoreTable::Parts)?;
        let mut row = self.parts.get_mut(&part_id).ok_or(StoreError::RowNotFound {
            table: StoreTable::Parts,
            id: part_id,
        })?;
        row.parent_part_id = parent_part_id;
        Ok(())
    }

    async fn list_parts_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Part>> {
        let mut parts: Vec<Part> = self
            .parts
            .iter()
            .filter(|row| row.job_id == job_id)
            .map(|row| row.value().clone())
            .collect();
        parts.sort_by(|a, b| a.part_number.cmp(&b.part_number).then(a.id.cmp(&b.id)));
        Ok(parts)
    }

    async fn list_child_parts(&self, parent_part_id: Uuid) -> StoreResult<Vec<Part>> {
        let mut parts: Vec<Part> = self
            .parts
            .iter()
            .filter(|row| row.parent_part_id == Some(parent_part_id))
            .map(|row| row.value().clone())
            .collect();
        parts.sort_by(|a, b| a.part_number.cmp(&b.part_number).then(a.id.cmp(&b.id)));
        Ok(parts)
    }

    async fn count_parts(&self) -> StoreResult<u64> {
        Ok(self.parts.len() as u64)
    }

    async fn get_operation(&self, id: Uuid) -> StoreResult<Option<Operation>> {
        Ok(self.operations.get(&id).map(|row| row.value().clone()))
    }

    async fn insert_operation(&self, operation: &Operation) -> StoreResult<()> {
        self.check_writable(StoreTable::Operations)?;
        self.operations.insert(operation.id, operation.clone());
        Ok(())
    }

    async fn update_operation_progress(&self, operation: &Operation) -> StoreResult<()> {
        self.check_writable(StoreTable::Operations)?;
        let mut row = self
            .operations
            .get_mut(&operation.id)
            .ok_or(StoreError::RowNotFound {
                table: StoreTable::Operations,
                id: operation.id,
            })?;
        row.status = operation.status;
        row.assigned_operator_id = operation.assigned_operator_id;
        row.completed_at = operation.completed_at;
        row.completion_percentage = operation.completion_percentage;
        Ok(())
    }

    async fn mark_operation_started(&self, id: Uuid, operator_id: Uuid) -> StoreResult<Option<Operation>> {
        self.check_writable(StoreTable::Operations)?;
        // Check and set under the row's shard lock
        let mut row = self.operations.get_mut(&id).ok_or(StoreError::RowNotFound {
            table: StoreTable::Operations,
            id,
        })?;
        if row.status != OperationStatus::NotStarted {
            return Ok(None);
        }
        row.status = OperationStatus::InProgress;
        row.assigned_operator_id.get_or_insert(operator_id);
        Ok(Some(row.value().clone()))
    }

    async fn add_operation_actual_time(&self, id: Uuid, minutes: i32) -> StoreResult<()> {
        self.check_writable(StoreTable::Operations)?;
        let mut row = self.operations.get_mut(&id).ok_or(StoreError::RowNotFound {
            table: StoreTable::Operations,
            id,
        })?;
        row.actual_time += minutes;
        Ok(())
    }

    async fn list_operations_for_part(&self, part_id: Uuid) -> StoreResult<Vec<Operation>> {
        let mut operations: Vec<Operation> = self
            .operations
            .iter()
            .filter(|row| row.part_id == part_id)
            .map(|row| row.value().clone())
            .collect();
        operations.sort_by(|a, b| a.sequence.cmp(&b.sequence).then(a.id.cmp(&b.id)));
        Ok(operations)
    }

    async fn get_cell(&self, id: Uuid) -> StoreResult<Option<Cell>> {
        Ok(self.cells.get(&id).map(|row| row.value().clone()))
    }

    async fn insert_cell(&self, cell: &Cell) -> StoreResult<()> {
        self.check_writable(StoreTable::Cells)?;
        self.cells.insert(cell.id, cell.clone());
        Ok(())
    }

    async fn get_time_entry(&self, id: Uuid) -> StoreResult<Option<TimeEntry>> {
        Ok(self.timers.lock().entries.get(&id).cloned())
    }

    async fn insert_time_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        self.check_writable(StoreTable::TimeEntries)?;
        let mut timers = self.timers.lock();
        if entry.is_open()
            && timers
                .entries
                .values()
                .any(|existing| existing.operator_id == entry.operator_id && existing.is_open())
        {
            return Err(StoreError::UniqueViolation {
                constraint: OPEN_TIMER_CONSTRAINT.to_string(),
            });
        }
        timers.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> StoreResult<()> {
        self.check_writable(StoreTable::TimeEntries)?;
        let mut timers = self.timers.lock();
        let row = timers.entries.get_mut(&entry.id).ok_or(StoreError::RowNotFound {
            table: StoreTable::TimeEntries,
            id: entry.id,
        })?;
        row.end_time = entry.end_time;
        row.duration = entry.duration;
        row.is_paused = entry.is_paused;
        Ok(())
    }

    async fn find_open_time_entry_for_operator(&self, operator_id: Uuid) -> StoreResult<Option<TimeEntry>> {
        Ok(self
            .timers
            .lock()
            .entries
            .values()
            .find(|entry| entry.operator_id == operator_id && entry.is_open())
            .cloned())
    }

    async fn list_open_time_entries_for_operation(&self, operation_id: Uuid) -> StoreResult<Vec<TimeEntry>> {
        let mut entries: Vec<TimeEntry> = self
            .timers
            .lock()
            .entries
            .values()
            .filter(|entry| entry.operation_id == operation_id && entry.is_open())
            .cloned()
            .collect();
        entries.sort_by_key(|entry| entry.start_time);
        Ok(entries)
    }

    async fn insert_time_entry_pause(&self, pause: &TimeEntryPause) -> StoreResult<()> {
        self.check_writable(StoreTable::TimeEntryPauses)?;
        let mut timers = self.timers.lock();
        if pause.is_active()
            && timers
                .pauses
                .values()
                .any(|existing| existing.time_entry_id == pause.time_entry_id && existing.is_active())
        {
            return Err(StoreError::UniqueViolation {
                constraint: ACTIVE_PAUSE_CONSTRAINT.to_string(),
            });
        }
        timers.pauses.insert(pause.id, pause.clone());
        Ok(())
    }

    async fn update_time_entry_pause(&self, pause: &TimeEntryPause) -> StoreResult<()> {
        self.check_writable(StoreTable::TimeEntryPauses)?;
        let mut timers = self.timers.lock();
        let row = timers.pauses.get_mut(&pause.id).ok_or(StoreError::RowNotFound {
            table: StoreTable::TimeEntryPauses,
            id: pause.id,
        })?;
        row.resumed_at = pause.resumed_at;
        row.duration = pause.duration;
        Ok(())
    }

    async fn find_active_pause(&self, time_entry_id: Uuid) -> StoreResult<Option<TimeEntryPause>> {
        Ok(self
            .timers
            .lock()
            .pauses
            .values()
            .find(|pause| pause.time_entry_id == time_entry_id && pause.is_active())
            .cloned())
    }

    async fn list_pauses(&self, time_entry_id: Uuid) -> StoreResult<Vec<TimeEntryPause>> {
        let mut pauses: Vec<TimeEntryPause> = self
            .timers
            .lock()
            .pauses
            .values()
            .filter(|pause| pause.time_entry_id == time_entry_id)
            .cloned()
            .collect();
        pauses.sort_by_key(|pause| pause.paused_at);
        Ok(pauses)
    }
}
