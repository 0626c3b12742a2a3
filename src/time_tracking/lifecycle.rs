//! Time Entry Lifecycle Manager
//!
//! `Idle -> Running -> Paused -> Running -> ... -> Closed` per operator and
//! operation. Starting work on an operation hands over to the propagation
//! engine; stop only books time and never changes operation status. Pause rows
//! are authoritative over the entry's `is_paused` flag, which is repaired when
//! the two disagree.

use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::accounting::{duration_minutes, effective_seconds, elapsed_seconds, total_pause_seconds};
use crate::clock::Clock;
use crate::constants::{events, status_groups};
use crate::error::{conflict, invalid_state, not_found, ProductionError, Result};
use crate::events::{notify_quietly, payloads, EventNotifier};
use crate::logging::log_timer_event;
use crate::models::{Operation, TimeEntry, TimeEntryPause};
use crate::propagation::{StartCascade, StatusPropagationEngine};
use crate::state_machine::OperationStatus;
use crate::store::EntityStore;

/// Outcome of starting a timer
#[derive(Debug, Clone, PartialEq)]
pub struct StartedTimer {
    pub entry: TimeEntry,
    pub operation: Operation,
    /// This start moved the operation out of `not_started`
    pub first_start: bool,
    /// Part and job state after the start roll-up; absent for on-hold operations
    pub cascade: Option<StartCascade>,
}

impl StartedTimer {
    pub fn is_first_start(&self) -> bool {
        self.first_start
    }
}

/// A time entry with its pauses and second-level totals
#[derive(Debug, Clone, PartialEq)]
pub struct TimeEntrySummary {
    pub entry: TimeEntry,
    pub pauses: Vec<TimeEntryPause>,
    pub paused_seconds: i64,
    /// Worked seconds so far, or in total for a closed entry
    pub effective_seconds: i64,
}

#[derive(Clone)]
pub struct TimeEntryLifecycle {
    store: Arc<dyn EntityStore>,
    engine: StatusPropagationEngine,
    notifier: Arc<dyn EventNotifier>,
    clock: Arc<dyn Clock>,
}

impl TimeEntryLifecycle {
    pub fn new(
        store: Arc<dyn EntityStore>,
        engine: StatusPropagationEngine,
        notifier: Arc<dyn EventNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            engine,
            notifier,
            clock,
        }
    }

    /// Open a timer for `operator_id` on `operation_id`
    pub async fn start(&self, operation_id: Uuid, operator_id: Uuid) -> Result<StartedTimer> {
        let mut operation = self.load_operation(operation_id).await?;

        if !status_groups::TIMEABLE_OPERATION_STATES.contains(&operation.status) {
            return Err(invalid_state(
                "operation",
                operation.id,
                format!(
                    "'{}' is {}; timers cannot be started on it",
                    operation.operation_name, operation.status
                ),
            ));
        }

        if let Some(open) = self.store.find_open_time_entry_for_operator(operator_id).await? {
            return Err(self.open_timer_conflict(&open).await);
        }

        let entry = TimeEntry::open(operation.id, operator_id, self.clock.now());
        if let Err(e) = self.store.insert_time_entry(&entry).await {
            // Lost a race against another start for the same operator
            if e.is_unique_violation() {
                if let Some(open) = self.store.find_open_time_entry_for_operator(operator_id).await? {
                    return Err(self.open_timer_conflict(&open).await);
                }
            }
            return Err(e.into());
        }

        // Only the caller that wins the not_started transition announces it
        let first_start = match self.store.mark_operation_started(operation.id, operator_id).await? {
            Some(started) => {
                operation = started;
                notify_quietly(
                    self.notifier.as_ref(),
                    events::OPERATION_STARTED,
                    payloads::operation_started(&operation, &entry),
                )
                .await;
                true
            }
            None => {
                operation = self.load_operation(operation.id).await?;
                false
            }
        };

        // Re-run on every start so a cascade aborted by a store failure is
        // completed by the next one; the roll-up is a no-op on consistent state
        let cascade = if operation.status == OperationStatus::InProgress {
            Some(self.engine.on_entered_in_progress(&operation).await?)
        } else {
            None
        };

        log_timer_event(
            "start",
            operator_id,
            operation.id,
            entry.id,
            if first_start { "first start" } else { "resumed work" },
        );

        Ok(StartedTimer {
            entry,
            operation,
            first_start,
            cascade,
        })
    }

    /// Pause a running timer.
    ///
    /// The pause rows are authoritative. An active pause left behind by a
    /// failed flag write is adopted and the flag is set.
    pub async fn pause(&self, time_entry_id: Uuid) -> Result<TimeEntryPause> {
        let mut entry = self.load_open_entry(time_entry_id).await?;

        let pause = match self.store.find_active_pause(entry.id).await? {
            Some(_) if entry.is_paused => {
                return Err(invalid_state("time_entry", entry.id, "timer is already paused"));
            }
            Some(active) => {
                warn!(time_entry_id = %entry.id, "Active pause without paused flag; completing pause");
                active
            }
            None => {
                let pause = TimeEntryPause::begin(entry.id, self.clock.now());
                match self.store.insert_time_entry_pause(&pause).await {
                    Err(e) if e.is_unique_violation() => {
                        return Err(invalid_state("time_entry", entry.id, "timer is already paused"));
                    }
                    other => other?,
                }
                pause
            }
        };

        entry.is_paused = true;
        self.store.update_time_entry(&entry).await?;

        log_timer_event("pause", entry.operator_id, entry.operation_id, entry.id, "paused");
        Ok(pause)
    }

    /// Resume a paused timer, closing its active pause.
    ///
    /// A paused flag left set after its pause was already closed is cleared,
    /// and the closed pause is returned.
    pub async fn resume(&self, time_entry_id: Uuid) -> Result<TimeEntryPause> {
        let mut entry = self.load_open_entry(time_entry_id).await?;

        let pause = match self.close_active_pause(&entry, self.clock.now()).await? {
            Some(closed) => closed,
            None if entry.is_paused => {
                warn!(time_entry_id = %entry.id, "Paused flag without active pause; clearing flag");
                self.store
                    .list_pauses(entry.id)
                    .await?
                    .pop()
                    .ok_or_else(|| invalid_state("time_entry", entry.id, "no pause is recorded"))?
            }
            None => return Err(invalid_state("time_entry", entry.id, "timer is not paused")),
        };

        entry.is_paused = false;
        self.store.update_time_entry(&entry).await?;

        log_timer_event("resume", entry.operator_id, entry.operation_id, entry.id, "resumed");
        Ok(pause)
    }

    /// Close the operator's timer on `operation_id` and book its effective minutes
    pub async fn stop(&self, operation_id: Uuid, operator_id: Uuid) -> Result<TimeEntrySummary> {
        let operation = self.load_operation(operation_id).await?;

        let mut entry = self
            .store
            .find_open_time_entry_for_operator(operator_id)
            .await?
            .filter(|entry| entry.operation_id == operation.id)
            .ok_or_else(|| {
                invalid_state(
                    "operation",
                    operation.id,
                    format!(
                        "operator {operator_id} has no open timer on '{}'",
                        operation.operation_name
                    ),
                )
            })?;

        let now = self.clock.now();
        if self.close_active_pause(&entry, now).await?.is_some() {
            debug!(time_entry_id = %entry.id, "Closed active pause before stop");
        }

        let pauses = self.store.list_pauses(entry.id).await?;
        let paused_seconds = total_pause_seconds(&pauses, now);
        let effective = effective_seconds(entry.start_time, now, &pauses);
        let minutes = duration_minutes(effective);

        entry.end_time = Some(now);
        entry.duration = Some(minutes);
        entry.is_paused = false;
        self.store.update_time_entry(&entry).await?;
        self.store.add_operation_actual_time(operation.id, minutes).await?;

        info!(
            time_entry_id = %entry.id,
            operation_id = %operation.id,
            operator_id = %operator_id,
            effective_seconds = effective,
            duration_minutes = minutes,
            pauses = pauses.len(),
            "Timer stopped"
        );
        log_timer_event("stop", operator_id, operation.id, entry.id, "stopped");

        Ok(TimeEntrySummary {
            entry,
            pauses,
            paused_seconds,
            effective_seconds: effective,
        })
    }

    /// The operator's open timer, if any
    pub async fn active_timer(&self, operator_id: Uuid) -> Result<Option<TimeEntrySummary>> {
        match self.store.find_open_time_entry_for_operator(operator_id).await? {
            Some(entry) => Ok(Some(self.summarize(entry).await?)),
            None => Ok(None),
        }
    }

    pub async fn summary(&self, time_entry_id: Uuid) -> Result<TimeEntrySummary> {
        let entry = self
            .store
            .get_time_entry(time_entry_id)
            .await?
            .ok_or_else(|| not_found("time_entry", time_entry_id))?;
        self.summarize(entry).await
    }

    async fn summarize(&self, entry: TimeEntry) -> Result<TimeEntrySummary> {
        let until = entry.end_time.unwrap_or_else(|| self.clock.now());
        let pauses = self.store.list_pauses(entry.id).await?;
        Ok(TimeEntrySummary {
            paused_seconds: total_pause_seconds(&pauses, until),
            effective_seconds: effective_seconds(entry.start_time, until, &pauses),
            entry,
            pauses,
        })
    }

    /// Close the entry's active pause at `now`, if there is one
    async fn close_active_pause(
        &self,
        entry: &TimeEntry,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<TimeEntryPause>> {
        let Some(mut pause) = self.store.find_active_pause(entry.id).await? else {
            return Ok(None);
        };

        let seconds = elapsed_seconds(pause.paused_at, now);
        pause.resumed_at = Some(now);
        pause.duration = Some(i32::try_from(seconds).unwrap_or(i32::MAX));
        self.store.update_time_entry_pause(&pause).await?;
        Ok(Some(pause))
    }

    async fn load_operation(&self, operation_id: Uuid) -> Result<Operation> {
        self.store
            .get_operation(operation_id)
            .await?
            .ok_or_else(|| not_found("operation", operation_id))
    }

    async fn load_open_entry(&self, time_entry_id: Uuid) -> Result<TimeEntry> {
        let entry = self
            .store
            .get_time_entry(time_entry_id)
            .await?
            .ok_or_else(|| not_found("time_entry", time_entry_id))?;
        if !entry.is_open() {
            return Err(invalid_state("time_entry", entry.id, "timer is already stopped"));
        }
        Ok(entry)
    }

    /// Conflict naming the operation the operator is already timing
    async fn open_timer_conflict(&self, open: &TimeEntry) -> ProductionError {
        let operation_name = match self.store.get_operation(open.operation_id).await {
            Ok(Some(operation)) => operation.operation_name,
            _ => "unknown operation".to_string(),
        };
        conflict(
            open.operation_id,
            operation_name,
            format!(
                "operator {} already has an open timer (time entry {}); stop it first",
                open.operator_id, open.id
            ),
        )
    }
}
