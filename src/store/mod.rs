//! # Entity Store Adapter
//!
//! Point reads/writes and simple filtered queries over the production records.
//! The engine depends only on [`EntityStore`]; the persistent store behind it is
//! an external collaborator.
//!
//! Implementations must enforce two uniqueness rules at insert time rather than
//! leaving them to a check-then-write in the caller:
//!
//! - at most one open time entry (`end_time IS NULL`) per operator
//! - at most one active pause (`resumed_at IS NULL`) per time entry
//!
//! A violation is reported as [`StoreError::UniqueViolation`].

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Cell, Job, Operation, Part, TimeEntry, TimeEntryPause};

pub use memory::InMemoryEntityStore;
#[cfg(feature = "postgres")]
pub use postgres::PgEntityStore;

/// Constraint name for the one-open-timer-per-operator rule
pub const OPEN_TIMER_CONSTRAINT: &str = "ux_time_entries_one_open_per_operator";
/// Constraint name for the one-active-pause-per-entry rule
pub const ACTIVE_PAUSE_CONSTRAINT: &str = "ux_time_entry_pauses_one_active";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("No {table} row with id {id}")]
    RowNotFound { table: StoreTable, id: Uuid },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            // SQLSTATE 23505: unique_violation
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::UniqueViolation {
                    constraint: db_err.constraint().unwrap_or("unknown").to_string(),
                };
            }
        }
        StoreError::Database(err)
    }
}

/// Tables behind the store, used for error context and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreTable {
    Jobs,
    Parts,
    Operations,
    Cells,
    TimeEntries,
    TimeEntryPauses,
}

impl fmt::Display for StoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Jobs => "jobs",
            Self::Parts => "parts",
            Self::Operations => "operations",
            Self::Cells => "cells",
            Self::TimeEntries => "time_entries",
            Self::TimeEntryPauses => "time_entry_pauses",
        };
        f.write_str(name)
    }
}

/// CRUD and query contract over the production records
#[async_trait]
pub trait EntityStore: Send + Sync {
    // Jobs
    async fn get_job(&self, id: Uuid) -> StoreResult<Option<Job>>;
    async fn insert_job(&self, job: &Job) -> StoreResult<()>;
    /// Persist `status` and `current_cell_id`
    async fn update_job_progress(&self, job: &Job) -> StoreResult<()>;

    // Parts
    async fn get_part(&self, id: Uuid) -> StoreResult<Option<Part>>;
    async fn insert_part(&self, part: &Part) -> StoreResult<()>;
    /// Persist `status` and `current_cell_id`
    async fn update_part_progress(&self, part: &Part) -> StoreResult<()>;
    async fn set_part_parent(&self, part_id: Uuid, parent_part_id: Option<Uuid>) -> StoreResult<()>;
    async fn list_parts_for_job(&self, job_id: Uuid) -> StoreResult<Vec<Part>>;
    async fn list_child_parts(&self, parent_part_id: Uuid) -> StoreResult<Vec<Part>>;
    async fn count_parts(&self) -> StoreResult<u64>;

    // Operations
    async fn get_operation(&self, id: Uuid) -> StoreResult<Option<Operation>>;
    async fn insert_operation(&self, operation: &Operation) -> StoreResult<()>;
    /// Persist `status`, `assigned_operator_id`, `completed_at` and `completion_percentage`
    async fn update_operation_progress(&self, operation: &Operation) -> StoreResult<()>;
    /// Move a `not_started` operation to `in_progress`, assigning `operator_id`
    /// if nobody is assigned yet. Returns the updated row only for the caller
    /// that performed the transition; `None` when the operation had already left
    /// `not_started`.
    async fn mark_operation_started(&self, id: Uuid, operator_id: Uuid) -> StoreResult<Option<Operation>>;
    /// Atomically add `minutes` to `actual_time`
    async fn add_operation_actual_time(&self, id: Uuid, minutes: i32) -> StoreResult<()>;
    async fn list_operations_for_part(&self, part_id: Uuid) -> StoreResult<Vec<Operation>>;

    // Cells
    async fn get_cell(&self, id: Uuid) -> StoreResult<Option<Cell>>;
    async fn insert_cell(&self, cell: &Cell) -> StoreResult<()>;

    // Time entries
    async fn get_time_entry(&self, id: Uuid) -> StoreResult<Option<TimeEntry>>;
    /// Fails with `UniqueViolation` if the operator already has an open entry
    async fn insert_time_entry(&self, entry: &TimeEntry) -> StoreResult<()>;
    /// Persist `end_time`, `duration` and `is_paused`
    async fn update_time_entry(&self, entry: &TimeEntry) -> StoreResult<()>;
    async fn find_open_time_entry_for_operator(&self, operator_id: Uuid) -> StoreResult<Option<TimeEntry>>;
    async fn list_open_time_entries_for_operation(&self, operation_id: Uuid) -> StoreResult<Vec<TimeEntry>>;

    // Pauses
    /// Fails with `UniqueViolation` if the entry already has an active pause
    async fn insert_time_entry_pause(&self, pause: &TimeEntryPause) -> StoreResult<()>;
    /// Persist `resumed_at` and `duration`
    async fn update_time_entry_pause(&self, pause: &TimeEntryPause) -> StoreResult<()>;
    async fn find_active_pause(&self, time_entry_id: Uuid) -> StoreResult<Option<TimeEntryPause>>;
    async fn list_pauses(&self, time_entry_id: Uuid) -> StoreResult<Vec<TimeEntryPause>>;
}
