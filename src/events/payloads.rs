//! JSON payload builders for production events.

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::models::{Job, Operation, Part, TimeEntry};

pub fn operation_started(operation: &Operation, entry: &TimeEntry) -> Value {
    json!({
        "operation_id": operation.id,
        "operation_name": operation.operation_name,
        "part_id": operation.part_id,
        "cell_id": operation.cell_id,
        "operator_id": entry.operator_id,
        "time_entry_id": entry.id,
        "started_at": entry.start_time,
    })
}

pub fn operation_completed(operation: &Operation, completed_at: DateTime<Utc>) -> Value {
    json!({
        "operation_id": operation.id,
        "operation_name": operation.operation_name,
        "part_id": operation.part_id,
        "cell_id": operation.cell_id,
        "actual_time": operation.actual_time,
        "completed_at": completed_at,
    })
}

pub fn part_completed(part: &Part, completed_at: DateTime<Utc>) -> Value {
    json!({
        "part_id": part.id,
        "part_number": part.part_number,
        "job_id": part.job_id,
        "parent_part_id": part.parent_part_id,
        "completed_at": completed_at,
    })
}

pub fn job_transition(job: &Job, at: DateTime<Utc>) -> Value {
    json!({
        "job_id": job.id,
        "job_number": job.job_number,
        "status": job.status,
        "current_cell_id": job.current_cell_id,
        "transitioned_at": at,
    })
}
