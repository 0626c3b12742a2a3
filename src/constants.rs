//! # System Constants
//!
//! Event names and status groupings shared by the lifecycle manager and the
//! propagation engine.

pub use crate::state_machine::{JobStatus, OperationStatus, PartStatus};

/// Production events delivered through the event notifier
pub mod events {
    pub const OPERATION_STARTED: &str = "operation.started";
    pub const OPERATION_COMPLETED: &str = "operation.completed";
    pub const PART_COMPLETED: &str = "part.completed";
    pub const JOB_STARTED: &str = "job.started";
    pub const JOB_COMPLETED: &str = "job.completed";
}

/// Status groupings for validation and logic
pub mod status_groups {
    use super::OperationStatus;

    /// Operation statuses a timer may be started on
    pub const TIMEABLE_OPERATION_STATES: &[OperationStatus] = &[
        OperationStatus::NotStarted,
        OperationStatus::InProgress,
        OperationStatus::OnHold,
    ];

    /// Operation statuses that still count as remaining work on a part
    pub const REMAINING_OPERATION_STATES: &[OperationStatus] = &[
        OperationStatus::NotStarted,
        OperationStatus::InProgress,
        OperationStatus::OnHold,
    ];
}

/// Time accounting units
pub mod units {
    pub const SECONDS_PER_MINUTE: i64 = 60;
}
