//! # Time Tracking
//!
//! Operator timers on operations and their pause accounting.

pub mod accounting;
pub mod lifecycle;

pub use lifecycle::{StartedTimer, TimeEntryLifecycle, TimeEntrySummary};
