//! # Status Propagation
//!
//! Recomputes part and job status and current cell whenever an operation
//! enters in_progress or is completed.

pub mod cell_priority;
pub mod engine;
pub mod rollup;

pub use cell_priority::{frontier_cell, CellSequences};
pub use engine::{CompletionCascade, StartCascade, StatusPropagationEngine};
pub use rollup::{JobProgress, PartCompletionEffect, PartProgress, Progress};
