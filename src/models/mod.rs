//! # Production Models
//!
//! Records owned by the entity store. The engine reads and writes them through
//! [`crate::store::EntityStore`] and never keeps copies beyond one operation.
//!
//! Hierarchy: `Job 1-* Part 1-* Operation 1-* TimeEntry 1-* TimeEntryPause`,
//! with `Part 0..1-* Part` forming the assembly forest.

pub mod cell;
pub mod job;
pub mod operation;
pub mod part;
pub mod time_entry;

pub use cell::Cell;
pub use job::Job;
pub use operation::Operation;
pub use part::Part;
pub use time_entry::{TimeEntry, TimeEntryPause};
