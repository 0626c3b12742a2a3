#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Shopfloor Core Rust
//!
//! Production state propagation and time-tracking engine for jobs moving
//! through manufacturing cells.
//!
//! ## Overview
//!
//! A job is made of parts, and each part is worked through a sequence of
//! operations, one per cell. Operators clock time against operations with
//! timers that can be paused and resumed. Starting and completing operations
//! cascades status and "current cell" changes up to the part and the job.
//!
//! ## Module Organization
//!
//! - [`time_tracking`] - Timer lifecycle and pause accounting
//! - [`propagation`] - Operation to part to job status cascade
//! - [`hierarchy`] - Assembly links between parts with cycle protection
//! - [`service`] - The service contract callers use
//! - [`store`] - Entity store port with PostgreSQL and in-memory adapters
//! - [`events`] - Fire-and-forget event notification
//! - [`models`] - Jobs, parts, operations, cells, time entries
//! - [`state_machine`] - Job, part and operation statuses
//! - [`config`] - Layered configuration
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shopfloor_core::bootstrap::bootstrap;
//! use uuid::Uuid;
//!
//! # async fn example(operation_id: Uuid, operator_id: Uuid) -> anyhow::Result<()> {
//! let system = bootstrap().await?;
//!
//! let started = system.service.start_timer(operation_id, operator_id).await?;
//! system.service.pause_timer(started.entry.id).await?;
//! system.service.resume_timer(started.entry.id).await?;
//! let stopped = system.service.stop_timer(operation_id, operator_id).await?;
//! println!("booked {:?} minutes", stopped.entry.duration);
//!
//! system.service.complete_operation(operation_id).await?;
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod logging;
pub mod models;
pub mod propagation;
pub mod service;
pub mod state_machine;
pub mod store;
pub mod test_helpers;
pub mod time_tracking;

pub use clock::{Clock, SystemClock};
pub use config::{ConfigLoader, ShopfloorConfig};
pub use error::{ProductionError, Result};
pub use events::{EventNotifier, EventPublisher};
pub use hierarchy::{AssemblyHierarchy, AssemblyNode, DependencyStatus, IncompleteChild};
pub use models::{Cell, Job, Operation, Part, TimeEntry, TimeEntryPause};
pub use propagation::{CompletionCascade, StartCascade, StatusPropagationEngine};
pub use service::ProductionService;
pub use state_machine::{JobStatus, OperationStatus, PartStatus};
pub use store::{EntityStore, StoreError};
pub use time_tracking::{StartedTimer, TimeEntryLifecycle, TimeEntrySummary};
