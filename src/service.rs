//! # Production Service
//!
//! The service contract offered to UI and API callers. Every call takes plain
//! identifiers and returns a result object or a typed [`ProductionError`].
//!
//! [`ProductionError`]: crate::error::ProductionError

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::EventNotifier;
use crate::hierarchy::{AssemblyHierarchy, AssemblyNode, DependencyStatus};
use crate::models::{Part, TimeEntryPause};
use crate::propagation::{CompletionCascade, StatusPropagationEngine};
use crate::store::EntityStore;
use crate::time_tracking::{StartedTimer, TimeEntryLifecycle, TimeEntrySummary};

#[derive(Clone)]
pub struct ProductionService {
    timers: TimeEntryLifecycle,
    propagation: StatusPropagationEngine,
    hierarchy: AssemblyHierarchy,
}

impl ProductionService {
    /// Wire the engine onto a store and notifier using the system clock
    pub fn new(store: Arc<dyn EntityStore>, notifier: Arc<dyn EventNotifier>) -> Self {
        Self::with_clock(store, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn EntityStore>,
        notifier: Arc<dyn EventNotifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let propagation = StatusPropagationEngine::new(store.clone(), notifier.clone(), clock.clone());
        let timers = TimeEntryLifecycle::new(store.clone(), propagation.clone(), notifier, clock);
        let hierarchy = AssemblyHierarchy::new(store);
        Self {
            timers,
            propagation,
            hierarchy,
        }
    }

    #[instrument(skip(self))]
    pub async fn start_timer(&self, operation_id: Uuid, operator_id: Uuid) -> Result<StartedTimer> {
        self.timers.start(operation_id, operator_id).await
    }

    #[instrument(skip(self))]
    pub async fn pause_timer(&self, time_entry_id: Uuid) -> Result<TimeEntryPause> {
        self.timers.pause(time_entry_id).await
    }

    #[instrument(skip(self))]
    pub async fn resume_timer(&self, time_entry_id: Uuid) -> Result<TimeEntryPause> {
        self.timers.resume(time_entry_id).await
    }

    #[instrument(skip(self))]
    pub async fn stop_timer(&self, operation_id: Uuid, operator_id: Uuid) -> Result<TimeEntrySummary> {
        self.timers.stop(operation_id, operator_id).await
    }

    #[instrument(skip(self))]
    pub async fn active_timer(&self, operator_id: Uuid) -> Result<Option<TimeEntrySummary>> {
        self.timers.active_timer(operator_id).await
    }

    #[instrument(skip(self))]
    pub async fn time_entry_summary(&self, time_entry_id: Uuid) -> Result<TimeEntrySummary> {
        self.timers.summary(time_entry_id).await
    }

    #[instrument(skip(self))]
    pub async fn complete_operation(&self, operation_id: Uuid) -> Result<CompletionCascade> {
        self.propagation.complete_operation(operation_id).await
    }

    #[instrument(skip(self))]
    pub async fn set_parent_part(&self, child_id: Uuid, parent_id: Uuid) -> Result<Part> {
        self.hierarchy.set_parent(child_id, parent_id).await
    }

    #[instrument(skip(self))]
    pub async fn remove_parent_part(&self, child_id: Uuid) -> Result<Part> {
        self.hierarchy.remove_parent(child_id).await
    }

    #[instrument(skip(self))]
    pub async fn children_of(&self, part_id: Uuid) -> Result<Vec<Part>> {
        self.hierarchy.children_of(part_id).await
    }

    #[instrument(skip(self))]
    pub async fn dependency_status(&self, part_id: Uuid) -> Result<DependencyStatus> {
        self.hierarchy.dependency_status(part_id).await
    }

    #[instrument(skip(self))]
    pub async fn assembly_tree(&self, part_id: Uuid) -> Result<Vec<AssemblyNode>> {
        self.hierarchy.assembly_tree(part_id).await
    }
}
