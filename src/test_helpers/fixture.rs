use std::sync::Arc;
use uuid::Uuid;

use super::doubles::{ManualClock, RecordingNotifier};
use crate::events::EventNotifier;
use crate::models::{Cell, Job, Operation, Part};
use crate::service::ProductionService;
use crate::store::memory::InMemoryEntityStore;
use crate::store::{EntityStore, StoreResult};

/// An in-memory shop floor with a controllable clock
pub struct ProductionFixture {
    pub store: Arc<InMemoryEntityStore>,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: ProductionService,
}

impl ProductionFixture {
    pub fn new() -> Self {
        Self::with_recorder(RecordingNotifier::new())
    }

    /// Record events, then deliver them to `downstream`
    pub fn with_downstream(downstream: Arc<dyn EventNotifier>) -> Self {
        Self::with_recorder(RecordingNotifier::forwarding_to(downstream))
    }

    fn with_recorder(notifier: RecordingNotifier) -> Self {
        let notifier = Arc::new(notifier);
        let store = Arc::new(InMemoryEntityStore::new());
        let clock = Arc::new(ManualClock::at_shift_start());
        let service = ProductionService::with_clock(store.clone(), notifier.clone(), clock.clone());
        Self {
            store,
            clock,
            notifier,
            service,
        }
    }

    pub async fn job(&self, job_number: &str) -> StoreResult<Job> {
        let job = Job::new(job_number);
        self.store.insert_job(&job).await?;
        Ok(job)
    }

    pub async fn part(&self, job: &Job, part_number: &str) -> StoreResult<Part> {
        let part = Part::new(job.id, part_number);
        self.store.insert_part(&part).await?;
        Ok(part)
    }

    pub async fn cell(&self, name: &str, sequence: i32) -> StoreResult<Cell> {
        let cell = Cell::new(name, sequence);
        self.store.insert_cell(&cell).await?;
        Ok(cell)
    }

    pub async fn operation(&self, part: &Part, cell: &Cell, name: &str, sequence: i32) -> StoreResult<Operation> {
        let operation = Operation::new(part.id, cell.id, name, sequence);
        self.store.insert_operation(&operation).await?;
        Ok(operation)
    }

    pub async fn reload_operation(&self, id: Uuid) -> StoreResult<Option<Operation>> {
        self.store.get_operation(id).await
    }

    pub async fn reload_part(&self, id: Uuid) -> StoreResult<Option<Part>> {
        self.store.get_part(id).await
    }

    pub async fn reload_job(&self, id: Uuid) -> StoreResult<Option<Job>> {
        self.store.get_job(id).await
    }
}

impl Default for ProductionFixture {
    fn default() -> Self {
        Self::new()
    }
}
