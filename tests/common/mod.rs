//! Shared scenario setup for integration tests.

#![allow(dead_code)]

pub mod strategies;

use shopfloor_core::models::{Cell, Job, Operation, Part};
use shopfloor_core::test_helpers::ProductionFixture;
use uuid::Uuid;

/// One job with one part routed through three cells
pub struct SingleRoute {
    pub fixture: ProductionFixture,
    pub job: Job,
    pub part: Part,
    pub saw: Cell,
    pub weld: Cell,
    pub paint: Cell,
    pub cut: Operation,
    pub join: Operation,
    pub coat: Operation,
}

impl SingleRoute {
    pub async fn build() -> Self {
        let fixture = ProductionFixture::new();
        let job = fixture.job("J-1001").await.unwrap();
        let part = fixture.part(&job, "FRAME-01").await.unwrap();
        let saw = fixture.cell("Saw", 10).await.unwrap();
        let weld = fixture.cell("Weld", 20).await.unwrap();
        let paint = fixture.cell("Paint", 30).await.unwrap();
        let cut = fixture.operation(&part, &saw, "Cut to length", 1).await.unwrap();
        let join = fixture.operation(&part, &weld, "Weld frame", 2).await.unwrap();
        let coat = fixture.operation(&part, &paint, "Powder coat", 3).await.unwrap();

        Self {
            fixture,
            job,
            part,
            saw,
            weld,
            paint,
            cut,
            join,
            coat,
        }
    }

    pub async fn part_now(&self) -> Part {
        self.fixture.reload_part(self.part.id).await.unwrap().unwrap()
    }

    pub async fn job_now(&self) -> Job {
        self.fixture.reload_job(self.job.id).await.unwrap().unwrap()
    }

    pub async fn operation_now(&self, id: Uuid) -> Operation {
        self.fixture.reload_operation(id).await.unwrap().unwrap()
    }

    /// Start and immediately stop a timer so the operation is in progress
    pub async fn touch(&self, operation: &Operation) {
        let operator = Uuid::new_v4();
        self.fixture.service.start_timer(operation.id, operator).await.unwrap();
        self.fixture.service.stop_timer(operation.id, operator).await.unwrap();
    }

    /// Work an operation to completion
    pub async fn finish(&self, operation: &Operation) {
        self.touch(operation).await;
        self.fixture.service.complete_operation(operation.id).await.unwrap();
    }
}
