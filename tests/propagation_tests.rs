//! Operation -> part -> job cascade behaviour.

mod common;

use common::SingleRoute;
use shopfloor_core::constants::events;
use shopfloor_core::error::ProductionError;
use shopfloor_core::models::Job;
use shopfloor_core::store::{EntityStore, StoreTable};
use shopfloor_core::test_helpers::ProductionFixture;
use shopfloor_core::{JobStatus, OperationStatus, PartStatus};
use uuid::Uuid;

#[tokio::test]
async fn test_current_cell_follows_lowest_sequence() {
    let route = SingleRoute::build().await;

    // Paint (30) starts first
    route.touch(&route.coat).await;
    assert_eq!(route.part_now().await.current_cell_id, Some(route.paint.id));

    // Saw (10) takes over
    route.touch(&route.cut).await;
    assert_eq!(route.part_now().await.current_cell_id, Some(route.saw.id));
    assert_eq!(route.job_now().await.current_cell_id, Some(route.saw.id));

    // Paint is still in progress once saw is done
    route.fixture.service.complete_operation(route.cut.id).await.unwrap();
    assert_eq!(route.part_now().await.current_cell_id, Some(route.paint.id));
    assert_eq!(route.job_now().await.current_cell_id, Some(route.paint.id));
}

#[tokio::test]
async fn test_last_operation_completes_part_and_job() {
    let route = SingleRoute::build().await;
    route.finish(&route.cut).await;
    route.finish(&route.join).await;
    route.touch(&route.coat).await;

    let cascade = route.fixture.service.complete_operation(route.coat.id).await.unwrap();
    assert!(cascade.part_completed);
    assert!(cascade.job_completed);

    let operation = route.operation_now(route.coat.id).await;
    assert_eq!(operation.status, OperationStatus::Completed);
    assert_eq!(operation.completion_percentage, 100);
    assert!(operation.completed_at.is_some());

    let part = route.part_now().await;
    assert_eq!(part.status, PartStatus::Completed);
    assert_eq!(part.current_cell_id, None);

    let job = route.job_now().await;
    assert_eq!(job.status, JobStatus::Completed);
    assert_eq!(job.current_cell_id, None);

    let names = route.fixture.notifier.names();
    assert_eq!(names.iter().filter(|n| *n == events::OPERATION_COMPLETED).count(), 3);
    assert_eq!(route.fixture.notifier.count(events::PART_COMPLETED), 1);
    assert_eq!(route.fixture.notifier.count(events::JOB_COMPLETED), 1);
    assert_eq!(names.last().map(String::as_str), Some(events::JOB_COMPLETED));
}

#[tokio::test]
async fn test_job_waits_for_every_part() {
    let fixture = ProductionFixture::new();
    let job = fixture.job("J-3001").await.unwrap();
    let frame = fixture.part(&job, "FRAME").await.unwrap();
    let panel = fixture.part(&job, "PANEL").await.unwrap();
    let saw = fixture.cell("Saw", 10).await.unwrap();
    let press = fixture.cell("Press", 40).await.unwrap();
    let cut = fixture.operation(&frame, &saw, "Cut", 1).await.unwrap();
    let bend = fixture.operation(&panel, &press, "Bend", 1).await.unwrap();

    let operator = Uuid::new_v4();
    for operation in [&cut, &bend] {
        fixture.service.start_timer(operation.id, operator).await.unwrap();
        fixture.service.stop_timer(operation.id, operator).await.unwrap();
    }
    assert_eq!(
        fixture.reload_job(job.id).await.unwrap().unwrap().current_cell_id,
        Some(saw.id)
    );

    let cascade = fixture.service.complete_operation(cut.id).await.unwrap();
    assert!(cascade.part_completed);
    assert!(!cascade.job_completed);
    assert_eq!(cascade.job.status, JobStatus::InProgress);
    // Only the panel is still being worked
    assert_eq!(cascade.job.current_cell_id, Some(press.id));

    let cascade = fixture.service.complete_operation(bend.id).await.unwrap();
    assert!(cascade.job_completed);
    assert_eq!(cascade.job.current_cell_id, None);
}

#[tokio::test]
async fn test_idle_remaining_work_keeps_current_cell() {
    let route = SingleRoute::build().await;
    route.finish(&route.cut).await;

    // Weld and paint are untouched, so the saw stays the last known frontier
    let part = route.part_now().await;
    assert_eq!(part.status, PartStatus::InProgress);
    assert_eq!(part.current_cell_id, Some(route.saw.id));
    assert_eq!(route.job_now().await.current_cell_id, Some(route.saw.id));
}

#[tokio::test]
async fn test_complete_with_open_timer_conflicts() {
    let route = SingleRoute::build().await;
    route
        .fixture
        .service
        .start_timer(route.cut.id, Uuid::new_v4())
        .await
        .unwrap();

    let err = route.fixture.service.complete_operation(route.cut.id).await.unwrap_err();
    match err {
        ProductionError::Conflict { operation_id, .. } => assert_eq!(operation_id, route.cut.id),
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(route.operation_now(route.cut.id).await.status, OperationStatus::InProgress);
}

#[tokio::test]
async fn test_store_failure_aborts_cascade_and_retry_reconciles() {
    let route = SingleRoute::build().await;
    route.finish(&route.cut).await;
    route.finish(&route.join).await;
    route.touch(&route.coat).await;

    route.fixture.store.fail_writes_to(StoreTable::Parts);
    let err = route.fixture.service.complete_operation(route.coat.id).await.unwrap_err();
    assert_eq!(err.kind(), "store");

    // Operation write landed, nothing above it did
    assert_eq!(route.operation_now(route.coat.id).await.status, OperationStatus::Completed);
    assert_eq!(route.part_now().await.status, PartStatus::InProgress);
    assert_eq!(route.job_now().await.status, JobStatus::InProgress);

    route.fixture.store.heal();
    let cascade = route.fixture.service.complete_operation(route.coat.id).await.unwrap();
    assert!(cascade.part_completed);
    assert!(cascade.job_completed);
    assert_eq!(route.part_now().await.status, PartStatus::Completed);
}

#[tokio::test]
async fn test_repeated_completion_is_idempotent() {
    let route = SingleRoute::build().await;
    route.touch(&route.coat).await;
    route.touch(&route.join).await;

    let first = route.fixture.service.complete_operation(route.join.id).await.unwrap();
    let second = route.fixture.service.complete_operation(route.join.id).await.unwrap();

    assert_eq!(first.part, second.part);
    assert_eq!(first.job, second.job);
    assert_eq!(first.operation.completed_at, second.operation.completed_at);
    assert_eq!(route.fixture.notifier.count(events::OPERATION_COMPLETED), 1);
}

#[tokio::test]
async fn test_complete_unknown_operation() {
    let fixture = ProductionFixture::new();
    let err = fixture.service.complete_operation(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn test_held_job_is_not_restarted() {
    let fixture = ProductionFixture::new();
    let mut job = Job::new("J-4001");
    job.status = JobStatus::OnHold;
    fixture.store.insert_job(&job).await.unwrap();
    let part = fixture.part(&job, "SHAFT").await.unwrap();
    let lathe = fixture.cell("Lathe", 20).await.unwrap();
    let turn = fixture.operation(&part, &lathe, "Turn", 1).await.unwrap();

    fixture.service.start_timer(turn.id, Uuid::new_v4()).await.unwrap();

    let job = fixture.reload_job(job.id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::OnHold);
    assert_eq!(job.current_cell_id, Some(lathe.id));
    assert_eq!(fixture.notifier.count(events::JOB_STARTED), 0);
}

#[tokio::test]
async fn test_aborted_start_cascade_is_completed_by_next_start() {
    let route = SingleRoute::build().await;
    let operator = Uuid::new_v4();

    route.fixture.store.fail_writes_to(StoreTable::Parts);
    let err = route.fixture.service.start_timer(route.cut.id, operator).await.unwrap_err();
    assert_eq!(err.kind(), "store");

    // Operation moved, part and job did not
    assert_eq!(route.operation_now(route.cut.id).await.status, OperationStatus::InProgress);
    assert_eq!(route.part_now().await.status, PartStatus::NotStarted);
    assert_eq!(route.job_now().await.status, JobStatus::NotStarted);

    route.fixture.store.heal();
    route.fixture.service.stop_timer(route.cut.id, operator).await.unwrap();
    let again = route.fixture.service.start_timer(route.cut.id, operator).await.unwrap();
    assert!(!again.is_first_start());
    assert!(again.cascade.is_some());

    let part = route.part_now().await;
    assert_eq!(part.status, PartStatus::InProgress);
    assert_eq!(part.current_cell_id, Some(route.saw.id));

    let job = route.job_now().await;
    assert_eq!(job.status, JobStatus::InProgress);
    assert_eq!(job.current_cell_id, Some(route.saw.id));

    assert_eq!(route.fixture.notifier.count(events::OPERATION_STARTED), 1);
    assert_eq!(route.fixture.notifier.count(events::JOB_STARTED), 1);
}

#[tokio::test]
async fn test_aborted_job_write_is_completed_by_next_start() {
    let route = SingleRoute::build().await;
    route.touch(&route.coat).await;

    route.fixture.store.fail_writes_to(StoreTable::Jobs);
    let operator = Uuid::new_v4();
    let err = route.fixture.service.start_timer(route.cut.id, operator).await.unwrap_err();
    assert_eq!(err.kind(), "store");

    // Part moved to the saw, job still points at paint
    assert_eq!(route.part_now().await.current_cell_id, Some(route.saw.id));
    assert_eq!(route.job_now().await.current_cell_id, Some(route.paint.id));

    route.fixture.store.heal();
    route.fixture.service.stop_timer(route.cut.id, operator).await.unwrap();
    route.fixture.service.start_timer(route.cut.id, operator).await.unwrap();
    assert_eq!(route.job_now().await.current_cell_id, Some(route.saw.id));
    assert_eq!(route.fixture.notifier.count(events::JOB_STARTED), 1);
}
