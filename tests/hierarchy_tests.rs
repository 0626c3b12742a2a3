//! Assembly links, dependency checks and tree traversal.

use shopfloor_core::error::ProductionError;
use shopfloor_core::models::{Job, Part};
use shopfloor_core::store::EntityStore;
use shopfloor_core::test_helpers::ProductionFixture;
use shopfloor_core::PartStatus;
use uuid::Uuid;

async fn parts(fixture: &ProductionFixture, numbers: &[&str]) -> (Job, Vec<Part>) {
    let job = fixture.job("J-5001").await.unwrap();
    let mut parts = Vec::new();
    for number in numbers {
        parts.push(fixture.part(&job, number).await.unwrap());
    }
    (job, parts)
}

#[tokio::test]
async fn test_reverse_link_is_a_cycle() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["A", "B"]).await;

    fixture.service.set_parent_part(p[0].id, p[1].id).await.unwrap();
    let err = fixture.service.set_parent_part(p[1].id, p[0].id).await.unwrap_err();
    assert!(matches!(err, ProductionError::Cycle { .. }));

    // The rejected link was not written
    let b = fixture.reload_part(p[1].id).await.unwrap().unwrap();
    assert_eq!(b.parent_part_id, None);
}

#[tokio::test]
async fn test_self_and_transitive_links_are_cycles() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["ROOT", "MID", "LEAF"]).await;

    let err = fixture.service.set_parent_part(p[0].id, p[0].id).await.unwrap_err();
    assert_eq!(err.kind(), "cycle");

    fixture.service.set_parent_part(p[1].id, p[0].id).await.unwrap();
    fixture.service.set_parent_part(p[2].id, p[1].id).await.unwrap();

    let err = fixture.service.set_parent_part(p[0].id, p[2].id).await.unwrap_err();
    assert_eq!(err.kind(), "cycle");
}

#[tokio::test]
async fn test_relinking_and_removing_parent() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["ASSY-1", "ASSY-2", "SUB"]).await;

    fixture.service.set_parent_part(p[2].id, p[0].id).await.unwrap();
    let moved = fixture.service.set_parent_part(p[2].id, p[1].id).await.unwrap();
    assert_eq!(moved.parent_part_id, Some(p[1].id));
    assert!(fixture.service.children_of(p[0].id).await.unwrap().is_empty());

    let detached = fixture.service.remove_parent_part(p[2].id).await.unwrap();
    assert_eq!(detached.parent_part_id, None);
    assert!(fixture.service.children_of(p[1].id).await.unwrap().is_empty());

    // Removing again is a no-op
    fixture.service.remove_parent_part(p[2].id).await.unwrap();
}

#[tokio::test]
async fn test_unknown_parts_are_not_found() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["A"]).await;

    let err = fixture.service.set_parent_part(p[0].id, Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
    let err = fixture.service.children_of(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
}

#[tokio::test]
async fn test_children_are_requeried_each_call() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["ASSY", "C1", "C2"]).await;

    fixture.service.set_parent_part(p[1].id, p[0].id).await.unwrap();
    assert_eq!(fixture.service.children_of(p[0].id).await.unwrap().len(), 1);

    fixture.service.set_parent_part(p[2].id, p[0].id).await.unwrap();
    let children = fixture.service.children_of(p[0].id).await.unwrap();
    let numbers: Vec<&str> = children.iter().map(|c| c.part_number.as_str()).collect();
    assert_eq!(numbers, vec!["C1", "C2"]);
}

#[tokio::test]
async fn test_dependency_status_lists_incomplete_children() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["ASSY", "BOLT", "NUT"]).await;

    let leaf = fixture.service.dependency_status(p[1].id).await.unwrap();
    assert!(!leaf.has_children);
    assert!(leaf.dependencies_met);

    fixture.service.set_parent_part(p[1].id, p[0].id).await.unwrap();
    fixture.service.set_parent_part(p[2].id, p[0].id).await.unwrap();

    let mut bolt = p[1].clone();
    bolt.status = PartStatus::Completed;
    fixture.store.update_part_progress(&bolt).await.unwrap();

    let status = fixture.service.dependency_status(p[0].id).await.unwrap();
    assert!(status.has_children);
    assert!(!status.dependencies_met);
    assert_eq!(status.incomplete_children.len(), 1);
    let nut = &status.incomplete_children[0];
    assert_eq!(nut.id, p[2].id);
    assert_eq!(nut.part_number, "NUT");
    assert_eq!(nut.status, PartStatus::NotStarted);
    assert!(nut.reason.contains("NUT"));

    let mut nut = p[2].clone();
    nut.status = PartStatus::Completed;
    fixture.store.update_part_progress(&nut).await.unwrap();
    assert!(fixture.service.dependency_status(p[0].id).await.unwrap().dependencies_met);
}

#[tokio::test]
async fn test_assembly_tree_is_breadth_first_with_depth() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["TOP", "L1-A", "L1-B", "L2-A"]).await;

    assert!(fixture.service.assembly_tree(p[0].id).await.unwrap().is_empty());

    fixture.service.set_parent_part(p[1].id, p[0].id).await.unwrap();
    fixture.service.set_parent_part(p[2].id, p[0].id).await.unwrap();
    fixture.service.set_parent_part(p[3].id, p[1].id).await.unwrap();

    let tree = fixture.service.assembly_tree(p[0].id).await.unwrap();
    let layout: Vec<(&str, u32)> = tree
        .iter()
        .map(|node| (node.part.part_number.as_str(), node.depth))
        .collect();
    assert_eq!(layout, vec![("L1-A", 1), ("L1-B", 1), ("L2-A", 2)]);
}

#[tokio::test]
async fn test_corrupt_cycle_terminates() {
    let fixture = ProductionFixture::new();
    let (_, p) = parts(&fixture, &["X", "Y", "Z"]).await;

    // Bypass validation to plant X <-> Y
    fixture.store.set_part_parent(p[0].id, Some(p[1].id)).await.unwrap();
    fixture.store.set_part_parent(p[1].id, Some(p[0].id)).await.unwrap();

    let tree = fixture.service.assembly_tree(p[0].id).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].part.id, p[1].id);

    // Walking the corrupt chain above X is reported, not looped
    let err = fixture.service.set_parent_part(p[2].id, p[0].id).await.unwrap_err();
    assert_eq!(err.kind(), "cycle");
}
