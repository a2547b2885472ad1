// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency aggregation specs, driven through real local workers.

use crate::prelude::*;

fn group_request(viewer: &UserId, group: GroupId) -> NewAnalysis {
    NewAnalysis {
        workflow: "selective".to_string(),
        workflow_version: 1,
        subject: Subject::Group(group),
        params: Params::new(),
        scope: OwnerScope::Viewer(viewer.clone()),
    }
}

/// Registry whose `selective` workflow fails for the given collections and
/// aggregates dependency outputs otherwise.
fn selective_registry(failing: &[&CollectionId]) -> WorkflowRegistry {
    let fail_for: Vec<String> = failing.iter().map(|c| c.as_str().to_string()).collect();
    let fail_for: Vec<&str> = fail_for.iter().map(String::as_str).collect();
    let mut registry = stock_registry();
    registry.register(selective_workflow("selective", &fail_for)).expect("register selective");
    registry
}

fn two_member_group(catalog: &InMemoryCatalog) -> (GroupId, CollectionId, CollectionId) {
    let group = GroupId::new();
    catalog.define_group(&group, "projects");
    let a = CollectionId::new();
    let b = CollectionId::new();
    catalog.add_collection(&a, &["projects/a"]);
    catalog.add_collection(&b, &["projects/b"]);
    (group, a, b)
}

#[tokio::test]
async fn parent_aggregates_all_successful_children() {
    let h = worker_harness(selective_registry(&[]));
    let (group, ..) = two_member_group(&h.catalog);

    let parent = h.engine.get_or_submit(group_request(&h.viewer, group)).await.unwrap();
    assert!(h.wait_for_state(&parent.id, TaskState::Success).await);

    let parent = h.engine.analysis(&parent.id).unwrap();
    assert_eq!(parent.dependencies.len(), 2);
    let result = parent.result.unwrap();
    assert_eq!(result["count"], json!(2));
    h.shutdown().await;
}

#[tokio::test]
async fn partial_failure_keeps_the_parent_successful() {
    let catalog = InMemoryCatalog::new();
    let (group, _a, b) = two_member_group(&catalog);
    let h = worker_harness_with(selective_registry(&[&b]), catalog);

    let parent = h.engine.get_or_submit(group_request(&h.viewer, group)).await.unwrap();
    assert!(h.wait_for_state(&parent.id, TaskState::Success).await);

    let parent = h.engine.analysis(&parent.id).unwrap();
    let result = parent.result.unwrap();
    assert_eq!(result["count"], json!(1), "only the succeeded child contributes");

    let failed = h.engine.analysis(&parent.dependencies[1]).unwrap();
    assert_eq!(failed.task_state, TaskState::Failure);
    h.shutdown().await;
}

#[tokio::test]
async fn total_child_failure_propagates_to_the_parent() {
    let catalog = InMemoryCatalog::new();
    let (group, a, b) = two_member_group(&catalog);
    let h = worker_harness_with(selective_registry(&[&a, &b]), catalog);

    let parent = h.engine.get_or_submit(group_request(&h.viewer, group)).await.unwrap();
    assert!(h.wait_for_state(&parent.id, TaskState::Failure).await);

    let parent = h.engine.analysis(&parent.id).unwrap();
    assert_eq!(parent.error.as_deref(), Some("error propagated from dependency"));
    assert!(parent.traceback.unwrap().contains("handler refused"));
    h.shutdown().await;
}
