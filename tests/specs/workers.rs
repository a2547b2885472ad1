// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker lifecycle specs over the full engine + local worker pool.

use crate::prelude::*;

#[tokio::test]
async fn leaf_analysis_runs_to_success() {
    let h = worker_harness(stock_registry());
    let subject = Subject::Item(ItemId::new());

    let analysis = h.engine.get_or_submit(echo_request(subject.clone())).await.unwrap();
    assert!(h.wait_for_state(&analysis.id, TaskState::Success).await);

    let done = h.engine.analysis(&analysis.id).unwrap();
    assert_eq!(done.progress, 1.0);
    assert!(done.started_at_ms.is_some());
    assert!(done.ended_at_ms.is_some());
    assert_eq!(done.result.unwrap()["subject"], json!(subject.identity()));
    h.shutdown().await;
}

#[tokio::test]
async fn handler_errors_become_failure_data_not_faults() {
    let h = worker_harness(stock_registry());

    let analysis = h
        .engine
        .get_or_submit(NewAnalysis {
            workflow: "boom".to_string(),
            workflow_version: 1,
            subject: Subject::Item(ItemId::new()),
            params: Params::new(),
            scope: OwnerScope::Shared,
        })
        .await
        .unwrap();
    assert!(h.wait_for_state(&analysis.id, TaskState::Failure).await);

    let failed = h.engine.analysis(&analysis.id).unwrap();
    assert_eq!(failed.error.as_deref(), Some("computation refused"));
    assert!(failed.traceback.is_some());
    h.shutdown().await;
}

#[tokio::test]
async fn empty_group_succeeds_with_zero_contributions() {
    let mut registry = stock_registry();
    registry
        .register(selective_workflow("selective", &[]))
        .expect("register selective");
    let h = worker_harness(registry);
    let group = GroupId::new();
    h.catalog.define_group(&group, "projects/none");

    let analysis = h
        .engine
        .get_or_submit(NewAnalysis {
            workflow: "selective".to_string(),
            workflow_version: 1,
            subject: Subject::Group(group),
            params: Params::new(),
            scope: OwnerScope::Viewer(h.viewer.clone()),
        })
        .await
        .unwrap();
    assert!(h.wait_for_state(&analysis.id, TaskState::Success).await);

    let done = h.engine.analysis(&analysis.id).unwrap();
    assert!(done.dependencies.is_empty());
    assert_eq!(done.result.unwrap()["count"], json!(0));
    h.shutdown().await;
}

#[tokio::test]
async fn oversized_results_land_in_blob_storage() {
    let mut registry = stock_registry();
    registry
        .register(bulky_workflow("bulky", assay_adapters::INLINE_RESULT_MAX))
        .expect("register bulky");
    let h = worker_harness(registry);
    let subject = Subject::Item(ItemId::new());

    let analysis = h
        .engine
        .get_or_submit(NewAnalysis {
            workflow: "bulky".to_string(),
            workflow_version: 1,
            subject: subject.clone(),
            params: Params::new(),
            scope: OwnerScope::Shared,
        })
        .await
        .unwrap();
    assert!(h.wait_for_state(&analysis.id, TaskState::Success).await);

    // The record carries only the stub; the payload lives in the store.
    let done = h.engine.analysis(&analysis.id).unwrap();
    let result = done.result.unwrap();
    let blob = BlobRef(result["blob"].as_str().unwrap().to_string());
    let bytes = h.blobs.get(&blob).await.unwrap();
    let full: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(full["subject"], json!(subject.identity()));
    assert_eq!(h.blobs.len(), 1);
    h.shutdown().await;
}

#[tokio::test]
async fn controller_round_trip_polls_to_completion() {
    let h = worker_harness(stock_registry());
    let subjects = vec![Subject::Item(ItemId::new()), Subject::Item(ItemId::new())];

    let controller = h.engine.controller(&h.viewer, &subjects, "echo", None).await.unwrap();
    assert!(controller.get().iter().all(|a| a.task_state == TaskState::NotRun));

    controller.trigger_missing().await.unwrap();
    let ids: Vec<AnalysisId> = controller.ids().to_vec();
    for id in &ids {
        assert!(h.wait_for_state(id, TaskState::Success).await);
    }
    assert!(controller.get().iter().all(|a| a.task_state == TaskState::Success));
    h.shutdown().await;
}
