// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named-record isolation specs.

use crate::prelude::*;

#[tokio::test]
async fn naming_freezes_the_record_against_invalidation() {
    let h = fake_harness();
    let item = ItemId::new();
    let collection = CollectionId::new();
    h.catalog.add_collection(&collection, &["loose"]);
    h.catalog.add_item(&item, &collection);

    let analysis =
        h.engine.get_or_submit(echo_request(Subject::Item(item.clone()))).await.unwrap();
    let task = h.exec.take().remove(0);
    h.complete(&task).await;

    {
        let state = h.engine.state_snapshot();
        assert_eq!(state.require(&analysis.id).unwrap().task_state, TaskState::Success);
    }
    h.engine.assign_name(&analysis.id, "march run").unwrap();

    h.engine
        .handle_event(&Event::SourceChanged { source: SourceRef::Item(item) })
        .await
        .unwrap();

    let named = h.engine.analysis(&analysis.id).unwrap();
    assert_eq!(named.task_state, TaskState::Success);
    assert!(named.result.is_some());
    assert!(h.exec.take().is_empty());
}

#[tokio::test]
async fn fresh_lookup_after_naming_creates_a_new_record() {
    let h = fake_harness();
    let request = echo_request(Subject::Item(ItemId::new()));

    let first = h.engine.get_or_submit(request.clone()).await.unwrap();
    h.exec.take();
    h.engine.assign_name(&first.id, "baseline").unwrap();

    let second = h.engine.get_or_submit(request).await.unwrap();
    assert_ne!(second.id, first.id);
    assert_eq!(h.engine.state_snapshot().len(), 2);
}

#[tokio::test]
async fn named_records_cannot_be_resubmitted_or_renamed() {
    let h = fake_harness();
    let analysis =
        h.engine.get_or_submit(echo_request(Subject::Item(ItemId::new()))).await.unwrap();
    h.exec.take();
    h.engine.assign_name(&analysis.id, "one").unwrap();

    assert!(h.engine.force_resubmit(&analysis.id).await.is_err());
    assert!(h.engine.assign_name(&analysis.id, "two").is_err());
}
