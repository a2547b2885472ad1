// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invalidation specs: renewal reuses records and survives stale rounds.

use crate::prelude::*;

#[tokio::test]
async fn renewal_reuses_the_entity_id() {
    let h = worker_harness(stock_registry());
    let collection = CollectionId::new();
    h.catalog.add_collection(&collection, &["loose"]);

    let analysis = h
        .engine
        .get_or_submit(echo_request(Subject::Collection(collection.clone())))
        .await
        .unwrap();
    assert!(h.wait_for_state(&analysis.id, TaskState::Success).await);

    let first_round = h.engine.analysis(&analysis.id).unwrap();
    h.events
        .send(Event::SourceChanged { source: SourceRef::Collection(collection.clone()) })
        .await
        .unwrap();
    // Wait for the replacement round, not the stale success.
    let recomputed = wait_until(|| {
        h.engine
            .analysis(&analysis.id)
            .is_some_and(|a| a.token != first_round.token && a.task_state == TaskState::Success)
    })
    .await;
    assert!(recomputed);

    // The same id answers a fresh lookup; no second record appeared.
    let again = h
        .engine
        .get_or_submit(echo_request(Subject::Collection(collection)))
        .await
        .unwrap();
    assert_eq!(again.id, analysis.id);
    assert_eq!(h.engine.state_snapshot().len(), 1);
    h.shutdown().await;
}

#[tokio::test]
async fn item_change_cascades_through_the_container() {
    let h = worker_harness(stock_registry());
    let item = ItemId::new();
    let collection = CollectionId::new();
    h.catalog.add_collection(&collection, &["loose"]);
    h.catalog.add_item(&item, &collection);

    let over_collection = h
        .engine
        .get_or_submit(echo_request(Subject::Collection(collection)))
        .await
        .unwrap();
    assert!(h.wait_for_state(&over_collection.id, TaskState::Success).await);
    let first_round = h.engine.analysis(&over_collection.id).unwrap();

    h.events.send(Event::SourceChanged { source: SourceRef::Item(item) }).await.unwrap();
    let recomputed = wait_until(|| {
        h.engine
            .analysis(&over_collection.id)
            .is_some_and(|a| a.token != first_round.token && a.task_state == TaskState::Success)
    })
    .await;
    assert!(recomputed);
    h.shutdown().await;
}
