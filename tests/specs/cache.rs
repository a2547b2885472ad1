// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache identity specs: dedup, atomicity, kwargs normalization.

use crate::prelude::*;
use assay_storage::AnalysisState;
use parking_lot::Mutex;

#[tokio::test]
async fn identical_requests_share_one_record() {
    let h = fake_harness();
    let request = echo_request(Subject::Item(ItemId::new()));

    let first = h.engine.get_or_submit(request.clone()).await.unwrap();
    let second = h.engine.get_or_submit(request).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.engine.state_snapshot().len(), 1);
}

#[test]
fn concurrent_creation_leaves_exactly_one_unnamed_record() {
    let store = Arc::new(Mutex::new(AnalysisState::new()));
    let request = echo_request(Subject::Item(ItemId::new()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&store);
            let request = request.clone();
            std::thread::spawn(move || {
                let (id, _created) = store.lock().find_or_create(request, 0);
                id
            })
        })
        .collect();
    let ids: Vec<AnalysisId> = handles.into_iter().map(|handle| handle.join().unwrap()).collect();

    let store = store.lock();
    assert_eq!(store.len(), 1);
    assert!(ids.iter().all(|id| *id == ids[0]));
    assert!(store.find_by_fingerprint(&request.fingerprint()).is_some());
}

#[tokio::test]
async fn kwargs_normalization_is_part_of_the_fingerprint() {
    let h = fake_harness();
    let subjects = vec![Subject::Item(ItemId::new())];

    let coerced = h
        .engine
        .controller(&h.viewer, &subjects, "echo", Some(&json!({ "a": "2" })))
        .await
        .unwrap();
    let plain = h
        .engine
        .controller(&h.viewer, &subjects, "echo", Some(&json!({ "a": 2 })))
        .await
        .unwrap();
    let default = h.engine.controller(&h.viewer, &subjects, "echo", None).await.unwrap();

    // String "2" coerces to the declared integer; the default (a = 1) is a
    // different identity.
    assert_eq!(coerced.ids(), plain.ids());
    assert_ne!(plain.ids(), default.ids());
}

#[tokio::test]
async fn unknown_kwargs_are_rejected_before_any_record_exists() {
    let h = fake_harness();
    let subjects = vec![Subject::Item(ItemId::new())];

    let result = h
        .engine
        .controller(&h.viewer, &subjects, "echo", Some(&json!({ "a": 2, "b": "abc" })))
        .await;
    assert!(result.is_err());
    assert!(h.engine.state_snapshot().is_empty());
}

#[tokio::test]
async fn same_params_different_scope_are_distinct_records() {
    let h = fake_harness();
    let group = GroupId::new();
    h.catalog.define_group(&group, "projects");
    let other = UserId::new();

    let mine = h
        .engine
        .controller(&h.viewer, &[Subject::Group(group.clone())], "echo", None)
        .await
        .unwrap();
    let theirs =
        h.engine.controller(&other, &[Subject::Group(group)], "echo", None).await.unwrap();

    assert_ne!(mine.ids(), theirs.ids());
    assert_eq!(h.engine.state_snapshot().len(), 2);
}
