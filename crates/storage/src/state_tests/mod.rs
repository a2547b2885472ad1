// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod tasks;

use super::*;
use assay_core::{CollectionId, ItemId, TaskState, UserId};
use serde_json::json;

pub(crate) fn item_subject(id: &str) -> Subject {
    Subject::Item(ItemId::from(id))
}

pub(crate) fn new_analysis(subject: Subject) -> NewAnalysis {
    NewAnalysis {
        workflow: "height".to_string(),
        workflow_version: 1,
        subject,
        params: Params::new(),
        scope: OwnerScope::Shared,
    }
}

#[test]
fn find_or_create_creates_once() {
    let mut state = AnalysisState::new();
    let (id, created) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    assert!(created);
    let (again, created) = state.find_or_create(new_analysis(item_subject("itm-a")), 2_000);
    assert!(!created);
    assert_eq!(id, again);
    assert_eq!(state.len(), 1);
}

#[test]
fn created_record_starts_not_run() {
    let mut state = AnalysisState::new();
    let (id, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.task_state, TaskState::NotRun);
    assert_eq!(analysis.created_at_ms, 1_000);
    assert!(analysis.dependencies.is_empty());
}

#[test]
fn lookup_ignores_task_state() {
    let mut state = AnalysisState::new();
    let (id, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    let token = state.submit(&id, 1_100).unwrap();
    state.apply_event(
        &Event::TaskStarted { id: id.clone(), token: token.clone() },
        1_200,
    );
    state.apply_event(
        &Event::TaskFailed {
            id: id.clone(),
            token,
            error: "boom".into(),
            traceback: "t".into(),
        },
        1_300,
    );
    // a failed record is still the cache entry; callers decide on resubmission
    let (again, created) = state.find_or_create(new_analysis(item_subject("itm-a")), 2_000);
    assert!(!created);
    assert_eq!(again, id);
}

#[test]
fn distinct_fingerprints_create_distinct_records() {
    let mut state = AnalysisState::new();
    let (a, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    let (b, _) = state.find_or_create(new_analysis(item_subject("itm-b")), 1_000);
    let mut viewer_bound = new_analysis(item_subject("itm-a"));
    viewer_bound.scope = OwnerScope::Viewer(UserId::from("usr-x"));
    let (c, _) = state.find_or_create(viewer_bound, 1_000);
    assert_ne!(a, b);
    assert_ne!(a, c);
    assert_eq!(state.len(), 3);
}

#[test]
fn params_feed_the_fingerprint() {
    let mut state = AnalysisState::new();
    let mut with_params = new_analysis(item_subject("itm-a"));
    with_params.params.insert("a".into(), json!(2));
    let (a, _) = state.find_or_create(with_params, 1_000);
    let (b, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    assert_ne!(a, b);
}

#[test]
fn naming_removes_record_from_index() {
    let mut state = AnalysisState::new();
    let (id, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    state.assign_name(&id, "my snapshot").unwrap();

    // same fingerprint now creates a brand-new record
    let (fresh, created) = state.find_or_create(new_analysis(item_subject("itm-a")), 2_000);
    assert!(created);
    assert_ne!(fresh, id);
    assert_eq!(state.len(), 2);

    // the named record survives unchanged
    let named = state.get(&id).unwrap();
    assert_eq!(named.name.as_deref(), Some("my snapshot"));
}

#[test]
fn renew_reuses_the_same_record() {
    let mut state = AnalysisState::new();
    let (id, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    let token = state.submit(&id, 1_100).unwrap();
    state.apply_event(&Event::TaskStarted { id: id.clone(), token: token.clone() }, 1_200);
    state.apply_event(
        &Event::TaskSucceeded { id: id.clone(), token, result: json!(42) },
        1_300,
    );
    assert_eq!(state.get(&id).unwrap().task_state, TaskState::Success);

    state.renew(&id, 2_000).unwrap();
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.task_state, TaskState::Pending);
    assert!(analysis.result.is_none());

    // the fingerprint still resolves to the same record, not a new one
    let (again, created) = state.find_or_create(new_analysis(item_subject("itm-a")), 2_100);
    assert!(!created);
    assert_eq!(again, id);
}

#[test]
fn renaming_rejected_for_missing_record() {
    let mut state = AnalysisState::new();
    let missing = assay_core::AnalysisId::from("ana-missing");
    assert!(matches!(
        state.assign_name(&missing, "x"),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn unnamed_for_subjects_filters_named_records() {
    let mut state = AnalysisState::new();
    let (a, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    let (b, _) = state.find_or_create(new_analysis(item_subject("itm-b")), 1_100);
    state.assign_name(&b, "kept").unwrap();

    let hits = state.unnamed_for_subjects(&[item_subject("itm-a"), item_subject("itm-b")]);
    assert_eq!(hits, vec![a]);
}

#[test]
fn dependents_of_walks_reverse_edges() {
    let mut state = AnalysisState::new();
    let (child, _) = state.find_or_create(
        new_analysis(Subject::Collection(CollectionId::from("col-a"))),
        1_000,
    );
    let mut parent_new = new_analysis(Subject::Group(assay_core::GroupId::from("grp-a")));
    parent_new.scope = OwnerScope::Viewer(UserId::from("usr-x"));
    let (parent, _) = state.find_or_create(parent_new, 1_100);
    state.set_dependencies(&parent, vec![child.clone()]).unwrap();

    assert_eq!(state.dependents_of(&child), vec![parent]);
    assert!(state.dependents_of(&assay_core::AnalysisId::from("ana-x")).is_empty());
}

#[test]
fn fail_now_records_engine_decided_failure() {
    let mut state = AnalysisState::new();
    let (id, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    state.submit(&id, 1_100).unwrap();
    state
        .fail_now(&id, "no dependency succeeded", "error propagated from dependency", 1_500)
        .unwrap();
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.task_state, TaskState::Failure);
    assert_eq!(analysis.error.as_deref(), Some("no dependency succeeded"));
}
