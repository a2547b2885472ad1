// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{item_subject, new_analysis};
use crate::state::AnalysisState;
use assay_core::{AnalysisId, Event, SubmissionToken, TaskState};
use serde_json::json;

fn submitted_state() -> (AnalysisState, AnalysisId, SubmissionToken) {
    let mut state = AnalysisState::new();
    let (id, _) = state.find_or_create(new_analysis(item_subject("itm-a")), 1_000);
    let token = state.submit(&id, 1_100).unwrap();
    (state, id, token)
}

fn started(event_id: &AnalysisId, token: &SubmissionToken) -> Event {
    Event::TaskStarted { id: event_id.clone(), token: token.clone() }
}

#[test]
fn started_event_moves_to_started() {
    let (mut state, id, token) = submitted_state();
    state.apply_event(&started(&id, &token), 1_200);
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.task_state, TaskState::Started);
    assert_eq!(analysis.started_at_ms, Some(1_200));
}

#[test]
fn applying_same_event_twice_is_idempotent() {
    let (mut state, id, token) = submitted_state();
    state.apply_event(&started(&id, &token), 1_200);
    state.apply_event(&started(&id, &token), 1_999);
    // second delivery leaves the original timestamp
    assert_eq!(state.get(&id).unwrap().started_at_ms, Some(1_200));
}

#[test]
fn progress_applies_only_while_started() {
    let (mut state, id, token) = submitted_state();
    let progress = Event::TaskProgress { id: id.clone(), token: token.clone(), fraction: 0.5 };
    state.apply_event(&progress, 1_150);
    assert_eq!(state.get(&id).unwrap().progress, 0.0);

    state.apply_event(&started(&id, &token), 1_200);
    state.apply_event(&progress, 1_250);
    assert_eq!(state.get(&id).unwrap().progress, 0.5);
}

#[test]
fn duplicate_success_keeps_first_result() {
    let (mut state, id, token) = submitted_state();
    state.apply_event(&started(&id, &token), 1_200);
    state.apply_event(
        &Event::TaskSucceeded { id: id.clone(), token: token.clone(), result: json!(1) },
        1_300,
    );
    state.apply_event(
        &Event::TaskSucceeded { id: id.clone(), token: token.clone(), result: json!(2) },
        1_400,
    );
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.result, Some(json!(1)));
    assert_eq!(analysis.ended_at_ms, Some(1_300));
}

#[test]
fn stale_token_write_is_discarded_after_renewal() {
    let (mut state, id, old_token) = submitted_state();
    state.apply_event(&started(&id, &old_token), 1_200);

    // renewal resets the round while the old run is still in flight
    state.renew(&id, 2_000).unwrap();

    state.apply_event(
        &Event::TaskSucceeded { id: id.clone(), token: old_token, result: json!("stale") },
        2_100,
    );
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.task_state, TaskState::Pending);
    assert!(analysis.result.is_none());
}

#[test]
fn retry_then_started_again() {
    let (mut state, id, token) = submitted_state();
    state.apply_event(&started(&id, &token), 1_200);
    state.apply_event(&Event::TaskRetry { id: id.clone(), token: token.clone() }, 1_300);
    assert_eq!(state.get(&id).unwrap().task_state, TaskState::Retry);
    state.apply_event(&started(&id, &token), 1_400);
    let analysis = state.get(&id).unwrap();
    assert_eq!(analysis.task_state, TaskState::Started);
    assert_eq!(analysis.retries, 1);
}

#[test]
fn event_for_unknown_analysis_is_dropped() {
    let mut state = AnalysisState::new();
    let event = Event::TaskStarted {
        id: AnalysisId::from("ana-ghost"),
        token: SubmissionToken::from("tok-x"),
    };
    state.apply_event(&event, 1_000);
    assert!(state.is_empty());
}

#[test]
fn non_task_events_are_ignored() {
    let (mut state, id, _) = submitted_state();
    state.apply_event(&Event::Shutdown, 1_200);
    state.apply_event(&Event::Custom, 1_200);
    assert_eq!(state.get(&id).unwrap().task_state, TaskState::Pending);
}
