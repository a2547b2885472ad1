// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Idempotent application of worker callback events.

use super::AnalysisState;
use assay_core::Event;

/// Apply a task event to the state.
///
/// Guards live on the record itself: a write is dropped when its submission
/// token no longer matches (the record was renewed or force-resubmitted in
/// the meantime) or when the record is already past the targeted state
/// (duplicate delivery). Drops are logged at debug, never errors.
pub(super) fn apply(state: &mut AnalysisState, event: &Event, now_ms: u64) {
    let Some(id) = event.analysis_id() else {
        return;
    };
    let Some(analysis) = state.get_mut_for_event(id) else {
        tracing::debug!(%id, event = event.name(), "event for unknown analysis dropped");
        return;
    };

    let applied = match event {
        Event::TaskStarted { token, .. } => analysis.apply_started(token, now_ms),
        Event::TaskProgress { token, fraction, .. } => analysis.apply_progress(token, *fraction),
        Event::TaskRetry { token, .. } => analysis.apply_retry(token),
        Event::TaskSucceeded { token, result, .. } => {
            analysis.apply_success(token, result.clone(), now_ms)
        }
        Event::TaskFailed { token, error, traceback, .. } => {
            analysis.apply_failure(token, error, traceback, now_ms)
        }
        _ => return,
    };

    if applied {
        tracing::debug!(%id, event = event.name(), state = %analysis.task_state, "applied");
    } else {
        tracing::debug!(
            %id,
            event = event.name(),
            state = %analysis.task_state,
            "stale or duplicate event discarded"
        );
    }
}
