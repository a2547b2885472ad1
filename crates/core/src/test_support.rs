// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::params::{ParamKind, ParamSchema};
use crate::subject::SubjectKind;
use crate::workflow::{WorkflowError, WorkflowSpec};
use serde_json::{json, Value};
use std::sync::Arc;

// ── Proptest strategies ─────────────────────────────────────────────────

/// Proptest strategies for core state machine types.
pub mod strategies {
    use crate::analysis::TaskState;
    use proptest::prelude::*;

    pub fn arb_task_state() -> impl Strategy<Value = TaskState> {
        prop_oneof![
            Just(TaskState::NotRun),
            Just(TaskState::Pending),
            Just(TaskState::Started),
            Just(TaskState::Retry),
            Just(TaskState::Success),
            Just(TaskState::Failure),
        ]
    }
}

// ── Workflow factory functions ──────────────────────────────────────────

/// A workflow accepting every subject variant, with one integer parameter
/// `a` defaulting to 1. The handler echoes subject identity, params, and
/// the count of dependency inputs.
pub fn echo_workflow(name: &str) -> WorkflowSpec {
    WorkflowSpec {
        name: name.to_string(),
        display_name: format!("Echo {name}"),
        version: 1,
        schema: ParamSchema::new().field("a", ParamKind::Integer, 1),
        accepts: vec![SubjectKind::Item, SubjectKind::Collection, SubjectKind::Group],
        flavor: "plot".to_string(),
        handler: Arc::new(|input, _progress| {
            Ok(json!({
                "subject": input.subject.identity(),
                "params": input.params,
                "inputs": input.inputs.len(),
            }))
        }),
    }
}

/// A workflow producing a result of roughly `payload_bytes` bytes of
/// readings. Useful for exercising result-offload paths.
pub fn bulky_workflow(name: &str, payload_bytes: usize) -> WorkflowSpec {
    WorkflowSpec {
        name: name.to_string(),
        display_name: format!("Bulky {name}"),
        version: 1,
        schema: ParamSchema::new(),
        accepts: vec![SubjectKind::Item, SubjectKind::Collection, SubjectKind::Group],
        flavor: "series".to_string(),
        handler: Arc::new(move |input, _progress| {
            Ok(json!({
                "subject": input.subject.identity(),
                "readings": "9".repeat(payload_bytes),
            }))
        }),
    }
}

/// A workflow whose handler always fails with the given message.
pub fn failing_workflow(name: &str, message: &str) -> WorkflowSpec {
    let message = message.to_string();
    WorkflowSpec {
        name: name.to_string(),
        display_name: format!("Failing {name}"),
        version: 1,
        schema: ParamSchema::new(),
        accepts: vec![SubjectKind::Item, SubjectKind::Collection, SubjectKind::Group],
        flavor: "plot".to_string(),
        handler: Arc::new(move |_input, _progress| {
            Err(WorkflowError::new(message.clone()).with_traceback(format!("Traceback: {message}")))
        }),
    }
}

/// A workflow whose handler fails for the subjects named in `fail_for`
/// (matched on identity substring) and sums dependency input counts
/// otherwise. Useful for partial-failure aggregation tests.
pub fn selective_workflow(name: &str, fail_for: &[&str]) -> WorkflowSpec {
    let fail_for: Vec<String> = fail_for.iter().map(|s| s.to_string()).collect();
    WorkflowSpec {
        name: name.to_string(),
        display_name: format!("Selective {name}"),
        version: 1,
        schema: ParamSchema::new(),
        accepts: vec![SubjectKind::Item, SubjectKind::Collection, SubjectKind::Group],
        flavor: "series".to_string(),
        handler: Arc::new(move |input, _progress| {
            let identity = input.subject.identity();
            if fail_for.iter().any(|f| identity.contains(f.as_str())) {
                return Err(WorkflowError::new(format!("handler refused {identity}")));
            }
            let contributions: Vec<Value> =
                input.inputs.iter().map(|d| d.result.clone()).collect();
            Ok(json!({ "count": input.inputs.len(), "contributions": contributions }))
        }),
    }
}
