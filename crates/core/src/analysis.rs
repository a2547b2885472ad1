// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The analysis record and its task state machine.

use crate::fingerprint::Fingerprint;
use crate::params::Params;
use crate::scope::OwnerScope;
use crate::subject::Subject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

crate::define_id! {
    /// Unique identifier for a persisted analysis record.
    pub struct AnalysisId("ana-");
}

crate::define_id! {
    /// Token identifying one submission round.
    ///
    /// Regenerated on every (re)submission. Worker callbacks carry the token
    /// they were dispatched with; a terminal write whose token no longer
    /// matches the record is stale and must be discarded.
    pub struct SubmissionToken("tok-");
}

/// Lifecycle state of one analysis computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    NotRun,
    Pending,
    Started,
    Retry,
    Success,
    Failure,
}

impl TaskState {
    /// Terminal for the current submission round.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Success | TaskState::Failure)
    }

    /// Still occupying the worker pool (pending, started, or awaiting redelivery).
    pub fn is_running(&self) -> bool {
        matches!(self, TaskState::Pending | TaskState::Started | TaskState::Retry)
    }
}

crate::simple_display! {
    TaskState {
        NotRun => "not-run",
        Pending => "pending",
        Started => "started",
        Retry => "retry",
        Success => "success",
        Failure => "failure",
    }
}

/// Errors from explicit state transitions (submit, resubmit, renew, name).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("analysis is named and frozen")]
    Named,
    #[error("invalid transition: {op} from {from}")]
    InvalidState { op: &'static str, from: TaskState },
}

/// Persisted record of one computation: its state machine, timestamps,
/// progress, error/traceback, output, ownership, and dependencies.
///
/// Together, (workflow, subject, params, scope) form the fingerprint under
/// which unnamed records are deduplicated. Assigning a `name` freezes the
/// record: it leaves the fingerprint index, renewal skips it, and
/// resubmission is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: AnalysisId,
    pub workflow: String,
    pub workflow_version: u32,
    pub subject: Subject,
    pub params: Params,
    pub scope: OwnerScope,
    pub fingerprint: Fingerprint,
    pub task_state: TaskState,
    /// Token of the current submission round.
    pub token: SubmissionToken,
    /// Fraction complete in [0, 1]; meaningful only while started.
    pub progress: f64,
    pub created_at_ms: u64,
    pub submitted_at_ms: Option<u64>,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    /// Opaque structured output; set only on success.
    pub result: Option<Value>,
    pub error: Option<String>,
    pub traceback: Option<String>,
    /// Once set, the record is a frozen snapshot.
    pub name: Option<String>,
    /// Ordered child analyses this one aggregates.
    pub dependencies: Vec<AnalysisId>,
    /// Retry transitions observed in the current round.
    pub retries: u32,
    /// True once the current round's task has been handed to the execution
    /// adapter. Prevents duplicate dispatch of a pending parent while its
    /// children finish out of order.
    #[serde(default)]
    pub dispatched: bool,
}

impl Analysis {
    /// Create a fresh record in `not-run` with no dependencies.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workflow: impl Into<String>,
        workflow_version: u32,
        subject: Subject,
        params: Params,
        scope: OwnerScope,
        fingerprint: Fingerprint,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id: AnalysisId::new(),
            workflow: workflow.into(),
            workflow_version,
            subject,
            params,
            scope,
            fingerprint,
            task_state: TaskState::NotRun,
            token: SubmissionToken::new(),
            progress: 0.0,
            created_at_ms,
            submitted_at_ms: None,
            started_at_ms: None,
            ended_at_ms: None,
            result: None,
            error: None,
            traceback: None,
            name: None,
            dependencies: Vec::new(),
            retries: 0,
            dispatched: false,
        }
    }

    pub fn is_named(&self) -> bool {
        self.name.is_some()
    }

    /// Name the record, freezing it against cache reuse and recomputation.
    pub fn assign_name(&mut self, name: impl Into<String>) -> Result<(), TransitionError> {
        if self.is_named() {
            return Err(TransitionError::Named);
        }
        self.name = Some(name.into());
        Ok(())
    }

    /// First submission: `not-run` → `pending`.
    pub fn submit(&mut self, now_ms: u64) -> Result<SubmissionToken, TransitionError> {
        if self.task_state != TaskState::NotRun {
            return Err(TransitionError::InvalidState { op: "submit", from: self.task_state });
        }
        self.begin_round(now_ms);
        Ok(self.token.clone())
    }

    /// Forced resubmission: the only path out of `success`/`failure`
    /// (and out of `retry`) back to `pending`. Rejected for named records.
    pub fn resubmit(&mut self, now_ms: u64) -> Result<SubmissionToken, TransitionError> {
        if self.is_named() {
            return Err(TransitionError::Named);
        }
        if !matches!(self.task_state, TaskState::Success | TaskState::Failure | TaskState::Retry) {
            return Err(TransitionError::InvalidState { op: "resubmit", from: self.task_state });
        }
        self.begin_round(now_ms);
        Ok(self.token.clone())
    }

    /// Renewal after a source-data change: reset in place from any state and
    /// start a fresh round. The record id is reused; only named records are
    /// exempt. An in-flight older run keeps its stale token and its late
    /// terminal write is discarded.
    pub fn renew(&mut self, now_ms: u64) -> Result<SubmissionToken, TransitionError> {
        if self.is_named() {
            return Err(TransitionError::Named);
        }
        self.begin_round(now_ms);
        Ok(self.token.clone())
    }

    fn begin_round(&mut self, now_ms: u64) {
        self.task_state = TaskState::Pending;
        self.token = SubmissionToken::new();
        self.progress = 0.0;
        self.submitted_at_ms = Some(now_ms);
        self.started_at_ms = None;
        self.ended_at_ms = None;
        self.result = None;
        self.error = None;
        self.traceback = None;
        self.retries = 0;
        self.dispatched = false;
    }

    /// Record a failure decided by the engine itself (dependency aggregation),
    /// without a worker round trip.
    pub fn fail_now(
        &mut self,
        error: impl Into<String>,
        traceback: impl Into<String>,
        now_ms: u64,
    ) -> Result<(), TransitionError> {
        if self.task_state.is_terminal() || self.task_state == TaskState::NotRun {
            return Err(TransitionError::InvalidState { op: "fail", from: self.task_state });
        }
        self.task_state = TaskState::Failure;
        self.error = Some(error.into());
        self.traceback = Some(traceback.into());
        self.ended_at_ms = Some(now_ms);
        Ok(())
    }

    fn token_matches(&self, token: &SubmissionToken) -> bool {
        self.token == *token
    }

    /// Worker started: `pending`/`retry` → `started`. Returns whether applied.
    pub fn apply_started(&mut self, token: &SubmissionToken, now_ms: u64) -> bool {
        if !self.token_matches(token) {
            return false;
        }
        match self.task_state {
            TaskState::Pending | TaskState::Retry => {
                self.task_state = TaskState::Started;
                if self.started_at_ms.is_none() {
                    self.started_at_ms = Some(now_ms);
                }
                true
            }
            _ => false,
        }
    }

    /// Progress update; only applies while `started`. Late or out-of-order
    /// updates after a terminal state are ignored.
    pub fn apply_progress(&mut self, token: &SubmissionToken, fraction: f64) -> bool {
        if !self.token_matches(token) || self.task_state != TaskState::Started {
            return false;
        }
        self.progress = fraction.clamp(0.0, 1.0);
        true
    }

    /// Execution channel lost: `started` → `retry`. Not an error; the worker
    /// pool redelivers and the task starts again under the same token.
    pub fn apply_retry(&mut self, token: &SubmissionToken) -> bool {
        if !self.token_matches(token) || self.task_state != TaskState::Started {
            return false;
        }
        self.task_state = TaskState::Retry;
        self.retries += 1;
        true
    }

    /// Worker succeeded: `started` → `success`. Duplicate deliveries for the
    /// same round and stale-token writes are discarded.
    pub fn apply_success(&mut self, token: &SubmissionToken, result: Value, now_ms: u64) -> bool {
        if !self.token_matches(token) || self.task_state != TaskState::Started {
            return false;
        }
        self.task_state = TaskState::Success;
        self.progress = 1.0;
        self.result = Some(result);
        self.ended_at_ms = Some(now_ms);
        true
    }

    /// Worker failed: `started` → `failure`. Same discard rules as success.
    pub fn apply_failure(
        &mut self,
        token: &SubmissionToken,
        error: impl Into<String>,
        traceback: impl Into<String>,
        now_ms: u64,
    ) -> bool {
        if !self.token_matches(token) || self.task_state != TaskState::Started {
            return false;
        }
        self.task_state = TaskState::Failure;
        self.error = Some(error.into());
        self.traceback = Some(traceback.into());
        self.ended_at_ms = Some(now_ms);
        true
    }
}

crate::builder! {
    pub struct AnalysisBuilder => Analysis {
        into {
            workflow: String = "test-workflow",
        }
        set {
            workflow_version: u32 = 1,
            subject: Subject = Subject::Item(crate::subject::ItemId::from("itm-test")),
            params: Params = Params::new(),
            scope: OwnerScope = OwnerScope::Shared,
            task_state: TaskState = TaskState::NotRun,
            progress: f64 = 0.0,
            created_at_ms: u64 = 1_000_000,
            submitted_at_ms: Option<u64> = None,
            started_at_ms: Option<u64> = None,
            ended_at_ms: Option<u64> = None,
            result: Option<Value> = None,
            error: Option<String> = None,
            traceback: Option<String> = None,
            dependencies: Vec<AnalysisId> = Vec::new(),
            retries: u32 = 0,
            dispatched: bool = false,
        }
        option {
            name: String = None,
        }
        computed {
            id: AnalysisId = AnalysisId::new(),
            token: SubmissionToken = SubmissionToken::new(),
            fingerprint: Fingerprint = Fingerprint::compute(
                "test-workflow",
                1,
                &Subject::Item(crate::subject::ItemId::from("itm-test")),
                &Params::new(),
                &OwnerScope::Shared,
            ),
        }
    }
}

#[cfg(test)]
#[path = "analysis_tests.rs"]
mod tests;
