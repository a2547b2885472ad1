// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution adapter: the boundary to the asynchronous worker pool.
//!
//! Submission is fire-and-forget; everything the worker has to say comes
//! back as events on the core's channel. Callbacks are at-least-once and
//! the store applies them idempotently, so an adapter is free to redeliver.

use crate::blob::{BlobAdapter, BlobError};
use assay_core::{
    AnalysisId, DependencyInput, Event, Params, ProgressSink, Subject, SubmissionToken,
    WorkflowInput, WorkflowRegistry,
};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

/// One queued computation request.
#[derive(Debug, Clone)]
pub struct TaskSubmission {
    pub analysis: AnalysisId,
    pub token: SubmissionToken,
    pub workflow: String,
    pub subject: Subject,
    pub params: Params,
    /// Already-computed dependency outputs, in declaration order.
    pub inputs: Vec<DependencyInput>,
}

/// Errors from task submission.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("unknown workflow: {0}")]
    UnknownWorkflow(String),
    #[error("event channel closed")]
    ChannelClosed,
}

/// Adapter over the worker pool. `submit` must not block on computation.
#[async_trait]
pub trait ExecAdapter: Clone + Send + Sync + 'static {
    async fn submit(&self, task: TaskSubmission) -> Result<(), ExecError>;
}

/// Progress sink that forwards fractions as events.
///
/// Uses `try_send`: progress is lossy last-write-wins data, and a handler
/// must never block on a full channel.
struct ChannelProgress {
    id: AnalysisId,
    token: SubmissionToken,
    events: mpsc::Sender<Event>,
}

impl ProgressSink for ChannelProgress {
    fn report(&self, fraction: f64) {
        let _ = self.events.try_send(Event::TaskProgress {
            id: self.id.clone(),
            token: self.token.clone(),
            fraction,
        });
    }
}

/// Results whose serialized form exceeds this many bytes are handed to the
/// blob store; the recorded result is the inline stub `{"blob": "<ref>"}`.
pub const INLINE_RESULT_MAX: usize = 64 * 1024;

/// Replace an oversized result value with its blob stub.
async fn offload_result<B: BlobAdapter>(blobs: &B, result: Value) -> Result<Value, BlobError> {
    let bytes = serde_json::to_vec(&result)?;
    if bytes.len() <= INLINE_RESULT_MAX {
        return Ok(result);
    }
    let blob = blobs.put(&bytes).await?;
    tracing::info!(%blob, size = bytes.len(), "result offloaded to blob storage");
    Ok(serde_json::json!({ "blob": blob }))
}

/// Worker pool running registered handlers on tokio blocking tasks.
///
/// One spawned task per submission: emits `task:started`, runs the handler
/// on the blocking pool, then emits `task:succeeded` or `task:failed`.
/// Oversized results are parked in the blob store first.
#[derive(Clone)]
pub struct LocalExecAdapter<B: BlobAdapter> {
    registry: Arc<WorkflowRegistry>,
    events: mpsc::Sender<Event>,
    blobs: B,
}

impl<B: BlobAdapter> LocalExecAdapter<B> {
    pub fn new(registry: Arc<WorkflowRegistry>, events: mpsc::Sender<Event>, blobs: B) -> Self {
        Self { registry, events, blobs }
    }
}

#[async_trait]
impl<B: BlobAdapter> ExecAdapter for LocalExecAdapter<B> {
    async fn submit(&self, task: TaskSubmission) -> Result<(), ExecError> {
        let handler = self
            .registry
            .get(&task.workflow)
            .map_err(|_| ExecError::UnknownWorkflow(task.workflow.clone()))?
            .handler
            .clone();
        let events = self.events.clone();
        let blobs = self.blobs.clone();

        tokio::spawn(async move {
            let TaskSubmission { analysis, token, workflow, subject, params, inputs } = task;
            tracing::info!(%analysis, %workflow, subject = %subject, "worker picked up task");

            if events
                .send(Event::TaskStarted { id: analysis.clone(), token: token.clone() })
                .await
                .is_err()
            {
                return;
            }

            let progress = ChannelProgress {
                id: analysis.clone(),
                token: token.clone(),
                events: events.clone(),
            };
            let input = WorkflowInput { subject, params, inputs };
            let outcome =
                tokio::task::spawn_blocking(move || (handler)(&input, &progress)).await;

            let event = match outcome {
                Ok(Ok(result)) => match offload_result(&blobs, result).await {
                    Ok(result) => Event::TaskSucceeded { id: analysis, token, result },
                    Err(e) => Event::TaskFailed {
                        id: analysis,
                        token,
                        error: format!("result offload failed: {e}"),
                        traceback: String::new(),
                    },
                },
                Ok(Err(e)) => Event::TaskFailed {
                    id: analysis,
                    token,
                    error: e.message,
                    traceback: e.traceback,
                },
                // The blocking task was cancelled or panicked: treat as a
                // lost execution channel, not a computation error.
                Err(join_error) => {
                    tracing::warn!(%analysis, error = %join_error, "worker task lost");
                    Event::TaskRetry { id: analysis, token }
                }
            };
            let _ = events.send(event).await;
        });

        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{ExecAdapter, ExecError, TaskSubmission};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Records submissions without executing anything. Tests drive the
    /// lifecycle by feeding events into the store themselves.
    #[derive(Clone, Default)]
    pub struct FakeExecAdapter {
        submissions: Arc<Mutex<Vec<TaskSubmission>>>,
    }

    impl FakeExecAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn submissions(&self) -> Vec<TaskSubmission> {
            self.submissions.lock().clone()
        }

        /// Drain recorded submissions.
        pub fn take(&self) -> Vec<TaskSubmission> {
            std::mem::take(&mut self.submissions.lock())
        }
    }

    #[async_trait]
    impl ExecAdapter for FakeExecAdapter {
        async fn submit(&self, task: TaskSubmission) -> Result<(), ExecError> {
            self.submissions.lock().push(task);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeExecAdapter;

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
