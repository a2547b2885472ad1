// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event types for the assay dispatch core.
//!
//! Worker callbacks and source-data mutations enter the core as events on a
//! single channel. Delivery is at-least-once, so every consumer of these
//! events must apply them idempotently.

use crate::analysis::{AnalysisId, SubmissionToken};
use crate::subject::{CollectionId, ItemId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to a source data record whose cache-relevant state changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SourceRef {
    Item(ItemId),
    Collection(CollectionId),
}

/// Events consumed by the runtime loop.
///
/// Serializes with `{"type": "event:name", ...fields}` format.
/// Unknown type tags deserialize to `Custom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "system:shutdown")]
    Shutdown,

    /// Worker picked the task up.
    #[serde(rename = "task:started")]
    TaskStarted { id: AnalysisId, token: SubmissionToken },

    /// Progress fraction in [0, 1]; only meaningful while started.
    #[serde(rename = "task:progress")]
    TaskProgress { id: AnalysisId, token: SubmissionToken, fraction: f64 },

    /// Execution channel lost; the worker pool will redeliver.
    #[serde(rename = "task:retry")]
    TaskRetry { id: AnalysisId, token: SubmissionToken },

    /// Computation finished with a result payload.
    #[serde(rename = "task:succeeded")]
    TaskSucceeded { id: AnalysisId, token: SubmissionToken, result: Value },

    /// Computation raised; error and traceback are data, not a fault.
    #[serde(rename = "task:failed")]
    TaskFailed { id: AnalysisId, token: SubmissionToken, error: String, traceback: String },

    /// A source record's cache-relevant data changed (e.g., files reprocessed).
    #[serde(rename = "source:changed")]
    SourceChanged { source: SourceRef },

    /// A source record was deleted; only its immediate container renews.
    #[serde(rename = "source:deleted")]
    SourceDeleted { source: SourceRef },

    #[serde(other)]
    Custom,
}

impl Event {
    /// Short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Shutdown => "system:shutdown",
            Event::TaskStarted { .. } => "task:started",
            Event::TaskProgress { .. } => "task:progress",
            Event::TaskRetry { .. } => "task:retry",
            Event::TaskSucceeded { .. } => "task:succeeded",
            Event::TaskFailed { .. } => "task:failed",
            Event::SourceChanged { .. } => "source:changed",
            Event::SourceDeleted { .. } => "source:deleted",
            Event::Custom => "custom",
        }
    }

    /// The analysis this event addresses, if it is a task callback.
    pub fn analysis_id(&self) -> Option<&AnalysisId> {
        match self {
            Event::TaskStarted { id, .. }
            | Event::TaskProgress { id, .. }
            | Event::TaskRetry { id, .. }
            | Event::TaskSucceeded { id, .. }
            | Event::TaskFailed { id, .. } => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
