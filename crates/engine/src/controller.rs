// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request-facing query surface over the engine.

use crate::engine::Engine;
use crate::error::EngineError;
use assay_adapters::{CatalogAdapter, ExecAdapter, NotifyAdapter, PermissionAdapter};
use assay_core::{raw_params, Analysis, AnalysisId, Clock, Subject, TaskState, UserId};
use assay_storage::NewAnalysis;
use serde_json::Value;

/// One viewer's request for a workflow over a set of subjects, bound to
/// the records that answer it.
///
/// Construction resolves the subjects and fills cache misses with fresh
/// `not-run` records, but submits nothing. Callers poll [`get`] for current
/// states and call [`trigger_missing`] to lazily start whatever has never
/// run; a cache miss is computed on first access, not on creation.
///
/// [`get`]: AnalysisController::get
/// [`trigger_missing`]: AnalysisController::trigger_missing
pub struct AnalysisController<'e, P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    engine: &'e Engine<P, G, N, E, C>,
    entries: Vec<AnalysisId>,
}

impl<P, G, N, E, C> std::fmt::Debug for AnalysisController<'_, P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisController")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl<P, G, N, E, C> Engine<P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    /// Build a controller for `(viewer, subjects, workflow, kwargs)`.
    ///
    /// Validation is synchronous and strict: unknown workflow, a subject
    /// variant the workflow does not accept, and bad kwargs are all
    /// rejected here, before any record is created. A subject the viewer
    /// cannot read is silently excluded; resolving nothing at all yields an
    /// empty controller, not an error.
    pub async fn controller(
        &self,
        viewer: &UserId,
        subjects: &[Subject],
        workflow: &str,
        kwargs: Option<&Value>,
    ) -> Result<AnalysisController<'_, P, G, N, E, C>, EngineError> {
        let spec = self.registry.get(workflow)?;
        for subject in subjects {
            self.registry.check_accepts(workflow, subject.kind())?;
        }
        let params = spec.schema.normalize(&raw_params(kwargs)?)?;

        let mut entries = Vec::new();
        for subject in subjects {
            let Some(resolved) = self.resolve(subject, viewer).await? else {
                continue;
            };
            let (id, created) = {
                let mut store = self.store.lock();
                store.find_or_create(
                    NewAnalysis {
                        workflow: spec.name.clone(),
                        workflow_version: spec.version,
                        subject: resolved.subject,
                        params: params.clone(),
                        scope: resolved.scope,
                    },
                    self.now_ms(),
                )
            };
            if created {
                tracing::debug!(analysis = %id, %subject, "record created for request");
            }
            if !entries.contains(&id) {
                entries.push(id);
            }
        }
        Ok(AnalysisController { engine: self, entries })
    }
}

impl<P, G, N, E, C> AnalysisController<'_, P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    /// Submit every entry still in `not-run`. Idempotent: entries in any
    /// other state are left untouched.
    pub async fn trigger_missing(&self) -> Result<(), EngineError> {
        for id in &self.entries {
            let not_run = self
                .engine
                .analysis(id)
                .is_some_and(|a| a.task_state == TaskState::NotRun);
            if not_run {
                self.engine.begin_round(id, crate::dispatch::Round::Submit).await?;
            }
        }
        Ok(())
    }

    /// Current snapshots of the resolved records, in resolution order.
    pub fn get(&self) -> Vec<Analysis> {
        let store = self.engine.store.lock();
        self.entries.iter().filter_map(|id| store.get(id).cloned()).collect()
    }

    pub fn ids(&self) -> &[AnalysisId] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
