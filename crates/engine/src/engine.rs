// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine struct: shared state plus the adapter set.

use crate::config::EngineConfig;
use assay_adapters::{CatalogAdapter, ExecAdapter, NotifyAdapter, PermissionAdapter, TaskSubmission};
use assay_core::{
    Analysis, AnalysisId, Clock, DependencyInput, SystemClock, WorkflowRegistry,
};
use assay_storage::AnalysisState;
use parking_lot::Mutex;
use std::sync::Arc;

/// Orchestrator over the analysis store.
///
/// All mutation of [`AnalysisState`] happens under the single mutex held
/// here; adapter calls never overlap the lock. Cloning is cheap and shares
/// the store, so request handlers and the event loop operate on one state.
pub struct Engine<P, G, N, E, C = SystemClock>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    pub(crate) store: Arc<Mutex<AnalysisState>>,
    pub(crate) registry: Arc<WorkflowRegistry>,
    pub(crate) permissions: P,
    pub(crate) catalog: G,
    pub(crate) notify: N,
    pub(crate) exec: E,
    pub(crate) clock: C,
    pub(crate) config: EngineConfig,
}

impl<P, G, N, E, C> Clone for Engine<P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
            permissions: self.permissions.clone(),
            catalog: self.catalog.clone(),
            notify: self.notify.clone(),
            exec: self.exec.clone(),
            clock: self.clock.clone(),
            config: self.config.clone(),
        }
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
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<WorkflowRegistry>,
        permissions: P,
        catalog: G,
        notify: N,
        exec: E,
        clock: C,
        config: EngineConfig,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(AnalysisState::new())),
            registry,
            permissions,
            catalog,
            notify,
            exec,
            clock,
            config,
        }
    }

    /// Replace the store contents, e.g. after loading a snapshot.
    pub fn restore(&self, state: AnalysisState) {
        *self.store.lock() = state;
    }

    pub fn registry(&self) -> &WorkflowRegistry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Name a record, freezing it: it leaves the fingerprint index and is
    /// exempt from renewal and resubmission from then on.
    pub fn assign_name(
        &self,
        id: &AnalysisId,
        name: &str,
    ) -> Result<(), crate::error::EngineError> {
        self.store.lock().assign_name(id, name)?;
        tracing::info!(analysis = %id, name, "record named and frozen");
        Ok(())
    }

    /// Snapshot of one record, if it exists.
    pub fn analysis(&self, id: &AnalysisId) -> Option<Analysis> {
        self.store.lock().get(id).cloned()
    }

    /// Copy of the whole store, for snapshot persistence.
    pub fn state_snapshot(&self) -> AnalysisState {
        self.store.lock().clone()
    }

    pub(crate) fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Build the wire-ready submission for a record whose round is about to
    /// be handed to the execution adapter. Dependency inputs carry only the
    /// succeeded children, in declaration order.
    pub(crate) fn build_submission(store: &AnalysisState, analysis: &Analysis) -> TaskSubmission {
        let inputs: Vec<DependencyInput> = analysis
            .dependencies
            .iter()
            .filter_map(|dep_id| store.get(dep_id))
            .filter_map(|dep| {
                dep.result.as_ref().map(|result| DependencyInput {
                    analysis: dep.id.clone(),
                    subject: dep.subject.clone(),
                    result: result.clone(),
                })
            })
            .collect();
        TaskSubmission {
            analysis: analysis.id.clone(),
            token: analysis.token.clone(),
            workflow: analysis.workflow.clone(),
            subject: analysis.subject.clone(),
            params: analysis.params.clone(),
            inputs,
        }
    }

    /// Hand planned submissions to the execution adapter, outside the lock.
    pub(crate) async fn dispatch_all(
        &self,
        tasks: Vec<TaskSubmission>,
    ) -> Result<(), crate::error::EngineError> {
        for task in tasks {
            tracing::info!(
                analysis = %task.analysis,
                workflow = %task.workflow,
                subject = %task.subject,
                inputs = task.inputs.len(),
                "dispatching task"
            );
            self.exec.submit(task).await?;
        }
        Ok(())
    }
}
