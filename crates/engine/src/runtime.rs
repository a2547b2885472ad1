// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event loop: worker callbacks and source mutations enter here.

use crate::engine::Engine;
use crate::error::EngineError;
use assay_adapters::{CatalogAdapter, ExecAdapter, NotifyAdapter, PermissionAdapter};
use assay_core::{AnalysisId, Clock, Event, TaskState};
use tokio::sync::mpsc;

impl<P, G, N, E, C> Engine<P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    /// Consume events until the channel closes or a shutdown event arrives.
    ///
    /// Adapter faults are logged and the loop keeps going; a wedged loop
    /// would strand every in-flight analysis in `pending`.
    pub async fn run(&self, mut events: mpsc::Receiver<Event>) {
        tracing::info!("runtime loop started");
        while let Some(event) = events.recv().await {
            let shutdown = matches!(event, Event::Shutdown);
            if let Err(e) = self.handle_event(&event).await {
                tracing::error!(event = event.name(), error = %e, "event handling failed");
            }
            if shutdown {
                break;
            }
        }
        if let Some(path) = self.config.snapshot_path.clone() {
            let state = self.state_snapshot();
            match assay_storage::save(&state, &path) {
                Ok(()) => tracing::info!(path = %path.display(), "state snapshot written"),
                Err(e) => tracing::error!(error = %e, "state snapshot failed"),
            }
        }
        tracing::info!("runtime loop stopped");
    }

    /// Apply one event. Task callbacks mutate the store idempotently; a
    /// terminal transition wakes the record's dependents.
    pub async fn handle_event(&self, event: &Event) -> Result<(), EngineError> {
        tracing::debug!(event = event.name(), "event received");
        match event {
            Event::TaskStarted { .. }
            | Event::TaskProgress { .. }
            | Event::TaskSucceeded { .. }
            | Event::TaskFailed { .. } => self.handle_task_event(event).await,
            Event::TaskRetry { id, .. } => {
                self.handle_task_event(event).await?;
                self.handle_retry(id).await
            }
            Event::SourceChanged { source } => self.on_source_changed(source).await,
            Event::SourceDeleted { source } => self.on_source_deleted(source).await,
            Event::Shutdown | Event::Custom => Ok(()),
        }
    }

    async fn handle_task_event(&self, event: &Event) -> Result<(), EngineError> {
        let mut tasks = Vec::new();
        let settled = {
            let mut store = self.store.lock();
            let now = self.now_ms();
            store.apply_event(event, now);
            let settled = event
                .analysis_id()
                .and_then(|id| store.get(id))
                .filter(|a| a.task_state.is_terminal())
                .map(|a| (a.id.clone(), a.task_state, a.workflow.clone()));
            if let Some((id, _, _)) = &settled {
                self.reconcile_dependents(&mut store, id, now, &mut tasks)?;
            }
            settled
        };
        self.dispatch_all(tasks).await?;
        if let Some((id, state, workflow)) = settled {
            self.notify_settled(&id, state, &workflow).await;
        }
        Ok(())
    }

    /// A retry means the execution channel was lost, not that the
    /// computation errored. Within budget the same round is handed back to
    /// the worker pool under its existing token; past the budget the loss
    /// is permanent and recorded as a failure.
    async fn handle_retry(&self, id: &AnalysisId) -> Result<(), EngineError> {
        let mut tasks = Vec::new();
        let mut escalated = None;
        {
            let mut store = self.store.lock();
            let now = self.now_ms();
            let Some(analysis) = store.get(id) else { return Ok(()) };
            if analysis.task_state != TaskState::Retry {
                return Ok(());
            }
            if analysis.retries > self.config.max_retries {
                tracing::warn!(analysis = %id, retries = analysis.retries, "retry budget exhausted");
                store.fail_now(
                    id,
                    "execution channel lost",
                    "task redelivery exceeded the retry budget",
                    now,
                )?;
                escalated = Some(store.require(id)?.workflow.clone());
                self.reconcile_dependents(&mut store, id, now, &mut tasks)?;
            } else {
                let analysis = store.require(id)?.clone();
                tasks.push(Self::build_submission(&store, &analysis));
            }
        }
        self.dispatch_all(tasks).await?;
        if let Some(workflow) = escalated {
            self.notify_settled(id, TaskState::Failure, &workflow).await;
        }
        Ok(())
    }

    async fn notify_settled(&self, id: &AnalysisId, state: TaskState, workflow: &str) {
        let title = match state {
            TaskState::Success => "analysis finished",
            _ => "analysis failed",
        };
        if let Err(e) = self.notify.notify(title, &format!("{workflow} ({id})")).await {
            tracing::warn!(analysis = %id, error = %e, "notification failed");
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
