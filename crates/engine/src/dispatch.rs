// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission planning: cache fill, dependency fan-out, reconciliation.
//!
//! Store mutation and adapter calls are strictly phased: each operation
//! plans its submissions under the store mutex, then hands the collected
//! [`TaskSubmission`]s to the execution adapter after the lock is released.

use crate::engine::Engine;
use crate::error::EngineError;
use assay_adapters::{CatalogAdapter, ExecAdapter, NotifyAdapter, PermissionAdapter, TaskSubmission};
use assay_core::{
    Analysis, AnalysisId, Clock, CollectionId, OwnerScope, Subject, TaskState, TransitionError,
};
use assay_storage::{AnalysisState, NewAnalysis, StoreError};

/// Which transition opens the new submission round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Round {
    /// First submission of a `not-run` record.
    Submit,
    /// Explicit forced resubmission out of a terminal state.
    Resubmit,
    /// Reset after a source-data change.
    Renew,
}

impl<P, G, N, E, C> Engine<P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    /// Look up the cached record for this fingerprint, creating and
    /// submitting it on a miss. An existing record is returned as-is, in
    /// whatever state it is in; only `not-run` triggers submission.
    pub async fn get_or_submit(&self, new: NewAnalysis) -> Result<Analysis, EngineError> {
        let (id, created) = {
            let mut store = self.store.lock();
            store.find_or_create(new, self.now_ms())
        };
        if created {
            tracing::info!(analysis = %id, "cache miss, record created");
        }
        let needs_submit =
            self.store.lock().require(&id)?.task_state == TaskState::NotRun;
        if needs_submit {
            self.begin_round(&id, Round::Submit).await?;
        }
        Ok(self.store.lock().require(&id)?.clone())
    }

    /// Forced resubmission: the only way out of `success`/`failure` back to
    /// `pending`. Rejected for named records.
    pub async fn force_resubmit(&self, id: &AnalysisId) -> Result<Analysis, EngineError> {
        self.begin_round(id, Round::Resubmit).await?;
        Ok(self.store.lock().require(id)?.clone())
    }

    /// Open a new round on an existing record and dispatch whatever became
    /// runnable. Group membership is recomputed from the catalog on every
    /// round, outside the lock.
    pub(crate) async fn begin_round(
        &self,
        id: &AnalysisId,
        round: Round,
    ) -> Result<(), EngineError> {
        let (subject, scope) = {
            let store = self.store.lock();
            let analysis = store.require(id)?;
            (analysis.subject.clone(), analysis.scope.clone())
        };
        let members = match (&subject, &scope) {
            (Subject::Group(group), OwnerScope::Viewer(viewer)) => {
                Some(self.group_members(group, viewer).await?)
            }
            // Group records are always viewer-scoped at creation; a shared
            // group record would have no permission context to resolve with.
            (Subject::Group(_), OwnerScope::Shared) => Some(Vec::new()),
            _ => None,
        };

        let mut tasks = Vec::new();
        {
            let mut store = self.store.lock();
            let now = self.now_ms();
            match round {
                Round::Submit => match store.submit(id, now) {
                    Ok(_) => {}
                    // Lost the race with another submitter; their round stands.
                    Err(StoreError::Transition(TransitionError::InvalidState { .. })) => {
                        return Ok(());
                    }
                    Err(e) => return Err(e.into()),
                },
                Round::Resubmit => {
                    store.resubmit(id, now)?;
                }
                Round::Renew => {
                    store.renew(id, now)?;
                }
            }
            match members {
                Some(members) => {
                    self.plan_group_round(&mut store, id, &members, now, &mut tasks)?
                }
                None => self.plan_leaf_round(&mut store, id, &mut tasks)?,
            }
        }
        self.dispatch_all(tasks).await
    }

    /// A record with no dependency fan-out is runnable immediately.
    pub(crate) fn plan_leaf_round(
        &self,
        store: &mut AnalysisState,
        id: &AnalysisId,
        tasks: &mut Vec<TaskSubmission>,
    ) -> Result<(), EngineError> {
        let analysis = store.require(id)?.clone();
        store.mark_dispatched(id)?;
        tasks.push(Self::build_submission(store, &analysis));
        Ok(())
    }

    /// Fan a group round out to one child per member collection: same
    /// workflow and params, collection subject, shared scope. Children are
    /// found-or-created under the same fingerprint semantics and submitted
    /// only from `not-run`; a cached terminal child is consumed as-is.
    fn plan_group_round(
        &self,
        store: &mut AnalysisState,
        parent_id: &AnalysisId,
        members: &[CollectionId],
        now: u64,
        tasks: &mut Vec<TaskSubmission>,
    ) -> Result<(), EngineError> {
        let parent = store.require(parent_id)?.clone();
        let mut children = Vec::with_capacity(members.len());
        for member in members {
            let (child_id, created) = store.find_or_create(
                NewAnalysis {
                    workflow: parent.workflow.clone(),
                    workflow_version: parent.workflow_version,
                    subject: Subject::Collection(member.clone()),
                    params: parent.params.clone(),
                    scope: OwnerScope::Shared,
                },
                now,
            );
            if created {
                tracing::debug!(parent = %parent_id, child = %child_id, "dependency created");
            }
            if store.require(&child_id)?.task_state == TaskState::NotRun {
                store.submit(&child_id, now)?;
                self.plan_leaf_round(store, &child_id, tasks)?;
            }
            children.push(child_id);
        }
        store.set_dependencies(parent_id, children)?;
        self.reconcile_parent(store, parent_id, now, tasks)?;
        Ok(())
    }

    /// Dispatch a pending parent whose children have all settled, or record
    /// its failure when every child failed. Returns whether the parent
    /// reached a terminal state here.
    pub(crate) fn reconcile_parent(
        &self,
        store: &mut AnalysisState,
        parent_id: &AnalysisId,
        now: u64,
        tasks: &mut Vec<TaskSubmission>,
    ) -> Result<bool, EngineError> {
        let parent = store.require(parent_id)?.clone();
        if parent.task_state != TaskState::Pending || parent.dispatched {
            return Ok(false);
        }
        let children: Vec<&Analysis> =
            parent.dependencies.iter().filter_map(|id| store.get(id)).collect();
        if children.iter().any(|c| !c.task_state.is_terminal()) {
            return Ok(false);
        }

        let succeeded = children.iter().filter(|c| c.task_state == TaskState::Success).count();
        if !children.is_empty() && succeeded == 0 {
            let traceback: Vec<String> = children
                .iter()
                .map(|c| {
                    format!(
                        "{}: {}",
                        c.subject,
                        c.traceback.as_deref().or(c.error.as_deref()).unwrap_or("failed")
                    )
                })
                .collect();
            let traceback = traceback.join("\n");
            tracing::info!(parent = %parent_id, children = children.len(), "all dependencies failed");
            store.fail_now(parent_id, "error propagated from dependency", &traceback, now)?;
            return Ok(true);
        }

        store.mark_dispatched(parent_id)?;
        tasks.push(Self::build_submission(store, &parent));
        Ok(false)
    }

    /// Walk pending parents upward from a record that just settled,
    /// dispatching or failing each one whose children are now all terminal.
    pub(crate) fn reconcile_dependents(
        &self,
        store: &mut AnalysisState,
        id: &AnalysisId,
        now: u64,
        tasks: &mut Vec<TaskSubmission>,
    ) -> Result<(), EngineError> {
        let mut settled = vec![id.clone()];
        while let Some(current) = settled.pop() {
            for parent_id in store.dependents_of(&current) {
                if self.reconcile_parent(store, &parent_id, now, tasks)? {
                    settled.push(parent_id);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
