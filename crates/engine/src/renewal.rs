// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Invalidation: renewing cached results after source-data mutations.

use crate::engine::Engine;
use crate::error::EngineError;
use assay_adapters::{CatalogAdapter, ExecAdapter, NotifyAdapter, PermissionAdapter};
use assay_core::{AnalysisId, Clock, SourceRef, Subject, TaskState};

impl<P, G, N, E, C> Engine<P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    /// A source record's cache-relevant data changed: every unnamed record
    /// over that source, its containing collection, and (transitively)
    /// anything aggregating those records, is reset and recomputed in
    /// place. Named records are never touched.
    pub async fn on_source_changed(&self, source: &SourceRef) -> Result<(), EngineError> {
        let subjects = self.affected_subjects(source).await?;
        self.renew_subjects(&subjects).await
    }

    /// A source record was deleted. Only its immediate container renews:
    /// deleting an item refreshes the collection-level analyses over its
    /// collection; deleting a whole collection renews nothing and is only
    /// reported through the notification adapter.
    pub async fn on_source_deleted(&self, source: &SourceRef) -> Result<(), EngineError> {
        match source {
            SourceRef::Item(item) => {
                let subjects = match self.catalog.collection_of(item).await? {
                    Some(collection) => vec![Subject::Collection(collection)],
                    None => Vec::new(),
                };
                self.renew_subjects(&subjects).await
            }
            SourceRef::Collection(collection) => {
                if let Err(e) = self
                    .notify
                    .notify("source deleted", &format!("collection {collection} was deleted"))
                    .await
                {
                    tracing::warn!(error = %e, "deletion notification failed");
                }
                Ok(())
            }
        }
    }

    async fn affected_subjects(&self, source: &SourceRef) -> Result<Vec<Subject>, EngineError> {
        match source {
            SourceRef::Item(item) => {
                let mut subjects = vec![Subject::Item(item.clone())];
                if let Some(collection) = self.catalog.collection_of(item).await? {
                    subjects.push(Subject::Collection(collection));
                }
                Ok(subjects)
            }
            SourceRef::Collection(collection) => {
                Ok(vec![Subject::Collection(collection.clone())])
            }
        }
    }

    /// Renew every unnamed record over the given subjects, plus the
    /// transitive closure of records depending on them. Each record is
    /// reset in place (same id, fresh token) so the old result stays
    /// readable until the replacement round lands; late callbacks from the
    /// superseded round fail the token check and are discarded.
    async fn renew_subjects(&self, subjects: &[Subject]) -> Result<(), EngineError> {
        let mut tasks = Vec::new();
        let mut frozen = Vec::new();
        {
            let mut store = self.store.lock();
            let now = self.now_ms();

            // Named records are exempt from renewal; their owners are told
            // the underlying data moved on without them.
            frozen.extend(
                store
                    .iter()
                    .filter(|a| subjects.contains(&a.subject))
                    .filter_map(|a| a.name.clone()),
            );

            let mut closure: Vec<AnalysisId> = Vec::new();
            let mut worklist = store.unnamed_for_subjects(subjects);
            while let Some(id) = worklist.pop() {
                if closure.contains(&id) {
                    continue;
                }
                closure.push(id.clone());
                for dependent in store.dependents_of(&id) {
                    let named = store.get(&dependent).is_none_or(|a| a.is_named());
                    if !named && !closure.contains(&dependent) {
                        worklist.push(dependent);
                    }
                }
            }

            // Records still in not-run have no stale result to refresh;
            // they keep waiting for their lazy first read.
            closure.retain(|id| {
                store.get(id).is_some_and(|a| a.task_state != TaskState::NotRun)
            });

            for id in &closure {
                store.renew(id, now)?;
                tracing::info!(analysis = %id, "renewed after source change");
            }
            for id in &closure {
                let has_dependencies = !store.require(id)?.dependencies.is_empty();
                if has_dependencies {
                    self.reconcile_parent(&mut store, id, now, &mut tasks)?;
                } else {
                    self.plan_leaf_round(&mut store, id, &mut tasks)?;
                }
            }
        }
        for name in frozen {
            if let Err(e) = self
                .notify
                .notify("source changed", &format!("named analysis {name} uses data that has changed"))
                .await
            {
                tracing::warn!(error = %e, "staleness notification failed");
            }
        }
        self.dispatch_all(tasks).await
    }
}

#[cfg(test)]
#[path = "renewal_tests.rs"]
mod tests;
