// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized analysis state: records plus the fingerprint index.

mod tasks;

use crate::StoreError;
use assay_core::{
    Analysis, AnalysisId, Event, Fingerprint, OwnerScope, Params, Subject, SubmissionToken,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Inputs for creating one analysis record.
#[derive(Debug, Clone)]
pub struct NewAnalysis {
    pub workflow: String,
    pub workflow_version: u32,
    pub subject: Subject,
    pub params: Params,
    pub scope: OwnerScope,
}

impl NewAnalysis {
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::compute(
            &self.workflow,
            self.workflow_version,
            &self.subject,
            &self.params,
            &self.scope,
        )
    }
}

/// All persisted analysis records plus the fingerprint index over the
/// unnamed ones.
///
/// Named records are deliberately absent from the index: they are frozen
/// snapshots, excluded from cache lookup and renewal. The index is rebuilt
/// from the records on snapshot load.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct AnalysisState {
    analyses: HashMap<AnalysisId, Analysis>,
    #[serde(skip)]
    index: HashMap<Fingerprint, AnalysisId>,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the unnamed record for this fingerprint, or create one in
    /// `not-run`. Returns the id and whether a record was created.
    ///
    /// Callers hold the state mutex across this call, which is what makes
    /// lookup+create atomic with respect to concurrent identical requests:
    /// exactly one unnamed record per fingerprint ever survives.
    pub fn find_or_create(&mut self, new: NewAnalysis, now_ms: u64) -> (AnalysisId, bool) {
        let fingerprint = new.fingerprint();
        if let Some(id) = self.index.get(&fingerprint) {
            return (id.clone(), false);
        }
        let analysis = Analysis::new(
            new.workflow,
            new.workflow_version,
            new.subject,
            new.params,
            new.scope,
            fingerprint.clone(),
            now_ms,
        );
        let id = analysis.id.clone();
        self.index.insert(fingerprint, id.clone());
        self.analyses.insert(id.clone(), analysis);
        (id, true)
    }

    pub fn get(&self, id: &AnalysisId) -> Option<&Analysis> {
        self.analyses.get(id)
    }

    pub fn require(&self, id: &AnalysisId) -> Result<&Analysis, StoreError> {
        self.get(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    fn require_mut(&mut self, id: &AnalysisId) -> Result<&mut Analysis, StoreError> {
        self.analyses.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// The unnamed record for this fingerprint, if any.
    pub fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> Option<&Analysis> {
        self.index.get(fingerprint).and_then(|id| self.analyses.get(id))
    }

    pub fn len(&self) -> usize {
        self.analyses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Analysis> {
        self.analyses.values()
    }

    /// First submission of a `not-run` record.
    pub fn submit(&mut self, id: &AnalysisId, now_ms: u64) -> Result<SubmissionToken, StoreError> {
        Ok(self.require_mut(id)?.submit(now_ms)?)
    }

    /// Forced resubmission out of a terminal (or retry) state.
    pub fn resubmit(
        &mut self,
        id: &AnalysisId,
        now_ms: u64,
    ) -> Result<SubmissionToken, StoreError> {
        Ok(self.require_mut(id)?.resubmit(now_ms)?)
    }

    /// Renewal reset after a source-data change. Reuses the record in place.
    pub fn renew(&mut self, id: &AnalysisId, now_ms: u64) -> Result<SubmissionToken, StoreError> {
        Ok(self.require_mut(id)?.renew(now_ms)?)
    }

    /// Mark the current round as handed to the execution adapter.
    pub fn mark_dispatched(&mut self, id: &AnalysisId) -> Result<(), StoreError> {
        self.require_mut(id)?.dispatched = true;
        Ok(())
    }

    /// Replace the record's ordered dependency list.
    pub fn set_dependencies(
        &mut self,
        id: &AnalysisId,
        dependencies: Vec<AnalysisId>,
    ) -> Result<(), StoreError> {
        self.require_mut(id)?.dependencies = dependencies;
        Ok(())
    }

    /// Record an engine-decided failure (dependency aggregation).
    pub fn fail_now(
        &mut self,
        id: &AnalysisId,
        error: &str,
        traceback: &str,
        now_ms: u64,
    ) -> Result<(), StoreError> {
        Ok(self.require_mut(id)?.fail_now(error, traceback, now_ms)?)
    }

    /// Name a record, freezing it. The fingerprint index entry is removed so
    /// the next `find_or_create` for the same tuple builds a fresh record.
    pub fn assign_name(&mut self, id: &AnalysisId, name: &str) -> Result<(), StoreError> {
        let analysis = self.require_mut(id)?;
        analysis.assign_name(name)?;
        let fingerprint = analysis.fingerprint.clone();
        if self.index.get(&fingerprint) == Some(id) {
            self.index.remove(&fingerprint);
        }
        Ok(())
    }

    /// Ids of unnamed records whose subject is one of the given subjects.
    pub fn unnamed_for_subjects(&self, subjects: &[Subject]) -> Vec<AnalysisId> {
        let mut out: Vec<&Analysis> = self
            .analyses
            .values()
            .filter(|a| !a.is_named() && subjects.contains(&a.subject))
            .collect();
        out.sort_by_key(|a| a.created_at_ms);
        out.into_iter().map(|a| a.id.clone()).collect()
    }

    /// Ids of records listing `id` among their dependencies.
    pub fn dependents_of(&self, id: &AnalysisId) -> Vec<AnalysisId> {
        let mut out: Vec<&Analysis> = self
            .analyses
            .values()
            .filter(|a| a.dependencies.contains(id))
            .collect();
        out.sort_by_key(|a| a.created_at_ms);
        out.into_iter().map(|a| a.id.clone()).collect()
    }

    /// Apply a worker callback event. Idempotent: at-least-once delivery
    /// means the same event may arrive twice, and a reset record may see
    /// late events from a previous round; both are discarded by the
    /// token/state guards on [`Analysis`].
    pub fn apply_event(&mut self, event: &Event, now_ms: u64) {
        tasks::apply(self, event, now_ms);
    }

    /// Rebuild the fingerprint index from the records (after snapshot load).
    pub(crate) fn rebuild_index(&mut self) {
        self.index.clear();
        for analysis in self.analyses.values() {
            if !analysis.is_named() {
                self.index.insert(analysis.fingerprint.clone(), analysis.id.clone());
            }
        }
    }

    pub(crate) fn get_mut_for_event(&mut self, id: &AnalysisId) -> Option<&mut Analysis> {
        self.analyses.get_mut(id)
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
