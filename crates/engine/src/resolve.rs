// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subject resolution: permission filtering, scope, and group membership.

use crate::engine::Engine;
use crate::error::EngineError;
use assay_adapters::{CatalogAdapter, ExecAdapter, NotifyAdapter, PermissionAdapter, PermissionLevel};
use assay_core::{Clock, CollectionId, GroupId, OwnerScope, Subject, UserId};

/// One concrete subject a request resolved to, with its owner scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub subject: Subject,
    pub scope: OwnerScope,
}

/// Case-insensitive label prefix match. `projects/alloys` reaches
/// `projects/alloys` itself and every nested sub-label under it.
fn label_matches(candidate: &str, group_label: &str) -> bool {
    let candidate = candidate.to_lowercase();
    let prefix = group_label.to_lowercase();
    candidate == prefix || candidate.starts_with(&format!("{prefix}/"))
}

impl<P, G, N, E, C> Engine<P, G, N, E, C>
where
    P: PermissionAdapter,
    G: CatalogAdapter,
    N: NotifyAdapter,
    E: ExecAdapter,
    C: Clock,
{
    /// Resolve one requested subject for a viewer.
    ///
    /// Items and collections pass through after a read-permission check;
    /// a denied subject contributes nothing rather than erroring. A group
    /// resolves to itself, viewer-scoped, because its membership is
    /// permission-filtered per viewer; members appear only as dependencies.
    pub async fn resolve(
        &self,
        subject: &Subject,
        viewer: &UserId,
    ) -> Result<Option<Resolved>, EngineError> {
        if subject.is_group() {
            return Ok(Some(Resolved {
                subject: subject.clone(),
                scope: OwnerScope::Viewer(viewer.clone()),
            }));
        }
        if !self.permissions.allows(viewer, subject, PermissionLevel::View).await? {
            tracing::debug!(%subject, %viewer, "subject excluded: no read access");
            return Ok(None);
        }
        Ok(Some(Resolved { subject: subject.clone(), scope: OwnerScope::Shared }))
    }

    /// Membership of a group for a viewer: collections whose labels fall
    /// under the group's defining label, filtered by read permission,
    /// deduplicated, in creation order.
    ///
    /// Pure with respect to the store: recomputed on every submission,
    /// never cached across permission changes.
    pub async fn group_members(
        &self,
        group: &GroupId,
        viewer: &UserId,
    ) -> Result<Vec<CollectionId>, EngineError> {
        let label = self.catalog.group_label(group).await?;
        let mut records = self.catalog.collections().await?;
        records.sort_by_key(|r| r.created_seq);

        let mut members = Vec::new();
        for record in records {
            if !record.labels.iter().any(|l| label_matches(l, &label)) {
                continue;
            }
            if members.contains(&record.id) {
                continue;
            }
            let subject = Subject::Collection(record.id.clone());
            if self.permissions.allows(viewer, &subject, PermissionLevel::View).await? {
                members.push(record.id);
            }
        }
        Ok(members)
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
