// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Permission collaborator boundary.

use assay_core::{Subject, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access level asked of the permission collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    View,
    Edit,
    Full,
}

assay_core::simple_display! {
    PermissionLevel {
        View => "view",
        Edit => "edit",
        Full => "full",
    }
}

/// Errors from permission lookups.
#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("permission backend unavailable: {0}")]
    Unavailable(String),
}

/// Adapter over the external user/permission store.
///
/// Absence of permission is not an error: subjects the viewer cannot see
/// are silently excluded from resolution.
#[async_trait]
pub trait PermissionAdapter: Clone + Send + Sync + 'static {
    async fn allows(
        &self,
        viewer: &UserId,
        subject: &Subject,
        level: PermissionLevel,
    ) -> Result<bool, PermissionError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{PermissionAdapter, PermissionError, PermissionLevel};
    use assay_core::{Subject, UserId};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    /// In-memory permission table for tests.
    ///
    /// Grants are (viewer, subject identity, level) triples; `allow_all`
    /// short-circuits every check to true.
    #[derive(Clone, Default)]
    pub struct FakePermissionAdapter {
        grants: Arc<Mutex<HashSet<(UserId, String, PermissionLevel)>>>,
        allow_all: bool,
    }

    impl FakePermissionAdapter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn allow_all() -> Self {
            Self { grants: Arc::default(), allow_all: true }
        }

        pub fn grant(&self, viewer: &UserId, subject: &Subject, level: PermissionLevel) {
            self.grants.lock().insert((viewer.clone(), subject.identity(), level));
        }

        pub fn revoke(&self, viewer: &UserId, subject: &Subject, level: PermissionLevel) {
            self.grants.lock().remove(&(viewer.clone(), subject.identity(), level));
        }
    }

    #[async_trait]
    impl PermissionAdapter for FakePermissionAdapter {
        async fn allows(
            &self,
            viewer: &UserId,
            subject: &Subject,
            level: PermissionLevel,
        ) -> Result<bool, PermissionError> {
            if self.allow_all {
                return Ok(true);
            }
            Ok(self.grants.lock().contains(&(viewer.clone(), subject.identity(), level)))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakePermissionAdapter;

#[cfg(test)]
#[path = "permission_tests.rs"]
mod tests;
