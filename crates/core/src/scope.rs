// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Owner scope: whether a cached result is shareable across viewers.

use crate::subject::UserId;
use serde::{Deserialize, Serialize};

/// Scope of a cached analysis result.
///
/// Item and collection subjects produce viewer-independent data, so their
/// results are shared across every viewer with read access. Group subjects
/// have permission-filtered membership, so their results are bound to the
/// viewer they were resolved for and never shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "viewer", rename_all = "snake_case")]
pub enum OwnerScope {
    Shared,
    Viewer(UserId),
}

impl OwnerScope {
    /// Stable key fed into the fingerprint.
    pub fn key(&self) -> String {
        match self {
            OwnerScope::Shared => "shared".to_string(),
            OwnerScope::Viewer(id) => format!("viewer:{id}"),
        }
    }

    /// The viewer this scope is bound to, if any.
    pub fn viewer(&self) -> Option<&UserId> {
        match self {
            OwnerScope::Shared => None,
            OwnerScope::Viewer(id) => Some(id),
        }
    }
}

crate::simple_display! {
    OwnerScope {
        Shared => "shared",
        Viewer(..) => "viewer",
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
