// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cache fingerprints for analysis deduplication.
//!
//! The fingerprint is the cache key: a sha256 digest over the workflow
//! identity, the resolved subject identity, the canonical normalized
//! parameters, and the owner-scope key. At most one unnamed analysis
//! exists per fingerprint.

use crate::params::{canonical_json, Params};
use crate::scope::OwnerScope;
use crate::subject::Subject;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Derived cache identity of one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint for one (workflow, subject, params, scope) tuple.
    ///
    /// Inputs are length-delimited before hashing so adjacent fields cannot
    /// alias each other.
    pub fn compute(
        workflow: &str,
        workflow_version: u32,
        subject: &Subject,
        params: &Params,
        scope: &OwnerScope,
    ) -> Self {
        let mut hasher = Sha256::new();
        for part in [
            workflow,
            &workflow_version.to_string(),
            &subject.identity(),
            &canonical_json(params),
            &scope.key(),
        ] {
            hasher.update(part.len().to_le_bytes());
            hasher.update(part.as_bytes());
        }
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(64);
        for byte in digest {
            use std::fmt::Write;
            let _ = write!(hex, "{byte:02x}");
        }
        Self(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
