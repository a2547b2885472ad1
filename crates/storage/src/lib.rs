// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! assay-storage: the persisted analysis store.
//!
//! The store is the only shared mutable resource in the system. All
//! fingerprint lookup/creation goes through [`AnalysisState`], whose methods
//! uphold the at-most-one-unnamed-record-per-fingerprint invariant; callers
//! serialize access with a single mutex around the state.

mod snapshot;
mod state;

pub use snapshot::{load, save};
pub use state::{AnalysisState, NewAnalysis};

use assay_core::{AnalysisId, TransitionError};
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("analysis not found: {0}")]
    NotFound(AnalysisId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("snapshot io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot decode: {0}")]
    Decode(#[from] serde_json::Error),
}
