// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Zstd-compressed JSON snapshots of the analysis state.
//!
//! The snapshot is written to a sibling temp file and renamed into place so
//! a crash mid-write never leaves a truncated snapshot behind.

use crate::state::AnalysisState;
use crate::StoreError;
use std::fs;
use std::path::Path;

const ZSTD_LEVEL: i32 = 3;

/// Serialize, compress, and atomically write the state to `path`.
pub fn save(state: &AnalysisState, path: &Path) -> Result<(), StoreError> {
    let json = serde_json::to_vec(state)?;
    let compressed = zstd::encode_all(json.as_slice(), ZSTD_LEVEL)?;
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &compressed)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(
        path = %path.display(),
        records = state.len(),
        bytes = compressed.len(),
        "snapshot written"
    );
    Ok(())
}

/// Read, decompress, and deserialize a snapshot, rebuilding the fingerprint
/// index over the unnamed records.
pub fn load(path: &Path) -> Result<AnalysisState, StoreError> {
    let compressed = fs::read(path)?;
    let json = zstd::decode_all(compressed.as_slice())?;
    let mut state: AnalysisState = serde_json::from_slice(&json)?;
    state.rebuild_index();
    tracing::debug!(path = %path.display(), records = state.len(), "snapshot loaded");
    Ok(state)
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
