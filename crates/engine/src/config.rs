// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, loaded from a TOML file.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

fn default_max_retries() -> u32 {
    3
}

fn default_channel_capacity() -> usize {
    256
}

/// Tunables for the dispatch runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Retry transitions tolerated per submission round before the round is
    /// recorded as a failure (default 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Capacity of the event channel between workers and the runtime loop
    /// (default 256).
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Where to persist state snapshots; `None` disables persistence.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            channel_capacity: default_channel_capacity(),
            snapshot_path: None,
        }
    }
}

impl EngineConfig {
    pub fn parse(text: &str) -> Result<Self, EngineError> {
        toml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, EngineError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
