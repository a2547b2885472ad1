// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type.

use assay_adapters::{CatalogError, ExecError, NotifyError, PermissionError};
use assay_core::{ParamError, RegistryError};
use assay_storage::StoreError;
use thiserror::Error;

/// Faults of the orchestration layer itself. Computation failures are
/// never represented here; they live on the analysis record as data.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("permission: {0}")]
    Permission(#[from] PermissionError),

    #[error("exec: {0}")]
    Exec(#[from] ExecError),

    #[error("notify: {0}")]
    Notify(#[from] NotifyError),

    #[error("config: {0}")]
    Config(String),
}
