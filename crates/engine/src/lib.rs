// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! assay-engine: orchestration over the analysis store.
//!
//! The [`Engine`] owns the shared analysis state and coordinates the
//! adapters: it resolves subjects, fills cache misses, plans and dispatches
//! submissions, reconciles dependency graphs as worker callbacks arrive,
//! and renews stale results when source data changes. Requests enter
//! through [`AnalysisController`]; worker callbacks and source mutations
//! enter through the event loop in [`runtime`].

pub mod config;
pub mod controller;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod renewal;
pub mod resolve;
pub mod runtime;

#[cfg(test)]
mod test_helpers;

pub use config::EngineConfig;
pub use controller::AnalysisController;
pub use engine::Engine;
pub use error::EngineError;
pub use resolve::Resolved;
