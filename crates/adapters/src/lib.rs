// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! assay-adapters: boundary traits for the external collaborators.
//!
//! The dispatch core consumes user/permission storage, the measurement
//! catalog, blob storage, notifications, and the asynchronous worker pool
//! through the narrow traits defined here. Each trait ships with either a
//! production-shaped implementation or an in-memory fake for tests.

pub mod blob;
pub mod catalog;
pub mod exec;
pub mod notify;
pub mod permission;

pub use blob::{BlobAdapter, BlobError, BlobRef, FsBlobAdapter};
#[cfg(any(test, feature = "test-support"))]
pub use blob::MemoryBlobAdapter;
pub use catalog::{CatalogAdapter, CatalogError, CollectionRecord};
#[cfg(any(test, feature = "test-support"))]
pub use catalog::InMemoryCatalog;
pub use exec::{ExecAdapter, ExecError, LocalExecAdapter, TaskSubmission, INLINE_RESULT_MAX};
#[cfg(any(test, feature = "test-support"))]
pub use exec::FakeExecAdapter;
pub use notify::{NoopNotifyAdapter, NotifyAdapter, NotifyError};
#[cfg(any(test, feature = "test-support"))]
pub use notify::FakeNotifyAdapter;
pub use permission::{PermissionAdapter, PermissionError, PermissionLevel};
#[cfg(any(test, feature = "test-support"))]
pub use permission::FakePermissionAdapter;
