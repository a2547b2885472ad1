// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! assay-core: domain types for the assay analysis dispatch core

pub mod macros;

pub mod analysis;
pub mod clock;
pub mod event;
pub mod fingerprint;
pub mod id;
pub mod params;
pub mod scope;
pub mod subject;
pub mod workflow;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(any(test, feature = "test-support"))]
pub use analysis::AnalysisBuilder;
pub use analysis::{Analysis, AnalysisId, SubmissionToken, TaskState, TransitionError};
pub use clock::{Clock, FakeClock, SystemClock};
pub use event::{Event, SourceRef};
pub use fingerprint::Fingerprint;
pub use params::{canonical_json, raw_params, ParamError, ParamField, ParamKind, ParamSchema, Params};
pub use scope::OwnerScope;
pub use subject::{CollectionId, GroupId, ItemId, Subject, SubjectKind, UserId};
pub use workflow::{
    DependencyInput, NullProgress, ProgressSink, RegistryError, WorkflowError, WorkflowHandler,
    WorkflowInput, WorkflowRegistry, WorkflowSpec,
};
