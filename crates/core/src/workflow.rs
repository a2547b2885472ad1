// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow descriptors and the static workflow registry.
//!
//! A workflow is a named, versioned computation with a declared parameter
//! schema and a declared set of subject variants it accepts. The registry is
//! built explicitly at startup; dispatch is by name lookup, never by
//! reflection or dynamic import.

use crate::analysis::AnalysisId;
use crate::params::{ParamSchema, Params};
use crate::subject::{Subject, SubjectKind};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Output of one already-computed dependency, handed to a parent's handler.
#[derive(Debug, Clone)]
pub struct DependencyInput {
    pub analysis: AnalysisId,
    pub subject: Subject,
    pub result: Value,
}

/// Everything a workflow handler receives for one run.
#[derive(Debug, Clone)]
pub struct WorkflowInput {
    pub subject: Subject,
    pub params: Params,
    /// Succeeded dependency outputs, in declaration order. Empty for leaf
    /// analyses and for group analyses over an empty group.
    pub inputs: Vec<DependencyInput>,
}

/// Progress reporting channel handed to a running handler.
pub trait ProgressSink: Send + Sync {
    fn report(&self, fraction: f64);
}

/// No-op sink for handlers run outside a worker context.
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn report(&self, _fraction: f64) {}
}

/// Error raised by a workflow handler. Recorded on the analysis as
/// `error` + `traceback`; never surfaced as a controller fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowError {
    pub message: String,
    pub traceback: String,
}

impl WorkflowError {
    pub fn new(message: impl Into<String>) -> Self {
        let message = message.into();
        let traceback = message.clone();
        Self { message, traceback }
    }

    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = traceback.into();
        self
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WorkflowError {}

/// Handler function executed by the worker pool.
pub type WorkflowHandler =
    Arc<dyn Fn(&WorkflowInput, &dyn ProgressSink) -> Result<Value, WorkflowError> + Send + Sync>;

/// A registered workflow: stable name, display name, version (part of the
/// fingerprint), parameter schema, accepted subject variants, and a
/// visualization flavor tag forwarded untouched to rendering.
#[derive(Clone)]
pub struct WorkflowSpec {
    pub name: String,
    pub display_name: String,
    pub version: u32,
    pub schema: ParamSchema,
    pub accepts: Vec<SubjectKind>,
    pub flavor: String,
    pub handler: WorkflowHandler,
}

impl WorkflowSpec {
    pub fn accepts(&self, kind: SubjectKind) -> bool {
        self.accepts.contains(&kind)
    }
}

impl std::fmt::Debug for WorkflowSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowSpec")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("accepts", &self.accepts)
            .field("flavor", &self.flavor)
            .finish_non_exhaustive()
    }
}

/// Errors from registry construction and lookup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("workflow already registered: {0}")]
    Duplicate(String),
    #[error("unknown workflow: {0}")]
    Unknown(String),
    #[error("workflow {workflow} does not accept {kind} subjects")]
    UnsupportedSubject { workflow: String, kind: SubjectKind },
}

/// Static registry mapping workflow name → spec. Built once at startup via
/// explicit `register` calls.
#[derive(Debug, Default)]
pub struct WorkflowRegistry {
    specs: HashMap<String, WorkflowSpec>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, spec: WorkflowSpec) -> Result<(), RegistryError> {
        if self.specs.contains_key(&spec.name) {
            return Err(RegistryError::Duplicate(spec.name));
        }
        self.specs.insert(spec.name.clone(), spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&WorkflowSpec, RegistryError> {
        self.specs.get(name).ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    /// Check that `name` exists and accepts the given subject variant.
    pub fn check_accepts(&self, name: &str, kind: SubjectKind) -> Result<&WorkflowSpec, RegistryError> {
        let spec = self.get(name)?;
        if !spec.accepts(kind) {
            return Err(RegistryError::UnsupportedSubject {
                workflow: name.to_string(),
                kind,
            });
        }
        Ok(spec)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
