// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the specs.

#![allow(dead_code)]

pub use assay_adapters::{
    BlobAdapter, BlobRef, FakeExecAdapter, FakeNotifyAdapter, FakePermissionAdapter,
    InMemoryCatalog, LocalExecAdapter, MemoryBlobAdapter, TaskSubmission,
};
pub use assay_core::test_support::{
    bulky_workflow, echo_workflow, failing_workflow, selective_workflow,
};
pub use assay_core::{
    AnalysisId, CollectionId, Event, FakeClock, GroupId, ItemId, OwnerScope, Params, SourceRef,
    Subject, TaskState, UserId, WorkflowRegistry,
};
pub use assay_engine::{Engine, EngineConfig};
pub use assay_storage::NewAnalysis;
pub use serde_json::json;
pub use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

pub const SPEC_WAIT_MAX_MS: u64 = 5_000;

pub type FakeEngine =
    Engine<FakePermissionAdapter, InMemoryCatalog, FakeNotifyAdapter, FakeExecAdapter, FakeClock>;
pub type WorkerEngine = Engine<
    FakePermissionAdapter,
    InMemoryCatalog,
    FakeNotifyAdapter,
    LocalExecAdapter<MemoryBlobAdapter>,
    FakeClock,
>;

/// Registry with the stock spec workflows: `echo` (one integer param `a`
/// defaulting to 1) and `boom` (always fails).
pub fn stock_registry() -> WorkflowRegistry {
    let mut registry = WorkflowRegistry::new();
    registry.register(echo_workflow("echo")).expect("register echo");
    registry.register(failing_workflow("boom", "computation refused")).expect("register boom");
    registry
}

/// Engine over a recording exec fake: submissions queue up instead of
/// running, and tests feed lifecycle events in by hand.
pub struct FakeHarness {
    pub engine: FakeEngine,
    pub exec: FakeExecAdapter,
    pub catalog: InMemoryCatalog,
    pub viewer: UserId,
}

pub fn fake_harness() -> FakeHarness {
    let exec = FakeExecAdapter::new();
    let catalog = InMemoryCatalog::new();
    let engine = Engine::new(
        Arc::new(stock_registry()),
        FakePermissionAdapter::allow_all(),
        catalog.clone(),
        FakeNotifyAdapter::new(),
        exec.clone(),
        FakeClock::new(),
        EngineConfig::default(),
    );
    FakeHarness { engine, exec, catalog, viewer: UserId::new() }
}

impl FakeHarness {
    /// Walk one recorded submission through started → succeeded.
    pub async fn complete(&self, task: &TaskSubmission) {
        self.engine
            .handle_event(&Event::TaskStarted {
                id: task.analysis.clone(),
                token: task.token.clone(),
            })
            .await
            .expect("started");
        self.engine
            .handle_event(&Event::TaskSucceeded {
                id: task.analysis.clone(),
                token: task.token.clone(),
                result: json!({ "subject": task.subject.identity() }),
            })
            .await
            .expect("succeeded");
    }
}

/// Engine wired to real local workers: submissions run on the blocking
/// pool and their callbacks flow through a live runtime loop.
pub struct WorkerHarness {
    pub engine: WorkerEngine,
    pub catalog: InMemoryCatalog,
    pub blobs: MemoryBlobAdapter,
    pub viewer: UserId,
    pub events: mpsc::Sender<Event>,
    runner: tokio::task::JoinHandle<()>,
}

pub fn worker_harness(registry: WorkflowRegistry) -> WorkerHarness {
    worker_harness_with(registry, InMemoryCatalog::new())
}

/// Variant taking a pre-populated catalog, for registries whose workflows
/// reference specific collection ids.
pub fn worker_harness_with(registry: WorkflowRegistry, catalog: InMemoryCatalog) -> WorkerHarness {
    let registry = Arc::new(registry);
    let config = EngineConfig::default();
    let (tx, rx) = mpsc::channel(config.channel_capacity);
    let blobs = MemoryBlobAdapter::new();
    let engine = Engine::new(
        Arc::clone(&registry),
        FakePermissionAdapter::allow_all(),
        catalog.clone(),
        FakeNotifyAdapter::new(),
        LocalExecAdapter::new(registry, tx.clone(), blobs.clone()),
        FakeClock::new(),
        config,
    );
    let runner = {
        let engine = engine.clone();
        tokio::spawn(async move { engine.run(rx).await })
    };
    WorkerHarness { engine, catalog, blobs, viewer: UserId::new(), events: tx, runner }
}

impl WorkerHarness {
    /// Poll until the record reaches the given state, or time out.
    pub async fn wait_for_state(&self, id: &AnalysisId, state: TaskState) -> bool {
        wait_until(|| self.engine.analysis(id).is_some_and(|a| a.task_state == state)).await
    }

    pub async fn shutdown(self) {
        let _ = self.events.send(Event::Shutdown).await;
        let _ = self.runner.await;
    }
}

pub async fn wait_until<F: Fn() -> bool>(check: F) -> bool {
    let deadline = Instant::now() + Duration::from_millis(SPEC_WAIT_MAX_MS);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Shared-scope request for the `echo` workflow with default params.
pub fn echo_request(subject: Subject) -> NewAnalysis {
    NewAnalysis {
        workflow: "echo".to_string(),
        workflow_version: 1,
        subject,
        params: Params::new(),
        scope: OwnerScope::Shared,
    }
}
