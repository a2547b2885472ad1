// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::config::EngineConfig;
use crate::engine::Engine;
use assay_adapters::{
    FakeExecAdapter, FakeNotifyAdapter, FakePermissionAdapter, InMemoryCatalog, TaskSubmission,
};
use assay_core::test_support::{echo_workflow, failing_workflow, selective_workflow};
use assay_core::{CollectionId, Event, FakeClock, GroupId, ItemId, UserId, WorkflowRegistry};
use serde_json::json;
use std::sync::Arc;

pub(crate) type TestEngine =
    Engine<FakePermissionAdapter, InMemoryCatalog, FakeNotifyAdapter, FakeExecAdapter, FakeClock>;

pub(crate) struct Harness {
    pub engine: TestEngine,
    pub exec: FakeExecAdapter,
    pub catalog: InMemoryCatalog,
    pub permissions: FakePermissionAdapter,
    pub notify: FakeNotifyAdapter,
    pub clock: FakeClock,
    pub viewer: UserId,
}

/// Engine over fakes: workflows `echo`, `boom`, `selective` registered,
/// every permission granted.
pub(crate) fn harness() -> Harness {
    harness_with_permissions(FakePermissionAdapter::allow_all())
}

pub(crate) fn harness_with_permissions(permissions: FakePermissionAdapter) -> Harness {
    let mut registry = WorkflowRegistry::new();
    registry.register(echo_workflow("echo")).expect("register echo");
    registry.register(failing_workflow("boom", "computation refused")).expect("register boom");
    registry.register(selective_workflow("selective", &[])).expect("register selective");

    let exec = FakeExecAdapter::new();
    let catalog = InMemoryCatalog::new();
    let notify = FakeNotifyAdapter::new();
    let clock = FakeClock::new();
    let engine = Engine::new(
        Arc::new(registry),
        permissions.clone(),
        catalog.clone(),
        notify.clone(),
        exec.clone(),
        clock.clone(),
        EngineConfig::default(),
    );
    Harness { engine, exec, catalog, permissions, notify, clock, viewer: UserId::new() }
}

impl Harness {
    /// A group of `n` collections under one label, viewable by everyone
    /// the permission fake allows.
    pub fn group_of(&self, label: &str, n: usize) -> (GroupId, Vec<CollectionId>) {
        let group = GroupId::new();
        self.catalog.define_group(&group, label);
        let mut collections = Vec::new();
        for i in 0..n {
            let collection = CollectionId::new();
            self.catalog.add_collection(&collection, &[&format!("{label}/set{i}")]);
            collections.push(collection);
        }
        (group, collections)
    }

    pub fn item_in_collection(&self) -> (ItemId, CollectionId) {
        let item = ItemId::new();
        let collection = CollectionId::new();
        self.catalog.add_collection(&collection, &["loose"]);
        self.catalog.add_item(&item, &collection);
        (item, collection)
    }

    /// Drive one recorded submission to success, as a worker would.
    pub async fn complete(&self, task: &TaskSubmission) {
        self.step(task, Event::TaskSucceeded {
            id: task.analysis.clone(),
            token: task.token.clone(),
            result: json!({ "subject": task.subject.identity(), "inputs": task.inputs.len() }),
        })
        .await;
    }

    /// Drive one recorded submission to failure.
    pub async fn fail(&self, task: &TaskSubmission) {
        self.step(task, Event::TaskFailed {
            id: task.analysis.clone(),
            token: task.token.clone(),
            error: "computation refused".to_string(),
            traceback: "Traceback: computation refused".to_string(),
        })
        .await;
    }

    async fn step(&self, task: &TaskSubmission, terminal: Event) {
        self.engine
            .handle_event(&Event::TaskStarted {
                id: task.analysis.clone(),
                token: task.token.clone(),
            })
            .await
            .expect("started");
        self.engine.handle_event(&terminal).await.expect("terminal");
    }
}
