// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Measurement catalog boundary: collections, items, labels, containment.
//!
//! The surface/measurement CRUD lives outside the core; resolution only
//! needs to enumerate collections with their labels (in creation order) and
//! to walk item → containing collection for renewal.

use assay_core::{CollectionId, GroupId, ItemId};
use async_trait::async_trait;
use thiserror::Error;

/// One collection as the resolver sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    pub id: CollectionId,
    /// Labels attached to the collection, e.g. `projects/alloys/steel`.
    pub labels: Vec<String>,
    /// Creation order; resolution sorts by this so fingerprint-relevant
    /// member ordering is deterministic across calls.
    pub created_seq: u64,
}

/// Errors from catalog lookups.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog backend unavailable: {0}")]
    Unavailable(String),
    #[error("unknown group: {0}")]
    UnknownGroup(GroupId),
}

/// Adapter over the external measurement catalog.
#[async_trait]
pub trait CatalogAdapter: Clone + Send + Sync + 'static {
    /// All collections, any order; the resolver sorts.
    async fn collections(&self) -> Result<Vec<CollectionRecord>, CatalogError>;

    /// The defining label of a group.
    async fn group_label(&self, group: &GroupId) -> Result<String, CatalogError>;

    /// The collection containing an item, if the item is known.
    async fn collection_of(&self, item: &ItemId) -> Result<Option<CollectionId>, CatalogError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CatalogAdapter, CatalogError, CollectionRecord};
    use assay_core::{CollectionId, GroupId, ItemId};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default)]
    struct CatalogInner {
        collections: Vec<CollectionRecord>,
        groups: HashMap<GroupId, String>,
        containment: HashMap<ItemId, CollectionId>,
        next_seq: u64,
    }

    /// In-memory catalog for tests.
    #[derive(Clone, Default)]
    pub struct InMemoryCatalog {
        inner: Arc<Mutex<CatalogInner>>,
    }

    impl InMemoryCatalog {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a collection with the given labels; creation order follows
        /// insertion order.
        pub fn add_collection(&self, id: &CollectionId, labels: &[&str]) {
            let mut inner = self.inner.lock();
            let created_seq = inner.next_seq;
            inner.next_seq += 1;
            inner.collections.push(CollectionRecord {
                id: id.clone(),
                labels: labels.iter().map(|s| s.to_string()).collect(),
                created_seq,
            });
        }

        /// Define a group by its label.
        pub fn define_group(&self, group: &GroupId, label: &str) {
            self.inner.lock().groups.insert(group.clone(), label.to_string());
        }

        /// Place an item inside a collection.
        pub fn add_item(&self, item: &ItemId, collection: &CollectionId) {
            self.inner.lock().containment.insert(item.clone(), collection.clone());
        }
    }

    #[async_trait]
    impl CatalogAdapter for InMemoryCatalog {
        async fn collections(&self) -> Result<Vec<CollectionRecord>, CatalogError> {
            Ok(self.inner.lock().collections.clone())
        }

        async fn group_label(&self, group: &GroupId) -> Result<String, CatalogError> {
            self.inner
                .lock()
                .groups
                .get(group)
                .cloned()
                .ok_or_else(|| CatalogError::UnknownGroup(group.clone()))
        }

        async fn collection_of(&self, item: &ItemId) -> Result<Option<CollectionId>, CatalogError> {
            Ok(self.inner.lock().containment.get(item).cloned())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::InMemoryCatalog;
