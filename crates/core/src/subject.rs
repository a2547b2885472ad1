// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Analysis subjects: the things an analysis is computed over.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a single measurement item.
    pub struct ItemId("itm-");
}

crate::define_id! {
    /// Unique identifier for a collection of measurement items.
    pub struct CollectionId("col-");
}

crate::define_id! {
    /// Unique identifier for a label-defined group of collections.
    pub struct GroupId("grp-");
}

crate::define_id! {
    /// Unique identifier for a viewer/user.
    pub struct UserId("usr-");
}

/// Subject variant tag, used for workflow acceptance checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Item,
    Collection,
    Group,
}

crate::simple_display! {
    SubjectKind {
        Item => "item",
        Collection => "collection",
        Group => "group",
    }
}

/// The thing an analysis is computed over.
///
/// A closed tagged union: exactly one concrete item, one collection, or one
/// label-defined group. A multi-subject request produces one analysis per
/// subject, never one analysis holding a list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Subject {
    Item(ItemId),
    Collection(CollectionId),
    Group(GroupId),
}

impl Subject {
    pub fn kind(&self) -> SubjectKind {
        match self {
            Subject::Item(_) => SubjectKind::Item,
            Subject::Collection(_) => SubjectKind::Collection,
            Subject::Group(_) => SubjectKind::Group,
        }
    }

    /// Stable identity string fed into the fingerprint.
    pub fn identity(&self) -> String {
        match self {
            Subject::Item(id) => format!("item:{id}"),
            Subject::Collection(id) => format!("collection:{id}"),
            Subject::Group(id) => format!("group:{id}"),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Subject::Group(_))
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.identity())
    }
}

#[cfg(test)]
#[path = "subject_tests.rs"]
mod tests;
