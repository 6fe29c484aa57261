// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The `Store` capability shared by backends and decorators.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::value::{Item, Value};

/// Search sentinel matching every item.
pub const WILDCARD: &str = "*";

/// A parsed search pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern<'a> {
    /// `*`: every item.
    All,
    /// `prefix*`: every item whose name starts with the prefix.
    Prefix(&'a str),
    /// Anything else: the item with exactly this name.
    Exact(&'a str),
}

impl<'a> Pattern<'a> {
    /// Classify a search string. Only a trailing `*` is a wildcard.
    pub fn parse(pattern: &'a str) -> Self {
        if pattern == WILDCARD {
            Pattern::All
        } else if let Some(prefix) = pattern.strip_suffix(WILDCARD) {
            Pattern::Prefix(prefix)
        } else {
            Pattern::Exact(pattern)
        }
    }

    /// Does `name` fall under this pattern?
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::All => true,
            Pattern::Prefix(prefix) => name.starts_with(prefix),
            Pattern::Exact(exact) => name == *exact,
        }
    }
}

/// Named item storage: read, create-if-absent, replace, delete and search.
///
/// Absence is never an error. Implementations must be safe to share across
/// threads and tokio tasks.
#[async_trait]
pub trait Store: Send + Sync {
    /// The item stored under `name`, or `None`.
    async fn read(&self, name: &str) -> Result<Option<Item>, StoreError>;

    /// Store `value` under `name` unless the name is taken.
    ///
    /// Returns `None` when the value was written, or the existing item (and
    /// writes nothing) when the name was already occupied.
    async fn add(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError>;

    /// Overwrite the payload of an existing item, returning the previous item.
    async fn replace(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError>;

    /// Remove the item under `name`, returning it if it existed.
    async fn delete(&self, name: &str) -> Result<Option<Item>, StoreError>;

    /// All items matching `pattern` (see [`Pattern`]), keyed by name.
    async fn search(&self, pattern: &str) -> Result<BTreeMap<String, Item>, StoreError>;

    /// Short label for this layer, used in logs.
    fn describe(&self) -> String;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn read(&self, name: &str) -> Result<Option<Item>, StoreError> {
        (**self).read(name).await
    }

    async fn add(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        (**self).add(name, value).await
    }

    async fn replace(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        (**self).replace(name, value).await
    }

    async fn delete(&self, name: &str) -> Result<Option<Item>, StoreError> {
        (**self).delete(name).await
    }

    async fn search(&self, pattern: &str) -> Result<BTreeMap<String, Item>, StoreError> {
        (**self).search(pattern).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Box<S> {
    async fn read(&self, name: &str) -> Result<Option<Item>, StoreError> {
        (**self).read(name).await
    }

    async fn add(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        (**self).add(name, value).await
    }

    async fn replace(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        (**self).replace(name, value).await
    }

    async fn delete(&self, name: &str) -> Result<Option<Item>, StoreError> {
        (**self).delete(name).await
    }

    async fn search(&self, pattern: &str) -> Result<BTreeMap<String, Item>, StoreError> {
        (**self).search(pattern).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
