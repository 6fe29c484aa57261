// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shape-restricting decorator.
//
// Wraps any `Store` and narrows it to one shape. Items of other shapes are
// invisible through the view and can be neither shadowed nor overwritten by
// it, so several views can share one backend without cross-contamination.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::warn;

use crate::error::StoreError;
use crate::store::Store;
use crate::value::{Item, Shape, Value};

/// A [`Store`] view that only accepts and exposes items of one [`Shape`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use atoms_store::{InMemoryTable, ShapeRestricted, Store, StoreError, TableStore, Value};
///
/// # tokio_test::block_on(async {
/// let backend = Arc::new(TableStore::new(InMemoryTable::new()));
/// let maps = ShapeRestricted::maps(Arc::clone(&backend));
/// let lists = ShapeRestricted::lists(Arc::clone(&backend));
///
/// lists.add("todo", Value::list(["write", "test"])).await.unwrap();
///
/// // The maps view cannot see the list, nor write over its name.
/// assert!(maps.read("todo").await.unwrap().is_none());
/// let err = maps.add("todo", Value::map([("k", "v")])).await.unwrap_err();
/// assert!(matches!(err, StoreError::InvalidShape { .. }));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct ShapeRestricted<S: Store> {
    inner: S,
    accepted: Shape,
}

impl<S: Store> ShapeRestricted<S> {
    /// Restrict `inner` to items of `accepted` shape.
    pub fn new(inner: S, accepted: Shape) -> Self {
        Self { inner, accepted }
    }

    /// A view that only holds maps.
    pub fn maps(inner: S) -> Self {
        Self::new(inner, Shape::Map)
    }

    /// A view that only holds lists.
    pub fn lists(inner: S) -> Self {
        Self::new(inner, Shape::List)
    }

    /// A view that only holds scalars.
    pub fn scalars(inner: S) -> Self {
        Self::new(inner, Shape::Scalar)
    }

    /// The shape this view accepts.
    pub fn accepted(&self) -> Shape {
        self.accepted
    }

    /// Will this view accept `value`?
    pub fn accepts(&self, value: &Value) -> bool {
        value.shape() == Some(self.accepted)
    }

    fn accepts_item(&self, item: &Item) -> bool {
        self.accepts(&item.value)
    }

    fn reject(&self, name: &str, what: &str, found: Option<Shape>) -> StoreError {
        let found = found.map_or("unknown", Shape::tag);
        warn!(
            view = %self.accepted,
            item = name,
            found,
            "rejected {} of wrong shape",
            what
        );
        StoreError::invalid_shape(
            name,
            format!("{} is '{}', view accepts '{}'", what, found, self.accepted),
        )
    }
}

#[async_trait]
impl<S: Store> Store for ShapeRestricted<S> {
    async fn read(&self, name: &str) -> Result<Option<Item>, StoreError> {
        Ok(self
            .inner
            .read(name)
            .await?
            .filter(|item| self.accepts_item(item)))
    }

    async fn add(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        if !self.accepts(&value) {
            return Err(self.reject(name, "value", value.shape()));
        }

        if let Some(existing) = self.inner.read(name).await? {
            if !self.accepts_item(&existing) {
                return Err(self.reject(name, "existing item", existing.shape()));
            }
        }

        // A foreign item may have been created after the check above.
        match self.inner.add(name, value).await? {
            Some(existing) if !self.accepts_item(&existing) => {
                Err(self.reject(name, "existing item", existing.shape()))
            }
            outcome => Ok(outcome),
        }
    }

    async fn replace(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        let existing = self.inner.read(name).await?;

        match existing {
            Some(ref item) if self.accepts_item(item) => {}
            Some(item) => return Err(self.reject(name, "existing item", item.shape())),
            None => {
                return Err(StoreError::invalid_shape(
                    name,
                    format!("no '{}' item to replace", self.accepted),
                ))
            }
        }

        if !self.accepts(&value) {
            return Err(self.reject(name, "value", value.shape()));
        }

        self.inner.replace(name, value).await
    }

    async fn delete(&self, name: &str) -> Result<Option<Item>, StoreError> {
        if self.read(name).await?.is_none() {
            return Ok(None);
        }

        match self.inner.delete(name).await? {
            Some(removed) if !self.accepts_item(&removed) => {
                // The name was re-created with another shape between the read
                // and the delete. Put it back unless the name was taken again.
                warn!(
                    view = %self.accepted,
                    item = name,
                    "restoring foreign item removed by a racing delete"
                );
                self.inner.add(name, removed.value).await?;
                Ok(None)
            }
            outcome => Ok(outcome),
        }
    }

    async fn search(&self, pattern: &str) -> Result<BTreeMap<String, Item>, StoreError> {
        let mut items = self.inner.search(pattern).await?;
        items.retain(|_, item| self.accepts_item(item));
        Ok(items)
    }

    fn describe(&self) -> String {
        format!("{}-only({})", self.accepted, self.inner.describe())
    }
}
