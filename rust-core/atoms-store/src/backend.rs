// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Backend store: binds the `Store` contract to one `Table`.
//
// Every write goes through the table's conditional put, so the existence
// check of `add` and the shape check of `replace` are atomic with the write.
// Shape restriction per view is not this layer's concern; see `restrict`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::codec::{decode, encode, row_tag, Row};
use crate::error::StoreError;
use crate::store::{Pattern, Store};
use crate::table::{Condition, PutOutcome, Table};
use crate::value::{Item, Value};

/// A [`Store`] that persists items as rows of a [`Table`].
///
/// # Example
///
/// ```rust
/// use atoms_store::{InMemoryTable, Store, TableStore, Value};
///
/// # tokio_test::block_on(async {
/// let store = TableStore::new(InMemoryTable::new());
/// assert!(store.add("fruit", Value::list(["apple"])).await.unwrap().is_none());
///
/// // A second add is a no-op that hands back the stored item.
/// let existing = store.add("fruit", Value::list(["pear"])).await.unwrap();
/// assert_eq!(existing.unwrap().value, Value::list(["apple"]));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TableStore<T: Table> {
    table: T,
}

impl<T: Table> TableStore<T> {
    /// Bind a store to an already opened table.
    pub fn new(table: T) -> Self {
        Self { table }
    }

    /// Return a reference to the underlying table.
    pub fn table(&self) -> &T {
        &self.table
    }
}

fn to_item(name: &str, row: &Row) -> Result<Item, StoreError> {
    Ok(Item::new(name, decode(row)?))
}

fn reject_absent(name: &str, value: &Value) -> Result<(), StoreError> {
    if value.is_absent() {
        return Err(StoreError::AbsentValue(name.to_string()));
    }
    Ok(())
}

#[async_trait]
impl<T: Table> Store for TableStore<T> {
    #[instrument(skip(self), fields(table = %self.table.name()))]
    async fn read(&self, name: &str) -> Result<Option<Item>, StoreError> {
        self.table
            .get_row(name)
            .await?
            .map(|row| to_item(name, &row))
            .transpose()
    }

    #[instrument(skip(self, value), fields(table = %self.table.name()))]
    async fn add(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        reject_absent(name, &value)?;
        let row = encode(name, &value)?;

        match self.table.put_row(name, row, Condition::NotExists).await? {
            PutOutcome::Written { .. } => {
                debug!(shape = ?value.shape(), "added item");
                Ok(None)
            }
            PutOutcome::Rejected { current: Some(row) } => {
                debug!("name already taken, returning existing item");
                to_item(name, &row).map(Some)
            }
            PutOutcome::Rejected { current: None } => Err(StoreError::CorruptedData(format!(
                "table '{}' rejected create of '{}' without a stored row",
                self.table.name(),
                name
            ))),
        }
    }

    #[instrument(skip(self, value), fields(table = %self.table.name()))]
    async fn replace(&self, name: &str, value: Value) -> Result<Option<Item>, StoreError> {
        reject_absent(name, &value)?;
        let row = encode(name, &value)?;
        let shape = value
            .shape()
            .ok_or_else(|| StoreError::invalid_shape(name, "value has no shape"))?;

        match self.table.put_row(name, row, Condition::ShapeIs(shape)).await? {
            PutOutcome::Written { previous } => {
                debug!(%shape, "replaced item");
                previous.map(|row| to_item(name, &row)).transpose()
            }
            PutOutcome::Rejected { current: None } => {
                debug!("nothing to replace");
                Ok(None)
            }
            PutOutcome::Rejected { current: Some(row) } => Err(StoreError::invalid_shape(
                name,
                format!(
                    "stored item is '{}', replacement is '{}'",
                    row_tag(&row).unwrap_or_default(),
                    shape
                ),
            )),
        }
    }

    #[instrument(skip(self), fields(table = %self.table.name()))]
    async fn delete(&self, name: &str) -> Result<Option<Item>, StoreError> {
        let removed = self.table.delete_row(name).await?;
        if removed.is_some() {
            debug!("deleted item");
        }
        removed.map(|row| to_item(name, &row)).transpose()
    }

    #[instrument(skip(self), fields(table = %self.table.name()))]
    async fn search(&self, pattern: &str) -> Result<BTreeMap<String, Item>, StoreError> {
        let pattern = Pattern::parse(pattern);
        let rows = match pattern {
            Pattern::All => self.table.scan("").await?,
            Pattern::Prefix(prefix) => self.table.scan(prefix).await?,
            Pattern::Exact(name) => self
                .table
                .get_row(name)
                .await?
                .map(|row| vec![(name.to_string(), row)])
                .unwrap_or_default(),
        };

        let mut items = BTreeMap::new();
        for (name, row) in rows.into_iter().filter(|(name, _)| pattern.matches(name)) {
            let item = to_item(&name, &row)?;
            items.insert(name, item);
        }
        debug!(matched = items.len(), "search complete");
        Ok(items)
    }

    fn describe(&self) -> String {
        format!("table:{}", self.table.name())
    }
}
