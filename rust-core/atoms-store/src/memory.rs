// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory table.
//
// Uses a `BTreeMap` wrapped in a tokio `RwLock`. The ordering gives prefix
// scans for free, and conditional writes run entirely under the write lock.
// Intended for tests, development, and ephemeral deployments.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::codec::Row;
use crate::error::StoreError;
use crate::table::{Condition, PutOutcome, Table};

/// An in-memory table backed by a sorted `BTreeMap`.
///
/// All data lives in process memory and is lost on drop. Clones share the
/// same rows.
///
/// # Example
///
/// ```rust
/// use atoms_store::codec::encode;
/// use atoms_store::memory::InMemoryTable;
/// use atoms_store::table::{Condition, Table};
/// use atoms_store::value::Value;
///
/// # tokio_test::block_on(async {
/// let table = InMemoryTable::new();
/// let row = encode("fruit", &Value::list(["apple"])).unwrap();
/// table.put_row("fruit", row.clone(), Condition::Always).await.unwrap();
/// assert_eq!(table.get_row("fruit").await.unwrap(), Some(row));
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryTable {
    name: String,
    rows: Arc<RwLock<BTreeMap<String, Row>>>,
}

impl InMemoryTable {
    /// Create a new, empty table.
    pub fn new() -> Self {
        Self::named("in-memory")
    }

    /// Create a new, empty table with the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Return the number of rows currently stored.
    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    /// Return true if the table holds no rows.
    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl Default for InMemoryTable {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Table for InMemoryTable {
    async fn get_row(&self, key: &str) -> Result<Option<Row>, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.get(key).cloned())
    }

    async fn put_row(
        &self,
        key: &str,
        row: Row,
        condition: Condition,
    ) -> Result<PutOutcome, StoreError> {
        let mut rows = self.rows.write().await;
        if !condition.holds(rows.get(key)) {
            return Ok(PutOutcome::Rejected {
                current: rows.get(key).cloned(),
            });
        }
        let previous = rows.insert(key.to_string(), row);
        Ok(PutOutcome::Written { previous })
    }

    async fn delete_row(&self, key: &str) -> Result<Option<Row>, StoreError> {
        let mut rows = self.rows.write().await;
        Ok(rows.remove(key))
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Row)>, StoreError> {
        let rows = self.rows.read().await;
        let results = rows
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Ok(results)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::value::{Shape, Value};

    fn list_row(name: &str, items: &[&str]) -> Row {
        encode(name, &Value::list(items.iter().copied())).unwrap()
    }

    #[tokio::test]
    async fn test_basic_crud() {
        let table = InMemoryTable::new();

        // Initially empty.
        assert!(table.is_empty().await);
        assert_eq!(table.get_row("a").await.unwrap(), None);

        // Put and get.
        let row = list_row("a", &["1"]);
        let outcome = table.put_row("a", row.clone(), Condition::Always).await.unwrap();
        assert_eq!(outcome, PutOutcome::Written { previous: None });
        assert_eq!(table.get_row("a").await.unwrap(), Some(row.clone()));
        assert_eq!(table.len().await, 1);

        // Overwrite reports the previous row.
        let updated = list_row("a", &["2"]);
        let outcome = table.put_row("a", updated.clone(), Condition::Always).await.unwrap();
        assert_eq!(outcome, PutOutcome::Written { previous: Some(row) });

        // Delete existing, then missing.
        assert_eq!(table.delete_row("a").await.unwrap(), Some(updated));
        assert_eq!(table.delete_row("a").await.unwrap(), None);
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn test_not_exists_condition() {
        let table = InMemoryTable::new();
        let first = list_row("k", &["first"]);
        let second = list_row("k", &["second"]);

        let outcome = table.put_row("k", first.clone(), Condition::NotExists).await.unwrap();
        assert!(matches!(outcome, PutOutcome::Written { previous: None }));

        let outcome = table.put_row("k", second, Condition::NotExists).await.unwrap();
        assert_eq!(outcome, PutOutcome::Rejected { current: Some(first.clone()) });
        assert_eq!(table.get_row("k").await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_shape_condition() {
        let table = InMemoryTable::new();
        let map = encode("k", &Value::map([("a", "b")])).unwrap();

        // Absent row never satisfies a shape condition.
        let outcome = table
            .put_row("k", map.clone(), Condition::ShapeIs(Shape::Map))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::Rejected { current: None });
        assert!(table.is_empty().await);

        table.put_row("k", map.clone(), Condition::Always).await.unwrap();
        let outcome = table
            .put_row("k", list_row("k", &["x"]), Condition::ShapeIs(Shape::List))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::Rejected { current: Some(map.clone()) });

        let replacement = encode("k", &Value::map([("a", "c")])).unwrap();
        let outcome = table
            .put_row("k", replacement, Condition::ShapeIs(Shape::Map))
            .await
            .unwrap();
        assert_eq!(outcome, PutOutcome::Written { previous: Some(map) });
    }

    #[tokio::test]
    async fn test_scan_prefix() {
        let table = InMemoryTable::new();
        for key in ["user:1", "user:2", "post:1", "users"] {
            table.put_row(key, list_row(key, &[]), Condition::Always).await.unwrap();
        }

        let keys: Vec<String> = table
            .scan("user:")
            .await
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["user:1", "user:2"]);

        // Empty prefix returns every row in key order.
        let all = table.scan("").await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].0, "post:1");

        assert!(table.scan("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_state() {
        let table = InMemoryTable::named("shared");
        let clone = table.clone();

        table.put_row("s", list_row("s", &["x"]), Condition::Always).await.unwrap();
        assert!(clone.get_row("s").await.unwrap().is_some());
        assert_eq!(clone.name(), "shared");
    }
}
