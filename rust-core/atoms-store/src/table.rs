// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Persistence-medium boundary.
//
// A `Table` is a key-value table of attribute rows with one conditional write
// primitive. The condition is evaluated and the write applied as a single
// atomic step by the implementation, which is what lets the item store offer
// create-if-absent and shape-preserving replace under concurrent writers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::codec::{row_tag, Row};
use crate::error::StoreError;
use crate::value::Shape;

/// Precondition attached to a [`Table::put_row`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// Write unconditionally.
    Always,
    /// Write only if no row exists under the key.
    NotExists,
    /// Write only if a row exists under the key and carries this shape tag.
    ShapeIs(Shape),
}

impl Condition {
    /// Evaluate the condition against the row currently stored, if any.
    pub fn holds(self, current: Option<&Row>) -> bool {
        match self {
            Condition::Always => true,
            Condition::NotExists => current.is_none(),
            Condition::ShapeIs(shape) => current
                .and_then(row_tag)
                .and_then(Shape::from_tag)
                .is_some_and(|stored| stored == shape),
        }
    }
}

/// Result of a conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum PutOutcome {
    /// The row was written; `previous` is what it replaced.
    Written { previous: Option<Row> },
    /// The condition failed and nothing was written; `current` is the row
    /// that was stored when the condition was checked.
    Rejected { current: Option<Row> },
}

/// A key-value table of attribute rows.
///
/// Implementations must be safe to share across threads and tokio tasks.
#[async_trait]
pub trait Table: Send + Sync {
    /// Fetch the row stored under `key`. Absence is `Ok(None)`.
    async fn get_row(&self, key: &str) -> Result<Option<Row>, StoreError>;

    /// Store `row` under `key` if `condition` holds, atomically with the check.
    async fn put_row(
        &self,
        key: &str,
        row: Row,
        condition: Condition,
    ) -> Result<PutOutcome, StoreError>;

    /// Remove the row under `key`, returning it if it existed.
    async fn delete_row(&self, key: &str) -> Result<Option<Row>, StoreError>;

    /// All rows whose key starts with `prefix`, in key order.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Row)>, StoreError>;

    /// A human-readable name for this table, used in logging.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Table + ?Sized> Table for Arc<T> {
    async fn get_row(&self, key: &str) -> Result<Option<Row>, StoreError> {
        (**self).get_row(key).await
    }

    async fn put_row(
        &self,
        key: &str,
        row: Row,
        condition: Condition,
    ) -> Result<PutOutcome, StoreError> {
        (**self).put_row(key, row, condition).await
    }

    async fn delete_row(&self, key: &str) -> Result<Option<Row>, StoreError> {
        (**self).delete_row(key).await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Row)>, StoreError> {
        (**self).scan(prefix).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;
    use crate::value::Value;

    #[test]
    fn test_condition_evaluation() {
        let map = encode("m", &Value::map([("k", "v")])).unwrap();
        let list = encode("l", &Value::list(["a"])).unwrap();

        assert!(Condition::Always.holds(None));
        assert!(Condition::Always.holds(Some(&map)));

        assert!(Condition::NotExists.holds(None));
        assert!(!Condition::NotExists.holds(Some(&map)));

        assert!(Condition::ShapeIs(Shape::Map).holds(Some(&map)));
        assert!(!Condition::ShapeIs(Shape::Map).holds(Some(&list)));
        assert!(!Condition::ShapeIs(Shape::Map).holds(None));
    }
}
