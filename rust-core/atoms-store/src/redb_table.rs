// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <j.d.a.jewell@open.ac.uk>
//
// redb-backed persistent table.
//
// Uses redb (pure Rust, B-tree, ACID, single-file database) to hold item rows
// durably. No C/C++ dependencies.
//
// # Design
//
// - One redb `Database` file; each `RedbTable` owns one named redb table in it,
//   keyed by item name, with the row stored as JSON bytes.
// - Read transactions for `get_row` and `scan` (concurrent, lock-free).
// - Conditional puts read the current row and write inside one write
//   transaction. redb serialises write transactions, so check and write are
//   atomic with respect to every other writer.
// - All redb work runs on the blocking pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, TableError};
use tracing::debug;

use crate::codec::{row_from_bytes, row_to_bytes, Row};
use crate::error::StoreError;
use crate::table::{Condition, PutOutcome, Table};

fn definition(table_name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(table_name)
}

/// A persistent table powered by redb.
///
/// Thread-safe: `Database` is `Send + Sync` and handles internal locking.
///
/// # Example
///
/// ```rust,no_run
/// use atoms_store::codec::encode;
/// use atoms_store::redb_table::RedbTable;
/// use atoms_store::table::{Condition, Table};
/// use atoms_store::value::Value;
///
/// # tokio_test::block_on(async {
/// let table = RedbTable::open("/tmp/atoms-test.redb", "atoms").unwrap();
/// let row = encode("fruit", &Value::list(["apple"])).unwrap();
/// table.put_row("fruit", row, Condition::NotExists).await.unwrap();
/// assert!(table.get_row("fruit").await.unwrap().is_some());
/// # });
/// ```
pub struct RedbTable {
    db: Arc<Database>,
    /// Path to the database file, for diagnostics.
    path: PathBuf,
    /// Name of the redb table holding the rows.
    table_name: Arc<str>,
}

impl RedbTable {
    /// Open or create a redb database at `path` and bind to `table_name`.
    ///
    /// Creates the file and parent directories if they don't exist. The table
    /// itself is created on first write.
    pub fn open(path: impl AsRef<Path>, table_name: &str) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&path).map_err(|e| {
            StoreError::BackendUnavailable(format!(
                "failed to open redb at {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!(path = %path.display(), table = table_name, "opened redb table");

        Ok(Self {
            db: Arc::new(db),
            path,
            table_name: Arc::from(table_name),
        })
    }

    /// Return the filesystem path of the database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` on the blocking pool with shared handles to the database.
    async fn blocking<F, R>(&self, f: F) -> Result<R, StoreError>
    where
        F: FnOnce(&Database, &str) -> Result<R, StoreError> + Send + 'static,
        R: Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let table_name = Arc::clone(&self.table_name);
        tokio::task::spawn_blocking(move || f(&db, &table_name))
            .await
            .map_err(|e| StoreError::BackendUnavailable(format!("task join: {e}")))?
    }
}

impl std::fmt::Debug for RedbTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbTable")
            .field("path", &self.path)
            .field("table", &self.table_name)
            .finish()
    }
}

#[async_trait]
impl Table for RedbTable {
    async fn get_row(&self, key: &str) -> Result<Option<Row>, StoreError> {
        let key = key.to_string();

        self.blocking(move |db, table_name| {
            let txn = db
                .begin_read()
                .map_err(|e| StoreError::BackendUnavailable(format!("read txn: {e}")))?;

            let table = match txn.open_table(definition(table_name)) {
                Ok(t) => t,
                // Nothing has been written yet.
                Err(TableError::TableDoesNotExist(_)) => return Ok(None),
                Err(e) => return Err(StoreError::BackendUnavailable(format!("open table: {e}"))),
            };

            let bytes = table
                .get(key.as_str())
                .map_err(|e| StoreError::CorruptedData(format!("get: {e}")))?
                .map(|guard| guard.value().to_vec());

            bytes.map(|b| row_from_bytes(&b)).transpose()
        })
        .await
    }

    async fn put_row(
        &self,
        key: &str,
        row: Row,
        condition: Condition,
    ) -> Result<PutOutcome, StoreError> {
        let key = key.to_string();
        let bytes = row_to_bytes(&row)?;

        self.blocking(move |db, table_name| {
            let txn = db
                .begin_write()
                .map_err(|e| StoreError::BackendUnavailable(format!("write txn: {e}")))?;

            let outcome = {
                let mut table = txn
                    .open_table(definition(table_name))
                    .map_err(|e| StoreError::BackendUnavailable(format!("open table: {e}")))?;

                let current = table
                    .get(key.as_str())
                    .map_err(|e| StoreError::CorruptedData(format!("get: {e}")))?
                    .map(|guard| guard.value().to_vec());
                let current = current.map(|b| row_from_bytes(&b)).transpose()?;

                if condition.holds(current.as_ref()) {
                    table
                        .insert(key.as_str(), bytes.as_slice())
                        .map_err(|e| StoreError::CorruptedData(format!("insert: {e}")))?;
                    PutOutcome::Written { previous: current }
                } else {
                    PutOutcome::Rejected { current }
                }
            };

            match outcome {
                PutOutcome::Written { .. } => txn
                    .commit()
                    .map_err(|e| StoreError::CorruptedData(format!("commit: {e}")))?,
                PutOutcome::Rejected { .. } => txn
                    .abort()
                    .map_err(|e| StoreError::BackendUnavailable(format!("abort: {e}")))?,
            }

            Ok(outcome)
        })
        .await
    }

    async fn delete_row(&self, key: &str) -> Result<Option<Row>, StoreError> {
        let key = key.to_string();

        self.blocking(move |db, table_name| {
            let txn = db
                .begin_write()
                .map_err(|e| StoreError::BackendUnavailable(format!("write txn: {e}")))?;
            let removed = {
                let mut table = txn
                    .open_table(definition(table_name))
                    .map_err(|e| StoreError::BackendUnavailable(format!("open table: {e}")))?;
                let removed = table
                    .remove(key.as_str())
                    .map_err(|e| StoreError::CorruptedData(format!("remove: {e}")))?
                    .map(|guard| guard.value().to_vec());
                removed
            };
            txn.commit()
                .map_err(|e| StoreError::CorruptedData(format!("commit: {e}")))?;

            removed.map(|b| row_from_bytes(&b)).transpose()
        })
        .await
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Row)>, StoreError> {
        let prefix = prefix.to_string();

        self.blocking(move |db, table_name| {
            let txn = db
                .begin_read()
                .map_err(|e| StoreError::BackendUnavailable(format!("read txn: {e}")))?;
            let table = match txn.open_table(definition(table_name)) {
                Ok(t) => t,
                Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
                Err(e) => return Err(StoreError::BackendUnavailable(format!("open table: {e}"))),
            };

            let iter = table
                .range(prefix.as_str()..)
                .map_err(|e| StoreError::CorruptedData(format!("range scan: {e}")))?;

            let mut results = Vec::new();
            for entry in iter {
                let (k, v) =
                    entry.map_err(|e| StoreError::CorruptedData(format!("scan entry: {e}")))?;
                let key = k.value().to_string();
                if !key.starts_with(&prefix) {
                    break;
                }
                results.push((key, row_from_bytes(v.value())?));
            }

            Ok(results)
        })
        .await
    }

    fn name(&self) -> &str {
        &self.table_name
    }
}
