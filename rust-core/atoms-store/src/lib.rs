// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Atoms item store
//
// A named, shape-typed item repository behind one `Store` contract. Items are
// maps, lists or scalars; they are persisted as flat attribute rows in a
// pluggable `Table`, and decorators narrow a store to a single shape without
// the backend knowing.
//
// # Modules
//
// - [`value`] -- `Shape`, `Value` and `Item`.
// - [`codec`] -- Encoding between values and attribute rows.
// - [`table`] -- The `Table` trait with its atomic conditional write.
// - [`memory`] -- An in-memory `BTreeMap` table.
// - [`store`] -- The `Store` trait and search patterns.
// - [`backend`] -- `TableStore`, the `Store` bound to one table.
// - [`restrict`] -- `ShapeRestricted`, the single-shape view.
// - [`metrics`] -- `MetricsStore`, an operation-counting decorator.
// - [`config`] -- Selecting and opening the table.
// - [`error`] -- `StoreError`.
//
// # Example
//
// ```rust
// use std::sync::Arc;
// use atoms_store::{InMemoryTable, ShapeRestricted, Store, TableStore, Value};
//
// # tokio_test::block_on(async {
// let backend = Arc::new(TableStore::new(InMemoryTable::new()));
// let maps = ShapeRestricted::maps(Arc::clone(&backend));
//
// maps.add("settings", Value::map([("theme", "dark")])).await.unwrap();
// let item = backend.read("settings").await.unwrap().unwrap();
// assert_eq!(item.value, Value::map([("theme", "dark")]));
// # });
// ```

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod restrict;
pub mod store;
pub mod table;
pub mod value;

// Optional persistent tables, feature-gated to keep the default build lean.
#[cfg(feature = "redb-backend")]
pub mod redb_table;

pub use backend::TableStore;
pub use config::{open_table, BackendKind, StoreConfig};
pub use error::StoreError;
pub use memory::InMemoryTable;
pub use metrics::{MetricsStore, StoreStats};
pub use restrict::ShapeRestricted;
pub use store::{Pattern, Store, WILDCARD};
pub use table::{Condition, PutOutcome, Table};
pub use value::{Item, Shape, Value};

#[cfg(feature = "redb-backend")]
pub use redb_table::RedbTable;
