// SPDX-License-Identifier: PMPL-1.0-or-later
//! Persistence tests for items stored in a redb table.

#![cfg(feature = "redb-backend")]

use std::sync::Arc;

use atoms_store::{
    open_table, BackendKind, RedbTable, ShapeRestricted, Store, StoreConfig, TableStore, Value,
};
use serde_json::json;
use tempfile::tempdir;

#[tokio::test]
async fn test_items_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("items.redb");

    {
        let store = TableStore::new(RedbTable::open(&path, "atoms").unwrap());
        store.add("a", Value::map([("x", "1")])).await.unwrap();
        store.add("b", Value::list(["p", "q"])).await.unwrap();
        store.add("c", Value::scalar(json!({"n": 42}))).await.unwrap();
        store.replace("b", Value::list(["r"])).await.unwrap();
    }

    let store = TableStore::new(RedbTable::open(&path, "atoms").unwrap());
    assert_eq!(store.table().path(), path.as_path());
    let all = store.search("*").await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all["a"].value, Value::map([("x", "1")]));
    assert_eq!(all["b"].value, Value::list(["r"]));
    assert_eq!(all["c"].value, Value::scalar(json!({"n": 42})));

    // Create-if-absent still holds against rows from the earlier session.
    let existing = store.add("a", Value::map([("x", "2")])).await.unwrap();
    assert_eq!(existing.unwrap().value, Value::map([("x", "1")]));
}

#[tokio::test]
async fn test_views_over_configured_table() {
    let dir = tempdir().unwrap();
    let config = StoreConfig {
        backend: BackendKind::Redb,
        table_name: "atoms".to_string(),
        persistence_dir: Some(dir.path().to_path_buf()),
    };
    let backend = Arc::new(TableStore::new(open_table(&config).unwrap()));
    let maps = ShapeRestricted::maps(Arc::clone(&backend));
    let lists = ShapeRestricted::lists(Arc::clone(&backend));

    maps.add("settings", Value::map([("theme", "dark")])).await.unwrap();
    lists.add("todo", Value::list(["write"])).await.unwrap();

    assert!(lists.replace("settings", Value::list(["x"])).await.is_err());
    assert_eq!(maps.search("*").await.unwrap().len(), 1);
    assert_eq!(lists.search("*").await.unwrap().len(), 1);
    assert_eq!(lists.delete("settings").await.unwrap(), None);
    assert!(backend.read("settings").await.unwrap().is_some());
}
