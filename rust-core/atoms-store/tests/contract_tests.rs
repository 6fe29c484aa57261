// SPDX-License-Identifier: PMPL-1.0-or-later
//! Contract tests for the item store.
//!
//! Exercises the `Store` contract end to end through the backend and the
//! shape-restricted views sharing it.

use std::sync::Arc;

use atoms_store::codec::{Attribute, Row, NAME_ATTR, TYPE_ATTR};
use atoms_store::{
    Condition, InMemoryTable, Item, Shape, ShapeRestricted, Store, StoreError, Table, TableStore,
    Value,
};
use serde_json::json;

type Backend = Arc<TableStore<InMemoryTable>>;

fn backend() -> Backend {
    Arc::new(TableStore::new(InMemoryTable::new()))
}

/// Backend holding `a` (map), `b` (list) and `c` (scalar).
async fn seeded() -> Backend {
    let backend = backend();
    backend.add("a", Value::map([("x", "1")])).await.unwrap();
    backend.add("b", Value::list(["p", "q"])).await.unwrap();
    backend.add("c", Value::scalar(json!(42))).await.unwrap();
    backend
}

fn names(items: &std::collections::BTreeMap<String, Item>) -> Vec<&str> {
    items.keys().map(String::as_str).collect()
}

// ===========================================================================
// Backend
// ===========================================================================

#[tokio::test]
async fn test_absent_names_are_not_errors() {
    let backend = backend();
    assert_eq!(backend.read("nobody").await.unwrap(), None);
    assert_eq!(backend.delete("nobody").await.unwrap(), None);
    assert!(backend.search("*").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_search_all_preserves_shapes() {
    let backend = seeded().await;

    let all = backend.search("*").await.unwrap();
    assert_eq!(names(&all), vec!["a", "b", "c"]);
    assert_eq!(all["a"].shape(), Some(Shape::Map));
    assert_eq!(all["b"].shape(), Some(Shape::List));
    assert_eq!(all["c"].shape(), Some(Shape::Scalar));
    assert_eq!(all["a"].value, Value::map([("x", "1")]));
    assert_eq!(all["b"].value, Value::list(["p", "q"]));
    assert_eq!(all["c"].value, Value::scalar(json!(42)));
}

#[tokio::test]
async fn test_second_add_returns_first_value() {
    let backend = backend();
    let v1 = Value::scalar(json!({"version": 1}));
    let v2 = Value::scalar(json!({"version": 2}));

    assert!(backend.add("n", v1.clone()).await.unwrap().is_none());
    let returned = backend.add("n", v2).await.unwrap().unwrap();
    assert_eq!(returned, Item::new("n", v1.clone()));
    assert_eq!(backend.read("n").await.unwrap().unwrap().value, v1);
}

#[tokio::test]
async fn test_full_lifecycle() {
    let backend = backend();

    // absent -> present
    assert!(backend.add("n", Value::list(["1"])).await.unwrap().is_none());
    // present -> present, same shape
    let previous = backend.replace("n", Value::list(["2"])).await.unwrap();
    assert_eq!(previous.unwrap().value, Value::list(["1"]));
    // present -> absent
    let removed = backend.delete("n").await.unwrap();
    assert_eq!(removed.unwrap().value, Value::list(["2"]));
    // absent again: a new add may pick any shape
    assert!(backend.add("n", Value::map([("k", "v")])).await.unwrap().is_none());
}

// ===========================================================================
// Shape-restricted views
// ===========================================================================

#[tokio::test]
async fn test_views_search_only_their_shape() {
    let backend = seeded().await;
    let maps = ShapeRestricted::maps(Arc::clone(&backend));
    let lists = ShapeRestricted::lists(Arc::clone(&backend));

    assert_eq!(names(&maps.search("*").await.unwrap()), vec!["a"]);
    assert_eq!(names(&lists.search("*").await.unwrap()), vec!["b"]);
}

#[tokio::test]
async fn test_wrong_shape_add_leaves_backend_untouched() {
    let backend = backend();
    let views = [
        ShapeRestricted::maps(Arc::clone(&backend)),
        ShapeRestricted::lists(Arc::clone(&backend)),
        ShapeRestricted::scalars(Arc::clone(&backend)),
    ];
    let values = [
        Value::map([("x", "1")]),
        Value::list(["p"]),
        Value::scalar(json!(true)),
    ];

    for view in &views {
        for value in values.iter().filter(|v| !view.accepts(v)) {
            let err = view.add("n", value.clone()).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidShape { .. }));
            assert!(backend.read("n").await.unwrap().is_none());
        }
    }
}

#[tokio::test]
async fn test_replace_with_other_shape_fails_in_every_view() {
    let backend = seeded().await;
    let views = [
        ShapeRestricted::maps(Arc::clone(&backend)),
        ShapeRestricted::lists(Arc::clone(&backend)),
        ShapeRestricted::scalars(Arc::clone(&backend)),
    ];

    for view in &views {
        let err = view.replace("a", Value::list(["z"])).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidShape { .. }));
    }
    assert_eq!(
        backend.read("a").await.unwrap().unwrap().value,
        Value::map([("x", "1")])
    );
}

#[tokio::test]
async fn test_view_cannot_delete_foreign_items() {
    let backend = seeded().await;
    let lists = ShapeRestricted::lists(Arc::clone(&backend));

    assert_eq!(lists.delete("a").await.unwrap(), None);
    assert_eq!(lists.delete("c").await.unwrap(), None);
    assert_eq!(backend.search("*").await.unwrap().len(), 3);

    assert!(lists.delete("b").await.unwrap().is_some());
    assert_eq!(names(&backend.search("*").await.unwrap()), vec!["a", "c"]);
}

#[tokio::test]
async fn test_views_behind_dyn_store() {
    let backend = seeded().await;
    let views: Vec<Arc<dyn Store>> = vec![
        Arc::new(ShapeRestricted::maps(Arc::clone(&backend))),
        Arc::new(ShapeRestricted::lists(Arc::clone(&backend))),
        Arc::new(ShapeRestricted::scalars(Arc::clone(&backend))),
    ];

    let seen: Vec<Vec<String>> = futures::future::join_all(views.iter().map(|v| v.search("*")))
        .await
        .into_iter()
        .map(|r| r.unwrap().into_keys().collect())
        .collect();
    assert_eq!(seen, vec![vec!["a"], vec!["b"], vec!["c"]]);
}

#[tokio::test]
async fn test_unknown_rows_are_invisible_to_views() {
    let backend = seeded().await;
    let mut row = Row::new();
    row.insert(NAME_ATTR.into(), Attribute::Str("future".into()));
    row.insert(TYPE_ATTR.into(), Attribute::Str("set".into()));
    backend
        .table()
        .put_row("future", row, Condition::Always)
        .await
        .unwrap();

    let views = [
        ShapeRestricted::maps(Arc::clone(&backend)),
        ShapeRestricted::lists(Arc::clone(&backend)),
        ShapeRestricted::scalars(Arc::clone(&backend)),
    ];
    let values = [
        Value::map([("x", "1")]),
        Value::list(["p"]),
        Value::scalar(json!(true)),
    ];

    for (view, value) in views.iter().zip(values) {
        assert_eq!(view.read("future").await.unwrap(), None);
        assert!(!view.search("*").await.unwrap().contains_key("future"));
        assert!(view.search("fut*").await.unwrap().is_empty());
        assert_eq!(view.delete("future").await.unwrap(), None);

        let err = view.add("future", value.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidShape { .. }));
        let err = view.replace("future", value).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidShape { .. }));
    }

    let item = backend.read("future").await.unwrap().unwrap();
    assert_eq!(item.value, Value::Unknown { tag: "set".into() });
    assert_eq!(item.shape(), None);
}
