// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for the item store

use atoms_store::codec::{decode, encode};
use atoms_store::{InMemoryTable, ShapeRestricted, Store, StoreError, TableStore, Value};
use proptest::prelude::*;

/// Generate arbitrary item names
fn arb_name() -> impl Strategy<Value = String> {
    "[a-z]{1,8}(:[0-9]{1,3})?"
}

/// Generate arbitrary map payloads (keys never collide with `item-*` attributes)
fn arb_map() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z][a-z0-9_]{0,7}", ".{0,16}", 0..6).prop_map(Value::Map)
}

/// Generate arbitrary list payloads
fn arb_list() -> impl Strategy<Value = Value> {
    prop::collection::vec(".{0,16}", 0..8).prop_map(Value::List)
}

/// Generate arbitrary non-null JSON scalars
fn arb_scalar() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[ -~]{0,12}".prop_map(serde_json::Value::from),
    ];
    let json = leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| serde_json::Value::Object(m.into_iter().collect())),
        ]
    });
    json.prop_map(Value::Scalar)
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![arb_map(), arb_list(), arb_scalar()]
}

proptest! {
    #[test]
    fn test_codec_round_trip(name in arb_name(), value in arb_value()) {
        let row = encode(&name, &value).unwrap();
        prop_assert_eq!(decode(&row).unwrap(), value);
    }

    #[test]
    fn test_add_then_read_returns_value(name in arb_name(), value in arb_value()) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = TableStore::new(InMemoryTable::new());

            prop_assert!(store.add(&name, value.clone()).await.unwrap().is_none());
            let item = store.read(&name).await.unwrap().unwrap();
            prop_assert_eq!(item.value, value);

            Ok(())
        })?;
    }

    #[test]
    fn test_add_never_overwrites(
        name in arb_name(),
        first in arb_value(),
        second in arb_value()
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let store = TableStore::new(InMemoryTable::new());

            store.add(&name, first.clone()).await.unwrap();
            let existing = store.add(&name, second).await.unwrap().unwrap();
            prop_assert_eq!(existing.value, first.clone());
            prop_assert_eq!(store.read(&name).await.unwrap().unwrap().value, first);

            Ok(())
        })?;
    }

    #[test]
    fn test_views_reject_foreign_shapes_without_writing(
        name in arb_name(),
        value in arb_value()
    ) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let backend = std::sync::Arc::new(TableStore::new(InMemoryTable::new()));
            let views = [
                ShapeRestricted::maps(backend.clone()),
                ShapeRestricted::lists(backend.clone()),
                ShapeRestricted::scalars(backend.clone()),
            ];

            for view in views.iter().filter(|view| !view.accepts(&value)) {
                let result = view.add(&name, value.clone()).await;
                let is_invalid_shape = matches!(result, Err(StoreError::InvalidShape { .. }));
                prop_assert!(is_invalid_shape);
                prop_assert!(backend.read(&name).await.unwrap().is_none());
            }

            Ok(())
        })?;
    }
}
