// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shape codec between `Value` and the flat attribute row used by tables.
//
// A row is a flat map of attribute name to attribute value with no nesting.
// The shape survives the trip through the reserved type attribute:
//
//   map   -> item-name, item-type = "map", one attribute per entry
//   list  -> item-name, item-type = "list", item-value = [..]
//   obj   -> item-name, item-type = "obj",  item-value = "<json>"

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::value::{Shape, Value};

/// Reserved attribute holding the item name (the row's primary key).
pub const NAME_ATTR: &str = "item-name";
/// Reserved attribute holding the shape tag.
pub const TYPE_ATTR: &str = "item-type";
/// Reserved attribute holding list and scalar payloads.
pub const VALUE_ATTR: &str = "item-value";

const RESERVED: [&str; 3] = [NAME_ATTR, TYPE_ATTR, VALUE_ATTR];

/// A single attribute value in a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attribute {
    /// A string attribute.
    #[serde(rename = "S")]
    Str(String),
    /// An ordered, multi-valued string attribute.
    #[serde(rename = "L")]
    StrList(Vec<String>),
}

impl Attribute {
    /// The string payload, `None` for a list attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Attribute::Str(s) => Some(s),
            Attribute::StrList(_) => None,
        }
    }
}

/// One persisted item: attribute name to attribute value.
pub type Row = BTreeMap<String, Attribute>;

/// Return true if `key` cannot be used as a map entry key.
pub fn is_reserved(key: &str) -> bool {
    RESERVED.contains(&key)
}

/// The raw shape tag of a row, if it has one.
pub fn row_tag(row: &Row) -> Option<&str> {
    row.get(TYPE_ATTR).and_then(Attribute::as_str)
}

/// Encode `value` as the row stored under `name`.
pub fn encode(name: &str, value: &Value) -> Result<Row, StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidName(name.to_string()));
    }

    let shape = value.shape().ok_or_else(|| {
        StoreError::invalid_shape(name, "value of unknown shape cannot be written")
    })?;

    let mut row = Row::new();
    row.insert(NAME_ATTR.to_string(), Attribute::Str(name.to_string()));
    row.insert(TYPE_ATTR.to_string(), Attribute::Str(shape.tag().to_string()));

    match value {
        Value::Map(entries) => {
            for (key, entry) in entries {
                if is_reserved(key) {
                    return Err(StoreError::ReservedKey {
                        name: name.to_string(),
                        key: key.clone(),
                    });
                }
                row.insert(key.clone(), Attribute::Str(entry.clone()));
            }
        }
        Value::List(items) => {
            row.insert(VALUE_ATTR.to_string(), Attribute::StrList(items.clone()));
        }
        Value::Scalar(json) => {
            let text = serde_json::to_string(json).map_err(|err| {
                StoreError::Serialization(format!("failed to serialize scalar '{}': {}", name, err))
            })?;
            row.insert(VALUE_ATTR.to_string(), Attribute::Str(text));
        }
        // Rejected above: it has no shape.
        Value::Unknown { .. } => {}
    }

    Ok(row)
}

/// Decode a row back into a value.
///
/// An unrecognized or missing shape tag yields [`Value::Unknown`]. A known
/// tag with a malformed payload is [`StoreError::CorruptedData`].
pub fn decode(row: &Row) -> Result<Value, StoreError> {
    let tag = row_tag(row).unwrap_or_default();
    let Some(shape) = Shape::from_tag(tag) else {
        return Ok(Value::Unknown {
            tag: tag.to_string(),
        });
    };

    let name = row
        .get(NAME_ATTR)
        .and_then(Attribute::as_str)
        .unwrap_or("<unnamed>");

    match shape {
        Shape::Map => {
            let mut entries = BTreeMap::new();
            for (key, attr) in row.iter().filter(|(k, _)| !is_reserved(k)) {
                let entry = attr.as_str().ok_or_else(|| {
                    StoreError::CorruptedData(format!(
                        "map entry '{}' of '{}' is not a string",
                        key, name
                    ))
                })?;
                entries.insert(key.clone(), entry.to_string());
            }
            Ok(Value::Map(entries))
        }
        Shape::List => match row.get(VALUE_ATTR) {
            Some(Attribute::StrList(items)) => Ok(Value::List(items.clone())),
            _ => Err(StoreError::CorruptedData(format!(
                "list '{}' has no string-list value",
                name
            ))),
        },
        Shape::Scalar => {
            let text = row
                .get(VALUE_ATTR)
                .and_then(Attribute::as_str)
                .ok_or_else(|| {
                    StoreError::CorruptedData(format!("scalar '{}' has no string value", name))
                })?;
            let json = serde_json::from_str(text).map_err(|err| {
                StoreError::CorruptedData(format!("scalar '{}' is not valid JSON: {}", name, err))
            })?;
            Ok(Value::Scalar(json))
        }
    }
}

/// Serialize a row for byte-oriented media.
pub fn row_to_bytes(row: &Row) -> Result<Vec<u8>, StoreError> {
    serde_json::to_vec(row)
        .map_err(|err| StoreError::Serialization(format!("failed to serialize row: {}", err)))
}

/// Deserialize a row written by [`row_to_bytes`].
pub fn row_from_bytes(bytes: &[u8]) -> Result<Row, StoreError> {
    serde_json::from_slice(bytes)
        .map_err(|err| StoreError::Serialization(format!("failed to deserialize row: {}", err)))
}
