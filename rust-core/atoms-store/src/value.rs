// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// In-memory item model.
//
// Every stored payload is one of a closed set of shapes. The shape is decided
// once, when a value is built or decoded, and all later dispatch is a match on
// the `Value` variant.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The structural kind of an item's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// Flat string key to string value mapping.
    Map,
    /// Ordered sequence of strings.
    List,
    /// Opaque JSON value.
    Scalar,
}

impl Shape {
    /// Wire tag persisted in the row's type attribute.
    pub fn tag(self) -> &'static str {
        match self {
            Shape::Map => "map",
            Shape::List => "list",
            Shape::Scalar => "obj",
        }
    }

    /// Parse a wire tag. Matching ignores ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        [Shape::Map, Shape::List, Shape::Scalar]
            .into_iter()
            .find(|shape| shape.tag().eq_ignore_ascii_case(tag))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A typed item payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Flat mapping from key to string.
    Map(BTreeMap<String, String>),
    /// Ordered string sequence. Order and duplicates are preserved.
    List(Vec<String>),
    /// Any JSON value, stored through the JSON codec untouched.
    Scalar(serde_json::Value),
    /// A row whose shape tag this version does not recognize.
    ///
    /// Surfaced on read so that rows written by newer versions stay readable.
    /// It has no shape, so no restricted view accepts it and it cannot be
    /// written back.
    Unknown {
        /// The tag found in the row, empty if the row had none.
        tag: String,
    },
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Build a list value.
    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Wrap a JSON value as a scalar.
    pub fn scalar(json: serde_json::Value) -> Self {
        Value::Scalar(json)
    }

    /// The shape of this value, `None` for [`Value::Unknown`].
    pub fn shape(&self) -> Option<Shape> {
        match self {
            Value::Map(_) => Some(Shape::Map),
            Value::List(_) => Some(Shape::List),
            Value::Scalar(_) => Some(Shape::Scalar),
            Value::Unknown { .. } => None,
        }
    }

    /// True for a null scalar, the store's notion of "no value".
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Scalar(serde_json::Value::Null))
    }

    /// Infer a value from a JSON document by inspecting its structure.
    ///
    /// An object whose members are all strings becomes a map, an array whose
    /// elements are all strings becomes a list, and anything else is kept
    /// whole as a scalar.
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Object(obj) if obj.values().all(Json::is_string) => Value::Map(
                obj.into_iter()
                    .filter_map(|(k, v)| match v {
                        Json::String(s) => Some((k, s)),
                        _ => None,
                    })
                    .collect(),
            ),
            Json::Array(items) if items.iter().all(Json::is_string) => Value::List(
                items
                    .into_iter()
                    .filter_map(|v| match v {
                        Json::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Value::Scalar(other),
        }
    }

    /// Render as JSON for responses.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Map(map) => Json::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Json::String(v.clone())))
                    .collect(),
            ),
            Value::List(items) => Json::Array(items.iter().cloned().map(Json::String).collect()),
            Value::Scalar(json) => json.clone(),
            Value::Unknown { tag } => serde_json::json!({ "unknown-shape": tag }),
        }
    }
}

/// A named, shape-tagged stored value.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Unique name within the backend's namespace.
    pub name: String,
    /// The payload.
    pub value: Value,
}

impl Item {
    /// Pair `name` with `value`.
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Shape of the payload.
    pub fn shape(&self) -> Option<Shape> {
        self.value.shape()
    }
}
