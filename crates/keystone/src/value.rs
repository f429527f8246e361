// SPDX-License-Identifier: LGPL-2.1-or-later
// Copyright (C) 2025 Shahzad A. Bhatti <bhatti@plexobject.com>
//
// This file is part of PlexSpaces.
//
// PlexSpaces is free software: you can redistribute it and/or modify
// it under the terms of the GNU Lesser General Public License as published by
// the Free Software Foundation, either version 2.1 of the License, or
// (at your option) any later version.
//
// PlexSpaces is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Lesser General Public License for more details.
//
// You should have received a copy of the GNU Lesser General Public License
// along with PlexSpaces. If not, see <https://www.gnu.org/licenses/>.

//! Value model and the serialization codec.
//!
//! ## Representations
//! A [`Value`] is stored either natively (Redis string, list or hash) or as a
//! serialized JSON envelope inside a Redis string or an overflow file:
//!
//! ```text
//! {"type":"hash","value":{"a":"A"}}
//! {"type":"list","value":["1","2"]}
//! {"type":"object","value":{"first":"Ada","tags":["x"]}}
//! ```
//!
//! File-backed keys hold a [`PlacementRecord`] (`{"file":"<name>"}`) instead.
//!
//! ## Known Ambiguity
//! A plain string that happens to be a valid envelope or placement record
//! reads back decoded. There is no escaping scheme.

use crate::KeystoneResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

/// A value as seen by Keystone callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case", deny_unknown_fields)]
pub enum Value {
    /// Scalar text
    String(String),
    /// Integer scalar, stored natively as decimal text
    Integer(i64),
    /// Ordered sequence of strings (native Redis list unless serialized)
    List(Vec<String>),
    /// Field/value mapping (native Redis hash unless serialized)
    Hash(BTreeMap<String, String>),
    /// Composite record with named properties, always stored serialized
    Object(Map<String, Json>),
}

impl Value {
    /// Convert a JSON node into the closest value shape.
    pub fn from_json(json: Json) -> Value {
        match json {
            Json::String(s) => Value::String(s),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::String(n.to_string()),
            },
            Json::Object(map) => Value::Object(map),
            Json::Array(items) if items.iter().all(Json::is_string) => Value::List(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Json::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Value::String(other.to_string()),
        }
    }

    /// Borrow the text of a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar text of a string or integer value.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::String(s) => Some(s.clone()),
            Value::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Textual form of a named field of a hash or object value.
    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            Value::Hash(map) => map.get(name).cloned(),
            Value::Object(map) => map.get(name).map(json_text),
            _ => None,
        }
    }

    /// Whether this value is a composite record that must be serialized.
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Elements to append to a sequence, if this value can be appended.
    pub(crate) fn into_elements(self) -> Option<Vec<String>> {
        match self {
            Value::String(s) => Some(vec![s]),
            Value::Integer(i) => Some(vec![i.to_string()]),
            Value::List(items) => Some(items),
            Value::Hash(_) | Value::Object(_) => None,
        }
    }

    /// Fields to merge into a mapping, if this value carries named fields.
    pub(crate) fn into_fields(self) -> Option<Vec<(String, String)>> {
        match self {
            Value::Hash(map) => Some(map.into_iter().collect()),
            Value::Object(map) => Some(map.into_iter().map(|(k, v)| (k, json_text(&v))).collect()),
            _ => None,
        }
    }

    /// Properties to set on an object, if this value carries named fields.
    pub(crate) fn into_properties(self) -> Option<Map<String, Json>> {
        match self {
            Value::Hash(map) => Some(map.into_iter().map(|(k, v)| (k, Json::String(v))).collect()),
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

impl From<Vec<&str>> for Value {
    fn from(items: Vec<&str>) -> Self {
        Value::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Hash(map)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Value {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Value::Hash(
            pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl From<Map<String, Json>> for Value {
    fn from(map: Map<String, Json>) -> Self {
        Value::Object(map)
    }
}

fn json_text(json: &Json) -> String {
    match json {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// One or several sub-element selectors (hash fields, list positions, properties).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    /// A single selector
    One(String),
    /// Several selectors, answered with a mapping
    Many(Vec<String>),
}

impl Index {
    /// All selectors as a slice-friendly vector.
    pub fn items(&self) -> Vec<String> {
        match self {
            Index::One(item) => vec![item.clone()],
            Index::Many(items) => items.clone(),
        }
    }
}

impl From<&str> for Index {
    fn from(s: &str) -> Self {
        Index::One(s.to_string())
    }
}

impl From<String> for Index {
    fn from(s: String) -> Self {
        Index::One(s)
    }
}

impl From<i64> for Index {
    fn from(i: i64) -> Self {
        Index::One(i.to_string())
    }
}

impl From<Vec<&str>> for Index {
    fn from(items: Vec<&str>) -> Self {
        Index::Many(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for Index {
    fn from(items: Vec<String>) -> Self {
        Index::Many(items)
    }
}

/// Result of a `values` query.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// The filter named exactly one key
    One(Value),
    /// Results keyed by wildcard capture, or by full key without a wildcard
    Many(BTreeMap<String, Value>),
}

/// Stored representation of a key, as reported by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    /// Native string (plain or serialized)
    String,
    /// Native list
    List,
    /// Native hash
    Hash,
    /// Native set (metadata index keys)
    Set,
    /// Payload lives in the file backend
    File,
}

impl KeyType {
    /// Lower-case name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::String => "string",
            KeyType::List => "list",
            KeyType::Hash => "hash",
            KeyType::Set => "set",
            KeyType::File => "file",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pointer stored in the fast backend for file-backed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlacementRecord {
    /// Generated file name under the namespace directory
    pub file: String,
}

impl PlacementRecord {
    /// Encode for storage in the fast backend.
    pub fn encode(&self) -> KeystoneResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a stored string, if it is a placement record.
    ///
    /// A record whose `file` is anything other than a single plain path
    /// component is rejected, so the string reads back as plain text and can
    /// never address a file outside its namespace directory.
    pub fn decode(raw: &str) -> Option<PlacementRecord> {
        if !raw.starts_with('{') {
            return None;
        }
        let record: PlacementRecord = serde_json::from_str(raw).ok()?;
        record.is_plain_name().then_some(record)
    }

    fn is_plain_name(&self) -> bool {
        let mut components = Path::new(&self.file).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) && !self.file.contains(|c: char| c == '/' || c == '\\')
    }
}

/// Serialize a value into its envelope.
pub fn encode(value: &Value) -> KeystoneResult<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode a stored string, if it is a serialized envelope.
pub fn decode(raw: &str) -> Option<Value> {
    if !raw.starts_with('{') {
        return None;
    }
    serde_json::from_str(raw).ok()
}

/// Decode a stored string, falling back to the raw text.
pub fn decode_or_plain(raw: String) -> Value {
    decode(&raw).unwrap_or(Value::String(raw))
}
