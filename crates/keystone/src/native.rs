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

//! Native Keystone connection.
//!
//! ## Purpose
//! Orchestrates the fast backend, the file backend and the metadata index.
//! Each operation qualifies its key once, inspects the stored representation
//! and dispatches on it.
//!
//! ## Representations
//! | stored as                        | `type_of` | read back as            |
//! |----------------------------------|-----------|-------------------------|
//! | native string                    | string    | text or decoded envelope|
//! | native list                      | list      | [`Value::List`]         |
//! | native hash                      | hash      | [`Value::Hash`]         |
//! | native set                       | set       | sorted [`Value::List`]  |
//! | placement record + overflow file | file      | decoded file contents   |
//!
//! ## Consistency
//! No cross-command atomicity. A `put` that clears and rebuilds a hash, or
//! moves a key between backends, is visible mid-flight to concurrent readers,
//! and a crash may leave stale index entries or orphaned files.

use crate::backend::{FastBackend, MemoryBackend};
use crate::config::{ConnectionConfig, Driver};
use crate::file::FileStore;
use crate::key::{glob_regex, KeyCodec, Scope};
use crate::metadata::Metadata;
use crate::value::{decode_or_plain, encode};
use crate::{
    Connection, Index, KeyType, KeystoneResult, KeystoneStats, PlacementRecord, Selection, Value,
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Connection over one fast backend and one file root.
#[derive(Clone)]
pub struct NativeConnection {
    backend: Arc<dyn FastBackend>,
    metadata: Metadata,
    files: FileStore,
    codec: KeyCodec,
    max_redis_size: usize,
}

impl NativeConnection {
    /// Build a connection over an existing fast backend.
    ///
    /// ## Errors
    /// - [`KeystoneError::ConfigError`](crate::KeystoneError::ConfigError): If `path` is missing
    pub fn with_backend(config: &ConnectionConfig, backend: Arc<dyn FastBackend>) -> KeystoneResult<Self> {
        config.validate()?;
        let files = FileStore::new(config.storage_path()?);
        let metadata = Metadata::new(backend.clone(), config.prefix.clone(), config.metadata_namespace.clone());
        Ok(Self {
            backend,
            metadata,
            files,
            codec: KeyCodec::new(config.prefix.clone(), config.root_namespace.clone()),
            max_redis_size: config.max_redis_size,
        })
    }

    /// Build a connection for `config.driver`.
    ///
    /// ## Errors
    /// - [`KeystoneError::ConfigError`](crate::KeystoneError::ConfigError): Invalid configuration,
    ///   or the native driver without the `redis-backend` feature
    /// - [`KeystoneError::BackendError`](crate::KeystoneError::BackendError): Redis unreachable
    pub async fn connect(config: &ConnectionConfig) -> KeystoneResult<Self> {
        config.validate()?;
        match config.driver {
            Driver::Memory => Self::with_backend(config, Arc::new(MemoryBackend::new())),
            #[cfg(feature = "redis-backend")]
            Driver::Native => {
                let backend = crate::backend::RedisBackend::new(&config.redis_url()).await?;
                Self::with_backend(config, Arc::new(backend))
            }
            #[cfg(not(feature = "redis-backend"))]
            Driver::Native => Err(crate::KeystoneError::ConfigError(
                "The native driver requires the 'redis-backend' feature".to_string(),
            )),
        }
    }

    /// File backend of this connection.
    pub fn file_store(&self) -> &FileStore {
        &self.files
    }

    // =========================================================================
    // Helpers on qualified keys
    // =========================================================================

    async fn placement(&self, key: &str) -> KeystoneResult<Option<PlacementRecord>> {
        if self.backend.key_type(key).await? != Some(KeyType::String) {
            return Ok(None);
        }
        Ok(self
            .backend
            .get(key)
            .await?
            .and_then(|raw| PlacementRecord::decode(&raw)))
    }

    async fn read_file(&self, key: &str, record: &PlacementRecord) -> KeystoneResult<Option<Value>> {
        let namespace = self.codec.namespace_of(key);
        let contents = self.files.read(&namespace, &record.file).await?;
        if contents.is_none() {
            warn!(key = %key, file = %record.file, "placement record points at a missing file");
        }
        Ok(contents.map(decode_or_plain))
    }

    async fn read_value(&self, key: &str) -> KeystoneResult<Option<Value>> {
        match self.backend.key_type(key).await? {
            Some(KeyType::List) => Ok(Some(Value::List(self.backend.lrange(key, 0, -1).await?))),
            Some(KeyType::Hash) => Ok(Some(Value::Hash(self.backend.hgetall(key).await?))),
            Some(KeyType::Set) => {
                let mut members = self.backend.smembers(key).await?;
                members.sort();
                Ok(Some(Value::List(members)))
            }
            Some(KeyType::String) => {
                let Some(raw) = self.backend.get(key).await? else {
                    return Ok(None);
                };
                match PlacementRecord::decode(&raw) {
                    Some(record) => self.read_file(key, &record).await,
                    None => Ok(Some(decode_or_plain(raw))),
                }
            }
            Some(KeyType::File) | None => Ok(None),
        }
    }

    async fn put_qualified(&self, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<()> {
        let value = if force_serialize || value.is_object() {
            Value::String(encode(&value)?)
        } else {
            value
        };

        self.metadata.record_forget(key).await?;
        match value {
            Value::String(text) if text.len() > self.max_redis_size => self.put_file(key, &text).await,
            other => {
                self.forget_file(key).await?;
                self.put_native(key, other).await
            }
        }
    }

    async fn put_file(&self, key: &str, text: &str) -> KeystoneResult<()> {
        let namespace = self.codec.namespace_of(key);
        let file = match self.placement(key).await? {
            Some(record) => record.file,
            None => {
                let record = PlacementRecord {
                    file: FileStore::generate_name(),
                };
                self.backend.set(key, &record.encode()?).await?;
                record.file
            }
        };

        debug!(key = %key, file = %file, bytes = text.len(), "placing value in file backend");
        self.files.write(&namespace, &file, text.as_bytes()).await?;
        self.metadata.record_write(key, false).await
    }

    async fn put_native(&self, key: &str, value: Value) -> KeystoneResult<()> {
        match value {
            Value::Hash(map) => {
                self.backend.del(key).await?;
                if map.is_empty() {
                    debug!(key = %key, "empty hash leaves key absent");
                    return Ok(());
                }
                let fields: Vec<(String, String)> = map.into_iter().collect();
                self.backend.hset_multiple(key, &fields).await?;
            }
            Value::List(items) => {
                self.backend.del(key).await?;
                if items.is_empty() {
                    debug!(key = %key, "empty list leaves key absent");
                    return Ok(());
                }
                self.backend.rpush(key, &items).await?;
            }
            Value::String(text) => self.backend.set(key, &text).await?,
            Value::Integer(i) => self.backend.set(key, &i.to_string()).await?,
            object @ Value::Object(_) => self.backend.set(key, &encode(&object)?).await?,
        }
        debug!(key = %key, "placed value in fast backend");
        self.metadata.record_write(key, true).await
    }

    async fn forget_file(&self, key: &str) -> KeystoneResult<()> {
        if let Some(record) = self.placement(key).await? {
            let namespace = self.codec.namespace_of(key);
            self.files.delete(&namespace, &record.file).await?;
        }
        Ok(())
    }

    /// Drop index entries of a key the backend removed after it emptied.
    async fn unindex_if_gone(&self, key: &str) -> KeystoneResult<()> {
        if !self.backend.exists(key).await? {
            self.metadata.record_forget(key).await?;
        }
        Ok(())
    }

    async fn pluck_qualified(&self, key: &str, index: &Index) -> KeystoneResult<Option<Value>> {
        match self.backend.key_type(key).await? {
            Some(KeyType::Hash) => match index {
                Index::One(field) => Ok(self.backend.hget(key, field).await?.map(Value::String)),
                Index::Many(fields) => {
                    let mut found = BTreeMap::new();
                    for field in fields {
                        if let Some(value) = self.backend.hget(key, field).await? {
                            found.insert(field.clone(), value);
                        }
                    }
                    Ok(Some(Value::Hash(found)))
                }
            },
            Some(KeyType::List) => match index {
                Index::One(position) => match position.parse::<i64>() {
                    Ok(position) => Ok(self.backend.lindex(key, position).await?.map(Value::String)),
                    Err(_) => Ok(None),
                },
                Index::Many(positions) => {
                    let mut found = BTreeMap::new();
                    for position in positions {
                        let Ok(parsed) = position.parse::<i64>() else {
                            continue;
                        };
                        if let Some(item) = self.backend.lindex(key, parsed).await? {
                            found.insert(position.clone(), item);
                        }
                    }
                    Ok(Some(Value::Hash(found)))
                }
            },
            Some(KeyType::String) => Ok(self
                .read_value(key)
                .await?
                .and_then(|value| pluck_fields(value, index))),
            _ => Ok(None),
        }
    }

    async fn list_only(&self, key: &str) -> KeystoneResult<bool> {
        Ok(self.backend.key_type(key).await? == Some(KeyType::List))
    }
}

/// Whether `raw` is an integer in the canonical form Redis accepts for `INCRBY`.
///
/// Only a leading `-` is allowed as a sign, and leading zeros are rejected.
fn is_integer_text(raw: &str) -> bool {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    let canonical = match digits.as_bytes() {
        [] => false,
        [b'0'] => raw == "0",
        [b'0', ..] => false,
        bytes => bytes.iter().all(u8::is_ascii_digit),
    };
    canonical && raw.parse::<i64>().is_ok()
}

/// Select properties of a decoded hash or object value.
fn pluck_fields(value: Value, index: &Index) -> Option<Value> {
    match (value, index) {
        (Value::Hash(map), Index::One(field)) => map.get(field).cloned().map(Value::String),
        (Value::Hash(map), Index::Many(fields)) => Some(Value::Hash(
            fields
                .iter()
                .filter_map(|f| map.get(f).map(|v| (f.clone(), v.clone())))
                .collect(),
        )),
        (Value::Object(map), Index::One(field)) => map.get(field).cloned().map(Value::from_json),
        (Value::Object(map), Index::Many(fields)) => Some(Value::Object(
            fields
                .iter()
                .filter_map(|f| map.get(f).map(|v| (f.clone(), v.clone())))
                .collect(),
        )),
        _ => None,
    }
}

#[async_trait]
impl Connection for NativeConnection {
    async fn get(&self, scope: &Scope, key: &str, index: Option<&Index>) -> KeystoneResult<Option<Value>> {
        let key = self.codec.qualify(scope, key);
        match index {
            Some(index) => self.pluck_qualified(&key, index).await,
            None => self.read_value(&key).await,
        }
    }

    async fn file_info(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<PlacementRecord>> {
        self.placement(&self.codec.qualify(scope, key)).await
    }

    async fn pluck(&self, scope: &Scope, key: &str, index: &Index) -> KeystoneResult<Option<Value>> {
        self.pluck_qualified(&self.codec.qualify(scope, key), index).await
    }

    async fn exists(&self, scope: &Scope, key: &str, field: Option<&str>) -> KeystoneResult<bool> {
        let key = self.codec.qualify(scope, key);
        let Some(field) = field else {
            return self.backend.exists(&key).await;
        };
        match self.backend.key_type(&key).await? {
            Some(KeyType::Hash) => self.backend.hexists(&key, field).await,
            Some(KeyType::String) => Ok(match self.read_value(&key).await? {
                Some(Value::Hash(map)) => map.contains_key(field),
                Some(Value::Object(map)) => map.contains_key(field),
                _ => false,
            }),
            _ => Ok(false),
        }
    }

    async fn type_of(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<KeyType>> {
        let key = self.codec.qualify(scope, key);
        match self.backend.key_type(&key).await? {
            Some(KeyType::String) if self.placement(&key).await?.is_some() => Ok(Some(KeyType::File)),
            other => Ok(other),
        }
    }

    async fn first(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        let key = self.codec.qualify(scope, key);
        if !self.list_only(&key).await? {
            return Ok(None);
        }
        self.backend.lindex(&key, 0).await
    }

    async fn last(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        let key = self.codec.qualify(scope, key);
        if !self.list_only(&key).await? {
            return Ok(None);
        }
        self.backend.lindex(&key, -1).await
    }

    #[instrument(skip(self, scope), fields(namespace = ?scope.namespace()))]
    async fn shift(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        let key = self.codec.qualify(scope, key);
        if !self.list_only(&key).await? {
            return Ok(None);
        }
        let item = self.backend.lpop(&key).await?;
        self.unindex_if_gone(&key).await?;
        Ok(item)
    }

    #[instrument(skip(self, scope), fields(namespace = ?scope.namespace()))]
    async fn pop(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        let key = self.codec.qualify(scope, key);
        if !self.list_only(&key).await? {
            return Ok(None);
        }
        let item = self.backend.rpop(&key).await?;
        self.unindex_if_gone(&key).await?;
        Ok(item)
    }

    async fn range(&self, scope: &Scope, key: &str, start: i64, end: i64) -> KeystoneResult<Option<Vec<String>>> {
        let key = self.codec.qualify(scope, key);
        if !self.list_only(&key).await? {
            return Ok(None);
        }
        Ok(Some(self.backend.lrange(&key, start, end).await?))
    }

    #[instrument(skip(self, scope, value), fields(namespace = ?scope.namespace()))]
    async fn put(&self, scope: &Scope, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<()> {
        let key = self.codec.qualify(scope, key);
        self.put_qualified(&key, value, force_serialize).await
    }

    #[instrument(skip(self, scope, value), fields(namespace = ?scope.namespace()))]
    async fn add(&self, scope: &Scope, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<bool> {
        let key = self.codec.qualify(scope, key);
        if self.backend.exists(&key).await? {
            return Ok(false);
        }
        self.put_qualified(&key, value, force_serialize).await?;
        Ok(true)
    }

    #[instrument(skip(self, scope, value), fields(namespace = ?scope.namespace()))]
    async fn push(&self, scope: &Scope, key: &str, value: Value) -> KeystoneResult<()> {
        let key = self.codec.qualify(scope, key);
        match self.backend.key_type(&key).await? {
            None => return self.put_qualified(&key, value, false).await,
            Some(KeyType::List) => {
                if let Some(items) = value.into_elements() {
                    return self.backend.rpush(&key, &items).await;
                }
            }
            Some(KeyType::Hash) => {
                if let Some(fields) = value.into_fields() {
                    return self.backend.hset_multiple(&key, &fields).await;
                }
            }
            Some(KeyType::String) => match self.read_value(&key).await? {
                Some(Value::Hash(mut map)) => {
                    if let Some(fields) = value.into_fields() {
                        map.extend(fields);
                        return self.put_qualified(&key, Value::Hash(map), true).await;
                    }
                }
                Some(Value::List(mut items)) => {
                    if let Some(more) = value.into_elements() {
                        items.extend(more);
                        return self.put_qualified(&key, Value::List(items), true).await;
                    }
                }
                Some(Value::Object(mut properties)) => {
                    if let Some(more) = value.into_properties() {
                        properties.extend(more);
                        return self.put_qualified(&key, Value::Object(properties), true).await;
                    }
                }
                Some(Value::String(text)) => {
                    if let Some(suffix) = value.scalar_text() {
                        return self.put_qualified(&key, Value::String(text + &suffix), false).await;
                    }
                }
                Some(Value::Integer(_)) | None => {}
            },
            Some(KeyType::Set) | Some(KeyType::File) => {}
        }
        warn!(key = %key, "push does not apply to the stored representation, ignored");
        Ok(())
    }

    #[instrument(skip(self, scope), fields(namespace = ?scope.namespace()))]
    async fn increment(&self, scope: &Scope, key: &str, by: i64) -> KeystoneResult<Option<i64>> {
        let key = self.codec.qualify(scope, key);
        if self.backend.key_type(&key).await? != Some(KeyType::String) {
            return Ok(None);
        }
        let Some(raw) = self.backend.get(&key).await? else {
            return Ok(None);
        };
        if !is_integer_text(&raw) {
            debug!(key = %key, "increment skipped, value is not an integer");
            return Ok(None);
        }
        Ok(Some(self.backend.incr_by(&key, by).await?))
    }

    #[instrument(skip(self, scope), fields(namespace = ?scope.namespace()))]
    async fn forget(&self, scope: &Scope, key: &str, index: Option<&Index>) -> KeystoneResult<()> {
        let key = self.codec.qualify(scope, key);

        let Some(index) = index else {
            if self.codec.namespace_of(&key) == self.metadata.namespace() {
                warn!(key = %key, "refusing to forget a key in the metadata namespace");
                return Ok(());
            }
            self.forget_file(&key).await?;
            self.backend.del(&key).await?;
            return self.metadata.record_forget(&key).await;
        };

        let items = index.items();
        match self.backend.key_type(&key).await? {
            Some(KeyType::List) => {
                for item in &items {
                    self.backend.lrem(&key, 1, item).await?;
                }
                self.unindex_if_gone(&key).await
            }
            Some(KeyType::Hash) => {
                self.backend.hdel(&key, &items).await?;
                self.unindex_if_gone(&key).await
            }
            Some(KeyType::String) => match self.read_value(&key).await? {
                Some(Value::Hash(mut map)) => {
                    for item in &items {
                        map.remove(item);
                    }
                    self.put_qualified(&key, Value::Hash(map), true).await
                }
                Some(Value::List(mut list)) => {
                    for item in &items {
                        if let Some(pos) = list.iter().position(|x| x == item) {
                            list.remove(pos);
                        }
                    }
                    self.put_qualified(&key, Value::List(list), true).await
                }
                Some(Value::Object(mut properties)) => {
                    for item in &items {
                        properties.remove(item);
                    }
                    self.put_qualified(&key, Value::Object(properties), true).await
                }
                _ => {
                    debug!(key = %key, "indexed forget on a plain value, ignored");
                    Ok(())
                }
            },
            _ => Ok(()),
        }
    }

    async fn keys(&self, scope: &Scope, filter: &str) -> KeystoneResult<Vec<String>> {
        let full_pattern = self.codec.filter_pattern(scope, filter);
        let pattern = glob_regex(&full_pattern)?;
        let namespace = self.codec.namespace_of(&full_pattern);
        let candidates = if namespace.contains('*') {
            self.metadata.all_keys().await?
        } else {
            self.metadata.keys_in_namespace(&namespace).await?
        };
        let mut keys: Vec<String> = candidates
            .into_iter()
            .filter(|key| pattern.is_match(key))
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn values(
        &self,
        scope: &Scope,
        filter: &str,
        index: Option<&str>,
        value: Option<&str>,
    ) -> KeystoneResult<Selection> {
        let full_pattern = self.codec.filter_pattern(scope, filter);
        let pattern = glob_regex(&full_pattern)?;

        let mut results = BTreeMap::new();
        for key in self.keys(scope, filter).await? {
            let result = match (index, value) {
                (Some(field), Some(expected)) => self
                    .read_value(&key)
                    .await?
                    .filter(|record| record.field(field).as_deref() == Some(expected)),
                (Some(field), None) => self.pluck_qualified(&key, &Index::One(field.to_string())).await?,
                (None, _) => self.read_value(&key).await?,
            };
            let Some(result) = result else {
                continue;
            };

            if key == full_pattern {
                return Ok(Selection::One(result));
            }
            let label = pattern
                .captures(&key)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| key.clone());
            results.insert(label, result);
        }
        Ok(Selection::Many(results))
    }

    async fn namespaces(&self) -> KeystoneResult<Vec<String>> {
        self.metadata.namespaces().await
    }

    async fn stats(&self) -> KeystoneResult<KeystoneStats> {
        self.metadata.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_connection(max_redis_size: usize) -> (NativeConnection, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config = ConnectionConfig {
            driver: Driver::Memory,
            path: Some(temp_dir.path().to_path_buf()),
            max_redis_size,
            ..Default::default()
        };
        let conn = NativeConnection::with_backend(&config, Arc::new(MemoryBackend::new())).unwrap();
        (conn, temp_dir)
    }

    #[test]
    fn test_missing_path_is_config_error() {
        let config = ConnectionConfig {
            driver: Driver::Memory,
            ..Default::default()
        };
        assert!(NativeConnection::with_backend(&config, Arc::new(MemoryBackend::new())).is_err());
    }

    #[test]
    fn test_is_integer_text_matches_redis_format() {
        for raw in ["0", "5", "-5", "10", "9223372036854775807", "-9223372036854775808"] {
            assert!(is_integer_text(raw), "{} should be an integer", raw);
        }
        for raw in ["", "-", "+5", "05", "-05", "-0", "00", " 5", "5 ", "1.5", "9223372036854775808"] {
            assert!(!is_integer_text(raw), "{:?} should not be an integer", raw);
        }
    }

    #[test]
    fn test_pluck_fields_of_object() {
        let object = Value::from_json(json!({"a": "A", "n": [1, 2]}));
        assert_eq!(pluck_fields(object.clone(), &Index::from("a")), Some(Value::from("A")));
        assert_eq!(pluck_fields(object.clone(), &Index::from("missing")), None);
        match pluck_fields(object, &Index::from(vec!["a", "missing"])) {
            Some(Value::Object(map)) => {
                assert_eq!(map.len(), 1);
                assert_eq!(map.get("a"), Some(&json!("A")));
            }
            other => panic!("Expected object, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_overwrite_of_file_backed_key_reuses_file() {
        let (conn, _temp_dir) = create_test_connection(8);
        let root = Scope::root();

        conn.put(&root, "doc", Value::from("0123456789abcdef"), false).await.unwrap();
        let first = conn.file_info(&root, "doc").await.unwrap().unwrap();

        conn.put(&root, "doc", Value::from("fedcba9876543210"), false).await.unwrap();
        let second = conn.file_info(&root, "doc").await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(
            conn.get(&root, "doc", None).await.unwrap(),
            Some(Value::from("fedcba9876543210"))
        );
        // Still indexed as a file key after the overwrite
        assert_eq!(conn.stats().await.unwrap().file_keys, 1);
    }

    #[tokio::test]
    async fn test_shift_to_empty_unindexes_key() {
        let (conn, _temp_dir) = create_test_connection(64);
        let root = Scope::root();

        conn.put(&root, "queue", Value::from(vec!["only"]), false).await.unwrap();
        assert_eq!(conn.shift(&root, "queue").await.unwrap(), Some("only".to_string()));
        assert!(!conn.exists(&root, "queue", None).await.unwrap());
        assert!(conn.keys(&root, "*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_forget_skips_metadata_namespace() {
        let (conn, _temp_dir) = create_test_connection(64);
        let root = Scope::root();

        conn.put(&root, "k", Value::from("v"), false).await.unwrap();
        conn.forget(&root, "app/keystone::keys:all", None).await.unwrap();
        assert_eq!(conn.stats().await.unwrap().total_keys, 1);
    }

    #[tokio::test]
    async fn test_set_keys_read_back_sorted() {
        let (conn, _temp_dir) = create_test_connection(64);
        conn.put(&Scope::ns("x"), "k", Value::from("v"), false).await.unwrap();
        conn.put(&Scope::ns("a"), "k", Value::from("v"), false).await.unwrap();

        let namespaces = conn
            .get(&Scope::root(), "app/keystone::namespaces", None)
            .await
            .unwrap();
        assert_eq!(namespaces, Some(Value::from(vec!["a", "x"])));
        assert_eq!(
            conn.type_of(&Scope::root(), "app/keystone::namespaces").await.unwrap(),
            Some(KeyType::Set)
        );
    }
}
