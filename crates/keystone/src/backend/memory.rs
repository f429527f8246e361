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

//! In-memory fast backend.
//!
//! ## Purpose
//! Provides a HashMap-based stand-in for Redis for testing and single-process
//! scenarios. Command semantics (negative indices, inclusive ranges, empty
//! collections vanishing, WRONGTYPE failures) mirror Redis.
//!
//! ## Limitations
//! - Not persistent (data lost on restart)
//! - Not shared between processes

use super::FastBackend;
use crate::{KeyType, KeystoneError, KeystoneResult};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Entry in the in-memory store.
#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    List(VecDeque<String>),
    Hash(BTreeMap<String, String>),
    Set(BTreeSet<String>),
}

impl Entry {
    fn key_type(&self) -> KeyType {
        match self {
            Entry::Str(_) => KeyType::String,
            Entry::List(_) => KeyType::List,
            Entry::Hash(_) => KeyType::Hash,
            Entry::Set(_) => KeyType::Set,
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Entry::Str(_) => false,
            Entry::List(items) => items.is_empty(),
            Entry::Hash(fields) => fields.is_empty(),
            Entry::Set(members) => members.is_empty(),
        }
    }
}

fn wrong_type(key: &str) -> KeystoneError {
    KeystoneError::BackendError(format!(
        "WRONGTYPE Operation against a key holding the wrong kind of value: {}",
        key
    ))
}

/// Resolve a possibly negative index against `len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let resolved = if index < 0 { len + index } else { index };
    if resolved < 0 || resolved >= len {
        None
    } else {
        Some(resolved as usize)
    }
}

/// In-memory fast backend.
///
/// ## Example
/// ```rust
/// use plexspaces_keystone::backend::{FastBackend, MemoryBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let backend = MemoryBackend::new();
/// backend.rpush("list", &["a".to_string(), "b".to_string()]).await?;
/// assert_eq!(backend.lindex("list", -1).await?, Some("b".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryBackend {
    data: Arc<RwLock<HashMap<String, Entry>>>,
}

impl MemoryBackend {
    /// Create an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pop from the head (`front = true`) or tail of a list.
    async fn pop(&self, key: &str, front: bool) -> KeystoneResult<Option<String>> {
        let mut data = self.data.write().await;
        let popped = match data.get_mut(key) {
            None => return Ok(None),
            Some(Entry::List(items)) => {
                if front {
                    items.pop_front()
                } else {
                    items.pop_back()
                }
            }
            Some(_) => return Err(wrong_type(key)),
        };
        Self::drop_if_empty(&mut data, key);
        Ok(popped)
    }

    fn drop_if_empty(data: &mut HashMap<String, Entry>, key: &str) {
        if data.get(key).is_some_and(Entry::is_empty) {
            data.remove(key);
        }
    }
}

#[async_trait]
impl FastBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "InMemory"
    }

    async fn key_type(&self, key: &str) -> KeystoneResult<Option<KeyType>> {
        let data = self.data.read().await;
        Ok(data.get(key).map(Entry::key_type))
    }

    async fn exists(&self, key: &str) -> KeystoneResult<bool> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }

    async fn del(&self, key: &str) -> KeystoneResult<()> {
        let mut data = self.data.write().await;
        data.remove(key);
        Ok(())
    }

    async fn get(&self, key: &str) -> KeystoneResult<Option<String>> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(None),
            Some(Entry::Str(value)) => Ok(Some(value.clone())),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> KeystoneResult<()> {
        let mut data = self.data.write().await;
        data.insert(key.to_string(), Entry::Str(value.to_string()));
        Ok(())
    }

    async fn incr_by(&self, key: &str, by: i64) -> KeystoneResult<i64> {
        let mut data = self.data.write().await;
        let current = match data.get(key) {
            None => 0,
            Some(Entry::Str(value)) => value.parse::<i64>().map_err(|_| {
                KeystoneError::InvalidValue(format!("value is not an integer: {}", key))
            })?,
            Some(_) => return Err(wrong_type(key)),
        };
        let next = current.checked_add(by).ok_or_else(|| {
            KeystoneError::InvalidValue(format!("increment would overflow: {}", key))
        })?;
        data.insert(key.to_string(), Entry::Str(next.to_string()));
        Ok(next)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> KeystoneResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Entry::List(VecDeque::new()))
        {
            Entry::List(items) => {
                items.extend(values.iter().cloned());
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KeystoneResult<Vec<String>> {
        let data = self.data.read().await;
        let items = match data.get(key) {
            None => return Ok(Vec::new()),
            Some(Entry::List(items)) => items,
            Some(_) => return Err(wrong_type(key)),
        };

        let len = items.len() as i64;
        let start = if start < 0 { (len + start).max(0) } else { start };
        let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
        if start > stop || start >= len {
            return Ok(Vec::new());
        }
        Ok(items
            .iter()
            .skip(start as usize)
            .take((stop - start + 1) as usize)
            .cloned()
            .collect())
    }

    async fn lindex(&self, key: &str, index: i64) -> KeystoneResult<Option<String>> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(None),
            Some(Entry::List(items)) => {
                Ok(resolve_index(index, items.len()).and_then(|i| items.get(i).cloned()))
            }
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn lpop(&self, key: &str) -> KeystoneResult<Option<String>> {
        self.pop(key, true).await
    }

    async fn rpop(&self, key: &str) -> KeystoneResult<Option<String>> {
        self.pop(key, false).await
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> KeystoneResult<()> {
        let mut data = self.data.write().await;
        let items = match data.get_mut(key) {
            None => return Ok(()),
            Some(Entry::List(items)) => items,
            Some(_) => return Err(wrong_type(key)),
        };

        let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() as usize };
        let mut removed = 0;
        if count >= 0 {
            let mut i = 0;
            while i < items.len() && removed < limit {
                if items[i] == value {
                    items.remove(i);
                    removed += 1;
                } else {
                    i += 1;
                }
            }
        } else {
            let mut i = items.len();
            while i > 0 && removed < limit {
                i -= 1;
                if items[i] == value {
                    items.remove(i);
                    removed += 1;
                }
            }
        }
        Self::drop_if_empty(&mut data, key);
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> KeystoneResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(BTreeMap::new()))
        {
            Entry::Hash(map) => {
                map.extend(fields.iter().cloned());
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn hget(&self, key: &str, field: &str) -> KeystoneResult<Option<String>> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(None),
            Some(Entry::Hash(map)) => Ok(map.get(field).cloned()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hgetall(&self, key: &str) -> KeystoneResult<BTreeMap<String, String>> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(BTreeMap::new()),
            Some(Entry::Hash(map)) => Ok(map.clone()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> KeystoneResult<()> {
        let mut data = self.data.write().await;
        match data.get_mut(key) {
            None => return Ok(()),
            Some(Entry::Hash(map)) => {
                for field in fields {
                    map.remove(field);
                }
            }
            Some(_) => return Err(wrong_type(key)),
        }
        Self::drop_if_empty(&mut data, key);
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> KeystoneResult<bool> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(false),
            Some(Entry::Hash(map)) => Ok(map.contains_key(field)),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn sadd(&self, key: &str, member: &str) -> KeystoneResult<()> {
        let mut data = self.data.write().await;
        match data
            .entry(key.to_string())
            .or_insert_with(|| Entry::Set(BTreeSet::new()))
        {
            Entry::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            _ => Err(wrong_type(key)),
        }
    }

    async fn srem(&self, key: &str, member: &str) -> KeystoneResult<()> {
        let mut data = self.data.write().await;
        match data.get_mut(key) {
            None => return Ok(()),
            Some(Entry::Set(members)) => {
                members.remove(member);
            }
            Some(_) => return Err(wrong_type(key)),
        }
        Self::drop_if_empty(&mut data, key);
        Ok(())
    }

    async fn smembers(&self, key: &str) -> KeystoneResult<Vec<String>> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(Vec::new()),
            Some(Entry::Set(members)) => Ok(members.iter().cloned().collect()),
            Some(_) => Err(wrong_type(key)),
        }
    }

    async fn scard(&self, key: &str) -> KeystoneResult<usize> {
        let data = self.data.read().await;
        match data.get(key) {
            None => Ok(0),
            Some(Entry::Set(members)) => Ok(members.len()),
            Some(_) => Err(wrong_type(key)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_set_replaces_any_type() {
        let backend = MemoryBackend::new();
        backend.rpush("k", &strings(&["a"])).await.unwrap();
        backend.set("k", "v").await.unwrap();
        assert_eq!(backend.key_type("k").await.unwrap(), Some(KeyType::String));
        assert_eq!(backend.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_lrange_negative_indices() {
        let backend = MemoryBackend::new();
        backend.rpush("l", &strings(&["1", "2", "3", "4", "5"])).await.unwrap();

        assert_eq!(backend.lrange("l", 0, -1).await.unwrap().len(), 5);
        assert_eq!(backend.lrange("l", -2, -1).await.unwrap(), strings(&["4", "5"]));
        assert_eq!(backend.lrange("l", 1, 100).await.unwrap(), strings(&["2", "3", "4", "5"]));
        assert_eq!(backend.lrange("l", -100, 0).await.unwrap(), strings(&["1"]));
        assert!(backend.lrange("l", 3, 1).await.unwrap().is_empty());
        assert!(backend.lrange("l", 7, 9).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lindex_and_pops() {
        let backend = MemoryBackend::new();
        backend.rpush("l", &strings(&["a", "b", "c"])).await.unwrap();

        assert_eq!(backend.lindex("l", -1).await.unwrap(), Some("c".to_string()));
        assert_eq!(backend.lindex("l", 3).await.unwrap(), None);
        assert_eq!(backend.lpop("l").await.unwrap(), Some("a".to_string()));
        assert_eq!(backend.rpop("l").await.unwrap(), Some("c".to_string()));
        assert_eq!(backend.rpop("l").await.unwrap(), Some("b".to_string()));
        assert!(!backend.exists("l").await.unwrap());
    }

    #[tokio::test]
    async fn test_lrem_directions() {
        let backend = MemoryBackend::new();
        backend.rpush("l", &strings(&["x", "a", "x", "b", "x"])).await.unwrap();

        backend.lrem("l", 1, "x").await.unwrap();
        assert_eq!(backend.lrange("l", 0, -1).await.unwrap(), strings(&["a", "x", "b", "x"]));

        backend.lrem("l", -1, "x").await.unwrap();
        assert_eq!(backend.lrange("l", 0, -1).await.unwrap(), strings(&["a", "x", "b"]));

        backend.lrem("l", 0, "x").await.unwrap();
        assert_eq!(backend.lrange("l", 0, -1).await.unwrap(), strings(&["a", "b"]));
    }

    #[tokio::test]
    async fn test_incr_by() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.incr_by("n", 5).await.unwrap(), 5);
        assert_eq!(backend.incr_by("n", -2).await.unwrap(), 3);

        backend.set("s", "abc").await.unwrap();
        assert!(backend.incr_by("s", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_type_is_an_error() {
        let backend = MemoryBackend::new();
        backend.set("s", "v").await.unwrap();
        assert!(backend.hget("s", "f").await.is_err());
        assert!(backend.rpush("s", &strings(&["a"])).await.is_err());
    }

    #[tokio::test]
    async fn test_hash_and_set_vanish_when_empty() {
        let backend = MemoryBackend::new();
        backend
            .hset_multiple("h", &[("a".to_string(), "1".to_string())])
            .await
            .unwrap();
        backend.hdel("h", &strings(&["a"])).await.unwrap();
        assert!(!backend.exists("h").await.unwrap());

        backend.sadd("s", "m").await.unwrap();
        assert_eq!(backend.scard("s").await.unwrap(), 1);
        backend.srem("s", "m").await.unwrap();
        assert!(!backend.exists("s").await.unwrap());
    }
}
