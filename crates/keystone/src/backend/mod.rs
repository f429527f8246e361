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

//! Fast backend abstraction.
//!
//! ## Purpose
//! The subset of Redis commands Keystone relies on, expressed as a trait so the
//! connection can run against a live Redis server or an in-process store with
//! the same semantics.
//!
//! ## Semantics
//! Implementations follow Redis behavior: list indices may be negative and
//! count from the tail, ranges are inclusive, emptied lists/hashes/sets
//! disappear, and commands against a key of the wrong type fail with
//! [`KeystoneError::BackendError`](crate::KeystoneError::BackendError).

use crate::{KeyType, KeystoneResult};
use async_trait::async_trait;
use std::collections::BTreeMap;

pub mod memory;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use memory::MemoryBackend;

#[cfg(feature = "redis-backend")]
pub use self::redis::RedisBackend;

/// Redis-compatible command surface used by the connection.
#[async_trait]
pub trait FastBackend: Send + Sync {
    /// Backend name for statistics (e.g., "Redis", "InMemory").
    fn name(&self) -> &'static str;

    /// Native type of `key` (never [`KeyType::File`]); `None` when absent.
    async fn key_type(&self, key: &str) -> KeystoneResult<Option<KeyType>>;

    /// Whether `key` exists.
    async fn exists(&self, key: &str) -> KeystoneResult<bool>;

    /// Delete `key` regardless of type.
    async fn del(&self, key: &str) -> KeystoneResult<()>;

    /// String value of `key`.
    async fn get(&self, key: &str) -> KeystoneResult<Option<String>>;

    /// Set a string value, replacing any value of any type.
    async fn set(&self, key: &str, value: &str) -> KeystoneResult<()>;

    /// Add `by` to the integer stored at `key`, returning the new value.
    async fn incr_by(&self, key: &str, by: i64) -> KeystoneResult<i64>;

    /// Append values to the tail of a list.
    async fn rpush(&self, key: &str, values: &[String]) -> KeystoneResult<()>;

    /// Inclusive range of list elements.
    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KeystoneResult<Vec<String>>;

    /// List element at `index`.
    async fn lindex(&self, key: &str, index: i64) -> KeystoneResult<Option<String>>;

    /// Remove and return the head of a list.
    async fn lpop(&self, key: &str) -> KeystoneResult<Option<String>>;

    /// Remove and return the tail of a list.
    async fn rpop(&self, key: &str) -> KeystoneResult<Option<String>>;

    /// Remove up to `count` occurrences of `value` (from the head when positive,
    /// from the tail when negative, all when zero).
    async fn lrem(&self, key: &str, count: i64, value: &str) -> KeystoneResult<()>;

    /// Set several hash fields.
    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> KeystoneResult<()>;

    /// Value of a hash field.
    async fn hget(&self, key: &str, field: &str) -> KeystoneResult<Option<String>>;

    /// All fields of a hash.
    async fn hgetall(&self, key: &str) -> KeystoneResult<BTreeMap<String, String>>;

    /// Delete hash fields.
    async fn hdel(&self, key: &str, fields: &[String]) -> KeystoneResult<()>;

    /// Whether a hash field exists.
    async fn hexists(&self, key: &str, field: &str) -> KeystoneResult<bool>;

    /// Add a set member.
    async fn sadd(&self, key: &str, member: &str) -> KeystoneResult<()>;

    /// Remove a set member.
    async fn srem(&self, key: &str, member: &str) -> KeystoneResult<()>;

    /// All set members.
    async fn smembers(&self, key: &str) -> KeystoneResult<Vec<String>>;

    /// Set cardinality.
    async fn scard(&self, key: &str) -> KeystoneResult<usize>;
}
