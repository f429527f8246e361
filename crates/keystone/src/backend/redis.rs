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

//! Redis fast backend.
//!
//! ## Purpose
//! Issues Keystone's command surface against a Redis server.
//!
//! ## Architecture
//! - Uses `redis` crate with async ConnectionManager
//! - ConnectionManager handles reconnection; each call clones the handle
//! - Errors are reported with the failing command name and never retried
//!
//! ## Usage
//! ```rust,no_run
//! use plexspaces_keystone::backend::{FastBackend, RedisBackend};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = RedisBackend::new("redis://127.0.0.1:6379/0").await?;
//! backend.set("keystone:app::greeting", "hello").await?;
//! # Ok(())
//! # }
//! ```

use super::FastBackend;
use crate::{KeyType, KeystoneError, KeystoneResult};
use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};
use std::collections::BTreeMap;

fn command_failed(command: &'static str) -> impl Fn(RedisError) -> KeystoneError {
    move |e| KeystoneError::BackendError(format!("Redis {} failed: {}", command, e))
}

/// Redis-based fast backend.
#[derive(Clone)]
pub struct RedisBackend {
    /// Redis connection manager (async, reconnecting)
    manager: ConnectionManager,
}

impl RedisBackend {
    /// Connect to Redis.
    ///
    /// ## Arguments
    /// * `url` - Redis connection URL (e.g., "redis://:secret@localhost:6379/0")
    ///
    /// ## Errors
    /// - [`KeystoneError::BackendError`]: If the URL is invalid or Redis is unreachable
    pub async fn new(url: &str) -> KeystoneResult<Self> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl FastBackend for RedisBackend {
    fn name(&self) -> &'static str {
        "Redis"
    }

    async fn key_type(&self, key: &str) -> KeystoneResult<Option<KeyType>> {
        let mut conn = self.manager.clone();
        let kind: String = conn.key_type(key).await.map_err(command_failed("TYPE"))?;
        Ok(match kind.as_str() {
            "string" => Some(KeyType::String),
            "list" => Some(KeyType::List),
            "hash" => Some(KeyType::Hash),
            "set" => Some(KeyType::Set),
            _ => None,
        })
    }

    async fn exists(&self, key: &str) -> KeystoneResult<bool> {
        let mut conn = self.manager.clone();
        let exists: bool = conn.exists(key).await.map_err(command_failed("EXISTS"))?;
        Ok(exists)
    }

    async fn del(&self, key: &str) -> KeystoneResult<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(key).await.map_err(command_failed("DEL"))?;
        Ok(())
    }

    async fn get(&self, key: &str) -> KeystoneResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.get(key).await.map_err(command_failed("GET"))?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> KeystoneResult<()> {
        let mut conn = self.manager.clone();
        conn.set::<_, _, ()>(key, value)
            .await
            .map_err(command_failed("SET"))?;
        Ok(())
    }

    async fn incr_by(&self, key: &str, by: i64) -> KeystoneResult<i64> {
        let mut conn = self.manager.clone();
        let value: i64 = conn.incr(key, by).await.map_err(command_failed("INCRBY"))?;
        Ok(value)
    }

    async fn rpush(&self, key: &str, values: &[String]) -> KeystoneResult<()> {
        if values.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        conn.rpush::<_, _, ()>(key, values)
            .await
            .map_err(command_failed("RPUSH"))?;
        Ok(())
    }

    async fn lrange(&self, key: &str, start: i64, stop: i64) -> KeystoneResult<Vec<String>> {
        let mut conn = self.manager.clone();
        let items: Vec<String> = conn
            .lrange(key, start as isize, stop as isize)
            .await
            .map_err(command_failed("LRANGE"))?;
        Ok(items)
    }

    async fn lindex(&self, key: &str, index: i64) -> KeystoneResult<Option<String>> {
        let mut conn = self.manager.clone();
        let item: Option<String> = conn
            .lindex(key, index as isize)
            .await
            .map_err(command_failed("LINDEX"))?;
        Ok(item)
    }

    async fn lpop(&self, key: &str) -> KeystoneResult<Option<String>> {
        let mut conn = self.manager.clone();
        let item: Option<String> = conn.lpop(key, None).await.map_err(command_failed("LPOP"))?;
        Ok(item)
    }

    async fn rpop(&self, key: &str) -> KeystoneResult<Option<String>> {
        let mut conn = self.manager.clone();
        let item: Option<String> = conn.rpop(key, None).await.map_err(command_failed("RPOP"))?;
        Ok(item)
    }

    async fn lrem(&self, key: &str, count: i64, value: &str) -> KeystoneResult<()> {
        let mut conn = self.manager.clone();
        conn.lrem::<_, _, ()>(key, count as isize, value)
            .await
            .map_err(command_failed("LREM"))?;
        Ok(())
    }

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)]) -> KeystoneResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        conn.hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(command_failed("HSET"))?;
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> KeystoneResult<Option<String>> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn.hget(key, field).await.map_err(command_failed("HGET"))?;
        Ok(value)
    }

    async fn hgetall(&self, key: &str) -> KeystoneResult<BTreeMap<String, String>> {
        let mut conn = self.manager.clone();
        let fields: BTreeMap<String, String> =
            conn.hgetall(key).await.map_err(command_failed("HGETALL"))?;
        Ok(fields)
    }

    async fn hdel(&self, key: &str, fields: &[String]) -> KeystoneResult<()> {
        if fields.is_empty() {
            return Ok(());
        }
        let mut conn = self.manager.clone();
        conn.hdel::<_, _, ()>(key, fields)
            .await
            .map_err(command_failed("HDEL"))?;
        Ok(())
    }

    async fn hexists(&self, key: &str, field: &str) -> KeystoneResult<bool> {
        let mut conn = self.manager.clone();
        let exists: bool = conn
            .hexists(key, field)
            .await
            .map_err(command_failed("HEXISTS"))?;
        Ok(exists)
    }

    async fn sadd(&self, key: &str, member: &str) -> KeystoneResult<()> {
        let mut conn = self.manager.clone();
        conn.sadd::<_, _, ()>(key, member)
            .await
            .map_err(command_failed("SADD"))?;
        Ok(())
    }

    async fn srem(&self, key: &str, member: &str) -> KeystoneResult<()> {
        let mut conn = self.manager.clone();
        conn.srem::<_, _, ()>(key, member)
            .await
            .map_err(command_failed("SREM"))?;
        Ok(())
    }

    async fn smembers(&self, key: &str) -> KeystoneResult<Vec<String>> {
        let mut conn = self.manager.clone();
        let members: Vec<String> = conn.smembers(key).await.map_err(command_failed("SMEMBERS"))?;
        Ok(members)
    }

    async fn scard(&self, key: &str) -> KeystoneResult<usize> {
        let mut conn = self.manager.clone();
        let count: usize = conn.scard(key).await.map_err(command_failed("SCARD"))?;
        Ok(count)
    }
}

// ============================================================================
// TESTS (require a running Redis instance)
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    async fn create_test_backend() -> RedisBackend {
        RedisBackend::new("redis://localhost:6379/15")
            .await
            .expect("Failed to connect to Redis (ensure Redis is running)")
    }

    #[tokio::test]
    #[ignore] // Requires running Redis instance
    async fn test_type_reporting() {
        let backend = create_test_backend().await;

        backend.set("keystone-test:type:s", "v").await.unwrap();
        backend
            .rpush("keystone-test:type:l", &["a".to_string()])
            .await
            .unwrap();

        assert_eq!(backend.key_type("keystone-test:type:s").await.unwrap(), Some(KeyType::String));
        assert_eq!(backend.key_type("keystone-test:type:l").await.unwrap(), Some(KeyType::List));
        assert_eq!(backend.key_type("keystone-test:type:none").await.unwrap(), None);

        // Cleanup
        backend.del("keystone-test:type:s").await.unwrap();
        backend.del("keystone-test:type:l").await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_list_commands() {
        let backend = create_test_backend().await;
        let key = "keystone-test:list";
        backend.del(key).await.unwrap();

        let items: Vec<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        backend.rpush(key, &items).await.unwrap();
        assert_eq!(backend.lrange(key, -2, -1).await.unwrap(), vec!["2", "3"]);
        assert_eq!(backend.lpop(key).await.unwrap(), Some("1".to_string()));
        assert_eq!(backend.rpop(key).await.unwrap(), Some("3".to_string()));

        // Cleanup
        backend.del(key).await.unwrap();
    }
}
