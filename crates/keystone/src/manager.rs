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

//! Keystone manager.
//!
//! ## Purpose
//! Resolves connection names to lazily built, memoized [`NativeConnection`]s.
//! The manager is itself a [`Connection`]: every call is routed to the
//! default connection.
//!
//! ## Usage
//! ```rust,no_run
//! use plexspaces_keystone::{Connection, KeystoneManager, Scope, Value};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let keystone = KeystoneManager::from_env()?;
//! keystone.put(&Scope::root(), "greeting", Value::from("hello"), false).await?;
//!
//! let reports = keystone.connection(Some("reports")).await?;
//! let total = reports.increment(&Scope::ns("billing"), "total", 5).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::KeystoneConfig;
use crate::{
    Connection, Index, KeyType, KeystoneResult, KeystoneStats, NativeConnection, PlacementRecord,
    Scope, Selection, Value,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Named connection registry.
pub struct KeystoneManager {
    config: KeystoneConfig,
    connections: Mutex<HashMap<String, Arc<NativeConnection>>>,
}

impl KeystoneManager {
    /// Create a manager; connections are built on first use.
    pub fn new(config: KeystoneConfig) -> Self {
        Self {
            config,
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Create a manager from `KEYSTONE_*` environment variables.
    pub fn from_env() -> KeystoneResult<Self> {
        Ok(Self::new(KeystoneConfig::from_env()?))
    }

    /// Name of the default connection.
    pub fn default_connection_name(&self) -> &str {
        &self.config.default
    }

    /// Manager configuration.
    pub fn config(&self) -> &KeystoneConfig {
        &self.config
    }

    /// Resolve a connection by name, or the default when `name` is `None`.
    ///
    /// Connections are built outside the registry lock, so a slow backend for
    /// one name never stalls resolution of another. When two callers race on
    /// the same name, the first insert wins and the other instance is dropped.
    ///
    /// ## Errors
    /// - [`KeystoneError::ConfigError`](crate::KeystoneError::ConfigError): Unknown name or
    ///   invalid connection settings
    /// - [`KeystoneError::BackendError`](crate::KeystoneError::BackendError): Redis unreachable
    pub async fn connection(&self, name: Option<&str>) -> KeystoneResult<Arc<NativeConnection>> {
        let name = name.unwrap_or(self.config.default.as_str());
        let settings = self.config.connection(name)?;

        if let Some(conn) = self.connections.lock().await.get(name) {
            return Ok(conn.clone());
        }

        let built = Arc::new(NativeConnection::connect(settings).await?);
        let mut connections = self.connections.lock().await;
        let conn = connections.entry(name.to_string()).or_insert_with(|| {
            info!(
                connection = %name,
                driver = %settings.driver,
                root_namespace = %settings.root_namespace,
                "Keystone connection created"
            );
            built
        });
        Ok(conn.clone())
    }

    async fn default_connection(&self) -> KeystoneResult<Arc<NativeConnection>> {
        self.connection(None).await
    }
}

#[async_trait]
impl Connection for KeystoneManager {
    async fn get(&self, scope: &Scope, key: &str, index: Option<&Index>) -> KeystoneResult<Option<Value>> {
        self.default_connection().await?.get(scope, key, index).await
    }

    async fn file_info(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<PlacementRecord>> {
        self.default_connection().await?.file_info(scope, key).await
    }

    async fn pluck(&self, scope: &Scope, key: &str, index: &Index) -> KeystoneResult<Option<Value>> {
        self.default_connection().await?.pluck(scope, key, index).await
    }

    async fn exists(&self, scope: &Scope, key: &str, field: Option<&str>) -> KeystoneResult<bool> {
        self.default_connection().await?.exists(scope, key, field).await
    }

    async fn type_of(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<KeyType>> {
        self.default_connection().await?.type_of(scope, key).await
    }

    async fn first(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        self.default_connection().await?.first(scope, key).await
    }

    async fn last(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        self.default_connection().await?.last(scope, key).await
    }

    async fn shift(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        self.default_connection().await?.shift(scope, key).await
    }

    async fn pop(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>> {
        self.default_connection().await?.pop(scope, key).await
    }

    async fn range(&self, scope: &Scope, key: &str, start: i64, end: i64) -> KeystoneResult<Option<Vec<String>>> {
        self.default_connection().await?.range(scope, key, start, end).await
    }

    async fn put(&self, scope: &Scope, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<()> {
        self.default_connection()
            .await?
            .put(scope, key, value, force_serialize)
            .await
    }

    async fn add(&self, scope: &Scope, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<bool> {
        self.default_connection()
            .await?
            .add(scope, key, value, force_serialize)
            .await
    }

    async fn push(&self, scope: &Scope, key: &str, value: Value) -> KeystoneResult<()> {
        self.default_connection().await?.push(scope, key, value).await
    }

    async fn increment(&self, scope: &Scope, key: &str, by: i64) -> KeystoneResult<Option<i64>> {
        self.default_connection().await?.increment(scope, key, by).await
    }

    async fn forget(&self, scope: &Scope, key: &str, index: Option<&Index>) -> KeystoneResult<()> {
        self.default_connection().await?.forget(scope, key, index).await
    }

    async fn keys(&self, scope: &Scope, filter: &str) -> KeystoneResult<Vec<String>> {
        self.default_connection().await?.keys(scope, filter).await
    }

    async fn values(
        &self,
        scope: &Scope,
        filter: &str,
        index: Option<&str>,
        value: Option<&str>,
    ) -> KeystoneResult<Selection> {
        self.default_connection()
            .await?
            .values(scope, filter, index, value)
            .await
    }

    async fn namespaces(&self) -> KeystoneResult<Vec<String>> {
        self.default_connection().await?.namespaces().await
    }

    async fn stats(&self) -> KeystoneResult<KeystoneStats> {
        self.default_connection().await?.stats().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConnectionConfig, Driver, KeystoneError};
    use tempfile::TempDir;

    fn memory_config(temp_dir: &TempDir) -> ConnectionConfig {
        ConnectionConfig {
            driver: Driver::Memory,
            path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_unknown_connection_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeystoneManager::new(KeystoneConfig::single("main", memory_config(&temp_dir)));

        match manager.connection(Some("missing")).await {
            Err(KeystoneError::ConfigError(msg)) => assert!(msg.contains("missing")),
            Err(e) => panic!("Expected ConfigError, got {:?}", e),
            Ok(_) => panic!("Expected ConfigError, got a connection"),
        }
    }

    #[tokio::test]
    async fn test_missing_path_fails_at_resolution() {
        let config = KeystoneConfig::single(
            "main",
            ConnectionConfig {
                driver: Driver::Memory,
                ..Default::default()
            },
        );
        let manager = KeystoneManager::new(config);
        assert!(matches!(
            manager.connection(None).await,
            Err(KeystoneError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_connections_are_memoized() {
        let temp_dir = TempDir::new().unwrap();
        let manager = KeystoneManager::new(KeystoneConfig::single("main", memory_config(&temp_dir)));

        let a = manager.connection(Some("main")).await.unwrap();
        let b = manager.connection(None).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(manager.default_connection_name(), "main");
    }
}
