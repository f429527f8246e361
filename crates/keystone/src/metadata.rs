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

//! Metadata index.
//!
//! ## Purpose
//! Keeps Keystone's own membership sets so listing never relies on the
//! backend's KEYS/SCAN primitives. All sets live under the metadata namespace:
//!
//! | set                   | members                          |
//! |-----------------------|----------------------------------|
//! | `keys:all`            | every live key                   |
//! | `namespaces`          | every namespace ever written     |
//! | `keys:ns:<namespace>` | live keys of one namespace       |
//! | `keys:redis`          | keys stored in the fast backend  |
//! | `keys:file`           | keys stored in the file backend  |

use crate::backend::FastBackend;
use crate::key::{namespace_of, SEPARATOR};
use crate::{KeystoneResult, KeystoneStats};
use std::sync::Arc;
use tracing::debug;

/// Membership sets describing every stored key.
#[derive(Clone)]
pub struct Metadata {
    backend: Arc<dyn FastBackend>,
    prefix: String,
    namespace: String,
}

impl Metadata {
    /// Create an index stored under `prefix` + `namespace`.
    pub fn new(backend: Arc<dyn FastBackend>, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
            namespace: namespace.into(),
        }
    }

    /// Metadata namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn set_key(&self, name: &str) -> String {
        format!("{}{}{}{}", self.prefix, self.namespace, SEPARATOR, name)
    }

    fn all_key(&self) -> String {
        self.set_key("keys:all")
    }

    fn namespaces_key(&self) -> String {
        self.set_key("namespaces")
    }

    fn namespace_key(&self, namespace: &str) -> String {
        self.set_key(&format!("keys:ns:{}", namespace))
    }

    fn redis_key(&self) -> String {
        self.set_key("keys:redis")
    }

    fn file_key(&self) -> String {
        self.set_key("keys:file")
    }

    /// Record a placement of `key`.
    pub async fn record_write(&self, key: &str, in_fast_backend: bool) -> KeystoneResult<()> {
        let namespace = namespace_of(key, &self.prefix);
        debug!(key = %key, namespace = %namespace, in_fast_backend, "indexing key");

        self.backend.sadd(&self.all_key(), key).await?;
        self.backend.sadd(&self.namespaces_key(), &namespace).await?;
        self.backend.sadd(&self.namespace_key(&namespace), key).await?;
        if in_fast_backend {
            self.backend.sadd(&self.redis_key(), key).await?;
        } else {
            self.backend.sadd(&self.file_key(), key).await?;
        }
        Ok(())
    }

    /// Drop `key` from every key set (no-op when untracked).
    pub async fn record_forget(&self, key: &str) -> KeystoneResult<()> {
        let namespace = namespace_of(key, &self.prefix);
        debug!(key = %key, "unindexing key");

        self.backend.srem(&self.all_key(), key).await?;
        self.backend.srem(&self.namespace_key(&namespace), key).await?;
        self.backend.srem(&self.redis_key(), key).await?;
        self.backend.srem(&self.file_key(), key).await?;
        Ok(())
    }

    /// Every indexed key.
    pub async fn all_keys(&self) -> KeystoneResult<Vec<String>> {
        self.backend.smembers(&self.all_key()).await
    }

    /// Indexed keys of one namespace.
    pub async fn keys_in_namespace(&self, namespace: &str) -> KeystoneResult<Vec<String>> {
        self.backend.smembers(&self.namespace_key(namespace)).await
    }

    /// Every namespace ever written, sorted.
    pub async fn namespaces(&self) -> KeystoneResult<Vec<String>> {
        let mut namespaces = self.backend.smembers(&self.namespaces_key()).await?;
        namespaces.sort();
        Ok(namespaces)
    }

    /// Set cardinalities.
    pub async fn stats(&self) -> KeystoneResult<KeystoneStats> {
        Ok(KeystoneStats {
            total_keys: self.backend.scard(&self.all_key()).await?,
            fast_keys: self.backend.scard(&self.redis_key()).await?,
            file_keys: self.backend.scard(&self.file_key()).await?,
            namespaces: self.backend.scard(&self.namespaces_key()).await?,
            backend_type: self.backend.name().to_string(),
        })
    }
}
