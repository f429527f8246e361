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

//! # PlexSpaces Keystone
//!
//! ## Purpose
//! Namespaced key/value storage layered on a Redis-compatible store, with
//! automatic overflow of large string payloads to the filesystem. Callers see
//! one logical key space partitioned by namespaces and a uniform value model
//! (strings, integers, lists, hashes and composite objects) regardless of
//! which physical backend holds the bytes.
//!
//! ## Architecture Context
//!
//! - **Key codec** ([`key`]): `<prefix><namespace>::<path>` qualification and globs
//! - **Value codec** ([`value`]): the JSON envelope for serialized values
//! - **Fast backend** ([`backend`]): Redis, or an in-process store with the same semantics
//! - **File backend** ([`file`]): overflow files under namespace directories
//! - **Metadata index** ([`metadata`]): membership sets used for listing
//! - **Connection** ([`NativeConnection`]): placement policy and value-shape dispatch
//! - **Manager** ([`KeystoneManager`]): named, lazily built connections
//!
//! ## Placement
//! Strings longer than `max_redis_size` bytes go to a file; the fast backend
//! keeps a small `{"file":"<name>"}` pointer under the key. Lists and hashes
//! are stored natively. Objects (and anything written with
//! [`Connection::serialize`]) are stored as a serialized envelope.
//!
//! ## Scoping
//! Every operation takes a [`Scope`]. `Scope::root()` resolves to the
//! configured root namespace; `Scope::ns("billing")` targets another one for
//! that single call. Keys that already contain `::` carry their own namespace.
//!
//! ## Examples
//! ```rust
//! use plexspaces_keystone::{Connection, ConnectionConfig, Driver, NativeConnection, Scope, Value};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig {
//!     driver: Driver::Memory,
//!     path: Some(std::env::temp_dir().join("keystone-doc")),
//!     ..Default::default()
//! };
//! let store = NativeConnection::connect(&config).await?;
//! let root = Scope::root();
//!
//! store.put(&root, "greeting", Value::from("hello"), false).await?;
//! assert_eq!(store.get(&root, "greeting", None).await?, Some(Value::from("hello")));
//!
//! store.put(&Scope::ns("billing"), "ids", Value::from(vec!["1", "2"]), false).await?;
//! assert_eq!(store.last(&root, "billing::ids").await?, Some("2".to_string()));
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//! ```bash
//! # Unit and integration tests (in-memory backend)
//! cargo test -p plexspaces-keystone
//!
//! # Include tests against a local Redis on db 15
//! cargo test -p plexspaces-keystone -- --ignored
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

use async_trait::async_trait;

pub mod backend;
pub mod config;
pub mod error;
pub mod file;
pub mod key;
pub mod manager;
pub mod metadata;
pub mod native;
pub mod value;

pub use config::{ConnectionConfig, Driver, KeystoneConfig};
pub use error::{KeystoneError, KeystoneResult};
pub use key::{KeyCodec, Scope};
pub use manager::KeystoneManager;
pub use native::NativeConnection;
pub use value::{Index, KeyType, PlacementRecord, Selection, Value};

/// Keystone operation contract.
///
/// ## Purpose
/// Implemented by [`NativeConnection`] and by [`KeystoneManager`], which
/// routes every call to its default connection.
///
/// ## Operations Grouped by Purpose
///
/// ### Reads
/// - `get()`, `pluck()`, `file_info()`, `exists()`, `type_of()`
///
/// ### List Helpers
/// - `first()`, `last()`, `shift()`, `pop()`, `range()`
///
/// ### Writes
/// - `put()`, `add()`, `serialize()`, `push()`, `increment()`, `forget()`
///
/// ### Listing
/// - `keys()`, `values()`, `namespaces()`, `stats()`
///
/// ## Failure Model
/// Missing keys, missing fields and operations that do not apply to a key's
/// representation yield `Ok(None)`, `Ok(false)` or a no-op. `Err` is reserved
/// for backend, filesystem and serialization failures.
#[async_trait]
pub trait Connection: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Get the whole value of `key`, or pluck `index` from it.
    ///
    /// ## Returns
    /// - list → [`Value::List`]; hash → [`Value::Hash`] (fields never decoded)
    /// - set → sorted [`Value::List`]
    /// - string → the decoded envelope, or the raw text
    /// - file-backed → the decoded file contents
    async fn get(&self, scope: &Scope, key: &str, index: Option<&Index>) -> KeystoneResult<Option<Value>>;

    /// Placement record of a file-backed key.
    async fn file_info(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<PlacementRecord>>;

    /// Extract named fields or list positions.
    ///
    /// ## Behavior
    /// - hash: field lookup
    /// - list: integer positions, negative counting from the tail
    /// - serialized hash/object: property lookup
    /// - [`Index::Many`] yields a mapping of the selectors that were present
    async fn pluck(&self, scope: &Scope, key: &str, index: &Index) -> KeystoneResult<Option<Value>>;

    /// Check existence of `key`, or of a field within it.
    ///
    /// With a field, only hashes and serialized hashes/objects can answer `true`.
    async fn exists(&self, scope: &Scope, key: &str, field: Option<&str>) -> KeystoneResult<bool>;

    /// Stored representation of `key`.
    async fn type_of(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<KeyType>>;

    // =========================================================================
    // List Helpers
    // =========================================================================

    /// First element of a list.
    async fn first(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>>;

    /// Last element of a list.
    async fn last(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>>;

    /// Remove and return the first element of a list.
    async fn shift(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>>;

    /// Remove and return the last element of a list.
    async fn pop(&self, scope: &Scope, key: &str) -> KeystoneResult<Option<String>>;

    /// Inclusive slice of a list; negative positions count from the tail.
    async fn range(&self, scope: &Scope, key: &str, start: i64, end: i64) -> KeystoneResult<Option<Vec<String>>>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store `value` under `key`, replacing whatever was there.
    ///
    /// ## Behavior
    /// - `force_serialize` or an object value → serialized envelope
    /// - text longer than `max_redis_size` bytes → file backend
    /// - list / hash → native list / hash (empty ones leave the key absent)
    async fn put(&self, scope: &Scope, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<()>;

    /// [`put`](Connection::put) only when `key` does not exist.
    ///
    /// ## Returns
    /// Whether the value was written.
    async fn add(&self, scope: &Scope, key: &str, value: Value, force_serialize: bool) -> KeystoneResult<bool>;

    /// Store `value` as a serialized envelope.
    async fn serialize(&self, scope: &Scope, key: &str, value: Value) -> KeystoneResult<()> {
        self.put(scope, key, value, true).await
    }

    /// Append to or merge into the existing value of `key`.
    ///
    /// ## Behavior
    /// - missing key → [`put`](Connection::put)
    /// - list → append element(s)
    /// - hash + hash/object → upsert fields
    /// - serialized hash/list/object → merge and re-serialize
    /// - plain string + scalar → concatenate
    /// - anything else → ignored
    async fn push(&self, scope: &Scope, key: &str, value: Value) -> KeystoneResult<()>;

    /// Add `by` to a native integer string.
    ///
    /// ## Returns
    /// The new value, or `None` (and no write) when the key is not an integer.
    async fn increment(&self, scope: &Scope, key: &str, by: i64) -> KeystoneResult<Option<i64>>;

    /// Delete `key`, or remove items from it.
    ///
    /// ## Behavior
    /// - without `index`: drop the file, the fast-backend entry and all index entries
    /// - list: remove the first occurrence of each value
    /// - hash: delete the fields
    /// - serialized hash/list/object: remove and re-serialize
    async fn forget(&self, scope: &Scope, key: &str, index: Option<&Index>) -> KeystoneResult<()>;

    // =========================================================================
    // Listing
    // =========================================================================

    /// Fully-qualified keys matching a `*` glob, sorted.
    ///
    /// A filter without `::` is placed under the scope's namespace.
    async fn keys(&self, scope: &Scope, filter: &str) -> KeystoneResult<Vec<String>>;

    /// Values of every key matching `filter`.
    ///
    /// ## Behavior
    /// - `index` and `value`: whole records whose `index` field equals `value`
    /// - `index` only: the plucked field of each record
    /// - otherwise: whole records
    ///
    /// ## Returns
    /// [`Selection::One`] when the filter names exactly one key, otherwise
    /// [`Selection::Many`] keyed by the first wildcard capture (or full key).
    async fn values(
        &self,
        scope: &Scope,
        filter: &str,
        index: Option<&str>,
        value: Option<&str>,
    ) -> KeystoneResult<Selection>;

    /// Every namespace ever written, sorted.
    async fn namespaces(&self) -> KeystoneResult<Vec<String>>;

    /// Index statistics.
    async fn stats(&self) -> KeystoneResult<KeystoneStats>;
}

/// Keystone index statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeystoneStats {
    /// Keys currently indexed
    pub total_keys: usize,
    /// Keys stored in the fast backend
    pub fast_keys: usize,
    /// Keys stored in the file backend
    pub file_keys: usize,
    /// Namespaces ever written
    pub namespaces: usize,
    /// Backend type (e.g., "Redis", "InMemory")
    pub backend_type: String,
}
