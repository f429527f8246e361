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

//! Key qualification and namespace scoping.
//!
//! ## Wire Format
//! Every physical key has the shape `<prefix><namespace>::<path>`, e.g.
//! `keystone:app/foundation::config:timeout`. This textual scheme is part of
//! the persisted-data compatibility surface and must round-trip unchanged.
//!
//! ## Scoping
//! Callers pass a [`Scope`] with every operation. A scope either names a
//! namespace or falls back to the connection's root namespace; it is a plain
//! value, so nothing leaks into the next call.

use crate::KeystoneResult;
use regex::Regex;
use tracing::trace;

/// Separator between namespace and path.
pub const SEPARATOR: &str = "::";

/// Per-call namespace selection.
///
/// ## Examples
/// ```rust
/// use plexspaces_keystone::Scope;
///
/// let root = Scope::root();
/// assert_eq!(root.namespace(), None);
///
/// let scoped = Scope::ns("billing/invoices");
/// assert_eq!(scoped.namespace(), Some("billing/invoices"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Scope {
    namespace: Option<String>,
}

impl Scope {
    /// Scope that resolves to the connection's root namespace.
    pub fn root() -> Self {
        Self::default()
    }

    /// Scope bound to an explicit namespace.
    pub fn ns(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    /// Explicit namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

/// Qualify `key` into its physical form.
///
/// A key that already contains [`SEPARATOR`] is treated as namespace-scoped.
/// The prefix is prepended only when missing, so qualifying twice is a no-op.
pub fn qualify(key: &str, namespace: &str, prefix: &str) -> String {
    let scoped = if key.contains(SEPARATOR) {
        key.to_string()
    } else {
        format!("{}{}{}", namespace, SEPARATOR, key)
    };

    if scoped.starts_with(prefix) {
        scoped
    } else {
        format!("{}{}", prefix, scoped)
    }
}

/// Namespace portion of a qualified key.
///
/// Keys without a separator yield the whole prefix-stripped key.
pub fn namespace_of(key: &str, prefix: &str) -> String {
    let unprefixed = key.strip_prefix(prefix).unwrap_or(key);
    match unprefixed.find(SEPARATOR) {
        Some(pos) => unprefixed[..pos].to_string(),
        None => unprefixed.to_string(),
    }
}

/// Compile a `*` glob into an anchored regular expression.
///
/// Every `*` becomes a capture group `(.*)`; all other characters match
/// literally.
pub fn glob_regex(pattern: &str) -> KeystoneResult<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join("(.*)");
    Ok(Regex::new(&format!("^{}$", body))?)
}

/// Key qualification bound to one connection's prefix and root namespace.
#[derive(Clone, Debug)]
pub struct KeyCodec {
    prefix: String,
    root_namespace: String,
}

impl KeyCodec {
    /// Create a codec for `prefix` and `root_namespace`.
    pub fn new(prefix: impl Into<String>, root_namespace: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            root_namespace: root_namespace.into(),
        }
    }

    /// Namespace a scope resolves to.
    pub fn resolve<'a>(&'a self, scope: &'a Scope) -> &'a str {
        scope.namespace().unwrap_or(&self.root_namespace)
    }

    /// Qualify `key` under `scope`.
    pub fn qualify(&self, scope: &Scope, key: &str) -> String {
        let qualified = qualify(key, self.resolve(scope), &self.prefix);
        trace!(key = %key, qualified = %qualified, "qualified key");
        qualified
    }

    /// Namespace of an already-qualified key.
    pub fn namespace_of(&self, key: &str) -> String {
        namespace_of(key, &self.prefix)
    }

    /// Fully-qualified pattern text for a key filter.
    ///
    /// Filters naming a namespace (`ns::path*`) only receive the prefix;
    /// bare filters are placed under the scope's namespace.
    pub fn filter_pattern(&self, scope: &Scope, filter: &str) -> String {
        if filter.contains(SEPARATOR) {
            qualify(filter, self.resolve(scope), &self.prefix)
        } else {
            format!("{}{}{}{}", self.prefix, self.resolve(scope), SEPARATOR, filter)
        }
    }
}
