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

//! Error types for Keystone operations.
//!
//! Missing keys, missing fields and wrong-type operations are not errors in
//! Keystone: they surface as `Ok(None)` / `Ok(false)`. The variants below are
//! reserved for configuration mistakes and resource failures.

use thiserror::Error;

/// Result type for Keystone operations.
pub type KeystoneResult<T> = Result<T, KeystoneError>;

/// Errors that can occur during Keystone operations.
#[derive(Error, Debug)]
pub enum KeystoneError {
    /// Configuration error (unknown connection, missing field, unknown driver)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Fast backend error (connection refused, command failure, wrong type)
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Invalid value format
    #[error("Invalid value format: {0}")]
    InvalidValue(String),

    /// Key filter could not be compiled into a pattern
    #[error("Invalid key pattern: {0}")]
    InvalidPattern(String),

    /// IO error from the file backend
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl From<serde_json::Error> for KeystoneError {
    fn from(err: serde_json::Error) -> Self {
        KeystoneError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for KeystoneError {
    fn from(err: serde_yaml::Error) -> Self {
        KeystoneError::ConfigError(format!("Failed to parse YAML: {}", err))
    }
}

impl From<regex::Error> for KeystoneError {
    fn from(err: regex::Error) -> Self {
        KeystoneError::InvalidPattern(err.to_string())
    }
}

#[cfg(feature = "redis-backend")]
impl From<redis::RedisError> for KeystoneError {
    fn from(err: redis::RedisError) -> Self {
        KeystoneError::BackendError(format!("Redis error: {}", err))
    }
}
