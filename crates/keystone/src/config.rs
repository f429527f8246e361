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

//! Configuration for Keystone connections.
//!
//! ## Environment Variables
//!
//! ### Connection Selection
//! - `KEYSTONE_CONNECTION`: Name of the default connection (default: "default")
//! - `KEYSTONE_DRIVER`: Fast backend (default: "native")
//!   - "native" | "redis" → Redis + file backend
//!   - "memory" | "in-memory" → in-process store + file backend
//!
//! ### Redis
//! - `KEYSTONE_HOST` (default: "127.0.0.1"), `KEYSTONE_PORT` (default: 6379)
//! - `KEYSTONE_DATABASE` (default: 0), `KEYSTONE_PASSWORD` (optional)
//!
//! ### Keys and Storage
//! - `KEYSTONE_PREFIX`: Physical key prefix (default: "keystone:")
//! - `KEYSTONE_ROOT_NAMESPACE`: Namespace for unscoped calls (default: "app/foundation")
//! - `KEYSTONE_METADATA_NAMESPACE`: Namespace of the index sets (default: "app/keystone")
//! - `KEYSTONE_PATH`: Root directory of the file backend (required)
//! - `KEYSTONE_MAX_REDIS_SIZE`: Largest string kept in Redis, in bytes (default: 4096)
//!
//! ## YAML
//! ```yaml
//! default: main
//! connections:
//!   main:
//!     driver: native
//!     host: ${REDIS_HOST:-127.0.0.1}
//!     path: ${KEYSTONE_PATH}
//!   scratch:
//!     driver: memory
//!     path: /tmp/keystone-scratch
//! ```
//! `${VAR}` and `${VAR:-default}` are substituted from the environment before
//! parsing; an unset variable without a default is a configuration error.

use crate::{KeystoneError, KeystoneResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the default connection when none is configured.
pub const DEFAULT_CONNECTION: &str = "default";

/// Fast backend driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Driver {
    /// Redis fast backend (requires redis-backend feature)
    #[default]
    Native,
    /// In-process fast backend
    Memory,
}

impl FromStr for Driver {
    type Err = KeystoneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "native" | "redis" => Ok(Driver::Native),
            "memory" | "in-memory" => Ok(Driver::Memory),
            "http" => Err(KeystoneError::ConfigError(
                "The 'http' driver is not supported by this crate".to_string(),
            )),
            other => Err(KeystoneError::ConfigError(format!(
                "Unknown driver: '{}'. Valid options: native, memory",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Driver {
    type Error = KeystoneError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Driver> for String {
    fn from(driver: Driver) -> Self {
        driver.to_string()
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Driver::Native => f.write_str("native"),
            Driver::Memory => f.write_str("memory"),
        }
    }
}

/// Settings for one named connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Fast backend driver
    pub driver: Driver,
    /// Redis host
    pub host: String,
    /// Redis port
    pub port: u16,
    /// Redis database number
    pub database: u32,
    /// Redis password
    pub password: Option<String>,
    /// Prefix prepended to every physical key
    pub prefix: String,
    /// Namespace used when a call carries no explicit one
    pub root_namespace: String,
    /// Namespace holding the index sets
    pub metadata_namespace: String,
    /// Root directory of the file backend
    pub path: Option<PathBuf>,
    /// Strings longer than this many bytes overflow to files
    pub max_redis_size: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            driver: Driver::Native,
            host: "127.0.0.1".to_string(),
            port: 6379,
            database: 0,
            password: None,
            prefix: "keystone:".to_string(),
            root_namespace: "app/foundation".to_string(),
            metadata_namespace: "app/keystone".to_string(),
            path: None,
            max_redis_size: 4096,
        }
    }
}

impl ConnectionConfig {
    /// Create configuration from `KEYSTONE_*` environment variables.
    ///
    /// ## Examples
    /// ```rust
    /// use plexspaces_keystone::ConnectionConfig;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ConnectionConfig::from_env()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_env() -> KeystoneResult<Self> {
        let defaults = Self::default();

        let driver = match env::var("KEYSTONE_DRIVER") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.driver,
        };

        Ok(Self {
            driver,
            host: env::var("KEYSTONE_HOST").unwrap_or(defaults.host),
            port: env::var("KEYSTONE_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            database: env::var("KEYSTONE_DATABASE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.database),
            password: env::var("KEYSTONE_PASSWORD").ok().filter(|s| !s.is_empty()),
            prefix: env::var("KEYSTONE_PREFIX").unwrap_or(defaults.prefix),
            root_namespace: env::var("KEYSTONE_ROOT_NAMESPACE").unwrap_or(defaults.root_namespace),
            metadata_namespace: env::var("KEYSTONE_METADATA_NAMESPACE")
                .unwrap_or(defaults.metadata_namespace),
            path: env::var("KEYSTONE_PATH").ok().map(PathBuf::from),
            max_redis_size: env::var("KEYSTONE_MAX_REDIS_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_redis_size),
        })
    }

    /// Root directory of the file backend.
    ///
    /// ## Errors
    /// - [`KeystoneError::ConfigError`]: If no path is configured
    pub fn storage_path(&self) -> KeystoneResult<&Path> {
        self.path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| KeystoneError::ConfigError("Missing required field 'path'".to_string()))
    }

    /// Check required fields.
    pub fn validate(&self) -> KeystoneResult<()> {
        self.storage_path()?;
        if self.prefix.contains(crate::key::SEPARATOR) {
            return Err(KeystoneError::ConfigError(format!(
                "Prefix '{}' must not contain '{}'",
                self.prefix,
                crate::key::SEPARATOR
            )));
        }
        Ok(())
    }

    /// Redis URL (`redis://[:password@]host:port/database`).
    pub fn redis_url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

fn default_connection_name() -> String {
    DEFAULT_CONNECTION.to_string()
}

/// Manager configuration: named connections plus the default name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystoneConfig {
    /// Connection used for unqualified calls
    #[serde(default = "default_connection_name")]
    pub default: String,
    /// Connection settings by name
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

impl KeystoneConfig {
    /// Configuration with a single named connection, which is also the default.
    pub fn single(name: impl Into<String>, connection: ConnectionConfig) -> Self {
        let name = name.into();
        let mut connections = HashMap::new();
        connections.insert(name.clone(), connection);
        Self {
            default: name,
            connections,
        }
    }

    /// Create configuration from the environment: one connection named by
    /// `KEYSTONE_CONNECTION`, built from `KEYSTONE_*` variables.
    pub fn from_env() -> KeystoneResult<Self> {
        let name = env::var("KEYSTONE_CONNECTION").unwrap_or_else(|_| default_connection_name());
        Ok(Self::single(name, ConnectionConfig::from_env()?))
    }

    /// Parse YAML after environment substitution.
    pub fn from_yaml_str(content: &str) -> KeystoneResult<Self> {
        let expanded = substitute_env_vars(content)?;
        Ok(serde_yaml::from_str(&expanded)?)
    }

    /// Load YAML from a file.
    pub async fn load(path: impl AsRef<Path>) -> KeystoneResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            KeystoneError::ConfigError(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Settings of a named connection.
    ///
    /// ## Errors
    /// - [`KeystoneError::ConfigError`]: If the name is not configured
    pub fn connection(&self, name: &str) -> KeystoneResult<&ConnectionConfig> {
        self.connections.get(name).ok_or_else(|| {
            KeystoneError::ConfigError(format!("Keystone connection '{}' is not configured", name))
        })
    }
}

/// Replace `${VAR}` / `${VAR:-default}` with environment values.
fn substitute_env_vars(content: &str) -> KeystoneResult<String> {
    let re = Regex::new(r"\$\{([^}:]+)(?::-([^}]*))?\}")?;

    let mut result = String::with_capacity(content.len());
    let mut last = 0;
    for cap in re.captures_iter(content) {
        let (Some(whole), Some(name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };
        let value = match (env::var(name.as_str()), cap.get(2)) {
            (Ok(value), _) => value,
            (Err(_), Some(default)) => default.as_str().to_string(),
            (Err(_), None) => {
                return Err(KeystoneError::ConfigError(format!(
                    "Environment variable '{}' is not set and no default provided",
                    name.as_str()
                )))
            }
        };
        result.push_str(&content[last..whole.start()]);
        result.push_str(&value);
        last = whole.end();
    }
    result.push_str(&content[last..]);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 11] = [
        "KEYSTONE_CONNECTION",
        "KEYSTONE_DRIVER",
        "KEYSTONE_HOST",
        "KEYSTONE_PORT",
        "KEYSTONE_DATABASE",
        "KEYSTONE_PASSWORD",
        "KEYSTONE_PREFIX",
        "KEYSTONE_ROOT_NAMESPACE",
        "KEYSTONE_METADATA_NAMESPACE",
        "KEYSTONE_PATH",
        "KEYSTONE_MAX_REDIS_SIZE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = ConnectionConfig::from_env().unwrap();
        assert_eq!(config, ConnectionConfig::default());
        assert_eq!(config.redis_url(), "redis://127.0.0.1:6379/0");
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("KEYSTONE_DRIVER", "memory");
        env::set_var("KEYSTONE_HOST", "cache.internal");
        env::set_var("KEYSTONE_PORT", "6380");
        env::set_var("KEYSTONE_DATABASE", "3");
        env::set_var("KEYSTONE_PASSWORD", "s3cret");
        env::set_var("KEYSTONE_PATH", "/var/lib/keystone");
        env::set_var("KEYSTONE_MAX_REDIS_SIZE", "128");

        let config = ConnectionConfig::from_env().unwrap();
        assert_eq!(config.driver, Driver::Memory);
        assert_eq!(config.max_redis_size, 128);
        assert_eq!(config.redis_url(), "redis://:s3cret@cache.internal:6380/3");
        assert_eq!(config.storage_path().unwrap(), Path::new("/var/lib/keystone"));
        assert!(config.validate().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_unknown_driver() {
        clear_env();
        env::set_var("KEYSTONE_DRIVER", "http");
        assert!(matches!(ConnectionConfig::from_env(), Err(KeystoneError::ConfigError(_))));

        env::set_var("KEYSTONE_DRIVER", "carrier-pigeon");
        assert!(matches!(ConnectionConfig::from_env(), Err(KeystoneError::ConfigError(_))));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_manager_config_from_env() {
        clear_env();
        env::set_var("KEYSTONE_CONNECTION", "primary");
        let config = KeystoneConfig::from_env().unwrap();
        assert_eq!(config.default, "primary");
        assert!(config.connection("primary").is_ok());
        assert!(config.connection("default").is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_yaml_with_substitution() {
        clear_env();
        env::set_var("KEYSTONE_TEST_YAML_PATH", "/data/keystone");
        let yaml = r#"
default: main
connections:
  main:
    driver: native
    host: ${KEYSTONE_TEST_YAML_HOST:-redis.local}
    path: ${KEYSTONE_TEST_YAML_PATH}
  scratch:
    driver: memory
    path: /tmp/scratch
    max_redis_size: 16
"#;
        let config = KeystoneConfig::from_yaml_str(yaml).unwrap();
        env::remove_var("KEYSTONE_TEST_YAML_PATH");

        let main = config.connection("main").unwrap();
        assert_eq!(main.host, "redis.local");
        assert_eq!(main.path, Some(PathBuf::from("/data/keystone")));
        assert_eq!(main.port, 6379);

        let scratch = config.connection("scratch").unwrap();
        assert_eq!(scratch.driver, Driver::Memory);
        assert_eq!(scratch.max_redis_size, 16);
    }

    #[test]
    #[serial]
    fn test_yaml_missing_variable_is_error() {
        env::remove_var("KEYSTONE_TEST_YAML_UNSET");
        let yaml = "connections:\n  default:\n    path: ${KEYSTONE_TEST_YAML_UNSET}\n";
        assert!(matches!(
            KeystoneConfig::from_yaml_str(yaml),
            Err(KeystoneError::ConfigError(_))
        ));
    }

    #[test]
    fn test_yaml_http_driver_is_error() {
        let yaml = "connections:\n  remote:\n    driver: http\n    path: /tmp\n";
        assert!(matches!(
            KeystoneConfig::from_yaml_str(yaml),
            Err(KeystoneError::ConfigError(_))
        ));
    }

    #[test]
    fn test_yaml_default_name() {
        let config = KeystoneConfig::from_yaml_str("connections: {}\n").unwrap();
        assert_eq!(config.default, DEFAULT_CONNECTION);
        assert!(config.connections.is_empty());
    }
}
