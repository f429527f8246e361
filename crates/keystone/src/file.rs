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

//! File backend for oversized string payloads.
//!
//! ## Path Structure
//! `{root}/{namespace}/{file}` where `namespace` is split on `/` into nested
//! directories and `file` is a generated ULID. Directories are created on
//! first write.
//!
//! ## Limitations
//! - Writes are neither fsynced nor locked
//! - Concurrent writers to the same key may race

use crate::KeystoneResult;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;
use ulid::Ulid;

/// Filesystem store rooted at a configured directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Generate a fresh opaque file name.
    pub fn generate_name() -> String {
        Ulid::new().to_string()
    }

    /// Directory holding files for `namespace`.
    ///
    /// Empty, `.` and `..` segments are dropped so a namespace cannot escape the root.
    pub fn dir_for(&self, namespace: &str) -> PathBuf {
        namespace
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    /// Full path of `file` under `namespace`.
    pub fn path_for(&self, namespace: &str, file: &str) -> PathBuf {
        self.dir_for(namespace).join(file)
    }

    /// Write `contents`, creating the namespace directory when needed.
    pub async fn write(&self, namespace: &str, file: &str, contents: &[u8]) -> KeystoneResult<()> {
        let dir = self.dir_for(namespace);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(file);
        debug!(path = %path.display(), bytes = contents.len(), "writing overflow file");
        tokio::fs::write(&path, contents).await?;
        Ok(())
    }

    /// Read a file; `None` when it does not exist.
    pub async fn read(&self, namespace: &str, file: &str) -> KeystoneResult<Option<String>> {
        let path = self.path_for(namespace, file);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a file, tolerating absence.
    pub async fn delete(&self, namespace: &str, file: &str) -> KeystoneResult<()> {
        let path = self.path_for(namespace, file);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed overflow file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
