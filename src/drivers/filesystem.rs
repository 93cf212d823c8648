//! Provider `file`: a REST view of a directory tree.
//!
//! ```json
//! { "mount": "/", "provider": "file", "basePath": "stash" }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;

use super::sanitize::sanitize;
use super::{Capabilities, DirEntry, DriverError, ReadOutcome, StorageDriver};
use crate::config::ConfigError;
use crate::routing::descriptor::MountDescriptor;

/// Serves files below a base directory.
#[derive(Debug, Clone)]
pub struct FilesystemDriver {
    base_path: PathBuf,
}

impl FilesystemDriver {
    pub const PROVIDER: &'static str = "file";

    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Requires `basePath`.
    pub fn from_descriptor(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        let base_path = descriptor.required_str("basePath")?;
        tracing::info!(mount = %descriptor.mount_path, base_path, "Using file store");
        Ok(Self::new(base_path))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Sanitised location of a request path.
    pub fn resolve(&self, path: &str) -> PathBuf {
        sanitize(&self.base_path, path)
    }
}

#[async_trait]
impl StorageDriver for FilesystemDriver {
    fn provider(&self) -> &str {
        Self::PROVIDER
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    async fn read(&self, path: &str) -> Result<ReadOutcome, DriverError> {
        let target = self.resolve(path);

        let metadata = match tokio::fs::metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => return Ok(ReadOutcome::NotFound),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            let listing = tokio::task::spawn_blocking(move || list_tree(&target))
                .await
                .map_err(io::Error::other)??;
            return Ok(ReadOutcome::Listing(listing));
        }

        match tokio::fs::read(&target).await {
            Ok(content) => Ok(ReadOutcome::Content(Bytes::from(content))),
            Err(e) if is_missing(&e) => Ok(ReadOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, DriverError> {
        match tokio::fs::metadata(self.resolve(path)).await {
            Ok(_) => Ok(true),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, body: Bytes) -> Result<(), DriverError> {
        let target = self.resolve(path);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&target, &body).await?;
        tracing::debug!(path = %target.display(), bytes = body.len(), "Wrote file");
        Ok(())
    }

    /// Removes a file or a whole directory tree. Missing paths succeed.
    async fn delete(&self, path: &str) -> Result<(), DriverError> {
        let target = self.resolve(path);
        if target == self.base_path {
            return Err(DriverError::BaseDirectory);
        }

        let metadata = match tokio::fs::symlink_metadata(&target).await {
            Ok(metadata) => metadata,
            Err(e) if is_missing(&e) => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            tokio::fs::remove_dir_all(&target).await?;
        } else {
            tokio::fs::remove_file(&target).await?;
        }
        tracing::debug!(path = %target.display(), "Deleted");
        Ok(())
    }
}

/// A path below a regular file fails with `NotADirectory`; it names
/// nothing, same as a missing path.
fn is_missing(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Recursive listing, sorted by name. Symlinks are listed as files and
/// not followed.
fn list_tree(dir: &Path) -> io::Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_dir() {
            let objects = list_tree(&entry.path())?;
            entries.push(DirEntry::Directory { name, objects });
        } else {
            entries.push(DirEntry::File { name });
        }
    }
    entries.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(entries)
}
