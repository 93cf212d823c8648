//! Storage driver subsystem.
//!
//! # Data Flow
//! ```text
//! MountDescriptor (startup)
//!     → build_driver() validates params, constructs one driver per mount
//!     → Arc<dyn StorageDriver> held by the mount table for the process lifetime
//!
//! Per request:
//!     dispatcher checks capabilities()
//!     → read / exists / write / delete
//!     → ReadOutcome or DriverError
//! ```
//!
//! # Design Decisions
//! - Capabilities are declared up front: a driver states what it
//!   supports and the dispatcher checks before calling
//! - `read` is mandatory; the other operations default to `Unsupported`
//! - Construction validates parameters synchronously and fails fast
//! - Drivers are shared across concurrent requests and hold no
//!   per-request state

pub mod environment;
pub mod filesystem;
pub mod object;
pub mod sanitize;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::routing::descriptor::{MountDescriptor, ProviderKind};

pub use environment::EnvironmentDriver;
pub use filesystem::FilesystemDriver;
pub use object::ObjectStoreDriver;

/// An operation a driver may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    Read,
    Exists,
    Write,
    Delete,
}

impl Capability {
    /// The capability an HTTP method maps to, if any.
    pub fn for_method(method: &Method) -> Option<Self> {
        if method == Method::GET {
            Some(Self::Read)
        } else if method == Method::HEAD {
            Some(Self::Exists)
        } else if method == Method::PUT {
            Some(Self::Write)
        } else if method == Method::DELETE {
            Some(Self::Delete)
        } else {
            None
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Exists => "exists",
            Self::Write => "write",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The optional operations a driver supports. Read is always supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    exists: bool,
    write: bool,
    delete: bool,
}

impl Capabilities {
    pub const READ_ONLY: Self = Self {
        exists: false,
        write: false,
        delete: false,
    };

    pub const ALL: Self = Self {
        exists: true,
        write: true,
        delete: true,
    };

    /// Add one capability.
    pub const fn with(mut self, capability: Capability) -> Self {
        match capability {
            Capability::Read => {}
            Capability::Exists => self.exists = true,
            Capability::Write => self.write = true,
            Capability::Delete => self.delete = true,
        }
        self
    }

    pub const fn supports(&self, capability: Capability) -> bool {
        match capability {
            Capability::Read => true,
            Capability::Exists => self.exists,
            Capability::Write => self.write,
            Capability::Delete => self.delete,
        }
    }
}

/// One entry of a recursive directory listing.
///
/// Serialises as `{ "type": "file", "name": ... }` or
/// `{ "type": "directory", "name": ..., "objects": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DirEntry {
    File { name: String },
    Directory { name: String, objects: Vec<DirEntry> },
}

impl DirEntry {
    pub fn name(&self) -> &str {
        match self {
            DirEntry::File { name } | DirEntry::Directory { name, .. } => name,
        }
    }
}

/// Result of a successful `read`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Nothing stored at the path. Not an error.
    NotFound,
    /// Raw content.
    Content(Bytes),
    /// Hierarchical backends: the tree below a directory.
    Listing(Vec<DirEntry>),
}

/// Backend failures. Detail stays in local diagnostics.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("'{provider}' driver does not support {capability}")]
    Unsupported {
        provider: String,
        capability: Capability,
    },

    #[error("stored value could not be decoded: {0}")]
    Decode(String),

    #[error("path '{0}' does not address an object")]
    InvalidPath(String),

    #[error("refusing to delete the mount base directory")]
    BaseDirectory,
}

/// Adapter between the gateway and one storage backend.
#[async_trait]
pub trait StorageDriver: Send + Sync + fmt::Debug {
    /// Provider name, for diagnostics.
    fn provider(&self) -> &str;

    /// Optional operations this driver implements.
    fn capabilities(&self) -> Capabilities {
        Capabilities::READ_ONLY
    }

    /// Fetch content, a listing, or report not-found.
    async fn read(&self, path: &str) -> Result<ReadOutcome, DriverError>;

    async fn exists(&self, _path: &str) -> Result<bool, DriverError> {
        Err(self.unsupported(Capability::Exists))
    }

    async fn write(&self, _path: &str, _body: Bytes) -> Result<(), DriverError> {
        Err(self.unsupported(Capability::Write))
    }

    async fn delete(&self, _path: &str) -> Result<(), DriverError> {
        Err(self.unsupported(Capability::Delete))
    }

    fn unsupported(&self, capability: Capability) -> DriverError {
        DriverError::Unsupported {
            provider: self.provider().to_string(),
            capability,
        }
    }
}

/// Construct the driver a descriptor names.
///
/// Proxy descriptors have no driver and are rejected here.
pub fn build_driver(descriptor: &MountDescriptor) -> Result<Arc<dyn StorageDriver>, ConfigError> {
    let driver: Arc<dyn StorageDriver> = match descriptor.provider {
        ProviderKind::File => Arc::new(FilesystemDriver::from_descriptor(descriptor)?),
        ProviderKind::Env => Arc::new(EnvironmentDriver::from_descriptor(descriptor)?),
        ProviderKind::S3Compatible | ProviderKind::Azure | ProviderKind::Google => {
            Arc::new(ObjectStoreDriver::from_descriptor(descriptor)?)
        }
        ProviderKind::Proxy => {
            return Err(descriptor.invalid("provider", "proxy mounts do not use a storage driver"))
        }
    };
    Ok(driver)
}
