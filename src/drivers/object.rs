//! Object storage providers: `s3compatible`, `azure` and `google`.
//!
//! ```json
//! {
//!   "mount": "/assets", "provider": "s3compatible",
//!   "endpoint": "http://minio:9000", "bucket": "assets",
//!   "accessKey": "...", "secretKey": "...", "basePath": "public"
//! }
//! { "mount": "/blobs", "provider": "azure",
//!   "storageAccount": "acct", "storageAccessKey": "...", "basePath": "container" }
//! { "mount": "/gcs", "provider": "google",
//!   "keyFilename": "/etc/stashbox/gcs.json", "basePath": "bucket" }
//! ```
//!
//! # Design Decisions
//! - The request path is normalised the same way as for `file` mounts
//!   to form the object key. For `s3compatible` it is joined onto
//!   `basePath`; for `azure` and `google`, `basePath` names the
//!   container or bucket
//! - `s3compatible` is read-only unless the mount sets `writable: true`;
//!   `azure` and `google` are always read-only
//! - The store is abstract over `ObjectStore`, so tests run against the
//!   in-memory implementation

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};

use super::sanitize::normalize_segments;
use super::{Capabilities, Capability, DriverError, ReadOutcome, StorageDriver};
use crate::config::ConfigError;
use crate::routing::descriptor::{MountDescriptor, ProviderKind};

#[derive(Debug, Clone)]
pub struct ObjectStoreDriver {
    kind: ProviderKind,
    store: Arc<dyn ObjectStore>,
    prefix: Vec<String>,
    capabilities: Capabilities,
}

impl ObjectStoreDriver {
    pub fn new(
        kind: ProviderKind,
        store: Arc<dyn ObjectStore>,
        base_path: Option<&str>,
        writable: bool,
    ) -> Self {
        let prefix = base_path
            .map(|p| normalize_segments(p).into_iter().map(str::to_string).collect())
            .unwrap_or_default();
        let mut capabilities = Capabilities::READ_ONLY.with(Capability::Exists);
        if writable {
            capabilities = capabilities
                .with(Capability::Write)
                .with(Capability::Delete);
        }
        Self {
            kind,
            store,
            prefix,
            capabilities,
        }
    }

    pub fn from_descriptor(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        match descriptor.provider {
            ProviderKind::Azure => Self::azure(descriptor),
            ProviderKind::Google => Self::google(descriptor),
            _ => Self::s3_compatible(descriptor),
        }
    }

    /// Requires `bucket`. `endpoint` without a scheme is taken as https.
    fn s3_compatible(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        let bucket = descriptor.required_str("bucket")?;
        let mut builder = AmazonS3Builder::new().with_bucket_name(bucket);

        if let Some(endpoint) = descriptor.optional_str("endpoint")? {
            let endpoint = if endpoint.contains("://") {
                endpoint.to_string()
            } else {
                format!("https://{endpoint}")
            };
            builder = builder
                .with_allow_http(endpoint.starts_with("http://"))
                .with_endpoint(endpoint);
        }
        if let Some(access_key) = descriptor.optional_str("accessKey")? {
            builder = builder.with_access_key_id(access_key);
        }
        if let Some(secret_key) = descriptor.optional_str("secretKey")? {
            builder = builder.with_secret_access_key(secret_key);
        }
        builder = builder.with_region(descriptor.optional_str("region")?.unwrap_or("us-east-1"));

        let store = builder
            .build()
            .map_err(|e| descriptor.invalid("endpoint", format!("failed to create S3 client: {e}")))?;

        let base_path = descriptor.optional_str("basePath")?;
        let writable = descriptor.flag("writable")?;
        tracing::info!(
            mount = %descriptor.mount_path,
            bucket,
            base_path = base_path.unwrap_or_default(),
            writable,
            "Using S3-compatible store"
        );
        Ok(Self::new(
            ProviderKind::S3Compatible,
            Arc::new(store),
            base_path,
            writable,
        ))
    }

    /// Requires `storageAccount` and `basePath` (the container).
    fn azure(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        let account = descriptor.required_str("storageAccount")?;
        let container = descriptor.required_str("basePath")?;
        let mut builder = MicrosoftAzureBuilder::new()
            .with_account(account)
            .with_container_name(container);
        if let Some(access_key) = descriptor.optional_str("storageAccessKey")? {
            builder = builder.with_access_key(access_key);
        }

        let store = builder.build().map_err(|e| {
            descriptor.invalid("storageAccessKey", format!("failed to create Azure client: {e}"))
        })?;

        tracing::info!(mount = %descriptor.mount_path, account, container, "Using Azure blob store");
        Ok(Self::new(ProviderKind::Azure, Arc::new(store), None, false))
    }

    /// Requires `basePath` (the bucket). `keyFilename` points at a
    /// service account key; without it ambient credentials are used.
    fn google(descriptor: &MountDescriptor) -> Result<Self, ConfigError> {
        let bucket = descriptor.required_str("basePath")?;
        let mut builder = GoogleCloudStorageBuilder::new().with_bucket_name(bucket);
        if let Some(key_file) = descriptor.optional_str("keyFilename")? {
            builder = builder.with_service_account_path(key_file);
        }

        let store = builder.build().map_err(|e| {
            descriptor.invalid("keyFilename", format!("failed to create GCS client: {e}"))
        })?;

        tracing::info!(mount = %descriptor.mount_path, bucket, "Using Google Cloud Storage");
        Ok(Self::new(ProviderKind::Google, Arc::new(store), None, false))
    }

    /// Object key for a request path. `None` when the path addresses no
    /// object (the bucket or prefix root).
    pub fn key(&self, path: &str) -> Option<ObjectPath> {
        let segments = normalize_segments(path);
        if segments.is_empty() {
            return None;
        }
        Some(ObjectPath::from_iter(
            self.prefix.iter().map(String::as_str).chain(segments),
        ))
    }
}

#[async_trait]
impl StorageDriver for ObjectStoreDriver {
    fn provider(&self) -> &str {
        self.kind.as_str()
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    async fn read(&self, path: &str) -> Result<ReadOutcome, DriverError> {
        let Some(key) = self.key(path) else {
            return Ok(ReadOutcome::NotFound);
        };
        let result = match self.store.get(&key).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => return Ok(ReadOutcome::NotFound),
            Err(e) => return Err(e.into()),
        };
        Ok(ReadOutcome::Content(result.bytes().await?))
    }

    async fn exists(&self, path: &str) -> Result<bool, DriverError> {
        let Some(key) = self.key(path) else {
            return Ok(false);
        };
        match self.store.head(&key).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, path: &str, body: Bytes) -> Result<(), DriverError> {
        if !self.capabilities.supports(Capability::Write) {
            return Err(self.unsupported(Capability::Write));
        }
        let key = self
            .key(path)
            .ok_or_else(|| DriverError::InvalidPath(path.to_string()))?;
        self.store.put(&key, PutPayload::from(body)).await?;
        tracing::debug!(key = %key, "Stored object");
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<(), DriverError> {
        if !self.capabilities.supports(Capability::Delete) {
            return Err(self.unsupported(Capability::Delete));
        }
        let key = self
            .key(path)
            .ok_or_else(|| DriverError::InvalidPath(path.to_string()))?;
        match self.store.delete(&key).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
