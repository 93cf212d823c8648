//! Mount descriptors.
//!
//! A descriptor is the validated, typed form of one `mounts` entry:
//! where it is mounted, which provider serves it, and the remaining
//! provider-specific parameters.

use std::fmt;

use serde_json::{Map, Value};

use crate::config::validation::is_blank_entry;
use crate::config::ConfigError;

/// Backend kinds a mount can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// Local directory tree.
    File,
    /// A single environment variable.
    Env,
    /// S3-compatible object storage.
    S3Compatible,
    /// Azure blob storage, read-only.
    Azure,
    /// Google Cloud Storage, read-only.
    Google,
    /// Upstream HTTP server.
    Proxy,
}

impl ProviderKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "file" => Some(Self::File),
            "env" => Some(Self::Env),
            "s3compatible" => Some(Self::S3Compatible),
            "azure" => Some(Self::Azure),
            "google" => Some(Self::Google),
            "proxy" => Some(Self::Proxy),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Env => "env",
            Self::S3Compatible => "s3compatible",
            Self::Azure => "azure",
            Self::Google => "google",
            Self::Proxy => "proxy",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One configured mount.
#[derive(Debug, Clone, PartialEq)]
pub struct MountDescriptor {
    /// Normalised mount path (leading `/`, no trailing `/` except root).
    pub mount_path: String,
    pub provider: ProviderKind,
    /// Every entry key other than `mount` and `provider`.
    pub params: Map<String, Value>,
    pub is_proxy: bool,
}

impl MountDescriptor {
    pub fn new(mount_path: &str, provider: ProviderKind, params: Map<String, Value>) -> Self {
        Self {
            mount_path: normalize_mount_path(mount_path),
            provider,
            params,
            is_proxy: provider == ProviderKind::Proxy,
        }
    }

    /// Materialise a raw `mounts` entry. Blank entries yield `Ok(None)`.
    pub fn from_entry(entry: &Value) -> Result<Option<Self>, ConfigError> {
        if is_blank_entry(entry) {
            return Ok(None);
        }
        let Some(map) = entry.as_object() else {
            return Err(ConfigError::InvalidValue {
                key: "mounts".to_string(),
                message: format!("entry {entry} is not an object"),
            });
        };

        let mount = map.get("mount").and_then(Value::as_str).unwrap_or_default();
        let provider = map.get("provider").and_then(Value::as_str).unwrap_or_default();
        let kind = ProviderKind::parse(provider).ok_or_else(|| ConfigError::UnknownProvider {
            mount: mount.to_string(),
            provider: provider.to_string(),
        })?;

        let params = map
            .iter()
            .filter(|(key, _)| key.as_str() != "mount" && key.as_str() != "provider")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Ok(Some(Self::new(mount, kind, params)))
    }

    /// A string parameter that must be present and non-empty.
    pub fn required_str(&self, param: &'static str) -> Result<&str, ConfigError> {
        match self.optional_str(param)? {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::MissingParameter {
                mount: self.mount_path.clone(),
                provider: self.provider.to_string(),
                param,
            }),
        }
    }

    /// A string parameter that may be absent or `null`.
    pub fn optional_str(&self, param: &'static str) -> Result<Option<&str>, ConfigError> {
        match self.params.get(param) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(value)) => Ok(Some(value)),
            Some(other) => Err(self.invalid(param, format!("expected a string, found {other}"))),
        }
    }

    /// A boolean parameter, `false` when absent.
    pub fn flag(&self, param: &'static str) -> Result<bool, ConfigError> {
        match self.params.get(param) {
            None | Some(Value::Null) => Ok(false),
            Some(Value::Bool(value)) => Ok(*value),
            Some(other) => Err(self.invalid(param, format!("expected a boolean, found {other}"))),
        }
    }

    pub fn invalid(&self, param: &'static str, message: impl Into<String>) -> ConfigError {
        ConfigError::InvalidParameter {
            mount: self.mount_path.clone(),
            param,
            message: message.into(),
        }
    }
}

/// Ensure a leading `/` and strip trailing ones; the root stays `/`.
pub fn normalize_mount_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}
