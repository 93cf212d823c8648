//! Mount table and request routing.
//!
//! # Responsibilities
//! - Build one mount per configured entry, in declared order
//! - Construct each mount's driver or upstream, failing fast
//! - Look up the first mount whose path prefixes a request path
//!
//! # Design Decisions
//! - Immutable after construction (shared across requests without locks)
//! - O(n) scan in declared order: the first match wins, so narrower
//!   mounts must be declared before broader ones
//! - Explicit no-match rather than a silent default

use std::sync::Arc;

use serde_json::Value;
use tracing::Span;

use super::descriptor::{MountDescriptor, ProviderKind};
use super::matcher::MountPathMatcher;
use crate::config::validation::validate_mounts;
use crate::config::{ConfigError, GatewayConfig};
use crate::drivers::{build_driver, StorageDriver};
use crate::proxy::ProxyUpstream;

/// What serves a mount.
#[derive(Debug, Clone)]
pub enum MountTarget {
    Driver(Arc<dyn StorageDriver>),
    Proxy(ProxyUpstream),
}

/// One entry of the mount table.
#[derive(Debug, Clone)]
pub struct Mount {
    pub descriptor: MountDescriptor,
    pub matcher: MountPathMatcher,
    pub target: MountTarget,
    /// Parent span for everything done on behalf of this mount.
    pub span: Span,
}

impl Mount {
    pub fn new(descriptor: MountDescriptor, target: MountTarget) -> Self {
        let span = tracing::info_span!(
            "mount",
            mount = %descriptor.mount_path,
            provider = %descriptor.provider,
        );
        Self {
            matcher: MountPathMatcher::new(descriptor.mount_path.clone()),
            descriptor,
            target,
            span,
        }
    }

    /// Build the driver or upstream a descriptor names.
    pub fn from_descriptor(descriptor: MountDescriptor) -> Result<Self, ConfigError> {
        let target = match descriptor.provider {
            ProviderKind::Proxy => MountTarget::Proxy(ProxyUpstream::from_descriptor(&descriptor)?),
            _ => MountTarget::Driver(build_driver(&descriptor)?),
        };
        Ok(Self::new(descriptor, target))
    }

    pub fn provider(&self) -> &'static str {
        self.descriptor.provider.as_str()
    }
}

/// A routing decision.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    pub mount: &'a Mount,
    /// Request path below the mount, always starting with `/`.
    pub remainder: &'a str,
}

/// Ordered, immutable set of mounts.
#[derive(Debug, Default)]
pub struct MountTable {
    mounts: Vec<Mount>,
}

impl MountTable {
    /// Validate and build every configured mount.
    pub fn from_config(config: &GatewayConfig) -> Result<Self, ConfigError> {
        Self::from_entries(&config.mounts)
    }

    pub fn from_entries(entries: &[Value]) -> Result<Self, ConfigError> {
        validate_mounts(entries).map_err(ConfigError::Validation)?;

        let mut mounts = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(descriptor) = MountDescriptor::from_entry(entry)? {
                mounts.push(Mount::from_descriptor(descriptor)?);
            }
        }

        if mounts.is_empty() {
            tracing::warn!("No mounts configured, every request will return 404");
        }
        for mount in &mounts {
            tracing::info!(
                mount = %mount.descriptor.mount_path,
                provider = mount.provider(),
                "Mounted"
            );
        }
        Ok(Self { mounts })
    }

    pub fn from_mounts(mounts: Vec<Mount>) -> Self {
        Self { mounts }
    }

    /// First mount, in declared order, whose path prefixes `path`.
    pub fn route<'a>(&'a self, path: &'a str) -> Option<RouteMatch<'a>> {
        self.mounts.iter().find_map(|mount| {
            mount
                .matcher
                .strip(path)
                .map(|remainder| RouteMatch { mount, remainder })
        })
    }

    pub fn len(&self) -> usize {
        self.mounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mount> {
        self.mounts.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(entries: Value) -> MountTable {
        let entries = entries.as_array().cloned().unwrap_or_default();
        MountTable::from_entries(&entries).unwrap()
    }

    #[test]
    fn test_first_match_wins() {
        let table = table(json!([
            { "mount": "/static/special", "provider": "env", "var": "SPECIAL" },
            { "mount": "/static", "provider": "file", "basePath": "/tmp/static" },
            { "mount": "/", "provider": "file", "basePath": "/tmp/root" },
        ]));

        let hit = table.route("/static/special").unwrap();
        assert_eq!(hit.mount.provider(), "env");
        assert_eq!(hit.remainder, "/");

        let hit = table.route("/static/special-not/x").unwrap();
        assert_eq!(hit.mount.descriptor.mount_path, "/static");
        assert_eq!(hit.remainder, "/special-not/x");

        let hit = table.route("/other").unwrap();
        assert_eq!(hit.mount.descriptor.mount_path, "/");
        assert_eq!(hit.remainder, "/other");
    }

    #[test]
    fn test_broader_mount_shadows_later_narrower_one() {
        let table = table(json!([
            { "mount": "/static", "provider": "file", "basePath": "/tmp/static" },
            { "mount": "/static/special", "provider": "env", "var": "SPECIAL" },
        ]));
        let hit = table.route("/static/special").unwrap();
        assert_eq!(hit.mount.provider(), "file");
        assert_eq!(hit.remainder, "/special");
    }

    #[test]
    fn test_no_match() {
        let table = table(json!([
            { "mount": "/files", "provider": "file", "basePath": "/tmp" },
        ]));
        assert!(table.route("/filesystem").is_none());
        assert!(table.route("/").is_none());
    }

    #[test]
    fn test_blank_entries_skipped() {
        let table = table(json!([
            null,
            { "mount": "/a", "provider": "file", "basePath": "/tmp" },
            {},
            { "mount": "/b", "provider": "proxy", "host": "localhost:3000" },
        ]));
        assert_eq!(table.len(), 2);
        assert!(matches!(
            table.route("/b/x").unwrap().mount.target,
            MountTarget::Proxy(_)
        ));
    }

    #[test]
    fn test_invalid_entries_are_fatal() {
        let invalid = json!([{ "mount": "no-slash", "provider": "file" }]);
        assert!(matches!(
            MountTable::from_entries(invalid.as_array().unwrap()),
            Err(ConfigError::Validation(_))
        ));

        let missing_param = json!([{ "mount": "/k", "provider": "env" }]);
        assert!(matches!(
            MountTable::from_entries(missing_param.as_array().unwrap()),
            Err(ConfigError::MissingParameter { .. })
        ));

        let unknown = json!([{ "mount": "/k", "provider": "ftp" }]);
        assert!(matches!(
            MountTable::from_entries(unknown.as_array().unwrap()),
            Err(ConfigError::UnknownProvider { .. })
        ));
    }
}
