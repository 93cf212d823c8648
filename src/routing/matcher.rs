//! Mount path matching.
//!
//! # Responsibilities
//! - Decide whether a request path falls under a mount path
//! - Strip the mount prefix, leaving the backend-relative remainder
//!
//! # Design Decisions
//! - Prefixes match on whole path segments: `/foo` matches `/foo` and
//!   `/foo/bar`, never `/foobar`
//! - Matching is case-sensitive
//! - No regex, plain string comparison

/// Segment-aware prefix matcher for one mount path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountPathMatcher {
    prefix: String,
}

impl MountPathMatcher {
    /// Create a matcher for an already-normalised mount path.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns true if `path` equals the prefix or continues it with `/`.
    pub fn matches(&self, path: &str) -> bool {
        if self.prefix == "/" {
            return true;
        }
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The part of `path` below the mount, always starting with `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        if !self.matches(path) {
            return None;
        }
        let rest = if self.prefix == "/" {
            path
        } else {
            &path[self.prefix.len()..]
        };
        Some(if rest.is_empty() { "/" } else { rest })
    }
}
