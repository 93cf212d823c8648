//! Path containment for directory-backed mounts.
//!
//! # Responsibilities
//! - Collapse `.` and `..` segments of a request path
//! - Drop any `..` that would climb above the mount base
//! - Join the result onto the base using the host's separator
//!
//! # Design Decisions
//! - Purely lexical: symlinks inside the base are not resolved
//! - Escape attempts collapse to the base instead of failing
//! - Both `/` and `\` separate segments, so a backslash can never smuggle
//!   a traversal past the normaliser on any platform

use std::path::{Component, Path, PathBuf};

/// Normalise a request path into safe relative segments.
///
/// `..` pops the previous segment; at the top it is discarded. Segments
/// that are not a single plain file name on this platform (for example a
/// drive prefix) are dropped as well.
pub fn normalize_segments(path: &str) -> Vec<&str> {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other if is_plain_name(other) => segments.push(other),
            _ => {}
        }
    }
    segments
}

/// Resolve `request_path` under `base`, never leaving it.
pub fn sanitize(base: &Path, request_path: &str) -> PathBuf {
    let mut resolved = base.to_path_buf();
    for segment in normalize_segments(request_path) {
        resolved.push(segment);
    }
    resolved
}

fn is_plain_name(segment: &str) -> bool {
    let mut components = Path::new(segment).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
