//! Asset path normalization
//!
//! Request paths are mapped into the asset tree by prefixing them with the
//! asset root name and cleaning the result. The request path is cleaned as a
//! rooted path first, so `..` segments can never climb above the root.

use std::fmt;

/// A normalized, slash-separated path identifying an asset in a source
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetPath(String);

impl AssetPath {
    /// Join a request URL path onto the asset root name
    ///
    /// Empty and `.` segments are dropped, `..` removes the previous segment
    /// but never a segment belonging to the root.
    pub fn join(root: &str, url_path: &str) -> Self {
        let mut segments: Vec<&str> = Vec::new();
        push_segments(&mut segments, root, 0);

        let floor = segments.len();
        push_segments(&mut segments, url_path, floor);

        if segments.is_empty() {
            Self(".".to_string())
        } else {
            Self(segments.join("/"))
        }
    }

    /// The cleaned form of a root name on its own
    pub fn root(name: &str) -> Self {
        Self::join(name, "/")
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Strip a mount point from the front of this path
    ///
    /// Returns `Some("")` when the path is the mount itself and `None` when
    /// the path lies outside of it.
    pub fn strip_mount(&self, mount: &AssetPath) -> Option<&str> {
        if mount.0 == "." {
            return Some(if self.0 == "." { "" } else { &self.0 });
        }
        if self.0 == mount.0 {
            return Some("");
        }
        self.0.strip_prefix(mount.0.as_str())?.strip_prefix('/')
    }

    /// Iterate over the path segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty() && *s != ".")
    }
}

fn push_segments<'a>(segments: &mut Vec<&'a str>, path: &'a str, floor: usize) {
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.len() > floor {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }
}

impl fmt::Display for AssetPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AssetPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
