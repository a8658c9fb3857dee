use itertools::Itertools;
use std::fmt;
use std::fmt::{Display, Formatter};

/// The only separator understood inside an archive.
pub const SEPARATOR: char = '/';

/// A normalized, root-relative path. The segments never contain `.`, `..`, empty strings or
/// separators, so two canonical paths are equal exactly when they name the same node.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct CanonicalPath {
    segments: Vec<String>,
}

impl CanonicalPath {
    /// Returns the root path.
    pub fn root() -> Self {
        Self::default()
    }

    /// Normalizes `raw` into a canonical path. This never fails: repeated, leading and trailing
    /// separators are dropped, `.` is dropped and `..` removes the previously retained segment.
    ///
    /// A `..` with nothing left to remove is discarded, so paths are clamped at the root instead
    /// of escaping above it. Archives have no parent of their root, and callers rely on `"//..//"`
    /// naming the root.
    ///
    /// # Arguments
    /// `raw`: The caller-supplied path.
    ///
    /// # Example
    /// ```
    /// use container_fs::path::CanonicalPath;
    ///
    /// assert_eq!(CanonicalPath::normalize("a//b/../b/"), CanonicalPath::normalize("/a/b"));
    /// assert!(CanonicalPath::normalize("//..//").is_root());
    /// assert_eq!(CanonicalPath::normalize("./x/./y").to_string(), "x/y");
    /// ```
    pub fn normalize(raw: &str) -> Self {
        let mut segments: Vec<String> = Vec::new();
        for segment in raw.split(SEPARATOR) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                segment => segments.push(segment.to_owned()),
            }
        }

        Self { segments }
    }

    /// Returns true if this is the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in the path. The root has a depth of zero.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Returns the segments of the path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the last segment, or `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns the parent path, or `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Iterates over every strict ancestor of the path, nearest first, ending with the root.
    ///
    /// # Example
    /// ```
    /// use container_fs::path::CanonicalPath;
    ///
    /// itertools::assert_equal(
    ///     CanonicalPath::normalize("a/b/c").ancestors().map(|path| path.to_string()),
    ///     vec!["a/b", "a", ""],
    /// );
    /// ```
    pub fn ancestors(&self) -> impl Iterator<Item = CanonicalPath> + '_ {
        (0..self.segments.len()).rev().map(|len| Self {
            segments: self.segments[..len].to_vec(),
        })
    }

    /// Appends a path to this one.
    pub fn join(&self, other: &CanonicalPath) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .chain(other.segments.iter())
                .cloned()
                .collect(),
        }
    }

    /// Resolves a raw caller-supplied path relative to this one. A raw path can only move back up
    /// to this path, never above it.
    ///
    /// # Arguments
    /// `raw`: The caller-supplied path.
    pub fn resolve(&self, raw: &str) -> Self {
        self.join(&Self::normalize(raw))
    }

    /// Returns a child path with one extra segment.
    pub(crate) fn child(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_owned());
        Self { segments }
    }

    /// Returns true if `base` is this path or one of its ancestors.
    pub fn starts_with(&self, base: &CanonicalPath) -> bool {
        self.segments.starts_with(&base.segments)
    }

    /// Returns this path relative to `base`, or `None` if `base` is not an ancestor of (or equal
    /// to) this path.
    pub fn strip_prefix(&self, base: &CanonicalPath) -> Option<Self> {
        self.segments
            .strip_prefix(base.segments.as_slice())
            .map(|segments| Self {
                segments: segments.to_vec(),
            })
    }
}

impl Display for CanonicalPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.iter().join("/"))
    }
}

impl From<&str> for CanonicalPath {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}
