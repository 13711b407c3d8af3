// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Tree positions: structured paths and their canonical string keys.
//!
//! A [`TracePath`] is the sequence of child indices from the component tree
//! root down to a node. Snapshots and the source/sink indices key their maps
//! by the canonical joined form, [`PathKey`]; ancestor/descendant tests run
//! on the segment slices so that sibling indices like `1` and `11` can never
//! collide the way a raw string-prefix comparison would make them.

/// Delimiter used when rendering a path to its canonical key form.
pub const PATH_DELIMITER: char = '.';

/// Position of a node in the component tree.
///
/// The empty path denotes the tree root. Paths are compared structurally:
/// `[0, 1]` is an ancestor of `[0, 1, 3]` and unrelated to `[0, 11]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TracePath(Vec<u32>);

impl TracePath {
    /// Constructs a path from child indices, root first.
    #[must_use]
    pub fn new(segments: Vec<u32>) -> Self {
        Self(segments)
    }

    /// The root path (empty segment sequence).
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns the child-index segments, root first.
    #[must_use]
    pub fn segments(&self) -> &[u32] {
        &self.0
    }

    /// Renders the canonical delimiter-joined key for this path.
    ///
    /// `[0, 1, 3]` renders as `"0.1.3"`; the root path renders as `""`.
    #[must_use]
    pub fn key(&self) -> PathKey {
        use core::fmt::Write as _;

        let mut out = String::new();
        for (i, seg) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(PATH_DELIMITER);
            }
            // Writing into a String cannot fail.
            let _ = write!(out, "{seg}");
        }
        PathKey(out)
    }

    /// Returns true if `self` is an ancestor of `other` or equal to it.
    ///
    /// Equality counts: a structural message at a path supersedes the exact
    /// node as well as everything below it. The comparison is on segments,
    /// never on the joined string.
    #[must_use]
    pub fn is_ancestor_or_equal(&self, other: &Self) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl From<&[u32]> for TracePath {
    fn from(segments: &[u32]) -> Self {
        Self(segments.to_vec())
    }
}

/// Canonical string form of a tree position, used as a map key.
///
/// Produced only by [`TracePath::key`]; two live nodes in the same snapshot
/// never share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathKey(String);

impl PathKey {
    /// The key of the root path.
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PathKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_segments_with_delimiter() {
        assert_eq!(TracePath::new(vec![0, 1, 3]).key().as_str(), "0.1.3");
        assert_eq!(TracePath::new(vec![0]).key().as_str(), "0");
        assert_eq!(TracePath::root().key().as_str(), "");
    }

    #[test]
    fn ancestor_includes_equal_paths() {
        let a = TracePath::new(vec![0, 1]);
        assert!(a.is_ancestor_or_equal(&TracePath::new(vec![0, 1])));
        assert!(a.is_ancestor_or_equal(&TracePath::new(vec![0, 1, 3])));
        assert!(!a.is_ancestor_or_equal(&TracePath::new(vec![0])));
        assert!(!a.is_ancestor_or_equal(&TracePath::new(vec![0, 2])));
    }

    #[test]
    fn sibling_indices_do_not_prefix_collide() {
        // "1" is a string prefix of "11" but not a structural ancestor.
        let one = TracePath::new(vec![1]);
        let eleven = TracePath::new(vec![11]);
        assert!(!one.is_ancestor_or_equal(&eleven));
        assert!(!eleven.is_ancestor_or_equal(&one));
    }

    #[test]
    fn root_is_ancestor_of_everything() {
        let root = TracePath::root();
        assert!(root.is_ancestor_or_equal(&TracePath::new(vec![4, 2])));
        assert!(root.is_ancestor_or_equal(&root));
    }
}
