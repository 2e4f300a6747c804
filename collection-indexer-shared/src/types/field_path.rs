//! Dotted field paths.
//!
//! A [`FieldPath`] is the segment list behind a dotted attribute name such as
//! `author.address.city`. Paths order segment by segment, and a path that is
//! exhausted first orders before the longer one, so a parent always sorts
//! directly ahead of its descendants. [`minimize`] relies on that to collapse
//! descendant paths into the parent that already covers them.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Separator between the segments of a dotted path.
pub const SEGMENT_DELIMITER: char = '.';

/// An ordered, non-empty sequence of non-empty path segments.
///
/// The derived ordering is the segment-wise lexicographic order with the
/// shorter path first on exhaustion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Split a dotted path into its segments.
    ///
    /// Empty segments are dropped. Returns `None` when nothing is left.
    ///
    /// # Example
    ///
    /// ```
    /// use collection_indexer_shared::FieldPath;
    ///
    /// let path = FieldPath::split("author.name").unwrap();
    /// assert_eq!(path.segments(), ["author", "name"]);
    /// assert!(FieldPath::split("").is_none());
    /// ```
    pub fn split(path: &str) -> Option<Self> {
        Self::from_segments(path.split(SEGMENT_DELIMITER).map(str::to_string))
    }

    /// Build a path from already separated segments, dropping empty ones.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments
            .into_iter()
            .map(Into::into)
            .filter(|s| !s.is_empty())
            .collect();

        if segments.is_empty() {
            None
        } else {
            Some(Self(segments))
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when `self` equals `other` or is one of its ancestors.
    pub fn is_prefix_of(&self, other: &FieldPath) -> bool {
        other.0.len() >= self.0.len() && other.0[..self.0.len()] == self.0[..]
    }

    /// True when `self` is a proper ancestor of `other`.
    pub fn is_strict_prefix_of(&self, other: &FieldPath) -> bool {
        other.0.len() > self.0.len() && self.is_prefix_of(other)
    }

    /// Return a new path with `head` inserted as the first segment.
    pub fn prefixed(&self, head: &str) -> FieldPath {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(FieldPath::split(head).map(|p| p.0).unwrap_or_default());
        segments.extend(self.0.iter().cloned());
        FieldPath(segments)
    }

    /// Return a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> FieldPath {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        FieldPath(segments)
    }

    /// All proper, non-empty prefixes of this path, shortest first.
    ///
    /// A path of `n` segments has exactly `n - 1` ancestors.
    pub fn ancestors(&self) -> Vec<FieldPath> {
        (1..self.0.len())
            .map(|end| FieldPath(self.0[..end].to_vec()))
            .collect()
    }

    /// The dotted form, e.g. `author.name`.
    pub fn dotted(&self) -> String {
        self.0.join(&SEGMENT_DELIMITER.to_string())
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.dotted())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FieldPath::split(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid field path: {:?}", raw)))
    }
}

/// Merge paths into a sorted list where no entry is a descendant of another.
///
/// Entries are sorted, then an entry is kept only if the previously kept
/// entry is not a prefix of it. Duplicates collapse into one.
///
/// # Example
///
/// ```
/// use collection_indexer_shared::{minimize, FieldPath};
///
/// let fields = vec![
///     FieldPath::split("a.b").unwrap(),
///     FieldPath::split("a").unwrap(),
///     FieldPath::split("c").unwrap(),
/// ];
/// let minimized = minimize(&fields);
/// assert_eq!(minimized, vec![FieldPath::split("a").unwrap(), FieldPath::split("c").unwrap()]);
/// ```
pub fn minimize<'a, I>(paths: I) -> Vec<FieldPath>
where
    I: IntoIterator<Item = &'a FieldPath>,
{
    let mut sorted: Vec<&FieldPath> = paths.into_iter().collect();
    sorted.sort();

    let mut kept: Vec<FieldPath> = Vec::with_capacity(sorted.len());
    for path in sorted {
        match kept.last() {
            Some(previous) if previous.is_prefix_of(path) => {}
            _ => kept.push(path.clone()),
        }
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;
    use std::collections::HashSet;

    fn path(raw: &str) -> FieldPath {
        FieldPath::split(raw).unwrap()
    }

    #[test]
    fn test_split_drops_empty_segments() {
        assert_eq!(path("a..b.").segments(), ["a", "b"]);
        assert!(FieldPath::split("...").is_none());
    }

    #[test]
    fn test_compare_shorter_first_on_exhaustion() {
        assert_eq!(path("a").cmp(&path("a.b")), Ordering::Less);
        assert_eq!(path("a.b").cmp(&path("a")), Ordering::Greater);
        assert_eq!(path("a.c").cmp(&path("a.b.z")), Ordering::Greater);
        assert_eq!(path("a.b").cmp(&path("a.b")), Ordering::Equal);
    }

    #[test]
    fn test_minimize_collapses_descendants() {
        let input: HashSet<FieldPath> = ["a.b.c", "a.b", "x", "a.bc", "x.y"]
            .iter()
            .map(|p| path(p))
            .collect();

        let minimized = minimize(&input);
        assert_eq!(minimized, vec![path("a.b"), path("a.bc"), path("x")]);
    }

    #[test]
    fn test_minimize_merges_several_sets() {
        let fields = vec![path("title"), path("author.name")];
        let summary = vec![path("author"), path("title")];

        let minimized = minimize(fields.iter().chain(summary.iter()));
        assert_eq!(minimized, vec![path("author"), path("title")]);
    }

    #[test]
    fn test_minimize_is_idempotent() {
        let input = vec![path("b"), path("a.b"), path("a"), path("c.d.e"), path("c.d")];
        let once = minimize(&input);
        let twice = minimize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_ancestors() {
        let p = path("a.b.c.d");
        let ancestors = p.ancestors();
        assert_eq!(ancestors.len(), p.len() - 1);
        assert_eq!(ancestors, vec![path("a"), path("a.b"), path("a.b.c")]);
        for ancestor in &ancestors {
            assert!(ancestor.is_strict_prefix_of(&p));
        }
        assert!(path("single").ancestors().is_empty());
    }

    #[test]
    fn test_prefixed_and_child() {
        assert_eq!(path("name").prefixed("author"), path("author.name"));
        assert_eq!(path("name").prefixed("joined.items"), path("joined.items.name"));
        assert_eq!(path("a").child("b"), path("a.b"));
    }

    #[test]
    fn test_serde_as_dotted_string() {
        let json = serde_json::to_string(&path("a.b")).unwrap();
        assert_eq!(json, "\"a.b\"");
        let back: FieldPath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, path("a.b"));
    }
}
