//! Uniform view over hierarchical documents.
//!
//! Traversal code never matches on a concrete document type. It asks a node
//! for its [`NodeKind`], iterates its children as `(key, value)` pairs and, for
//! pruning, removes children by key. Array positions surface as stringified
//! indices (`"0"`, `"1"`, ...).

use std::borrow::Cow;

/// Structural classification of a document node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Keyed container.
    Map,
    /// Positional container.
    Array,
    /// Leaf value. Scalars have no children.
    Scalar,
}

impl NodeKind {
    pub fn is_container(self) -> bool {
        !matches!(self, NodeKind::Scalar)
    }
}

/// Ordered child iterator returned by [`DocumentTree::entries`].
pub type Entries<'a, T> = Box<dyn Iterator<Item = (Cow<'a, str>, &'a T)> + 'a>;

/// Capabilities a document representation provides to the walker and prune.
pub trait DocumentTree: Sized {
    /// Classify this node.
    fn kind(&self) -> NodeKind;

    /// Children in document order. Empty for scalars.
    fn entries(&self) -> Entries<'_, Self>;

    /// Number of children. Zero for scalars.
    fn size(&self) -> usize;

    /// Mutable access to a direct child.
    fn child_mut(&mut self, key: &str) -> Option<&mut Self>;

    /// Remove a direct child and return it.
    ///
    /// Array children are addressed by their stringified position. Removing a
    /// position shifts the following elements down by one.
    fn remove_child(&mut self, key: &str) -> Option<Self>;

    /// Render a scalar as text. `None` for containers.
    fn scalar_text(&self) -> Option<String>;

    /// Text of a scalar eligible for summary fields: strings and integers.
    fn summary_text(&self) -> Option<String>;

    /// Boolean value of a scalar, if it is one.
    fn as_bool(&self) -> Option<bool>;

    /// Debug rendering used in conversion error messages.
    fn raw_display(&self) -> String;
}

/// Parse an array key produced by [`DocumentTree::entries`].
pub(crate) fn array_position(key: &str) -> Option<usize> {
    key.parse::<usize>().ok()
}

/// True for keys that denote array positions.
///
/// Positional keys are left out of logical field paths so that every element
/// of an array shares its parent's path.
pub fn is_positional_key(key: &str) -> bool {
    key.chars().next().is_some_and(|c| c.is_ascii_digit())
}
