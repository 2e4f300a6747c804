//! Depth-first traversal with chainable, path-aware receivers.
//!
//! A receiver is any `Clone` value describing how the current subtree is
//! interpreted. For each child the visitor decides a [`Step`]: keep the same
//! receiver for the child's descendants, switch to another one, or stop before
//! descending. Receivers that need a different mode per section (the
//! definition parser) use an enum; receivers that only collect (summary
//! extraction) use `()`.

use super::document_tree::{is_positional_key, DocumentTree, NodeKind};
use crate::errors::RAW_PATH_DELIMITER;
use crate::types::field_path::FieldPath;

/// What the walker does with the children of the node just visited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step<R> {
    /// Descend with the current receiver.
    Continue,
    /// Descend with a different receiver.
    Switch(R),
    /// Do not descend.
    Stop,
}

/// Keys of the ancestors of the node being visited.
#[derive(Debug, Clone, Default)]
pub struct WalkContext {
    stack: Vec<String>,
}

impl WalkContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw ancestor keys, including array positions.
    pub fn keys(&self) -> &[String] {
        &self.stack
    }

    /// Nesting depth of the node being visited. Direct children of the root are at depth 0.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Logical path of `key` under the current ancestors.
    ///
    /// Array positions and empty keys are left out, so every element of an
    /// array maps to its parent's path. `None` when nothing remains.
    pub fn field_path(&self, key: &str) -> Option<FieldPath> {
        FieldPath::from_segments(
            self.stack
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(key))
                .filter(|segment| !is_positional_key(segment)),
        )
    }

    /// Every raw key from the root down to `key`, joined for error messages.
    pub fn raw_path(&self, key: &str) -> String {
        let mut path = String::new();
        for segment in &self.stack {
            path.push_str(segment);
            path.push(RAW_PATH_DELIMITER);
        }
        path.push_str(key);
        path
    }

    pub(crate) fn push(&mut self, key: &str) {
        self.stack.push(key.to_string());
    }

    pub(crate) fn pop(&mut self) {
        self.stack.pop();
    }
}

/// Walk the children of `root` depth first.
///
/// `visit` is called once per child with the receiver in effect for its
/// parent. Scalars never have children, so their [`Step`] only matters for
/// containers. The first error aborts the walk.
pub fn walk<T, R, E, V>(root: &T, receiver: R, visit: &mut V) -> Result<(), E>
where
    T: DocumentTree,
    R: Clone,
    V: FnMut(&WalkContext, &R, &str, &T, NodeKind) -> Result<Step<R>, E>,
{
    let mut ctx = WalkContext::new();
    walk_node(&mut ctx, root, &receiver, visit)
}

fn walk_node<T, R, E, V>(
    ctx: &mut WalkContext,
    node: &T,
    receiver: &R,
    visit: &mut V,
) -> Result<(), E>
where
    T: DocumentTree,
    R: Clone,
    V: FnMut(&WalkContext, &R, &str, &T, NodeKind) -> Result<Step<R>, E>,
{
    for (key, child) in node.entries() {
        let kind = child.kind();
        let next = match visit(ctx, receiver, &key, child, kind)? {
            Step::Stop => continue,
            Step::Continue => receiver.clone(),
            Step::Switch(next) => next,
        };

        if kind.is_container() {
            ctx.push(&key);
            let result = walk_node(ctx, child, &next, visit);
            ctx.pop();
            result?;
        }
    }
    Ok(())
}
