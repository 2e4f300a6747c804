//! In-place removal of document subtrees.

use super::document_tree::{array_position, DocumentTree, NodeKind};
use super::walker::WalkContext;

/// Decision taken for one child during [`prune`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneDecision {
    /// Delete the child once its siblings have been scanned.
    Remove,
    /// Leave the child and everything below it untouched.
    Keep,
    /// Prune the child's own children, deleting the child if nothing is left.
    Recurse,
}

/// Prune `node` according to `decide`.
///
/// Only containers are scanned. Removals are applied after the full child
/// scan of a node; array positions are removed from the highest down. A
/// container marked [`PruneDecision::Recurse`] is deleted when it has no
/// children left afterwards. A scalar marked `Recurse` has nothing to descend
/// into and is left in place.
pub fn prune<T, F>(node: &mut T, decide: &mut F)
where
    T: DocumentTree,
    F: FnMut(&WalkContext, &str, &T) -> PruneDecision,
{
    let mut ctx = WalkContext::new();
    prune_node(&mut ctx, node, decide);
}

fn prune_node<T, F>(ctx: &mut WalkContext, node: &mut T, decide: &mut F)
where
    T: DocumentTree,
    F: FnMut(&WalkContext, &str, &T) -> PruneDecision,
{
    if !node.kind().is_container() {
        return;
    }

    let decisions: Vec<(String, PruneDecision)> = node
        .entries()
        .map(|(key, child)| {
            let decision = decide(ctx, &key, child);
            (key.into_owned(), decision)
        })
        .collect();

    let mut removals = Vec::new();
    for (key, decision) in decisions {
        match decision {
            PruneDecision::Keep => {}
            PruneDecision::Remove => removals.push(key),
            PruneDecision::Recurse => {
                if let Some(child) = node.child_mut(&key) {
                    if !child.kind().is_container() {
                        continue;
                    }
                    ctx.push(&key);
                    prune_node(ctx, child, decide);
                    ctx.pop();
                    if child.size() == 0 {
                        removals.push(key);
                    }
                }
            }
        }
    }

    if node.kind() == NodeKind::Array {
        removals.sort_by_key(|key| std::cmp::Reverse(array_position(key)));
    }
    for key in removals {
        node.remove_child(&key);
    }
}
