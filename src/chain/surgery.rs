//! Structural swap and its special cases.
//!
//! [`swap`] exchanges two boundary pairs `(outer, inner)`: the outer nodes
//! trade places in the tree and the inner nodes trade children. Replacing a
//! node, replacing a chain and wrapping are all instances of it.

use super::WrapChain;
use crate::tree::Tree;
use crate::{Error, Result};

/// Exchange the position and contents of `(outer1, inner1)` and
/// `(outer2, inner2)`.
///
/// Either outer node may be detached; the other one then ends up detached.
/// Swapping a pair with itself is a no-op. The two pairs must not overlap.
///
/// # Errors
///
/// [`Error::Usage`] when one outer node contains the other, or when an inner
/// node that would receive children cannot hold them. The tree is left
/// untouched in both cases.
pub fn swap<T: Tree>(
    tree: &mut T,
    outer1: T::Node,
    inner1: T::Node,
    outer2: T::Node,
    inner2: T::Node,
) -> Result<()> {
    if outer1 == outer2 && inner1 == inner2 {
        return Ok(());
    }
    if tree.contains(outer1, outer2) || tree.contains(outer2, outer1) {
        return Err(Error::usage(format!(
            "cannot swap overlapping chains {outer1:?} and {outer2:?}"
        )));
    }

    let displaced = tree.children(inner2);
    for (inner, incoming) in [(inner1, displaced.len()), (inner2, tree.child_count(inner1))] {
        if incoming > 0 && !tree.accepts_children(inner) {
            return Err(Error::usage(format!(
                "cannot move children into {inner:?}: node takes no children"
            )));
        }
    }

    let parent1 = tree.parent(outer1);
    let parent2 = tree.parent(outer2);
    let next2 = tree.next_sibling(outer2);

    // Contents: inner1's children move into inner2.
    for &child in &displaced {
        tree.remove_child(inner2, child);
    }
    for child in tree.children(inner1) {
        tree.append_child(inner2, child)?;
    }

    // outer2 takes outer1's place.
    match parent1 {
        Some(parent) => tree.insert_before(parent, outer2, Some(outer1))?,
        None => tree.detach(outer2),
    }

    // outer1 takes outer2's place. When outer2 sat right before outer1 the
    // captured sibling is outer1 itself, so anchor on outer2 instead.
    match parent2 {
        Some(parent) => {
            let reference = if next2 == Some(outer1) {
                Some(outer2)
            } else {
                next2
            };
            tree.insert_before(parent, outer1, reference)?;
        }
        None => tree.detach(outer1),
    }

    for child in displaced {
        tree.append_child(inner1, child)?;
    }
    Ok(())
}

/// Replace `outer` (and the run down to `inner`) with `inner`'s children.
///
/// # Errors
///
/// [`Error::Unbound`] when `outer` has no parent.
pub fn unwrap<T: Tree>(tree: &mut T, outer: T::Node, inner: T::Node) -> Result<()> {
    let parent = tree
        .parent(outer)
        .ok_or_else(|| Error::unbound(format!("cannot unwrap {outer:?}: node has no parent")))?;

    for child in tree.children(inner) {
        tree.insert_before(parent, child, Some(outer))?;
    }
    tree.remove_child(parent, outer);
    Ok(())
}

/// Put `chain` where `node` is and move `node` into the chain's inner node.
///
/// Wrapping with the empty chain leaves the tree unchanged.
///
/// # Errors
///
/// Any tree adapter error from moving `node` into the inner node, raised
/// before the tree is changed.
pub fn wrap<T: Tree>(tree: &mut T, node: T::Node, chain: &WrapChain<T::Node>) -> Result<()> {
    let Some((outer, inner)) = chain.bounds() else {
        return Ok(());
    };

    let parent = tree.parent(node);
    let next = tree.next_sibling(node);
    tree.append_child(inner, node)?;
    if let Some(parent) = parent {
        tree.insert_before(parent, outer, next)?;
    }
    Ok(())
}

/// Move `node`'s children into the chain's inner node and make the chain
/// `node`'s only child.
///
/// Wrapping with the empty chain leaves the tree unchanged.
///
/// # Errors
///
/// [`Error::Usage`] when `node` or the inner node cannot hold children.
pub fn wrap_inner<T: Tree>(tree: &mut T, node: T::Node, chain: &WrapChain<T::Node>) -> Result<()> {
    let Some((outer, inner)) = chain.bounds() else {
        return Ok(());
    };

    if !tree.accepts_children(node) || !tree.accepts_children(inner) {
        return Err(Error::usage(format!(
            "cannot wrap the contents of {node:?}: node takes no children"
        )));
    }

    for child in tree.children(node) {
        tree.append_child(inner, child)?;
    }
    tree.append_child(node, outer)
}
