//! Wrap chains.
//!
//! A wrap chain is a run of nodes `[n0 … nk]` where every member but the
//! last has exactly one child, the next member. `n0` is the *outer* node and
//! `nk` the *inner* node. The empty chain is a valid value meaning "no
//! wrapper"; structural operations treat it as unwrap.
//!
//! # Modules
//!
//! - `discover`: finding chains around/within a node (`Direction`)
//! - `surgery`: swap, wrap, wrap-inner and unwrap

mod discover;
mod surgery;

pub use discover::{Direction, around, get_wraps, within};
pub use surgery::{swap, unwrap, wrap, wrap_inner};

use smallvec::SmallVec;

use crate::tree::{Predicate, Tree};
use crate::{Error, Result};

// =============================================================================
// WrapChain
// =============================================================================

/// A validated run of single-child wrapper nodes, outside-in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapChain<N> {
    nodes: SmallVec<[N; 4]>,
}

impl<N: Copy + Eq + std::fmt::Debug> WrapChain<N> {
    /// The empty chain.
    pub fn empty() -> Self {
        Self {
            nodes: SmallVec::new(),
        }
    }

    /// A chain of one node. Always valid.
    pub fn single(node: N) -> Self {
        let mut nodes = SmallVec::new();
        nodes.push(node);
        Self { nodes }
    }

    /// Build a chain from outside-in ordered nodes, checking that each
    /// member's only child is the next member.
    ///
    /// # Errors
    ///
    /// [`Error::Structure`] naming the first index whose node breaks the
    /// chain.
    pub fn new<T>(tree: &T, nodes: impl IntoIterator<Item = N>) -> Result<Self>
    where
        T: Tree<Node = N>,
    {
        let nodes: SmallVec<[N; 4]> = nodes.into_iter().collect();

        for (index, pair) in nodes.windows(2).enumerate() {
            let count = tree.child_count(pair[0]);
            if count != 1 {
                return Err(Error::structure(
                    index,
                    format!("expected exactly one child, found {count}"),
                ));
            }
            if tree.first_child(pair[0]) != Some(pair[1]) {
                return Err(Error::structure(
                    index,
                    format!("only child is not the next chain member {:?}", pair[1]),
                ));
            }
        }

        Ok(Self { nodes })
    }

    /// Discover and validate the chain for `node` in `direction`.
    ///
    /// # Errors
    ///
    /// Propagates trim predicate and custom direction errors, and fails with
    /// [`Error::Structure`] when the concatenated directions do not form a
    /// chain (e.g. `within` before `self`).
    pub fn discover<T>(
        tree: &T,
        node: N,
        direction: &Direction<T>,
        trim: Option<&Predicate<T>>,
    ) -> Result<Self>
    where
        T: Tree<Node = N>,
    {
        let nodes = get_wraps(tree, node, direction, trim)?;
        Self::new(tree, nodes)
    }

    #[inline]
    pub fn outer(&self) -> Option<N> {
        self.nodes.first().copied()
    }

    #[inline]
    pub fn inner(&self) -> Option<N> {
        self.nodes.last().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }

    /// Outer and inner node, or `None` for the empty chain.
    #[inline]
    pub fn bounds(&self) -> Option<(N, N)> {
        Some((self.outer()?, self.inner()?))
    }

    // -------------------------------------------------------------------------
    // Structural operations
    // -------------------------------------------------------------------------

    /// Exchange tree position and contents with `other`.
    ///
    /// An empty side degrades to unwrapping the other side; two empty chains
    /// are a no-op.
    ///
    /// # Errors
    ///
    /// [`Error::Unbound`] when the unwrap fallback hits a parentless chain,
    /// plus any tree adapter error.
    pub fn swap_with<T>(&self, tree: &mut T, other: &Self) -> Result<()>
    where
        T: Tree<Node = N>,
    {
        match (self.bounds(), other.bounds()) {
            (Some((outer1, inner1)), Some((outer2, inner2))) => {
                swap(tree, outer1, inner1, outer2, inner2)
            }
            (Some((outer, inner)), None) | (None, Some((outer, inner))) => {
                unwrap(tree, outer, inner)
            }
            (None, None) => Ok(()),
        }
    }

    /// Replace the chain by its inner node's children.
    ///
    /// # Errors
    ///
    /// [`Error::Unbound`] for the empty chain or a chain without parent.
    pub fn unwrap<T>(&self, tree: &mut T) -> Result<()>
    where
        T: Tree<Node = N>,
    {
        let (outer, inner) = self
            .bounds()
            .ok_or_else(|| Error::unbound("cannot unwrap the empty chain"))?;
        unwrap(tree, outer, inner)
    }

    /// Put this chain around `node`.
    pub fn wrap<T>(&self, tree: &mut T, node: N) -> Result<()>
    where
        T: Tree<Node = N>,
    {
        wrap(tree, node, self)
    }

    /// Put this chain between `node` and its children.
    pub fn wrap_inner<T>(&self, tree: &mut T, node: N) -> Result<()>
    where
        T: Tree<Node = N>,
    {
        wrap_inner(tree, node, self)
    }

    /// Append `child` to the inner node.
    ///
    /// # Errors
    ///
    /// [`Error::Unbound`] for the empty chain.
    pub fn append<T>(&self, tree: &mut T, child: N) -> Result<()>
    where
        T: Tree<Node = N>,
    {
        let inner = self
            .inner()
            .ok_or_else(|| Error::unbound("cannot append to the empty chain"))?;
        tree.append_child(inner, child)
    }

    /// Detach the chain (with its subtree) from the tree. A chain that is
    /// already detached is left alone.
    ///
    /// # Errors
    ///
    /// [`Error::Unbound`] for the empty chain.
    pub fn remove<T>(&self, tree: &mut T) -> Result<()>
    where
        T: Tree<Node = N>,
    {
        let outer = self
            .outer()
            .ok_or_else(|| Error::unbound("cannot remove the empty chain"))?;
        tree.detach(outer);
        Ok(())
    }
}
