//! Chain discovery around and within a node.

use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::tree::{Predicate, Tree};
use crate::{Error, Result};

/// Custom discovery function: node → outside-in nodes.
pub type DirectionFn<T> = Rc<dyn Fn(&T, <T as Tree>::Node) -> Result<Vec<<T as Tree>::Node>>>;

/// Where to look for wrapper nodes relative to a node.
pub enum Direction<T: Tree> {
    /// The node itself (`self`).
    Node,
    /// Single-child ancestors (`around`).
    Around,
    /// Single-child descendants (`within`).
    Within,
    /// Several directions, results concatenated in order.
    Many(Vec<Direction<T>>),
    Custom(DirectionFn<T>),
}

impl<T: Tree> Direction<T> {
    /// `around`, `self`, `within`: the maximal chain through a node.
    pub fn full() -> Self {
        Self::Many(vec![Self::Around, Self::Node, Self::Within])
    }

    /// Wrap a closure as a custom direction.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&T, T::Node) -> Result<Vec<T::Node>> + 'static,
    {
        Self::Custom(Rc::new(f))
    }

    /// Parse a list of direction tokens.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] for an unknown token or an empty list.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self> {
        match tokens {
            [] => Err(Error::usage("direction list is empty")),
            [one] => one.as_ref().parse(),
            many => many
                .iter()
                .map(|t| t.as_ref().parse())
                .collect::<Result<Vec<_>>>()
                .map(Self::Many),
        }
    }
}

impl<T: Tree> FromStr for Direction<T> {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "self" => Ok(Self::Node),
            "around" => Ok(Self::Around),
            "within" => Ok(Self::Within),
            other => Err(Error::usage(format!(
                "unknown direction `{other}`, expected one of: self, around, within"
            ))),
        }
    }
}

impl<T: Tree> Clone for Direction<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Node => Self::Node,
            Self::Around => Self::Around,
            Self::Within => Self::Within,
            Self::Many(list) => Self::Many(list.clone()),
            Self::Custom(f) => Self::Custom(Rc::clone(f)),
        }
    }
}

impl<T: Tree> fmt::Debug for Direction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node => f.write_str("self"),
            Self::Around => f.write_str("around"),
            Self::Within => f.write_str("within"),
            Self::Many(list) => f.debug_list().entries(list).finish(),
            Self::Custom(_) => f.write_str("<custom>"),
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Single-child ancestors of `node`, outside-in.
///
/// Empty when `node` has a sibling or no parent.
pub fn around<T: Tree>(tree: &T, node: T::Node) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut current = tree.parent(node);
    while let Some(ancestor) = current {
        if tree.child_count(ancestor) != 1 {
            break;
        }
        out.push(ancestor);
        current = tree.parent(ancestor);
    }
    out.reverse();
    out
}

/// Single-child descendants of `node`, outside-in.
pub fn within<T: Tree>(tree: &T, node: T::Node) -> Vec<T::Node> {
    let mut out = Vec::new();
    let mut current = node;
    while tree.child_count(current) == 1 {
        let Some(child) = tree.first_child(current) else {
            break;
        };
        out.push(child);
        current = child;
    }
    out
}

/// Collect the nodes `direction` yields for `node`, then drop leading and
/// trailing entries accepted by `trim`.
///
/// The result is not validated; build a [`super::WrapChain`] from it to do so.
///
/// # Errors
///
/// Propagates errors from custom directions and the trim predicate.
pub fn get_wraps<T: Tree>(
    tree: &T,
    node: T::Node,
    direction: &Direction<T>,
    trim: Option<&Predicate<T>>,
) -> Result<Vec<T::Node>> {
    let mut nodes = Vec::new();
    collect(tree, node, direction, &mut nodes)?;

    let Some(trim) = trim else {
        return Ok(nodes);
    };

    let (mut lo, mut hi) = (0, nodes.len());
    while lo < hi && trim(tree, nodes[lo])? {
        lo += 1;
    }
    while hi > lo && trim(tree, nodes[hi - 1])? {
        hi -= 1;
    }
    nodes.truncate(hi);
    nodes.drain(..lo);
    Ok(nodes)
}

fn collect<T: Tree>(
    tree: &T,
    node: T::Node,
    direction: &Direction<T>,
    out: &mut Vec<T::Node>,
) -> Result<()> {
    match direction {
        Direction::Node => out.push(node),
        Direction::Around => out.extend(around(tree, node)),
        Direction::Within => out.extend(within(tree, node)),
        Direction::Many(list) => {
            for d in list {
                collect(tree, node, d, out)?;
            }
        }
        Direction::Custom(f) => out.extend(f(tree, node)?),
    }
    Ok(())
}
