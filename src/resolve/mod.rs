//! Lazy node and chain resolver.
//!
//! A [`Spec`] describes replacement structure declaratively and is turned
//! into concrete nodes only when an operation needs them:
//!
//! | Spec        | Node resolution            | Chain resolution                   |
//! |-------------|----------------------------|------------------------------------|
//! | `Template`  | one new element            | one new element per template slot  |
//! | `Concrete`  | returned as is             | returned as is (detached only)     |
//! | `Transform` | call, resolve the result   | call, resolve the result           |
//! | `List`      | exactly one element        | one link per element, in order     |
//!
//! The *contextual template* handed to transforms is the node (or chain)
//! being replaced, so a transform can derive the replacement from it.

mod template;

pub use template::ElementTemplate;

use std::fmt;
use std::rc::Rc;

use crate::chain::WrapChain;
use crate::tree::Tree;
use crate::{Error, Result};

/// Constructor function: contextual template → spec.
pub type SpecFn<T> = Rc<dyn Fn(&mut T, &[<T as Tree>::Node]) -> Result<Spec<T>>>;

/// Already-built structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Concrete<N> {
    Node(N),
    Chain(WrapChain<N>),
}

/// Declarative description of a node or chain.
pub enum Spec<T: Tree> {
    /// Element template string, see [`ElementTemplate`].
    Template(String),
    Concrete(Concrete<T::Node>),
    Transform(SpecFn<T>),
    List(Vec<Spec<T>>),
}

impl<T: Tree> Spec<T> {
    pub fn template(source: impl Into<String>) -> Self {
        Self::Template(source.into())
    }

    pub fn node(node: T::Node) -> Self {
        Self::Concrete(Concrete::Node(node))
    }

    pub fn chain(chain: WrapChain<T::Node>) -> Self {
        Self::Concrete(Concrete::Chain(chain))
    }

    pub fn transform<F>(f: F) -> Self
    where
        F: Fn(&mut T, &[T::Node]) -> Result<Spec<T>> + 'static,
    {
        Self::Transform(Rc::new(f))
    }

    pub fn list(items: impl IntoIterator<Item = Spec<T>>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Parse every template reachable without calling a transform, so that
    /// malformed templates surface before any rule runs.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] for the first malformed template.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Template(source) => source.parse::<ElementTemplate>().map(drop),
            Self::List(items) => items.iter().try_for_each(Self::validate),
            Self::Concrete(_) | Self::Transform(_) => Ok(()),
        }
    }
}

impl<T: Tree> From<&str> for Spec<T> {
    fn from(source: &str) -> Self {
        Self::template(source)
    }
}

impl<T: Tree> Clone for Spec<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Template(s) => Self::Template(s.clone()),
            Self::Concrete(c) => Self::Concrete(c.clone()),
            Self::Transform(f) => Self::Transform(Rc::clone(f)),
            Self::List(items) => Self::List(items.clone()),
        }
    }
}

impl<T: Tree> fmt::Debug for Spec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(s) => write!(f, "Template({s:?})"),
            Self::Concrete(c) => write!(f, "Concrete({c:?})"),
            Self::Transform(_) => f.write_str("Transform(<fn>)"),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Resolve `spec` to a single node.
///
/// # Errors
///
/// [`Error::Usage`] for malformed templates and for lists or chains that do
/// not hold exactly one node; transform errors propagate.
pub fn resolve_node<T: Tree>(
    tree: &mut T,
    spec: &Spec<T>,
    context: &[T::Node],
) -> Result<T::Node> {
    match spec {
        Spec::Template(source) => Ok(source.parse::<ElementTemplate>()?.instantiate(tree)),
        Spec::Concrete(Concrete::Node(node)) => Ok(*node),
        Spec::Concrete(Concrete::Chain(chain)) => match chain.nodes() {
            [node] => Ok(*node),
            nodes => Err(Error::usage(format!(
                "expected a single node, got a chain of {}",
                nodes.len()
            ))),
        },
        Spec::Transform(f) => {
            let next = f(tree, context)?;
            resolve_node(tree, &next, context)
        }
        Spec::List(items) => match items.as_slice() {
            [item] => resolve_node(tree, item, context),
            items => Err(Error::usage(format!(
                "expected a single node, got a list of {}",
                items.len()
            ))),
        },
    }
}

/// Resolve `spec` to a wrap chain shaped after `template`.
///
/// A template string is replicated once per template slot (at least once);
/// a list yields exactly one link per element; transforms receive
/// `template` and their result is resolved in turn.
///
/// # Errors
///
/// [`Error::Usage`] when a concrete node or chain is attached, or a node
/// would have to be replicated, plus template, transform and chain
/// validation errors.
pub fn resolve_chain<T: Tree>(
    tree: &mut T,
    spec: &Spec<T>,
    template: &[T::Node],
) -> Result<WrapChain<T::Node>> {
    match spec {
        Spec::Concrete(Concrete::Chain(chain)) => {
            if let Some(outer) = chain.outer()
                && tree.parent(outer).is_some()
            {
                return Err(Error::usage(format!(
                    "chain at {outer:?} is already attached and cannot be used as a wrapper; \
                     supply a constructor function"
                )));
            }
            Ok(chain.clone())
        }
        Spec::Transform(f) => {
            let next = f(tree, template)?;
            resolve_chain(tree, &next, template)
        }
        Spec::List(items) => resolve_list(tree, items, template),
        Spec::Concrete(Concrete::Node(node)) => {
            let slots = template.len().max(1);
            if slots > 1 {
                return Err(Error::usage(format!(
                    "node {node:?} cannot fill {slots} wrapper slots; supply a constructor function"
                )));
            }
            if tree.parent(*node).is_some() {
                return Err(Error::usage(format!(
                    "node {node:?} is already attached and cannot be used as a wrapper; \
                     supply a constructor function"
                )));
            }
            Ok(WrapChain::single(*node))
        }
        Spec::Template(source) => {
            let element = source.parse::<ElementTemplate>()?;
            let mut nodes = Vec::with_capacity(template.len().max(1));
            for _ in 0..template.len().max(1) {
                let node = element.instantiate(tree);
                if let Some(&prev) = nodes.last() {
                    tree.append_child(prev, node)?;
                }
                nodes.push(node);
            }
            WrapChain::new(tree, nodes)
        }
    }
}

/// Explicit mode: each element becomes the next link of the chain.
fn resolve_list<T: Tree>(
    tree: &mut T,
    items: &[Spec<T>],
    template: &[T::Node],
) -> Result<WrapChain<T::Node>> {
    let mut nodes: Vec<T::Node> = Vec::with_capacity(items.len());

    for (i, item) in items.iter().enumerate() {
        let context = template.get(i..=i).unwrap_or(&[]);
        let piece = resolve_chain(tree, item, context)?;

        if let (Some(&prev), Some(outer)) = (nodes.last(), piece.outer()) {
            tree.append_child(prev, outer)?;
        }
        nodes.extend_from_slice(piece.nodes());
    }

    WrapChain::new(tree, nodes)
}
