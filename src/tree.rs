//! Tree adapter.
//!
//! The rewriting core never owns nodes. It navigates and rearranges an
//! externally owned tree through this trait, so any DOM-like structure with
//! stable, copyable node handles can be rewritten.
//!
//! Mutators follow DOM semantics: inserting a node that already has a parent
//! detaches it from that parent first.

use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::Result;

/// Caller-supplied node test, used for rule filters and chain trimming.
pub type Predicate<T> = Rc<dyn Fn(&T, <T as Tree>::Node) -> Result<bool>>;

/// Wrap a closure as a [`Predicate`].
pub fn predicate<T, F>(f: F) -> Predicate<T>
where
    T: Tree,
    F: Fn(&T, T::Node) -> Result<bool> + 'static,
{
    Rc::new(f)
}

/// Navigation, mutation and element access over a markup tree.
pub trait Tree {
    /// Identity-comparable node handle.
    type Node: Copy + Eq + Hash + Debug + 'static;

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Children of `node` in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    fn first_child(&self, node: Self::Node) -> Option<Self::Node>;

    fn next_sibling(&self, node: Self::Node) -> Option<Self::Node>;

    fn child_count(&self, node: Self::Node) -> usize;

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Insert `node` into `parent` before `reference`, or at the end when
    /// `reference` is `None` or not a child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `node` is `parent` or one of its ancestors, or when
    /// `parent` does not [accept children](Tree::accepts_children).
    fn insert_before(
        &mut self,
        parent: Self::Node,
        node: Self::Node,
        reference: Option<Self::Node>,
    ) -> Result<()>;

    /// Append `node` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::insert_before`].
    fn append_child(&mut self, parent: Self::Node, node: Self::Node) -> Result<()> {
        self.insert_before(parent, node, None)
    }

    /// Detach `node` from `parent`. Does nothing if `node` is not a child of
    /// `parent`.
    fn remove_child(&mut self, parent: Self::Node, node: Self::Node);

    // ------------------------------------------------------------------------
    // Elements
    // ------------------------------------------------------------------------

    /// Create a new, detached element.
    fn create_element(&mut self, tag: &str) -> Self::Node;

    /// Tag name of an element node, `None` for any other node kind.
    fn tag_name(&self, node: Self::Node) -> Option<&str>;

    /// Content of a text node, `None` for any other node kind.
    fn text(&self, node: Self::Node) -> Option<&str>;

    fn attr(&self, node: Self::Node, name: &str) -> Option<&str>;

    /// Attribute names of an element in declaration order.
    fn attr_names(&self, node: Self::Node) -> Vec<String>;

    /// Set an attribute. Ignored for non-element nodes.
    fn set_attr(&mut self, node: Self::Node, name: &str, value: &str);

    fn remove_attr(&mut self, node: Self::Node, name: &str);

    // ------------------------------------------------------------------------
    // Provided helpers
    // ------------------------------------------------------------------------

    /// Detach `node` from its parent, if any.
    fn detach(&mut self, node: Self::Node) {
        if let Some(parent) = self.parent(node) {
            self.remove_child(parent, node);
        }
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Whether `node` may hold children. Void elements such as `<img>` may
    /// not, and [`Tree::insert_before`] refuses to put anything under them.
    fn accepts_children(&self, _node: Self::Node) -> bool {
        true
    }

    fn is_text(&self, node: Self::Node) -> bool {
        self.text(node).is_some()
    }

    fn is_element(&self, node: Self::Node) -> bool {
        self.tag_name(node).is_some()
    }

    /// Whitespace-separated entries of the `class` attribute.
    fn classes(&self, node: Self::Node) -> Vec<String> {
        self.attr(node, "class")
            .map(|v| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn has_class(&self, node: Self::Node, class: &str) -> bool {
        self.attr(node, "class")
            .is_some_and(|v| v.split_whitespace().any(|c| c == class))
    }

    /// Replace the `class` attribute, removing it when `classes` is empty.
    fn set_classes(&mut self, node: Self::Node, classes: &[String]) {
        if classes.is_empty() {
            self.remove_attr(node, "class");
        } else {
            self.set_attr(node, "class", &classes.join(" "));
        }
    }
}
