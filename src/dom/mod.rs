//! Arena-backed markup tree.
//!
//! `Dom` is the tree adapter bundled with the crate. Nodes live in a flat
//! arena and are addressed by [`NodeId`]; removing a node only detaches it,
//! so handles stay valid for the lifetime of the document.
//!
//! - `parse`: HTML fragment parsing via `tl`
//! - `render`: HTML serialization

mod parse;
mod render;

use std::fmt;

use smallvec::SmallVec;

use crate::tree::Tree;
use crate::{Error, Result};

// =============================================================================
// Types
// =============================================================================

/// Handle of a node inside a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Ordered attribute list. Most elements carry only a handful.
pub type Attrs = SmallVec<[(String, String); 4]>;

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Synthetic document root.
    Document,
    Element { tag: String, attrs: Attrs },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: SmallVec<[NodeId; 4]>,
}

impl NodeData {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: SmallVec::new(),
        }
    }
}

/// A document: an arena of nodes plus the id of its root.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Construction
// =============================================================================

impl Dom {
    /// Create an empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData::new(NodeKind::Document)],
            root: NodeId(0),
        }
    }

    /// Parse an HTML fragment into a new document.
    pub fn parse(html: &str) -> Result<Self> {
        parse::parse_html(html)
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes ever allocated, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData::new(kind));
        id
    }

    /// Create a detached element with the given attributes.
    pub fn element<'a>(
        &mut self,
        tag: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> NodeId {
        let attrs = attrs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.alloc(NodeKind::Element {
            tag: tag.to_ascii_lowercase(),
            attrs,
        })
    }

    /// Create a detached text node.
    pub fn text_node(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn comment(&mut self, text: impl Into<String>) -> NodeId {
        self.alloc(NodeKind::Comment(text.into()))
    }

    /// Create an element and append it to `parent`.
    pub fn append_element<'a>(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<NodeId> {
        let node = self.element(tag, attrs);
        self.append_child(parent, node)?;
        Ok(node)
    }

    /// Create a text node and append it to `parent`.
    pub fn append_text(&mut self, parent: NodeId, text: impl Into<String>) -> Result<NodeId> {
        let node = self.text_node(text);
        self.append_child(parent, node)?;
        Ok(node)
    }

    pub fn kind(&self, node: NodeId) -> &NodeKind {
        &self.data(node).kind
    }

    #[inline]
    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }

    #[inline]
    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.index()]
    }

    /// Whether `node` is reachable from the document root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Nodes below `node` in document order, excluding `node` itself.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.data(node).children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.data(n).children.iter().rev().copied());
        }
        out
    }

    /// Concatenated text of all text nodes below `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        if let NodeKind::Text(t) = &self.data(node).kind {
            out.push_str(t);
        }
        for n in self.descendants(node) {
            if let NodeKind::Text(t) = &self.data(n).kind {
                out.push_str(t);
            }
        }
        out
    }
}

// =============================================================================
// Tree adapter
// =============================================================================

impl Tree for Dom {
    type Node = NodeId;

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.data(node).children.to_vec()
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).children.first().copied()
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.data(node).parent?;
        let siblings = &self.data(parent).children;
        let pos = siblings.iter().position(|&c| c == node)?;
        siblings.get(pos + 1).copied()
    }

    fn child_count(&self, node: NodeId) -> usize {
        self.data(node).children.len()
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        node: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        if self.contains(node, parent) {
            return Err(Error::Hierarchy {
                node: node.to_string(),
            });
        }
        if !self.accepts_children(parent) {
            return Err(Error::usage(match self.tag_name(parent) {
                Some(tag) => format!("cannot insert into <{tag}>: void elements have no children"),
                None => format!("cannot insert into {parent}: node takes no children"),
            }));
        }

        self.detach(node);

        let siblings = &mut self.data_mut(parent).children;
        let pos = reference
            .and_then(|r| siblings.iter().position(|&c| c == r))
            .unwrap_or(siblings.len());
        siblings.insert(pos, node);
        self.data_mut(node).parent = Some(parent);
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, node: NodeId) {
        let siblings = &mut self.data_mut(parent).children;
        if let Some(pos) = siblings.iter().position(|&c| c == node) {
            siblings.remove(pos);
            self.data_mut(node).parent = None;
        }
    }

    fn accepts_children(&self, node: NodeId) -> bool {
        match &self.data(node).kind {
            NodeKind::Document => true,
            NodeKind::Element { tag, .. } => !render::is_void_element(tag),
            NodeKind::Text(_) | NodeKind::Comment(_) => false,
        }
    }

    fn create_element(&mut self, tag: &str) -> NodeId {
        self.element(tag, [])
    }

    fn tag_name(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Text(t) => Some(t),
            _ => None,
        }
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    fn attr_names(&self, node: NodeId) -> Vec<String> {
        match &self.data(node).kind {
            NodeKind::Element { attrs, .. } => attrs.iter().map(|(k, _)| k.clone()).collect(),
            _ => Vec::new(),
        }
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.data_mut(node).kind {
            match attrs.iter_mut().find(|(k, _)| k == name) {
                Some((_, v)) => *v = value.to_string(),
                None => attrs.push((name.to_string(), value.to_string())),
            }
        }
    }

    fn remove_attr(&mut self, node: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.data_mut(node).kind {
            attrs.retain(|(k, _)| k != name);
        }
    }
}
