//! Selector engine.
//!
//! Rules pick their nodes through the [`Selector`] trait. The crate ships
//! [`PatternSelector`], which understands a CSS subset (see [`Pattern`]) plus
//! the reserved `#text` pattern and composite text selections.

mod pattern;

pub use pattern::Pattern;

use std::fmt;
use std::str::FromStr;

use crate::tree::Tree;
use crate::{Error, Result};

/// Reserved pattern selecting every text node.
pub const TEXT_PATTERN: &str = "#text";

/// Lazy node sequence returned by a selector.
pub type Nodes<'t, N> = Box<dyn Iterator<Item = N> + 't>;

/// Text nodes to take relative to each node matched by a composite's root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextModifier {
    /// All text nodes in the subtree.
    DescendantText,
    /// Text nodes that are direct children.
    ChildText,
}

impl FromStr for TextModifier {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "descendant-text" => Ok(Self::DescendantText),
            "child-text" => Ok(Self::ChildText),
            other => Err(Error::usage(format!(
                "unknown selector modifier `{other}`, expected descendant-text or child-text"
            ))),
        }
    }
}

impl fmt::Display for TextModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DescendantText => "descendant-text",
            Self::ChildText => "child-text",
        })
    }
}

/// What a rule selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectSpec {
    Pattern(String),
    Composite {
        root: Box<SelectSpec>,
        modifier: TextModifier,
    },
}

impl SelectSpec {
    pub fn pattern(source: impl Into<String>) -> Self {
        Self::Pattern(source.into())
    }

    pub fn composite(root: SelectSpec, modifier: TextModifier) -> Self {
        Self::Composite {
            root: Box::new(root),
            modifier,
        }
    }

    /// Check every pattern for syntax errors.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Pattern(p) if p.trim() == TEXT_PATTERN => Ok(()),
            Self::Pattern(p) => p.parse::<Pattern>().map(drop),
            Self::Composite { root, .. } => root.validate(),
        }
    }
}

impl From<&str> for SelectSpec {
    fn from(source: &str) -> Self {
        Self::pattern(source)
    }
}

impl fmt::Display for SelectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern(p) => f.write_str(p),
            Self::Composite { root, modifier } => write!(f, "{{{root}}}::{modifier}"),
        }
    }
}

/// Pluggable selection strategy.
pub trait Selector<T: Tree> {
    /// Nodes below `root` matching `spec`, never `root` itself.
    ///
    /// # Errors
    ///
    /// [`Error::Usage`] for malformed patterns.
    fn select<'t>(&'t self, tree: &'t T, root: T::Node, spec: &SelectSpec)
    -> Result<Nodes<'t, T::Node>>;
}

// =============================================================================
// PatternSelector
// =============================================================================

/// The bundled selector: CSS-subset patterns over any [`Tree`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternSelector;

impl<T: Tree> Selector<T> for PatternSelector {
    fn select<'t>(
        &'t self,
        tree: &'t T,
        root: T::Node,
        spec: &SelectSpec,
    ) -> Result<Nodes<'t, T::Node>> {
        match spec {
            SelectSpec::Pattern(source) if source.trim() == TEXT_PATTERN => {
                Ok(Box::new(descendants(tree, root).filter(move |&n| tree.is_text(n))))
            }
            SelectSpec::Pattern(source) => {
                let pattern: Pattern = source.parse()?;
                Ok(Box::new(
                    descendants(tree, root).filter(move |&n| pattern.matches(tree, n, Some(root))),
                ))
            }
            SelectSpec::Composite { root: inner, modifier } => {
                let matched = self.select(tree, root, inner)?;
                let nodes: Nodes<'t, T::Node> = match modifier {
                    TextModifier::ChildText => Box::new(matched.flat_map(move |m| {
                        tree.children(m).into_iter().filter(move |&c| tree.is_text(c))
                    })),
                    TextModifier::DescendantText => {
                        // Nested matches would yield the same text twice.
                        let mut last: Option<T::Node> = None;
                        Box::new(
                            matched
                                .filter(move |&m| {
                                    if last.is_some_and(|l| tree.contains(l, m)) {
                                        return false;
                                    }
                                    last = Some(m);
                                    true
                                })
                                .flat_map(move |m| {
                                    descendants(tree, m).filter(move |&n| tree.is_text(n))
                                }),
                        )
                    }
                };
                Ok(nodes)
            }
        }
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// Preorder walk below `root`, excluding `root`.
pub fn descendants<T: Tree>(tree: &T, root: T::Node) -> Descendants<'_, T> {
    Descendants {
        tree,
        root,
        next: tree.first_child(root),
    }
}

/// Iterator returned by [`descendants`].
pub struct Descendants<'t, T: Tree> {
    tree: &'t T,
    root: T::Node,
    next: Option<T::Node>,
}

impl<T: Tree> Iterator for Descendants<'_, T> {
    type Item = T::Node;

    fn next(&mut self) -> Option<T::Node> {
        let current = self.next?;
        self.next = self.tree.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.root {
                    return None;
                }
                if let Some(sibling) = self.tree.next_sibling(node) {
                    return Some(sibling);
                }
                node = self.tree.parent(node)?;
            }
        });
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Dom, NodeId};

    const DOC: &str = "<div><p>a<b>b</b></p><p>c</p></div><p>d<span>e</span></p>";

    fn select(dom: &Dom, root: NodeId, spec: &SelectSpec) -> Vec<NodeId> {
        PatternSelector.select(dom, root, spec).unwrap().collect()
    }

    fn texts(dom: &Dom, nodes: &[NodeId]) -> Vec<String> {
        nodes.iter().map(|&n| dom.text_content(n)).collect()
    }

    #[test]
    fn test_descendants_preorder_excludes_root() {
        let dom = Dom::parse("<a><b></b><c><d></d></c></a><e></e>").unwrap();
        let tags: Vec<_> = descendants(&dom, dom.root())
            .filter_map(|n| dom.tag_name(n))
            .collect();
        assert_eq!(tags, ["a", "b", "c", "d", "e"]);

        let a = dom.first_child(dom.root()).unwrap();
        let tags: Vec<_> = descendants(&dom, a).filter_map(|n| dom.tag_name(n)).collect();
        assert_eq!(tags, ["b", "c", "d"]);
    }

    #[test]
    fn test_select_pattern_in_document_order() {
        let dom = Dom::parse(DOC).unwrap();
        let ps = select(&dom, dom.root(), &"p".into());
        assert_eq!(texts(&dom, &ps), ["ab", "c", "de"]);

        let nested = select(&dom, dom.root(), &"div > p, span".into());
        assert_eq!(texts(&dom, &nested), ["ab", "c", "e"]);
    }

    #[test]
    fn test_select_never_yields_root() {
        let dom = Dom::parse(DOC).unwrap();
        let div = dom.first_child(dom.root()).unwrap();
        let found = select(&dom, div, &"div, p".into());
        assert_eq!(texts(&dom, &found), ["ab", "c"]);
    }

    #[test]
    fn test_select_text_pattern() {
        let dom = Dom::parse(DOC).unwrap();
        let found = select(&dom, dom.root(), &TEXT_PATTERN.into());
        assert_eq!(texts(&dom, &found), ["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_composite_text_selection() {
        let dom = Dom::parse(DOC).unwrap();

        let child = SelectSpec::composite("p".into(), TextModifier::ChildText);
        assert_eq!(texts(&dom, &select(&dom, dom.root(), &child)), ["a", "c", "d"]);

        let below = SelectSpec::composite("p".into(), TextModifier::DescendantText);
        assert_eq!(
            texts(&dom, &select(&dom, dom.root(), &below)),
            ["a", "b", "c", "d", "e"]
        );

        // Nested roots do not duplicate text.
        let nested = SelectSpec::composite("div, p".into(), TextModifier::DescendantText);
        assert_eq!(
            texts(&dom, &select(&dom, dom.root(), &nested)),
            ["a", "b", "c", "d", "e"]
        );
    }

    #[test]
    fn test_selection_is_lazy() {
        let dom = Dom::parse(DOC).unwrap();
        let first = PatternSelector
            .select(&dom, dom.root(), &"p".into())
            .unwrap()
            .next();
        assert_eq!(first.map(|n| dom.text_content(n)).as_deref(), Some("ab"));
    }

    #[test]
    fn test_bad_specs_are_usage_errors() {
        let dom = Dom::parse(DOC).unwrap();
        assert!(matches!(
            PatternSelector.select(&dom, dom.root(), &"p >".into()),
            Err(Error::Usage(_))
        ));
        assert!(matches!("sideways-text".parse::<TextModifier>(), Err(Error::Usage(_))));

        let spec = SelectSpec::composite("div >".into(), TextModifier::ChildText);
        assert!(spec.validate().is_err());
        assert!(SelectSpec::from(TEXT_PATTERN).validate().is_ok());
    }
}
