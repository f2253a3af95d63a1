//! HTML serialization.

use std::borrow::Cow;
use std::fmt::Write;

use super::parse::is_raw_text_element;
use super::{Dom, NodeId, NodeKind};

impl Dom {
    /// Serialize the whole document.
    pub fn to_html(&self) -> String {
        self.render(self.root)
    }

    /// Serialize `node` and its subtree. The document node renders only its
    /// children.
    pub fn render(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(&mut out, node, false);
        out
    }

    fn write_node(&self, out: &mut String, node: NodeId, raw_text: bool) {
        let data = self.data(node);
        match &data.kind {
            NodeKind::Document => {
                for &child in &data.children {
                    self.write_node(out, child, false);
                }
            }
            NodeKind::Element { tag, attrs } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    if value.is_empty() {
                        let _ = write!(out, " {name}");
                    } else {
                        let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
                    }
                }
                out.push('>');

                if is_void_element(tag) {
                    return;
                }

                let raw = is_raw_text_element(tag);
                for &child in &data.children {
                    self.write_node(out, child, raw);
                }
                let _ = write!(out, "</{tag}>");
            }
            NodeKind::Text(text) if raw_text => out.push_str(text),
            NodeKind::Text(text) => out.push_str(&escape_text(text)),
            NodeKind::Comment(text) => {
                let _ = write!(out, "<!--{text}-->");
            }
        }
    }
}

/// Elements that never have children or a closing tag.
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

fn escape_text(s: &str) -> Cow<'_, str> {
    escape_with(s, &['<', '>', '&'])
}

fn escape_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, &['&', '"'])
}

fn escape_with<'a>(s: &'a str, special: &[char]) -> Cow<'a, str> {
    if !s.contains(special) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        match c {
            '<' if special.contains(&c) => out.push_str("&lt;"),
            '>' if special.contains(&c) => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' if special.contains(&c) => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}
