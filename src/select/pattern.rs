//! CSS-subset patterns.
//!
//! ```text
//! pattern   := group ("," group)*
//! group     := compound (combinator compound)*
//! combinator:= whitespace | ">"
//! compound  := ("*" | tag)? ("#" id | "." class | "[" attr ("=" value)? "]")*
//! ```
//!
//! Matching runs right to left. Ancestors are only considered up to and
//! including the scope node, so a pattern evaluated under a subtree never
//! looks outside of it.

use std::str::FromStr;

use crate::tree::Tree;
use crate::{Error, Result};

/// A parsed pattern: one or more comma-separated groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    source: String,
    groups: Vec<Group>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Group {
    /// Compounds left to right.
    parts: Vec<Compound>,
    /// `combinators[i]` joins `parts[i]` and `parts[i + 1]`.
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrTest {
    name: String,
    value: Option<String>,
}

impl Pattern {
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches, looking at ancestors up to `scope`
    /// (or the tree root when `scope` is `None`).
    pub fn matches<T: Tree>(&self, tree: &T, node: T::Node, scope: Option<T::Node>) -> bool {
        self.groups
            .iter()
            .any(|g| g.matches_at(tree, node, scope, g.parts.len() - 1))
    }
}

impl FromStr for Pattern {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        let groups = source
            .split(',')
            .map(|group| Parser::new(source, group).group())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            source: source.trim().to_string(),
            groups,
        })
    }
}

impl Group {
    fn matches_at<T: Tree>(
        &self,
        tree: &T,
        node: T::Node,
        scope: Option<T::Node>,
        index: usize,
    ) -> bool {
        if !self.parts[index].matches(tree, node) {
            return false;
        }
        if index == 0 {
            return true;
        }

        match self.combinators[index - 1] {
            Combinator::Child => {
                if Some(node) == scope {
                    return false;
                }
                tree.parent(node)
                    .is_some_and(|p| self.matches_at(tree, p, scope, index - 1))
            }
            Combinator::Descendant => {
                let mut current = node;
                while Some(current) != scope
                    && let Some(ancestor) = tree.parent(current)
                {
                    if self.matches_at(tree, ancestor, scope, index - 1) {
                        return true;
                    }
                    current = ancestor;
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches<T: Tree>(&self, tree: &T, node: T::Node) -> bool {
        let Some(tag) = tree.tag_name(node) else {
            return false;
        };
        if let Some(want) = &self.tag
            && !tag.eq_ignore_ascii_case(want)
        {
            return false;
        }
        if let Some(id) = &self.id
            && tree.attr(node, "id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|c| tree.has_class(node, c)) {
            return false;
        }
        self.attrs.iter().all(|test| match (&test.value, tree.attr(node, &test.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(want), Some(have)) => want == have,
        })
    }
}

// =============================================================================
// Parser
// =============================================================================

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Parser<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, group: &'a str) -> Self {
        Self {
            source,
            rest: group,
        }
    }

    fn error(&self, message: &str) -> Error {
        Error::usage(format!("pattern `{}`: {message}", self.source.trim()))
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    /// Skip whitespace, returning whether any was skipped.
    fn skip_ws(&mut self) -> bool {
        let trimmed = self.rest.trim_start();
        let skipped = trimmed.len() != self.rest.len();
        self.rest = trimmed;
        skipped
    }

    fn ident(&mut self) -> &'a str {
        let end = self
            .rest
            .find(|c: char| !is_ident_char(c))
            .unwrap_or(self.rest.len());
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        ident
    }

    fn required_ident(&mut self, what: &str) -> Result<String> {
        match self.ident() {
            "" => Err(self.error(&format!("expected {what} name"))),
            name => Ok(name.to_string()),
        }
    }

    fn group(mut self) -> Result<Group> {
        self.skip_ws();
        if self.rest.is_empty() {
            return Err(self.error("empty selector group"));
        }

        let mut parts = vec![self.compound()?];
        let mut combinators = Vec::new();

        loop {
            let spaced = self.skip_ws();
            let combinator = match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if spaced => Combinator::Descendant,
                Some(c) => return Err(self.error(&format!("unexpected `{c}`"))),
            };
            combinators.push(combinator);
            parts.push(self.compound()?);
        }

        Ok(Group { parts, combinators })
    }

    fn compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.peek() == Some('*') {
            self.bump();
            any = true;
        } else {
            let tag = self.ident();
            if !tag.is_empty() {
                compound.tag = Some(tag.to_ascii_lowercase());
                any = true;
            }
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.id = Some(self.required_ident("id")?);
                }
                Some('.') => {
                    self.bump();
                    compound.classes.push(self.required_ident("class")?);
                }
                Some('[') => {
                    self.bump();
                    compound.attrs.push(self.attr_test()?);
                }
                _ => break,
            }
            any = true;
        }

        if !any {
            return Err(match self.peek() {
                Some(c) => self.error(&format!("unexpected `{c}`")),
                None => self.error("expected a selector after combinator"),
            });
        }
        Ok(compound)
    }

    fn attr_test(&mut self) -> Result<AttrTest> {
        self.skip_ws();
        let name = self.required_ident("attribute")?;
        self.skip_ws();

        let value = match self.bump() {
            Some(']') => return Ok(AttrTest { name, value: None }),
            Some('=') => {
                self.skip_ws();
                self.attr_value()?
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_ws();
        if self.bump() != Some(']') {
            return Err(self.error("missing `]`"));
        }
        Ok(AttrTest {
            name,
            value: Some(value),
        })
    }

    fn attr_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let end = self
                    .rest
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated quoted value"))?;
                let value = self.rest[..end].to_string();
                self.rest = &self.rest[end + 1..];
                Ok(value)
            }
            _ => {
                let value = self.ident();
                if value.is_empty() {
                    return Err(self.error("empty attribute value"));
                }
                Ok(value.to_string())
            }
        }
    }
}
