//! Element templates: `tag[#id][.class]*[@key["="value]]*`.
//!
//! | Token          | Example              | Effect                    |
//! |----------------|----------------------|---------------------------|
//! | tag (required) | `figure`             | element name              |
//! | `#id`          | `#main`              | `id` attribute            |
//! | `.class`       | `.note.wide`         | appended to `class`       |
//! | `@key`         | `@hidden`            | empty attribute           |
//! | `@key=value`   | `@role=note`         | value up to the next `@`  |
//! | `@key="value"` | `@title="a \"b\""`   | `\"` and `\\` escapes     |

use std::fmt;
use std::str::FromStr;

use crate::tree::Tree;
use crate::{Error, Result};

/// Parsed element template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementTemplate {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<(String, String)>,
}

impl ElementTemplate {
    /// Create a new detached element described by this template.
    pub fn instantiate<T: Tree>(&self, tree: &mut T) -> T::Node {
        let node = tree.create_element(&self.tag);
        if let Some(id) = &self.id {
            tree.set_attr(node, "id", id);
        }
        if !self.classes.is_empty() {
            tree.set_attr(node, "class", &self.classes.join(" "));
        }
        for (key, value) in &self.attrs {
            tree.set_attr(node, key, value);
        }
        node
    }
}

impl FromStr for ElementTemplate {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        Scanner::new(source).template()
    }
}

impl fmt::Display for ElementTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)?;
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        for (key, value) in &self.attrs {
            if value.is_empty() {
                write!(f, "@{key}")?;
            } else {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                write!(f, "@{key}=\"{escaped}\"")?;
            }
        }
        Ok(())
    }
}

// =============================================================================
// Scanner
// =============================================================================

/// Characters that end a name token.
const DELIMITERS: [char; 5] = ['#', '.', '@', '=', '"'];

struct Scanner<'a> {
    source: &'a str,
    rest: &'a str,
}

impl<'a> Scanner<'a> {
    fn new(source: &'a str) -> Self {
        let trimmed = source.trim();
        Self {
            source: trimmed,
            rest: trimmed,
        }
    }

    fn error(&self, message: impl fmt::Display) -> Error {
        Error::usage(format!("template `{}`: {message}", self.source))
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.rest = &self.rest[c.len_utf8()..];
        Some(c)
    }

    /// Read a name up to the next delimiter or whitespace.
    fn name(&mut self) -> &'a str {
        let end = self
            .rest
            .find(|c: char| DELIMITERS.contains(&c) || c.is_whitespace())
            .unwrap_or(self.rest.len());
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        name
    }

    fn template(mut self) -> Result<ElementTemplate> {
        let tag = self.name();
        if tag.is_empty() {
            return Err(self.error("missing a tag name"));
        }

        let mut template = ElementTemplate {
            tag: tag.to_string(),
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        };

        while let Some(c) = self.bump() {
            match c {
                '#' => {
                    let id = self.required_name("id")?;
                    if template.id.replace(id).is_some() {
                        return Err(self.error("more than one `#id`"));
                    }
                }
                '.' => {
                    let class = self.required_name("class")?;
                    template.classes.push(class);
                }
                '@' => {
                    let key = self.required_name("attribute")?;
                    let value = if self.peek() == Some('=') {
                        self.bump();
                        self.value()?
                    } else {
                        String::new()
                    };
                    template.attrs.push((key, value));
                }
                other => return Err(self.error(format_args!("unexpected `{other}`"))),
            }
        }

        Ok(template)
    }

    fn required_name(&mut self, what: &str) -> Result<String> {
        let name = self.name();
        if name.is_empty() {
            return Err(self.error(format_args!("empty {what} name")));
        }
        Ok(name.to_string())
    }

    /// Attribute value: quoted with escapes, or bare up to the next `@`.
    fn value(&mut self) -> Result<String> {
        if self.peek() != Some('"') {
            let end = self.rest.find('@').unwrap_or(self.rest.len());
            let (value, rest) = self.rest.split_at(end);
            self.rest = rest;
            return Ok(value.to_string());
        }

        self.bump();
        let mut value = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some(escaped) => value.push(escaped),
                    None => break,
                },
                Some(c) => value.push(c),
                None => break,
            }
        }
        Err(self.error("unterminated quoted value"))
    }
}
