//! Rules and rulesets.
//!
//! A ruleset is an ordered list of entries. Each entry is either a [`Rule`]
//! or a nested ruleset, which runs with the enclosing selection as its seed.
//!
//! ```ignore
//! let ruleset = vec![
//!     Rule::select("span").into(),
//!     Rule::new().op("unwrap").into(),
//! ];
//! ```

mod interpreter;

pub use interpreter::{Interpreter, Selection};

use std::fmt;

use crate::ops::OpArg;
use crate::select::SelectSpec;
use crate::tree::{Predicate, Tree};

/// Ordered list of rules and nested rulesets.
pub type Ruleset<T> = Vec<Entry<T>>;

pub enum Entry<T: Tree> {
    Rule(Rule<T>),
    Nested(Ruleset<T>),
}

impl<T: Tree> From<Rule<T>> for Entry<T> {
    fn from(rule: Rule<T>) -> Self {
        Self::Rule(rule)
    }
}

impl<T: Tree> From<Ruleset<T>> for Entry<T> {
    fn from(ruleset: Ruleset<T>) -> Self {
        Self::Nested(ruleset)
    }
}

impl<T: Tree> fmt::Debug for Entry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rule(rule) => fmt::Debug::fmt(rule, f),
            Self::Nested(entries) => f.debug_tuple("Nested").field(entries).finish(),
        }
    }
}

/// One step of a ruleset.
///
/// - `select` replaces the selection; `default_select` only applies when no
///   selection exists yet.
/// - `only_if` / `except` filter it.
/// - `op` with `arg` names the operation applied to each selected node.
pub struct Rule<T: Tree> {
    pub name: Option<String>,
    pub select: Option<SelectSpec>,
    pub default_select: Option<SelectSpec>,
    pub only_if: Option<Predicate<T>>,
    pub except: Option<Predicate<T>>,
    pub op: Option<String>,
    pub arg: OpArg<T>,
}

impl<T: Tree> Default for Rule<T> {
    fn default() -> Self {
        Self {
            name: None,
            select: None,
            default_select: None,
            only_if: None,
            except: None,
            op: None,
            arg: OpArg::None,
        }
    }
}

impl<T: Tree> Rule<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rule starting from a fresh selection.
    pub fn select(spec: impl Into<SelectSpec>) -> Self {
        Self {
            select: Some(spec.into()),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn default_select(mut self, spec: impl Into<SelectSpec>) -> Self {
        self.default_select = Some(spec.into());
        self
    }

    pub fn only_if(mut self, predicate: Predicate<T>) -> Self {
        self.only_if = Some(predicate);
        self
    }

    pub fn except(mut self, predicate: Predicate<T>) -> Self {
        self.except = Some(predicate);
        self
    }

    pub fn op(mut self, name: impl Into<String>) -> Self {
        self.op = Some(name.into());
        self
    }

    pub fn arg(mut self, arg: impl Into<OpArg<T>>) -> Self {
        self.arg = arg.into();
        self
    }

    /// The rule's name, or its position path (`2.1`) when unnamed.
    pub fn label(&self, path: &[usize]) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => path
                .iter()
                .map(usize::to_string)
                .collect::<Vec<_>>()
                .join("."),
        }
    }

    fn has_filter(&self) -> bool {
        self.only_if.is_some() || self.except.is_some()
    }
}

impl<T: Tree> fmt::Debug for Rule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("select", &self.select)
            .field("default_select", &self.default_select)
            .field("only_if", &self.only_if.as_ref().map(|_| "<fn>"))
            .field("except", &self.except.as_ref().map(|_| "<fn>"))
            .field("op", &self.op)
            .field("arg", &self.arg)
            .finish()
    }
}
