//! Operation registry.
//!
//! An operation is registered under a name as a factory: given the rule's
//! argument it builds a [`Transform`], which the interpreter then applies to
//! every node of the selection.
//!
//! # Modules
//!
//! - `structure`: remove, unwrap, replace, wrap, wrap_inner
//! - `attrs`: attribute and class editing

mod attrs;
mod structure;

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::chain::Direction;
use crate::resolve::Spec;
use crate::tree::{Predicate, Tree};
use crate::{Error, Result};

/// Per-node transform built by an operation.
pub type Transform<T> = Box<dyn FnMut(&mut T, <T as Tree>::Node) -> Result<()>>;

/// Operation factory: argument → transform.
pub type OpFactory<T> = Rc<dyn Fn(&OpArg<T>) -> Result<Transform<T>>>;

/// Wrap a closure as an [`OpFactory`].
pub fn factory<T, F>(f: F) -> OpFactory<T>
where
    T: Tree,
    F: Fn(&OpArg<T>) -> Result<Transform<T>> + 'static,
{
    Rc::new(f)
}

/// Wrap a closure as a [`Transform`].
pub fn transform<T, F>(f: F) -> Transform<T>
where
    T: Tree,
    F: FnMut(&mut T, T::Node) -> Result<()> + 'static,
{
    Box::new(f)
}

// =============================================================================
// Arguments
// =============================================================================

/// Argument of a rule's operation.
pub enum OpArg<T: Tree> {
    None,
    Text(String),
    List(Vec<String>),
    Pairs(Vec<(String, String)>),
    Spec(Spec<T>),
    Wraps(WrapArg<T>),
}

/// Chain-targeting argument: which chain to act on and what to put there.
pub struct WrapArg<T: Tree> {
    pub with: Option<Spec<T>>,
    pub direction: Option<Direction<T>>,
    pub trim: Option<Predicate<T>>,
}

impl<T: Tree> Default for WrapArg<T> {
    fn default() -> Self {
        Self {
            with: None,
            direction: None,
            trim: None,
        }
    }
}

impl<T: Tree> OpArg<T> {
    /// Human-readable shape, for error messages.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::None => "no argument",
            Self::Text(_) => "a string",
            Self::List(_) => "a list",
            Self::Pairs(_) => "key/value pairs",
            Self::Spec(_) => "a spec",
            Self::Wraps(_) => "a chain table",
        }
    }

    fn mismatch(&self, op: &str, expected: &str) -> Error {
        Error::usage(format!(
            "operation `{op}` expects {expected}, got {}",
            self.shape()
        ))
    }

    /// One or more names, from a whitespace-separated string or a list.
    fn names(&self, op: &str) -> Result<Vec<String>> {
        let names: Vec<String> = match self {
            Self::Text(s) => s.split_whitespace().map(str::to_string).collect(),
            Self::List(items) => items.clone(),
            _ => return Err(self.mismatch(op, "one or more names")),
        };
        if names.is_empty() {
            return Err(Error::usage(format!("operation `{op}` needs at least one name")));
        }
        Ok(names)
    }

    fn pairs(&self, op: &str) -> Result<Vec<(String, String)>> {
        match self {
            Self::Pairs(pairs) => Ok(pairs.clone()),
            _ => Err(self.mismatch(op, "key/value pairs")),
        }
    }

    /// Chain location: direction (default `self`) and trim predicate.
    fn locate(&self, op: &str) -> Result<(Direction<T>, Option<Predicate<T>>)> {
        match self {
            Self::None => Ok((Direction::Node, None)),
            Self::Text(token) => Ok((token.parse()?, None)),
            Self::List(tokens) => Ok((Direction::from_tokens(tokens)?, None)),
            Self::Wraps(WrapArg { with: None, direction, trim }) => Ok((
                direction.clone().unwrap_or(Direction::Node),
                trim.clone(),
            )),
            _ => Err(self.mismatch(op, "a direction or a chain table without `with`")),
        }
    }

    /// Replacement spec plus the chain it applies to.
    fn replacement(&self, op: &str) -> Result<(Spec<T>, Direction<T>, Option<Predicate<T>>)> {
        let (spec, direction, trim) = match self {
            Self::Wraps(WrapArg { with: Some(spec), direction, trim }) => (
                spec.clone(),
                direction.clone().unwrap_or(Direction::Node),
                trim.clone(),
            ),
            Self::Wraps(_) => {
                return Err(Error::usage(format!("operation `{op}` needs a `with` spec")));
            }
            other => (other.spec(op)?, Direction::Node, None),
        };
        Ok((spec, direction, trim))
    }

    /// A spec, from a template string, a list of templates or a spec.
    fn spec(&self, op: &str) -> Result<Spec<T>> {
        let spec = match self {
            Self::Text(s) => Spec::template(s.as_str()),
            Self::List(items) => Spec::list(items.iter().map(|s| Spec::template(s.as_str()))),
            Self::Spec(spec) => spec.clone(),
            _ => return Err(self.mismatch(op, "a template, a template list or a spec")),
        };
        spec.validate()?;
        Ok(spec)
    }
}

impl<T: Tree> From<&str> for OpArg<T> {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl<T: Tree> From<Spec<T>> for OpArg<T> {
    fn from(spec: Spec<T>) -> Self {
        Self::Spec(spec)
    }
}

impl<T: Tree> fmt::Debug for OpArg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Text(s) => write!(f, "Text({s:?})"),
            Self::List(items) => write!(f, "List({items:?})"),
            Self::Pairs(pairs) => write!(f, "Pairs({pairs:?})"),
            Self::Spec(spec) => write!(f, "Spec({spec:?})"),
            Self::Wraps(w) => f
                .debug_struct("Wraps")
                .field("with", &w.with)
                .field("direction", &w.direction)
                .field("trim", &w.trim.as_ref().map(|_| "<fn>"))
                .finish(),
        }
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Name → factory map. Built once, never mutated; overrides produce a new map.
pub struct Registry<T: Tree> {
    ops: FxHashMap<String, OpFactory<T>>,
}

impl<T: Tree> Registry<T> {
    /// The standard operations.
    pub fn standard() -> Self
    where
        T: 'static,
    {
        let mut ops: FxHashMap<String, OpFactory<T>> = FxHashMap::default();
        for (name, op) in structure::ops::<T>().into_iter().chain(attrs::ops::<T>()) {
            ops.insert(name.to_string(), op);
        }
        Self { ops }
    }

    /// A new registry with `overrides` layered over this one.
    pub fn with_overrides<I>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (String, OpFactory<T>)>,
    {
        let mut ops = self.ops.clone();
        ops.extend(overrides);
        Self { ops }
    }

    pub fn get(&self, name: &str) -> Option<&OpFactory<T>> {
        self.ops.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ops.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ops.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<T: Tree + 'static> Default for Registry<T> {
    fn default() -> Self {
        Self::standard()
    }
}

/// Standard operation names, sorted.
pub fn standard_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = structure::NAMES
        .iter()
        .chain(attrs::NAMES.iter())
        .copied()
        .collect();
    names.sort_unstable();
    names
}
