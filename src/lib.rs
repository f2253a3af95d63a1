//! rewrap - rule-driven rewriting of markup trees.
//!
//! A ruleset is an ordered list of rules. Each rule selects nodes (or
//! inherits the previous rule's selection), filters them, and applies a
//! named operation. The structural operations work on wrap chains: a node
//! together with the single-child elements stacked around or inside it.
//!
//! # Module Structure
//!
//! ```text
//! src/
//! ├── tree       # Tree adapter trait, predicates
//! ├── dom        # bundled arena tree + HTML parse/render
//! ├── chain      # WrapChain, discovery, swap/unwrap/wrap surgery
//! ├── resolve    # lazy node/chain specs and element templates
//! ├── select     # Selector trait, CSS-subset PatternSelector
//! ├── ops        # operation registry (structure + attribute ops)
//! ├── rules      # Rule, Ruleset, Interpreter
//! ├── config     # rewrap.toml loading and validation
//! ├── logger     # colored stderr logging
//! └── error      # Error, Result
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rewrap::{Dom, Interpreter, PatternSelector, Rule};
//!
//! let mut dom = Dom::parse("<p><b><i>x</i></b></p>")?;
//! let rules = vec![Rule::select("b").op("unwrap").arg("self").into()];
//! let root = dom.root();
//! Interpreter::new(rules, PatternSelector).execute(&mut dom, root, None, None)?;
//! assert_eq!(dom.to_html(), "<p><i>x</i></p>");
//! ```

pub mod chain;
pub mod config;
pub mod dom;
pub mod error;
pub mod logger;
pub mod ops;
pub mod resolve;
pub mod rules;
pub mod select;
pub mod tree;

pub use chain::{Direction, WrapChain};
pub use dom::{Dom, NodeId};
pub use error::{Error, Result};
pub use ops::{OpArg, Registry, WrapArg};
pub use resolve::Spec;
pub use rules::{Entry, Interpreter, Rule, Ruleset};
pub use select::{PatternSelector, SelectSpec, Selector};
pub use tree::{Predicate, Tree, predicate};
