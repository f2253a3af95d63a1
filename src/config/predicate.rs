//! Named predicates usable in `only_if`, `except` and `trim`.
//!
//! | Name              | True for                                    |
//! |-------------------|---------------------------------------------|
//! | `blank`           | text nodes holding only whitespace          |
//! | `empty`           | nodes without children or text              |
//! | `text`            | text nodes                                  |
//! | `element`         | element nodes                               |
//! | `tag:NAME`        | elements named `NAME`                       |
//! | `has-class:NAME`  | elements carrying class `NAME`              |
//! | `has-attr:NAME`   | elements carrying attribute `NAME`          |
//! | `matches:PATTERN` | elements matching a selector pattern        |

use crate::select::Pattern;
use crate::tree::{Predicate, Tree, predicate};

/// Names accepted by [`named`], for hints.
pub const PREDICATE_NAMES: &str =
    "blank, empty, text, element, tag:NAME, has-class:NAME, has-attr:NAME, matches:PATTERN";

/// Look up a predicate by name.
///
/// # Errors
///
/// A description of what is wrong with `name`.
pub fn named<T: Tree>(name: &str) -> Result<Predicate<T>, String> {
    let (head, param) = match name.split_once(':') {
        Some((head, param)) => (head.trim(), Some(param.trim())),
        None => (name.trim(), None),
    };

    let pred = match (head, param) {
        ("blank", None) => predicate(|tree: &T, n| {
            Ok(tree.text(n).is_some_and(|t| t.trim().is_empty()))
        }),
        ("empty", None) => predicate(|tree: &T, n| {
            Ok(tree.child_count(n) == 0 && tree.text(n).is_none_or(str::is_empty))
        }),
        ("text", None) => predicate(|tree: &T, n| Ok(tree.is_text(n))),
        ("element", None) => predicate(|tree: &T, n| Ok(tree.is_element(n))),
        (_, Some("")) => return Err(format!("predicate `{head}` needs a non-empty parameter")),
        ("tag", Some(tag)) => {
            let tag = tag.to_ascii_lowercase();
            predicate(move |tree: &T, n| {
                Ok(tree.tag_name(n).is_some_and(|t| t.eq_ignore_ascii_case(&tag)))
            })
        }
        ("has-class", Some(class)) => {
            let class = class.to_string();
            predicate(move |tree: &T, n| Ok(tree.has_class(n, &class)))
        }
        ("has-attr", Some(attr)) => {
            let attr = attr.to_string();
            predicate(move |tree: &T, n| Ok(tree.attr(n, &attr).is_some()))
        }
        ("matches", Some(source)) => {
            let pattern: Pattern = source.parse().map_err(|e| format!("{e}"))?;
            predicate(move |tree: &T, n| Ok(pattern.matches(tree, n, None)))
        }
        ("blank" | "empty" | "text" | "element", Some(_)) => {
            return Err(format!("predicate `{head}` takes no parameter"));
        }
        ("tag" | "has-class" | "has-attr" | "matches", None) => {
            return Err(format!("predicate `{head}` needs a parameter, e.g. `{head}:NAME`"));
        }
        _ => return Err(format!("unknown predicate `{name}`")),
    };
    Ok(pred)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{Dom, NodeId};

    fn check(name: &str, dom: &Dom, node: NodeId) -> bool {
        named::<Dom>(name).unwrap()(dom, node).unwrap()
    }

    #[test]
    fn test_node_kind_predicates() {
        let dom = Dom::parse(r#"<p class="a" id="x"> </p><i></i>t"#).unwrap();
        let &[p, i, t] = &dom.children(dom.root())[..] else {
            panic!("unexpected fixture");
        };
        let space = dom.first_child(p).unwrap();

        assert!(check("blank", &dom, space));
        assert!(!check("blank", &dom, t));
        assert!(!check("blank", &dom, p));
        assert!(check("empty", &dom, i));
        assert!(!check("empty", &dom, p));
        assert!(check("text", &dom, t));
        assert!(check("element", &dom, p));
    }

    #[test]
    fn test_parameterized_predicates() {
        let dom = Dom::parse(r#"<div><p class="a" data-k="1">x</p></div>"#).unwrap();
        let div = dom.first_child(dom.root()).unwrap();
        let p = dom.first_child(div).unwrap();

        assert!(check("tag:P", &dom, p));
        assert!(check("has-class:a", &dom, p));
        assert!(!check("has-class:b", &dom, p));
        assert!(check("has-attr:data-k", &dom, p));
        assert!(check("matches:div > p.a", &dom, p));
        assert!(!check("matches:section p", &dom, p));
    }

    #[test]
    fn test_unknown_and_malformed_names() {
        for name in ["odd", "tag", "tag:", "blank:x", "matches:p >"] {
            assert!(named::<Dom>(name).is_err(), "{name}");
        }
    }
}
