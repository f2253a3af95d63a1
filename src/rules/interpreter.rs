//! Ruleset interpreter.
//!
//! Walks a ruleset in order, threading the current selection from rule to
//! rule. Nested rulesets receive the selection as their seed; whatever they
//! select stays local to them.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::{Entry, Rule, Ruleset};
use crate::ops::{OpFactory, Registry};
use crate::select::Selector;
use crate::tree::Tree;
use crate::{Error, Result, debug};

/// A materialized, deduplicated selection in document order.
pub type Selection<N> = Rc<[N]>;

/// Executes rulesets against a tree.
pub struct Interpreter<T: Tree> {
    ruleset: Ruleset<T>,
    registry: Registry<T>,
    selector: Box<dyn Selector<T>>,
}

impl<T: Tree> Interpreter<T> {
    /// Interpreter over the standard operations.
    pub fn new(ruleset: Ruleset<T>, selector: impl Selector<T> + 'static) -> Self
    where
        T: 'static,
    {
        Self {
            ruleset,
            registry: Registry::standard(),
            selector: Box::new(selector),
        }
    }

    /// Interpreter over the standard operations with `overrides` layered on
    /// top. Names in `overrides` shadow standard ones.
    pub fn with_overrides<I>(
        ruleset: Ruleset<T>,
        selector: impl Selector<T> + 'static,
        overrides: I,
    ) -> Self
    where
        T: 'static,
        I: IntoIterator<Item = (String, OpFactory<T>)>,
    {
        Self {
            ruleset,
            registry: Registry::standard().with_overrides(overrides),
            selector: Box::new(selector),
        }
    }

    pub fn ruleset(&self) -> &Ruleset<T> {
        &self.ruleset
    }

    pub fn registry(&self) -> &Registry<T> {
        &self.registry
    }

    /// Run `ruleset` (the interpreter's own when `None`) below `root`.
    ///
    /// `initial` seeds the selection. Returns `root`. Nothing is rolled back
    /// when a rule fails: the tree keeps every change made before it.
    ///
    /// # Errors
    ///
    /// [`Error::Rule`] for rules that cannot run, plus any error raised by
    /// selectors, predicates, operations or the tree adapter.
    pub fn execute(
        &self,
        tree: &mut T,
        root: T::Node,
        ruleset: Option<&Ruleset<T>>,
        initial: Option<Vec<T::Node>>,
    ) -> Result<T::Node> {
        let entries = ruleset.unwrap_or(&self.ruleset);
        let seed = initial.map(|nodes| dedup(nodes).into());
        let mut path = Vec::new();
        self.run(tree, root, entries, seed, &mut path)?;
        Ok(root)
    }

    fn run(
        &self,
        tree: &mut T,
        root: T::Node,
        entries: &[Entry<T>],
        mut selection: Option<Selection<T::Node>>,
        path: &mut Vec<usize>,
    ) -> Result<()> {
        for (index, entry) in entries.iter().enumerate() {
            path.push(index);
            match entry {
                Entry::Nested(nested) => {
                    self.run(tree, root, nested, selection.clone(), path)?;
                }
                Entry::Rule(rule) => {
                    let label = rule.label(path);
                    let result = self.apply(tree, root, rule, &label, selection.as_ref());
                    match result {
                        Ok(next) => selection = Some(next),
                        Err(err) => {
                            debug!("rule"; "`{}` failed: {}", label, err);
                            return Err(err);
                        }
                    }
                }
            }
            path.pop();
        }
        Ok(())
    }

    /// Run one rule and return the selection it leaves behind.
    fn apply(
        &self,
        tree: &mut T,
        root: T::Node,
        rule: &Rule<T>,
        label: &str,
        current: Option<&Selection<T::Node>>,
    ) -> Result<Selection<T::Node>> {
        let spec = match (&rule.select, current) {
            (Some(spec), _) => Some(spec),
            (None, None) => rule.default_select.as_ref(),
            (None, Some(_)) => None,
        };

        let selection: Selection<T::Node> = match (spec, current) {
            (Some(spec), _) => {
                let raw = self.selector.select(tree, root, spec)?;
                filter(tree, raw, rule)?.into()
            }
            (None, Some(current)) if rule.has_filter() => {
                filter(tree, current.iter().copied(), rule)?.into()
            }
            (None, Some(current)) => Rc::clone(current),
            (None, None) => {
                return Err(Error::rule(
                    label,
                    "no selection: add `select` or `default_select`, or seed the interpreter",
                ));
            }
        };

        let Some(name) = &rule.op else {
            if spec.is_none() && !rule.has_filter() {
                return Err(Error::rule(
                    label,
                    "rule neither alters selection nor performs an operation",
                ));
            }
            debug!("rule"; "`{}` selected {} node(s)", label, selection.len());
            return Ok(selection);
        };

        let factory = self
            .registry
            .get(name)
            .ok_or_else(|| Error::rule(label, format!("operation `{name}` is not registered")))?;
        let mut transform = factory(&rule.arg)?;

        debug!("rule"; "`{}` applies `{}` to {} node(s)", label, name, selection.len());
        for &node in selection.iter() {
            transform(tree, node)?;
        }
        Ok(selection)
    }
}

/// Deduplicate, keep nodes accepted by the rule's predicates, materialize.
fn filter<T: Tree>(
    tree: &T,
    nodes: impl Iterator<Item = T::Node>,
    rule: &Rule<T>,
) -> Result<Vec<T::Node>> {
    let mut seen = FxHashSet::default();
    let mut out = Vec::new();
    for node in nodes {
        if !seen.insert(node) {
            continue;
        }
        if let Some(only_if) = &rule.only_if
            && !only_if(tree, node)?
        {
            continue;
        }
        if let Some(except) = &rule.except
            && except(tree, node)?
        {
            continue;
        }
        out.push(node);
    }
    Ok(out)
}

fn dedup<N: Copy + Eq + std::hash::Hash>(nodes: Vec<N>) -> Vec<N> {
    let mut seen = FxHashSet::default();
    nodes.into_iter().filter(|n| seen.insert(*n)).collect()
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::dom::{Dom, NodeId};
    use crate::ops::{OpArg, factory, transform};
    use crate::select::{PatternSelector, TEXT_PATTERN};
    use crate::tree::{Predicate, predicate};

    fn blank() -> Predicate<Dom> {
        predicate(|dom: &Dom, n: NodeId| Ok(dom.text(n).is_some_and(|t| t.trim().is_empty())))
    }

    fn tag(name: &'static str) -> Predicate<Dom> {
        predicate(move |dom: &Dom, n: NodeId| Ok(dom.tag_name(n) == Some(name)))
    }

    fn run(source: &str, ruleset: Ruleset<Dom>) -> Result<String> {
        let mut dom = Dom::parse(source).unwrap();
        let root = dom.root();
        let interpreter = Interpreter::new(ruleset, PatternSelector);
        let returned = interpreter.execute(&mut dom, root, None, None)?;
        assert_eq!(returned, root);
        Ok(dom.to_html())
    }

    /// Registry override recording every node it is applied to.
    fn recorder(log: &Rc<RefCell<Vec<String>>>) -> (String, OpFactory<Dom>) {
        let log = Rc::clone(log);
        let op = factory(move |_: &OpArg<Dom>| {
            let log = Rc::clone(&log);
            Ok(transform(move |dom: &mut Dom, n: NodeId| {
                log.borrow_mut().push(dom.text_content(n));
                Ok(())
            }))
        });
        ("record".to_string(), op)
    }

    #[test]
    fn test_remove_blank_text_nodes() {
        let mut dom = Dom::new();
        let root = dom.root();
        let p = dom.append_element(root, "p", []).unwrap();
        dom.append_text(p, "a").unwrap();
        dom.append_text(p, "   ").unwrap();
        dom.append_text(p, "b").unwrap();

        let ruleset = vec![Rule::select(TEXT_PATTERN).only_if(blank()).op("remove").into()];
        Interpreter::new(ruleset, PatternSelector)
            .execute(&mut dom, root, None, None)
            .unwrap();

        let texts: Vec<_> = dom
            .descendants(root)
            .into_iter()
            .filter(|&n| dom.is_text(n))
            .collect();
        assert_eq!(texts.len(), 2);
        assert_eq!(dom.to_html(), "<p>ab</p>");
    }

    #[test]
    fn test_select_then_unwrap_carries_selection() {
        let html = run(
            "<p>a<span>b<i>c</i></span>d<span>e</span></p>",
            vec![Rule::select("span").into(), Rule::new().op("unwrap").into()],
        )
        .unwrap();
        assert_eq!(html, "<p>ab<i>c</i>de</p>");
    }

    #[test]
    fn test_nested_ruleset_applies_to_enclosing_selection() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dom = Dom::parse("<div>1</div><p>2</p><div>3</div>").unwrap();
        let root = dom.root();

        let ruleset = vec![
            Rule::select("div").into(),
            vec![Rule::new().op("record").into()].into(),
        ];
        Interpreter::with_overrides(ruleset, PatternSelector, [recorder(&log)])
            .execute(&mut dom, root, None, None)
            .unwrap();

        assert_eq!(*log.borrow(), ["1", "3"]);
    }

    #[test]
    fn test_nested_selection_does_not_leak_upward() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dom = Dom::parse("<div>1</div><p>2</p>").unwrap();
        let root = dom.root();

        let ruleset = vec![
            Rule::select("div").into(),
            vec![Rule::select("p").op("record").into()].into(),
            Rule::new().op("record").into(),
        ];
        Interpreter::with_overrides(ruleset, PatternSelector, [recorder(&log)])
            .execute(&mut dom, root, None, None)
            .unwrap();

        // The nested rule saw `p`; the outer rule still sees `div`.
        assert_eq!(*log.borrow(), ["2", "1"]);
    }

    #[test]
    fn test_filter_semantics() {
        let source = "<a>1</a><b>2</b><c>3</c>";
        let cases: [(Option<Predicate<Dom>>, Option<Predicate<Dom>>, &[&str]); 4] = [
            (None, None, &["1", "2", "3"]),
            (Some(tag("b")), None, &["2"]),
            (None, Some(tag("b")), &["1", "3"]),
            (Some(tag("b")), Some(tag("b")), &[]),
        ];

        for (only_if, except, expected) in cases {
            let log = Rc::new(RefCell::new(Vec::new()));
            let mut dom = Dom::parse(source).unwrap();
            let root = dom.root();
            let rule = Rule {
                only_if,
                except,
                ..Rule::select("*").op("record")
            };
            Interpreter::with_overrides(vec![rule.into()], PatternSelector, [recorder(&log)])
                .execute(&mut dom, root, None, None)
                .unwrap();
            assert_eq!(*log.borrow(), expected);
        }
    }

    #[test]
    fn test_filter_only_rule_narrows_carried_selection() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dom = Dom::parse("<a>1</a><b>2</b>").unwrap();
        let root = dom.root();

        let ruleset = vec![
            Rule::select("*").into(),
            Rule::new().except(tag("a")).into(),
            Rule::new().op("record").into(),
        ];
        Interpreter::with_overrides(ruleset, PatternSelector, [recorder(&log)])
            .execute(&mut dom, root, None, None)
            .unwrap();
        assert_eq!(*log.borrow(), ["2"]);
    }

    #[test]
    fn test_default_select_only_without_selection() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut dom = Dom::parse("<a>1</a><b>2</b>").unwrap();
        let root = dom.root();
        let rule: Entry<Dom> = Rule::new().default_select("a").op("record").into();

        let interpreter = Interpreter::with_overrides(vec![rule], PatternSelector, [recorder(&log)]);
        interpreter.execute(&mut dom, root, None, None).unwrap();
        assert_eq!(*log.borrow(), ["1"]);

        // A seeded selection wins over `default_select`.
        log.borrow_mut().clear();
        let b = dom.children(root)[1];
        interpreter.execute(&mut dom, root, None, Some(vec![b, b])).unwrap();
        assert_eq!(*log.borrow(), ["2"]);
    }

    #[test]
    fn test_explicit_ruleset_argument() {
        let mut dom = Dom::parse("<p><span>x</span></p>").unwrap();
        let root = dom.root();
        let interpreter = Interpreter::new(Vec::new(), PatternSelector);

        let other = vec![Rule::select("span").op("unwrap").into()];
        interpreter.execute(&mut dom, root, Some(&other), None).unwrap();
        assert_eq!(dom.to_html(), "<p>x</p>");
    }

    #[test]
    fn test_rule_errors() {
        let err = run("<p></p>", vec![Rule::new().op("remove").into()]).unwrap_err();
        assert!(matches!(err, Error::Rule { ref rule, .. } if rule == "0"), "{err}");

        let err = run(
            "<p></p>",
            vec![Rule::select("p").into(), Rule::new().named("idle").into()],
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "rule `idle`: rule neither alters selection nor performs an operation"
        );

        let err = run("<p></p>", vec![Rule::select("p").op("explode").into()]).unwrap_err();
        assert!(err.to_string().contains("operation `explode` is not registered"));
    }

    #[test]
    fn test_nested_rule_label_is_position_path() {
        let err = run(
            "<p></p>",
            vec![
                Rule::select("p").into(),
                vec![Rule::new().op("remove").into(), Rule::new().op("nope").into()].into(),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Rule { ref rule, .. } if rule == "1.1"), "{err}");
    }

    #[test]
    fn test_failure_keeps_earlier_changes() {
        let mut dom = Dom::parse("<p><span>x</span></p>").unwrap();
        let root = dom.root();
        let ruleset = vec![
            Rule::select("span").op("unwrap").into(),
            Rule::select("p").op("missing").into(),
        ];

        let interpreter = Interpreter::new(ruleset, PatternSelector);
        assert!(interpreter.execute(&mut dom, root, None, None).is_err());
        assert_eq!(dom.to_html(), "<p>x</p>");
    }

    #[test]
    fn test_predicate_errors_propagate() {
        let failing = predicate(|_: &Dom, _: NodeId| Err(anyhow::anyhow!("boom").into()));
        let err = run("<p></p>", vec![Rule::select("p").only_if(failing).op("remove").into()])
            .unwrap_err();
        assert!(matches!(err, Error::Callback(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_selection_is_fixed_during_pass() {
        // Wrapping each `b` adds new `b`-containing structure; only the
        // originally selected nodes are visited.
        let html = run(
            "<b>1</b><b>2</b>",
            vec![Rule::select("b").op("wrap").arg("b.outer").into()],
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<b class="outer"><b>1</b></b><b class="outer"><b>2</b></b>"#
        );
    }
}
