//! Structural operations: remove, unwrap, replace, wrap, wrap_inner.

use crate::chain::{self, WrapChain};
use crate::resolve::resolve_chain;
use crate::tree::Tree;
use crate::Result;

use super::{OpArg, OpFactory, Transform, factory, transform};

pub(super) const NAMES: [&str; 5] = ["remove", "unwrap", "replace", "wrap", "wrap_inner"];

pub(super) fn ops<T: Tree + 'static>() -> Vec<(&'static str, OpFactory<T>)> {
    vec![
        ("remove", factory(remove::<T>)),
        ("unwrap", factory(unwrap::<T>)),
        ("replace", factory(replace::<T>)),
        ("wrap", factory(wrap::<T>)),
        ("wrap_inner", factory(wrap_inner::<T>)),
    ]
}

/// Detach the located chain with its subtree.
fn remove<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let (direction, trim) = arg.locate("remove")?;
    Ok(transform(move |tree: &mut T, node| {
        let found = WrapChain::discover(tree, node, &direction, trim.as_ref())?;
        if found.is_empty() {
            return Ok(());
        }
        found.remove(tree)
    }))
}

/// Replace the located chain by its inner node's children.
fn unwrap<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let (direction, trim) = arg.locate("unwrap")?;
    Ok(transform(move |tree: &mut T, node| {
        let found = WrapChain::discover(tree, node, &direction, trim.as_ref())?;
        if found.is_empty() {
            return Ok(());
        }
        found.unwrap(tree)
    }))
}

/// Swap the located chain with the resolved replacement. The located chain is
/// the template, so a single template string yields a chain of equal length.
fn replace<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let (spec, direction, trim) = arg.replacement("replace")?;
    Ok(transform(move |tree: &mut T, node| {
        let found = WrapChain::discover(tree, node, &direction, trim.as_ref())?;
        if found.is_empty() {
            return Ok(());
        }
        let replacement = resolve_chain(tree, &spec, found.nodes())?;
        found.swap_with(tree, &replacement)
    }))
}

fn wrap<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let spec = arg.spec("wrap")?;
    Ok(transform(move |tree: &mut T, node| {
        let wrapper = resolve_chain(tree, &spec, &[node])?;
        chain::wrap(tree, node, &wrapper)
    }))
}

fn wrap_inner<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let spec = arg.spec("wrap_inner")?;
    Ok(transform(move |tree: &mut T, node| {
        let wrapper = resolve_chain(tree, &spec, &[node])?;
        chain::wrap_inner(tree, node, &wrapper)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::Direction;
    use crate::dom::{Dom, NodeId};
    use crate::ops::WrapArg;
    use crate::resolve::Spec;
    use crate::tree::predicate;
    use crate::Error;

    type Op = fn(&OpArg<Dom>) -> Result<Transform<Dom>>;

    fn apply(dom: &mut Dom, op: Op, arg: OpArg<Dom>, node: NodeId) {
        let mut t = op(&arg).unwrap();
        t(dom, node).unwrap();
    }

    fn find(dom: &Dom, tag: &str) -> NodeId {
        dom.descendants(dom.root())
            .into_iter()
            .find(|&n| dom.tag_name(n) == Some(tag))
            .unwrap()
    }

    #[test]
    fn test_remove_self_and_chain() {
        let mut dom = Dom::parse("<div><p><b>x</b></p></div><i>y</i>").unwrap();
        let b = find(&dom, "b");

        apply(&mut dom, remove, OpArg::from("around"), b);
        assert_eq!(dom.to_html(), "<i>y</i>");

        let i = find(&dom, "i");
        apply(&mut dom, remove, OpArg::None, i);
        assert_eq!(dom.to_html(), "");
    }

    #[test]
    fn test_unwrap_with_direction_list() {
        let mut dom = Dom::parse("<section><div><p>a<b>b</b></p></div></section><i></i>").unwrap();
        let div = find(&dom, "div");

        let arg = OpArg::List(vec!["around".into(), "self".into(), "within".into()]);
        apply(&mut dom, unwrap, arg, div);
        assert_eq!(dom.to_html(), "a<b>b</b><i></i>");
    }

    #[test]
    fn test_unwrap_trimmed_chain() {
        let mut dom = Dom::parse("<section><div><p>a<b>b</b></p></div></section><i></i>").unwrap();
        let div = find(&dom, "div");

        let arg = OpArg::Wraps(WrapArg {
            with: None,
            direction: Some(Direction::full()),
            trim: Some(predicate(|dom: &Dom, n: NodeId| {
                Ok(dom.tag_name(n) == Some("section"))
            })),
        });
        apply(&mut dom, unwrap, arg, div);
        assert_eq!(dom.to_html(), "<section>a<b>b</b></section><i></i>");
    }

    #[test]
    fn test_unwrap_root_is_unbound() {
        let mut dom = Dom::parse("<p>x</p>").unwrap();
        let root = dom.root();
        let mut t = unwrap(&OpArg::None).unwrap();
        assert!(matches!(t(&mut dom, root), Err(Error::Unbound(_))));
    }

    #[test]
    fn test_replace_node_keeps_children() {
        let mut dom = Dom::parse("<p>a <b>bold</b> c</p>").unwrap();
        let b = find(&dom, "b");

        apply(&mut dom, replace, OpArg::from("strong.em"), b);
        assert_eq!(dom.to_html(), r#"<p>a <strong class="em">bold</strong> c</p>"#);
    }

    #[test]
    fn test_replace_chain_replicates_template() {
        let mut dom = Dom::parse("<div><span><i>x<u>y</u></i></span></div>").unwrap();
        let span = find(&dom, "span");

        let arg = OpArg::Wraps(WrapArg {
            with: Some(Spec::from("em")),
            direction: Some(Direction::Many(vec![Direction::Node, Direction::Within])),
            trim: None,
        });
        apply(&mut dom, replace, arg, span);
        assert_eq!(dom.to_html(), "<div><em><em>x<u>y</u></em></em></div>");
    }

    #[test]
    fn test_replace_with_transform_spec() {
        let mut dom = Dom::parse(r#"<h1 id="t">Title</h1>"#).unwrap();
        let h1 = find(&dom, "h1");

        let spec = Spec::transform(|dom: &mut Dom, context: &[NodeId]| {
            let id = context.first().and_then(|&n| dom.attr(n, "id")).unwrap_or_default();
            Ok(Spec::template(format!("h2@data-from={id}")))
        });
        apply(&mut dom, replace, OpArg::Spec(spec), h1);
        assert_eq!(dom.to_html(), r#"<h2 data-from="t">Title</h2>"#);
    }

    #[test]
    fn test_replace_without_with_is_usage_error() {
        let arg = OpArg::<Dom>::Wraps(WrapArg::default());
        assert!(matches!(replace(&arg), Err(Error::Usage(_))));
    }

    #[test]
    fn test_wrap_and_wrap_inner() {
        let mut dom = Dom::parse("<p>a<b>b</b></p>").unwrap();
        let b = find(&dom, "b");
        apply(&mut dom, wrap, OpArg::from("span.k"), b);
        assert_eq!(dom.to_html(), r#"<p>a<span class="k"><b>b</b></span></p>"#);

        let p = find(&dom, "p");
        let arg = OpArg::List(vec!["div".into(), "em".into()]);
        apply(&mut dom, wrap_inner, arg, p);
        assert_eq!(
            dom.to_html(),
            r#"<p><div><em>a<span class="k"><b>b</b></span></em></div></p>"#
        );
    }

    fn try_apply(dom: &mut Dom, op: Op, arg: OpArg<Dom>, node: NodeId) -> Result<()> {
        let mut t = op(&arg).unwrap();
        t(dom, node)
    }

    #[test]
    fn test_replace_with_own_descendant_is_rejected() {
        let source = "<div><p><i>keep</i></p></div>";
        let mut dom = Dom::parse(source).unwrap();
        let div = find(&dom, "div");

        let spec = Spec::transform(|dom: &mut Dom, context: &[NodeId]| {
            let inner = context.first().and_then(|&n| dom.first_child(n)).unwrap();
            Ok(Spec::chain(WrapChain::single(inner)))
        });
        let err = try_apply(&mut dom, replace, OpArg::Spec(spec), div).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert_eq!(dom.to_html(), source);
    }

    #[test]
    fn test_void_elements_are_not_filled() {
        let source = r#"<p><img src="x"></p>"#;
        let mut dom = Dom::parse(source).unwrap();
        let img = find(&dom, "img");

        let err = try_apply(&mut dom, wrap_inner, OpArg::from("span"), img).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert_eq!(dom.to_html(), source);

        let p = find(&dom, "p");
        let err = try_apply(&mut dom, wrap, OpArg::from("br"), p).unwrap_err();
        assert!(matches!(err, Error::Usage(_)));
        assert_eq!(dom.to_html(), source);
    }

    #[test]
    fn test_malformed_template_fails_at_construction() {
        assert!(matches!(wrap::<Dom>(&OpArg::from(".x")), Err(Error::Usage(_))));
        assert!(matches!(wrap::<Dom>(&OpArg::None), Err(Error::Usage(_))));
    }
}
