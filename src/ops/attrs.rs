//! Attribute and class operations.

use rustc_hash::FxHashSet;

use crate::Result;
use crate::tree::Tree;

use super::{OpArg, OpFactory, Transform, factory, transform};

pub(super) const NAMES: [&str; 6] = [
    "set_attr",
    "remove_attr",
    "keep_attrs",
    "add_class",
    "remove_class",
    "keep_classes",
];

pub(super) fn ops<T: Tree + 'static>() -> Vec<(&'static str, OpFactory<T>)> {
    vec![
        ("set_attr", factory(set_attr::<T>)),
        ("remove_attr", factory(remove_attr::<T>)),
        ("keep_attrs", factory(keep_attrs::<T>)),
        ("add_class", factory(add_class::<T>)),
        ("remove_class", factory(remove_class::<T>)),
        ("keep_classes", factory(keep_classes::<T>)),
    ]
}

fn set_attr<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let pairs = arg.pairs("set_attr")?;
    Ok(transform(move |tree: &mut T, node| {
        for (key, value) in &pairs {
            tree.set_attr(node, key, value);
        }
        Ok(())
    }))
}

fn remove_attr<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let names = arg.names("remove_attr")?;
    Ok(transform(move |tree: &mut T, node| {
        for name in &names {
            tree.remove_attr(node, name);
        }
        Ok(())
    }))
}

/// Drop every attribute not listed.
fn keep_attrs<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let keep: FxHashSet<String> = arg.names("keep_attrs")?.into_iter().collect();
    Ok(transform(move |tree: &mut T, node| {
        for name in tree.attr_names(node) {
            if !keep.contains(&name) {
                tree.remove_attr(node, &name);
            }
        }
        Ok(())
    }))
}

fn add_class<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let added = arg.names("add_class")?;
    Ok(transform(move |tree: &mut T, node| {
        if !tree.is_element(node) {
            return Ok(());
        }
        let mut classes = tree.classes(node);
        for class in &added {
            if !classes.contains(class) {
                classes.push(class.clone());
            }
        }
        tree.set_classes(node, &classes);
        Ok(())
    }))
}

fn remove_class<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let removed: FxHashSet<String> = arg.names("remove_class")?.into_iter().collect();
    Ok(transform(move |tree: &mut T, node| {
        retain_classes(tree, node, |c| !removed.contains(c));
        Ok(())
    }))
}

/// Drop every class not listed.
fn keep_classes<T: Tree + 'static>(arg: &OpArg<T>) -> Result<Transform<T>> {
    let keep: FxHashSet<String> = arg.names("keep_classes")?.into_iter().collect();
    Ok(transform(move |tree: &mut T, node| {
        retain_classes(tree, node, |c| keep.contains(c));
        Ok(())
    }))
}

fn retain_classes<T: Tree>(tree: &mut T, node: T::Node, keep: impl Fn(&str) -> bool) {
    if tree.attr(node, "class").is_none() {
        return;
    }
    let classes: Vec<String> = tree.classes(node).into_iter().filter(|c| keep(c)).collect();
    tree.set_classes(node, &classes);
}
