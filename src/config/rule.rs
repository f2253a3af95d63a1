//! `[[rule]]` entries and their conversion into a [`Ruleset`].

use serde::Deserialize;

use super::ConfigDiagnostics;
use super::predicate::{PREDICATE_NAMES, named};
use crate::chain::Direction;
use crate::ops::{OpArg, Registry, WrapArg};
use crate::resolve::Spec;
use crate::rules::{Entry, Rule, Ruleset};
use crate::select::{SelectSpec, TextModifier};
use crate::tree::{Predicate, Tree};

// ============================================================================
// Raw entries
// ============================================================================

/// One `[[rule]]` table. Either a rule or, with `rules`, a nested ruleset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    pub name: Option<String>,
    pub select: Option<SelectConfig>,
    pub default_select: Option<SelectConfig>,
    pub only_if: Option<String>,
    pub except: Option<String>,
    pub op: Option<String>,
    pub arg: Option<ArgConfig>,
    pub rules: Option<Vec<RuleConfig>>,
}

/// `select = "p"` or `select = { root = "p", modifier = "child-text" }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum SelectConfig {
    Pattern(String),
    Composite(CompositeConfig),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompositeConfig {
    pub root: Box<SelectConfig>,
    pub modifier: String,
}

/// `arg`: a string, a list of strings or a table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArgConfig {
    Text(String),
    List(Vec<String>),
    Table(toml::Table),
}

/// Keys that turn an `arg` table into a chain argument.
const WRAP_KEYS: [&str; 3] = ["with", "direction", "trim"];

impl RuleConfig {
    fn is_nested_only(&self) -> bool {
        self.name.is_none()
            && self.select.is_none()
            && self.default_select.is_none()
            && self.only_if.is_none()
            && self.except.is_none()
            && self.op.is_none()
            && self.arg.is_none()
    }
}

// ============================================================================
// Conversion
// ============================================================================

/// Build a ruleset, reporting every problem under its field path.
pub(super) fn build<T: Tree>(
    entries: &[RuleConfig],
    prefix: &str,
    registry: &Registry<T>,
    diag: &mut ConfigDiagnostics,
) -> Ruleset<T> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(i, entry)| {
            let path = format!("{prefix}[{i}]");
            match &entry.rules {
                Some(nested) if entry.is_nested_only() => Some(Entry::Nested(build(
                    nested,
                    &format!("{path}.rules"),
                    registry,
                    diag,
                ))),
                Some(_) => {
                    diag.error_with_hint(
                        format!("{path}.rules"),
                        "an entry with `rules` cannot carry other keys",
                        "move the other keys into a rule of their own",
                    );
                    None
                }
                None => rule(entry, &path, registry, diag).map(Entry::Rule),
            }
        })
        .collect()
}

fn rule<T: Tree>(
    entry: &RuleConfig,
    path: &str,
    registry: &Registry<T>,
    diag: &mut ConfigDiagnostics,
) -> Option<Rule<T>> {
    let before = diag.len();

    let select = entry
        .select
        .as_ref()
        .and_then(|s| select_spec(s, &format!("{path}.select"), diag));
    let default_select = entry
        .default_select
        .as_ref()
        .and_then(|s| select_spec(s, &format!("{path}.default_select"), diag));
    let only_if = entry
        .only_if
        .as_deref()
        .and_then(|name| predicate(name, &format!("{path}.only_if"), diag));
    let except = entry
        .except
        .as_deref()
        .and_then(|name| predicate(name, &format!("{path}.except"), diag));

    if let Some(op) = &entry.op
        && !registry.contains(op)
    {
        diag.error_with_hint(
            format!("{path}.op"),
            format!("operation `{op}` is not registered"),
            format!("available: {}", registry.names().join(", ")),
        );
    }

    let arg = match &entry.arg {
        Some(arg) => op_arg(arg, &format!("{path}.arg"), diag).unwrap_or(OpArg::None),
        None => OpArg::None,
    };

    // Let the operation check its argument shape up front.
    if let Some(op) = &entry.op
        && let Some(factory) = registry.get(op)
        && diag.len() == before
        && let Err(err) = factory(&arg)
    {
        diag.error(format!("{path}.arg"), err.to_string());
    }

    if diag.len() != before {
        return None;
    }

    Some(Rule {
        name: entry.name.clone(),
        select,
        default_select,
        only_if,
        except,
        op: entry.op.clone(),
        arg,
    })
}

fn select_spec(
    config: &SelectConfig,
    path: &str,
    diag: &mut ConfigDiagnostics,
) -> Option<SelectSpec> {
    let spec = match config {
        SelectConfig::Pattern(p) => SelectSpec::pattern(p.as_str()),
        SelectConfig::Composite(c) => {
            let root = select_spec(&c.root, &format!("{path}.root"), diag);
            let modifier = match c.modifier.parse::<TextModifier>() {
                Ok(m) => Some(m),
                Err(err) => {
                    diag.error(format!("{path}.modifier"), err.to_string());
                    None
                }
            };
            return Some(SelectSpec::composite(root?, modifier?));
        }
    };

    match spec.validate() {
        Ok(()) => Some(spec),
        Err(err) => {
            diag.error(path, err.to_string());
            None
        }
    }
}

fn predicate<T: Tree>(
    name: &str,
    path: &str,
    diag: &mut ConfigDiagnostics,
) -> Option<Predicate<T>> {
    match named(name) {
        Ok(pred) => Some(pred),
        Err(message) => {
            diag.error_with_hint(path, message, format!("available: {PREDICATE_NAMES}"));
            None
        }
    }
}

fn op_arg<T: Tree>(
    arg: &ArgConfig,
    path: &str,
    diag: &mut ConfigDiagnostics,
) -> Option<OpArg<T>> {
    match arg {
        ArgConfig::Text(s) => Some(OpArg::Text(s.clone())),
        ArgConfig::List(items) => Some(OpArg::List(items.clone())),
        ArgConfig::Table(table) if table.keys().any(|k| WRAP_KEYS.contains(&k.as_str())) => {
            wrap_arg(table, path, diag).map(OpArg::Wraps)
        }
        ArgConfig::Table(table) => pairs(table, path, diag).map(OpArg::Pairs),
    }
}

fn wrap_arg<T: Tree>(
    table: &toml::Table,
    path: &str,
    diag: &mut ConfigDiagnostics,
) -> Option<WrapArg<T>> {
    let before = diag.len();
    let mut arg = WrapArg::default();

    for (key, value) in table {
        let field = format!("{path}.{key}");
        match (key.as_str(), value) {
            ("with", toml::Value::String(template)) => {
                arg.with = Some(Spec::template(template.as_str()));
            }
            ("with", toml::Value::Array(items)) => match strings(items) {
                Some(items) => arg.with = Some(Spec::list(items.into_iter().map(Spec::template))),
                None => diag.error(field, "expected a list of template strings"),
            },
            ("direction", toml::Value::String(token)) => match token.parse::<Direction<T>>() {
                Ok(d) => arg.direction = Some(d),
                Err(err) => diag.error(field, err.to_string()),
            },
            ("direction", toml::Value::Array(items)) => match strings(items) {
                Some(tokens) => match Direction::from_tokens(&tokens) {
                    Ok(d) => arg.direction = Some(d),
                    Err(err) => diag.error(field, err.to_string()),
                },
                None => diag.error(field, "expected a list of direction names"),
            },
            ("trim", toml::Value::String(name)) => arg.trim = predicate(name, &field, diag),
            ("with" | "direction" | "trim", _) => {
                diag.error(field, format!("unexpected {}", value.type_str()));
            }
            _ => diag.error_with_hint(
                field,
                format!("unknown key `{key}`"),
                "chain arguments take `with`, `direction` and `trim`",
            ),
        }
    }

    if let Some(spec) = &arg.with
        && let Err(err) = spec.validate()
    {
        diag.error(format!("{path}.with"), err.to_string());
    }

    (diag.len() == before).then_some(arg)
}

fn pairs(
    table: &toml::Table,
    path: &str,
    diag: &mut ConfigDiagnostics,
) -> Option<Vec<(String, String)>> {
    let before = diag.len();
    let mut out = Vec::with_capacity(table.len());
    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s.clone(),
            toml::Value::Integer(i) => i.to_string(),
            toml::Value::Float(f) => f.to_string(),
            toml::Value::Boolean(b) => b.to_string(),
            other => {
                diag.error(
                    format!("{path}.{key}"),
                    format!("attribute values must be scalars, got {}", other.type_str()),
                );
                continue;
            }
        };
        out.push((key.clone(), value));
    }
    (diag.len() == before).then_some(out)
}

fn strings(items: &[toml::Value]) -> Option<Vec<String>> {
    items
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;

    fn parse(source: &str) -> Vec<RuleConfig> {
        #[derive(Deserialize)]
        struct File {
            rule: Vec<RuleConfig>,
        }
        toml::from_str::<File>(source).unwrap().rule
    }

    fn convert(source: &str) -> (Ruleset<Dom>, ConfigDiagnostics) {
        let mut diag = ConfigDiagnostics::new();
        let ruleset = build(&parse(source), "rule", &Registry::standard(), &mut diag);
        (ruleset, diag)
    }

    #[test]
    fn test_select_forms() {
        let (ruleset, diag) = convert(
            r#"
            [[rule]]
            select = "p"

            [[rule]]
            select = { root = "div", modifier = "child-text" }
            "#,
        );
        assert!(diag.is_empty(), "{diag}");
        let [Entry::Rule(first), Entry::Rule(second)] = &ruleset[..] else {
            panic!("expected two rules");
        };
        assert_eq!(first.select, Some(SelectSpec::from("p")));
        assert_eq!(
            second.select,
            Some(SelectSpec::composite("div".into(), TextModifier::ChildText))
        );
    }

    #[test]
    fn test_arg_shapes() {
        let (ruleset, diag) = convert(
            r#"
            [[rule]]
            select = "b"
            op = "wrap"
            arg = "span.x"

            [[rule]]
            op = "remove_attr"
            arg = ["style", "id"]

            [[rule]]
            op = "unwrap"
            arg = { direction = ["around", "self"], trim = "tag:section" }

            [[rule]]
            op = "set_attr"
            arg = { role = "note", tabindex = 0 }
            "#,
        );
        assert!(diag.is_empty(), "{diag}");

        let args: Vec<&str> = ruleset
            .iter()
            .map(|e| match e {
                Entry::Rule(r) => r.arg.shape(),
                Entry::Nested(_) => "nested",
            })
            .collect();
        assert_eq!(args, ["a string", "a list", "a chain table", "key/value pairs"]);

        let Entry::Rule(set) = &ruleset[3] else {
            panic!("expected a rule");
        };
        let OpArg::Pairs(pairs) = &set.arg else {
            panic!("expected pairs");
        };
        assert!(pairs.contains(&("tabindex".to_string(), "0".to_string())));
    }

    #[test]
    fn test_pairs_keep_declared_order() {
        let (ruleset, diag) = convert(
            r#"
            [[rule]]
            op = "set_attr"
            arg = { title = "t", id = "x", aria-label = "l" }
            "#,
        );
        assert!(diag.is_empty(), "{diag}");

        let Entry::Rule(set) = &ruleset[0] else {
            panic!("expected a rule");
        };
        let OpArg::Pairs(pairs) = &set.arg else {
            panic!("expected pairs");
        };
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["title", "id", "aria-label"]);
    }

    #[test]
    fn test_nested_entries() {
        let (ruleset, diag) = convert(
            r#"
            [[rule]]
            select = "div"

            [[rule]]
            [[rule.rules]]
            op = "add_class"
            arg = "seen"
            "#,
        );
        assert!(diag.is_empty(), "{diag}");
        assert!(matches!(&ruleset[1], Entry::Nested(inner) if inner.len() == 1));
    }

    #[test]
    fn test_diagnostics_use_field_paths() {
        let (_, diag) = convert(
            r#"
            [[rule]]
            select = "p >"
            only_if = "odd"

            [[rule]]
            select = { root = "p", modifier = "sideways" }
            op = "explode"

            [[rule]]
            op = "remove"
            rules = []

            [[rule]]
            [[rule.rules]]
            op = "set_attr"
            arg = "id=x"
            "#,
        );
        let fields: Vec<&str> = diag.errors().iter().map(|d| d.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "rule[0].select",
                "rule[0].only_if",
                "rule[1].select.modifier",
                "rule[1].op",
                "rule[2].rules",
                "rule[3].rules[0].arg",
            ]
        );
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = toml::from_str::<RuleConfig>("selekt = \"p\"").unwrap_err();
        assert!(err.to_string().contains("selekt"));
    }

    #[test]
    fn test_wrap_arg_errors() {
        let (_, diag) = convert(
            r#"
            [[rule]]
            select = "p"
            op = "replace"
            arg = { with = ".no-tag", direction = "sideways", extra = 1 }
            "#,
        );
        let fields: Vec<&str> = diag.errors().iter().map(|d| d.field.as_str()).collect();
        assert!(fields.contains(&"rule[0].arg.direction"), "{fields:?}");
        assert!(fields.contains(&"rule[0].arg.extra"), "{fields:?}");
        assert!(fields.contains(&"rule[0].arg.with"), "{fields:?}");
    }
}
