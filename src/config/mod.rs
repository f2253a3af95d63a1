//! Ruleset files (`rewrap.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error      # ConfigError, ConfigDiagnostics
//! ├── predicate  # named predicates (`blank`, `tag:NAME`, ...)
//! ├── rule       # [[rule]] entries and conversion
//! └── mod.rs     # RewriteConfig (this file)
//! ```
//!
//! # Example
//!
//! ```toml
//! [[rule]]
//! name = "drop blank text"
//! select = "#text"
//! only_if = "blank"
//! op = "remove"
//!
//! [[rule]]
//! select = "span.note"
//! op = "replace"
//! arg = { with = "aside.note", direction = ["self", "within"] }
//! ```

mod error;
mod predicate;
mod rule;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use predicate::{PREDICATE_NAMES, named as named_predicate};
pub use rule::{ArgConfig, CompositeConfig, RuleConfig, SelectConfig};

use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ops::Registry;
use crate::rules::Ruleset;
use crate::tree::Tree;

/// Default ruleset file name.
pub const DEFAULT_CONFIG: &str = "rewrap.toml";

// ============================================================================
// root configuration
// ============================================================================

/// Root structure of a ruleset file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RewriteConfig {
    /// Top-level entries, in order
    #[serde(default)]
    pub rule: Vec<RuleConfig>,
}

/// Entry counts, for `rewrap check`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub rules: usize,
    pub nested: usize,
    pub depth: usize,
}

impl RewriteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Convert into a ruleset for `registry`, collecting every problem.
    pub fn ruleset<T: Tree>(&self, registry: &Registry<T>) -> Result<Ruleset<T>, ConfigError> {
        let mut diag = ConfigDiagnostics::new();
        let ruleset = rule::build(&self.rule, "rule", registry, &mut diag);
        diag.into_result().map_err(ConfigError::Diagnostics)?;
        Ok(ruleset)
    }

    pub fn summary(&self) -> Summary {
        fn walk(entries: &[RuleConfig], depth: usize, summary: &mut Summary) {
            summary.depth = summary.depth.max(depth);
            for entry in entries {
                match &entry.rules {
                    Some(nested) => {
                        summary.nested += 1;
                        walk(nested, depth + 1, summary);
                    }
                    None => summary.rules += 1,
                }
            }
        }

        let mut summary = Summary::default();
        walk(&self.rule, 0, &mut summary);
        summary
    }
}

/// Find a config file by searching upward from the current directory.
///
/// Absolute paths are returned as is when they exist.
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    let mut current = cwd.as_path();
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }
        current = current.parent()?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Dom;
    use crate::rules::Interpreter;
    use crate::select::PatternSelector;
    use tempfile::TempDir;

    const RULES: &str = r##"
[[rule]]
name = "drop blank text"
select = "#text"
only_if = "blank"
op = "remove"

[[rule]]
select = "span.note"
op = "replace"
arg = { with = "aside.note", direction = ["self", "within"] }

[[rule]]
select = "p"

[[rule]]
[[rule.rules]]
op = "add_class"
arg = "para"
"##;

    #[test]
    fn test_load_and_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        fs::write(&path, RULES).unwrap();

        let config = RewriteConfig::from_path(&path).unwrap();
        assert_eq!(
            config.summary(),
            Summary {
                rules: 4,
                nested: 1,
                depth: 1
            }
        );

        let registry = Registry::<Dom>::standard();
        let ruleset = config.ruleset(&registry).unwrap();

        let source = "<p>a <span class=\"note\"><b>b<i>i</i></b></span></p>\n<p> </p>";
        let mut dom = Dom::parse(source).unwrap();
        let root = dom.root();
        Interpreter::new(ruleset, PatternSelector)
            .execute(&mut dom, root, None, None)
            .unwrap();

        assert_eq!(
            dom.to_html(),
            concat!(
                r#"<p class="para">a <aside class="note"><aside class="note">b<i>i</i></aside></aside></p>"#,
                r#"<p class="para"></p>"#,
            )
        );
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = RewriteConfig::from_path(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_toml_errors() {
        assert!(matches!(
            RewriteConfig::from_str("[[rule]]\nselect = "),
            Err(ConfigError::Toml(_))
        ));
        assert!(matches!(
            RewriteConfig::from_str("[[rules]]\nselect = \"p\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_semantic_errors_are_collected() {
        let config = RewriteConfig::from_str(
            r#"
            [[rule]]
            select = "p"
            op = "nope"

            [[rule]]
            except = "odd"
            "#,
        )
        .unwrap();

        let Err(ConfigError::Diagnostics(diag)) = config.ruleset(&Registry::<Dom>::standard()) else {
            panic!("expected diagnostics");
        };
        assert_eq!(diag.len(), 2);
    }

    #[test]
    fn test_find_config_file_absolute() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG);
        assert_eq!(find_config_file(&path), None);

        fs::write(&path, "").unwrap();
        assert_eq!(find_config_file(&path), Some(path.clone()));
        assert!(RewriteConfig::from_path(&path).unwrap().rule.is_empty());
    }
}
