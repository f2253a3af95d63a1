//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Rule-driven markup rewriting
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Ruleset file path, searched upward from the current directory when relative
    #[arg(short = 'C', long, global = true, default_value = "rewrap.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Log every rule as it runs
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Apply the ruleset to a document
    #[command(visible_alias = "r")]
    Run {
        /// Input document, `-` for stdin
        #[arg(default_value = "-", value_hint = clap::ValueHint::FilePath)]
        input: PathBuf,

        /// Write output to file instead of stdout
        #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Validate the ruleset without touching any document
    #[command(visible_alias = "c")]
    Check,

    /// List the registered operations
    Ops,
}

/// `-` stands for stdin/stdout.
pub fn is_stdio(path: &std::path::Path) -> bool {
    path.as_os_str() == "-"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let cli = Cli::try_parse_from(["rewrap", "run"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("rewrap.toml"));
        assert!(!cli.verbose);
        let Commands::Run { input, output } = cli.command else {
            panic!("expected run");
        };
        assert!(is_stdio(&input));
        assert_eq!(output, None);
    }

    #[test]
    fn test_global_flags_and_alias() {
        let cli =
            Cli::try_parse_from(["rewrap", "r", "page.html", "-o", "out.html", "-v", "-C", "x.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, PathBuf::from("x.toml"));
        let Commands::Run { input, output } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(input, PathBuf::from("page.html"));
        assert_eq!(output, Some(PathBuf::from("out.html")));
    }

    #[test]
    fn test_check_and_ops() {
        assert!(matches!(
            Cli::try_parse_from(["rewrap", "c"]).unwrap().command,
            Commands::Check
        ));
        assert!(matches!(
            Cli::try_parse_from(["rewrap", "ops"]).unwrap().command,
            Commands::Ops
        ));
        assert!(Cli::try_parse_from(["rewrap", "serve"]).is_err());
    }
}
