//! rewrap - rule-driven markup rewriting.

mod cli;

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, is_stdio};
use rewrap::config::{RewriteConfig, find_config_file};
use rewrap::ops::standard_names;
use rewrap::{Dom, Interpreter, PatternSelector, Registry, debug, log, logger};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Run { input, output } => run(&cli.config, input, output.as_deref()),
        Commands::Check => check(&cli.config),
        Commands::Ops => {
            let mut stdout = std::io::stdout().lock();
            for name in standard_names() {
                writeln!(stdout, "{name}")?;
            }
            Ok(())
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Resolve `-C` the way the ruleset is looked up: upward from the cwd.
fn locate_config(config: &Path) -> Result<PathBuf> {
    find_config_file(config)
        .with_context(|| format!("ruleset file `{}` not found", config.display()))
}

fn load_config(config: &Path) -> Result<(PathBuf, RewriteConfig)> {
    let path = locate_config(config)?;
    let loaded = RewriteConfig::from_path(&path)?;
    debug!("config"; "loaded {}", path.display());
    Ok((path, loaded))
}

fn run(config: &Path, input: &Path, output: Option<&Path>) -> Result<()> {
    let (_, config) = load_config(config)?;
    let ruleset = config.ruleset(&Registry::<Dom>::standard())?;

    let source = read_input(input)?;
    let mut dom = Dom::parse(&source)
        .with_context(|| format!("failed to parse `{}`", input.display()))?;
    let root = dom.root();

    Interpreter::new(ruleset, PatternSelector).execute(&mut dom, root, None, None)?;
    debug!("run"; "rewrote {}", input.display());

    write_output(output, &dom.to_html())
}

fn check(config: &Path) -> Result<()> {
    let (path, config) = load_config(config)?;
    config.ruleset(&Registry::<Dom>::standard())?;

    let summary = config.summary();
    log!(
        "check";
        "{}: {} rules, {} nested rulesets, depth {}",
        path.display(),
        summary.rules,
        summary.nested,
        summary.depth
    );
    Ok(())
}

// =============================================================================
// IO
// =============================================================================

fn read_input(input: &Path) -> Result<String> {
    if is_stdio(input) {
        let mut source = String::new();
        std::io::stdin()
            .read_to_string(&mut source)
            .context("failed to read stdin")?;
        return Ok(source);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read `{}`", input.display()))
}

fn write_output(output: Option<&Path>, html: &str) -> Result<()> {
    match output {
        Some(path) if !is_stdio(path) => fs::write(path, html)
            .with_context(|| format!("failed to write `{}`", path.display())),
        _ => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{html}")?;
            Ok(())
        }
    }
}
