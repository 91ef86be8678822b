use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, ValueHint};

use crate::gate::{GatePolicy, Verdict};
use crate::vcs::TagSelection;

mod run_impl;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "lintgate",
    version,
    about = "Fail CI when lint violations regress against the latest release tag",
    long_about = None
)]
pub struct Args {
    /// Repository root to measure
    #[arg(value_name = "PATH", default_value = ".", value_hint = ValueHint::DirPath)]
    pub path: PathBuf,

    /// Config file (defaults to the nearest lintgate.toml)
    #[arg(long = "config", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Linter executable
    #[arg(long = "linter", value_name = "PROG", value_hint = ValueHint::CommandName)]
    pub linter: Option<String>,

    /// Extra argument passed to the linter (repeatable)
    #[arg(long = "linter-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub linter_args: Vec<String>,

    /// Comma-separated rule codes the linter should ignore, e.g. E501,W503
    #[arg(long = "ignore", value_name = "CODES")]
    pub ignore: Option<String>,

    /// Comma-separated file extensions to lint (no dots)
    #[arg(long = "ext", value_name = "LIST")]
    pub extensions: Option<String>,

    /// Drop report lines matching this regular expression
    #[arg(long = "exclude", value_name = "REGEX")]
    pub exclude: Option<String>,

    /// Remote to fetch tags from
    #[arg(long = "remote", value_name = "NAME")]
    pub remote: Option<String>,

    /// Use local tags only
    #[arg(long = "no-fetch", action = ArgAction::SetTrue)]
    pub no_fetch: bool,

    /// Compare against this tag instead of selecting one
    #[arg(long = "tag", value_name = "NAME")]
    pub tag: Option<String>,

    /// How the baseline tag is chosen
    #[arg(long = "tag-selection", value_enum)]
    pub tag_selection: Option<TagSelection>,

    /// Pass/fail rule
    #[arg(long = "policy", value_enum)]
    pub policy: Option<GatePolicy>,

    /// Write after.txt (current) and before.txt (baseline) reports here
    #[arg(long = "report-dir", value_name = "DIR", value_hint = ValueHint::DirPath)]
    pub report_dir: Option<PathBuf>,

    /// Print a JSON summary instead of status lines
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,

    /// Verbose logging (repeat for more)
    #[arg(long = "verbose", short = 'v', action = ArgAction::Count)]
    pub verbose: u8,
}

/// Runs the gate and returns its verdict.
///
/// # Errors
/// Returns an error on any environment fault: missing linter, unreadable
/// repository, failed fetch, or no usable tag.
pub fn run() -> Result<Verdict> {
    let args = Args::parse();
    crate::logging::init(args.verbose);
    run_impl::run_with_args(&args)
}
