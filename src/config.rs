//! Configuration discovery and effective settings resolution.
//!
//! `lintgate.toml` is read from the repository root (or the closest ancestor)
//! unless `--config` names a file. Precedence: CLI > config file > defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::cli::Args;
use crate::error::GateError;
use crate::gate::GatePolicy;
use crate::vcs::TagSelection;

pub const CONFIG_FILE_NAME: &str = "lintgate.toml";

/// Raw `lintgate.toml` contents. Every key is optional.
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub linter: Option<String>,
    pub linter_args: Option<Vec<String>>,
    pub ignore: Option<Vec<String>>,
    pub ignore_flag: Option<String>,
    pub extensions: Option<Vec<String>>,
    pub exclude: Option<String>,
    pub remote: Option<String>,
    pub fetch: Option<bool>,
    pub tag_selection: Option<TagSelection>,
    pub policy: Option<GatePolicy>,
    pub report_dir: Option<PathBuf>,
}

/// How the linter is invoked and how its output is filtered. Shared verbatim
/// by the current and baseline measurements.
#[derive(Debug, Clone)]
pub struct LintConfig {
    pub program: String,
    pub extra_args: Vec<String>,
    pub ignore_codes: Vec<String>,
    pub ignore_flag: String,
    pub extensions: Vec<String>,
    pub exclude: Option<Regex>,
}

impl Default for LintConfig {
    fn default() -> Self {
        Self {
            program: "flake8".to_string(),
            extra_args: Vec::new(),
            ignore_codes: Vec::new(),
            ignore_flag: "--ignore".to_string(),
            extensions: vec!["py".to_string()],
            exclude: None,
        }
    }
}

/// Fully-resolved settings used by the gate pipeline.
#[derive(Debug, Clone)]
pub struct Effective {
    pub repo_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub lint: LintConfig,
    pub remote: String,
    pub fetch: bool,
    pub tag: Option<String>,
    pub tag_selection: TagSelection,
    pub policy: GatePolicy,
    pub report_dir: Option<PathBuf>,
    pub json: bool,
}

/// Walks up from `start` looking for `lintgate.toml`.
pub fn discover(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

pub fn load_file(path: &Path) -> Result<FileConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg = toml::from_str(&text).map_err(|source| GateError::Config {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cfg)
}

pub fn compile_exclude(pattern: &str) -> Result<Regex, GateError> {
    Regex::new(pattern).map_err(|source| GateError::InvalidExclude {
        pattern: pattern.to_string(),
        source,
    })
}

/// Splits a comma-separated list, dropping blanks.
pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn resolve(args: &Args) -> Result<Effective> {
    let repo_root = args.path.clone();
    let config_path = match &args.config {
        Some(p) => Some(p.clone()),
        None => {
            let start = repo_root
                .canonicalize()
                .with_context(|| format!("resolve path {}", repo_root.display()))?;
            discover(&start)
        }
    };
    let file = match &config_path {
        Some(p) => load_file(p)?,
        None => FileConfig::default(),
    };
    merge(args, file, repo_root, config_path)
}

fn merge(
    args: &Args,
    file: FileConfig,
    repo_root: PathBuf,
    config_path: Option<PathBuf>,
) -> Result<Effective> {
    let defaults = LintConfig::default();

    // A relative `report_dir` in the file is relative to the file itself.
    let file_report_dir = file.report_dir.map(|dir| {
        match config_path.as_deref().and_then(Path::parent) {
            Some(base) => base.join(dir),
            None => dir,
        }
    });

    let exclude_src = args.exclude.clone().or(file.exclude);
    let exclude = match exclude_src.as_deref() {
        Some("") | None => None,
        Some(p) => Some(compile_exclude(p)?),
    };

    let lint = LintConfig {
        program: args.linter.clone().or(file.linter).unwrap_or(defaults.program),
        extra_args: if args.linter_args.is_empty() {
            file.linter_args.unwrap_or(defaults.extra_args)
        } else {
            args.linter_args.clone()
        },
        ignore_codes: args
            .ignore
            .as_deref()
            .map(split_list)
            .or(file.ignore)
            .unwrap_or(defaults.ignore_codes),
        ignore_flag: file.ignore_flag.unwrap_or(defaults.ignore_flag),
        extensions: args
            .extensions
            .as_deref()
            .map(split_list)
            .or(file.extensions)
            .unwrap_or(defaults.extensions),
        exclude,
    };

    Ok(Effective {
        repo_root,
        config_path,
        lint,
        remote: args
            .remote
            .clone()
            .or(file.remote)
            .unwrap_or_else(|| "origin".to_string()),
        fetch: !args.no_fetch && file.fetch.unwrap_or(true),
        tag: args.tag.clone(),
        tag_selection: args.tag_selection.or(file.tag_selection).unwrap_or_default(),
        policy: args.policy.or(file.policy).unwrap_or_default(),
        report_dir: args.report_dir.clone().or(file_report_dir),
        json: args.json,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        Args::parse_from(std::iter::once("lintgate").chain(argv.iter().copied()))
    }

    #[test]
    fn defaults_without_config() {
        let eff = merge(&args(&[]), FileConfig::default(), PathBuf::from("."), None).unwrap();
        assert_eq!(eff.lint.program, "flake8");
        assert_eq!(eff.lint.extensions, vec!["py"]);
        assert_eq!(eff.lint.ignore_flag, "--ignore");
        assert!(eff.lint.ignore_codes.is_empty());
        assert!(eff.lint.exclude.is_none());
        assert_eq!(eff.remote, "origin");
        assert!(eff.fetch);
        assert_eq!(eff.tag_selection, TagSelection::CommitDate);
        assert_eq!(eff.policy, GatePolicy::Strict);
    }

    #[test]
    fn file_values_apply_and_cli_wins() {
        let file: FileConfig = toml::from_str(
            r#"
linter = "pycodestyle"
ignore = ["E501", "W503"]
ignore_flag = "--extend-ignore"
exclude = "vendored\\.py"
fetch = false
tag_selection = "semver"
policy = "no-increase"
"#,
        )
        .unwrap();

        let eff = merge(&args(&[]), file.clone(), PathBuf::from("."), None).unwrap();
        assert_eq!(eff.lint.program, "pycodestyle");
        assert_eq!(eff.lint.ignore_codes, vec!["E501", "W503"]);
        assert_eq!(eff.lint.ignore_flag, "--extend-ignore");
        assert!(eff.lint.exclude.as_ref().unwrap().is_match("pkg/vendored.py:1:1: E1 x"));
        assert!(!eff.fetch);
        assert_eq!(eff.tag_selection, TagSelection::Semver);
        assert_eq!(eff.policy, GatePolicy::NoIncrease);

        let eff = merge(
            &args(&["--linter", "flake8", "--ignore", "E1,,E2 ", "--policy", "strict"]),
            file,
            PathBuf::from("."),
            None,
        )
        .unwrap();
        assert_eq!(eff.lint.program, "flake8");
        assert_eq!(eff.lint.ignore_codes, vec!["E1", "E2"]);
        assert_eq!(eff.policy, GatePolicy::Strict);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_patterns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "lintr = \"typo\"\n").unwrap();
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err.downcast_ref::<GateError>(), Some(GateError::Config { .. })));

        let err = merge(&args(&["--exclude", "("]), FileConfig::default(), PathBuf::from("."), None)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GateError>(),
            Some(GateError::InvalidExclude { .. })
        ));
    }

    #[test]
    fn report_dir_from_file_is_relative_to_the_file() {
        let cfg_path = PathBuf::from("/work/proj/lintgate.toml");
        let file: FileConfig = toml::from_str("report_dir = \"lint-out\"\n").unwrap();
        let eff = merge(&args(&[]), file, PathBuf::from("/work/proj/pkg"), Some(cfg_path.clone()))
            .unwrap();
        assert_eq!(eff.report_dir, Some(PathBuf::from("/work/proj/lint-out")));

        let file: FileConfig = toml::from_str("report_dir = \"/tmp/abs\"\n").unwrap();
        let eff = merge(&args(&[]), file, PathBuf::from("."), Some(cfg_path.clone())).unwrap();
        assert_eq!(eff.report_dir, Some(PathBuf::from("/tmp/abs")));

        let file: FileConfig = toml::from_str("report_dir = \"lint-out\"\n").unwrap();
        let eff = merge(&args(&["--report-dir", "cli-out"]), file, PathBuf::from("."), Some(cfg_path))
            .unwrap();
        assert_eq!(eff.report_dir, Some(PathBuf::from("cli-out")));
    }

    #[test]
    fn discovers_config_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "linter = \"ruff\"\n").unwrap();
        assert_eq!(discover(&nested), Some(dir.path().join(CONFIG_FILE_NAME)));
    }
}
