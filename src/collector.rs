use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;
use regex::Regex;

use crate::config::LintConfig;
use crate::error::GateError;
use crate::traversal::{TraversalOptions, collect_files};
use crate::types::LintReport;

/// Runs the configured linter over every qualifying file in the `scope`
/// subdirectory of the checkout at `root`, in a single batch, and returns the
/// filtered report. The linter runs from that subdirectory.
///
/// # Errors
/// Returns an error if traversal fails or the linter cannot be started.
pub fn collect(root: &Path, scope: &Path, cfg: &LintConfig) -> Result<LintReport> {
    let opts = TraversalOptions::from_extensions(&cfg.extensions);
    let files = collect_files(root, scope, &opts)?;
    let dir = root.join(scope);
    tracing::info!("{} files to lint under {}", files.len(), dir.display());
    if files.is_empty() {
        return Ok(LintReport::default());
    }

    let output = linter_command(&dir, cfg, &files)
        .output()
        .map_err(|source| GateError::LinterSpawn {
            program: cfg.program.clone(),
            source,
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !output.status.success() && stdout.trim().is_empty() {
        tracing::warn!(
            "{} exited with {} and produced no findings: {}",
            cfg.program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let report = filter_output(&stdout, cfg.exclude.as_ref());
    tracing::debug!("{} violations after filtering", report.count());
    Ok(report)
}

/// Builds `<linter> <extra args> <ignore flag>=<codes> <files…>`, run from `root`.
pub fn linter_command(root: &Path, cfg: &LintConfig, files: &[PathBuf]) -> Command {
    let mut cmd = Command::new(&cfg.program);
    cmd.current_dir(root).args(&cfg.extra_args);
    if !cfg.ignore_codes.is_empty() {
        cmd.arg(format!("{}={}", cfg.ignore_flag, cfg.ignore_codes.join(",")));
    }
    cmd.args(files);
    cmd
}

/// Drops blank lines and every line matched by `exclude`.
pub fn filter_output(stdout: &str, exclude: Option<&Regex>) -> LintReport {
    let lines = stdout
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !exclude.is_some_and(|re| re.is_match(l)))
        .map(str::to_string)
        .collect();
    LintReport::from_lines(lines)
}
