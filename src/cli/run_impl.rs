use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::collector;
use crate::config::{self, Effective};
use crate::formatters::status::{self, Colors};
use crate::formatters::unified::ReportDiff;
use crate::gate::{self, Verdict};
use crate::types::{BaselineSummary, GateSummary, LintReport, SideSummary};
use crate::vcs::{TagInfo, VcsContext};

use super::Args;

const DIFF_CONTEXT: usize = 3;

pub fn run_with_args(args: &Args) -> Result<Verdict> {
    let eff = config::resolve(args)?;
    if let Some(ref path) = eff.config_path {
        tracing::info!("using config {}", path.display());
    }

    let vcs = VcsContext::open(&eff.repo_root)?;
    let workdir = vcs.workdir()?;
    let scope = vcs.relative_to_workdir(&eff.repo_root)?;

    // Measure the caller's tree first; nothing below writes to it.
    let current =
        collector::collect(&workdir, &scope, &eff.lint).context("lint current tree")?;
    tracing::info!("current tree: {} errors", current.count());

    if eff.fetch {
        vcs.fetch_tags(&eff.remote)?;
    } else {
        tracing::info!("skipping tag fetch");
    }
    let tag = match eff.tag.as_deref() {
        Some(name) => vcs.find_tag(name)?,
        None => vcs.select_tag(eff.tag_selection)?,
    };
    tracing::info!("baseline tag {} ({:.7})", tag.name, tag.commit);

    let checkout = vcs.export_tag(&tag)?;
    let baseline = collector::collect(checkout.path(), &scope, &eff.lint)
        .with_context(|| format!("lint baseline {}", tag.name))?;
    drop(checkout);
    tracing::info!("baseline {}: {} errors", tag.name, baseline.count());

    if let Some(ref dir) = eff.report_dir {
        write_reports(dir, &current, &baseline)?;
    }

    let verdict = eff.policy.evaluate(baseline.count(), current.count());
    // Only a failing run shows line-level changes.
    let diff = (!verdict.passed())
        .then(|| ReportDiff::compute(baseline.lines(), current.lines()));
    let summary = build_summary(&eff, &tag, &current, &baseline, diff.as_ref(), verdict);
    emit_output(&eff, &summary, diff.as_ref());
    Ok(verdict)
}

fn build_summary(
    eff: &Effective,
    tag: &TagInfo,
    current: &LintReport,
    baseline: &LintReport,
    diff: Option<&ReportDiff<'_>>,
    verdict: Verdict,
) -> GateSummary {
    let owned =
        |lines: Vec<&str>| -> Vec<String> { lines.into_iter().map(str::to_string).collect() };
    let (new_violations, fixed_violations) = match diff {
        Some(d) => (owned(d.added()), owned(d.removed())),
        None => (Vec::new(), Vec::new()),
    };
    GateSummary {
        current: SideSummary::of(current),
        baseline: BaselineSummary {
            tag: tag.name.clone(),
            commit: tag.commit.to_string(),
            committed_at: tag.committed_at(),
            errors: baseline.count(),
            by_code: baseline.by_code(),
        },
        delta: gate::delta(baseline.count(), current.count()),
        policy: eff.policy,
        verdict,
        passed: verdict.passed(),
        new_violations,
        fixed_violations,
    }
}

fn write_reports(dir: &Path, current: &LintReport, baseline: &LintReport) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let after = dir.join("after.txt");
    let before = dir.join("before.txt");
    fs::write(&after, current.to_text()).with_context(|| format!("write {}", after.display()))?;
    fs::write(&before, baseline.to_text())
        .with_context(|| format!("write {}", before.display()))?;
    tracing::info!("reports written to {}", dir.display());
    Ok(())
}

fn emit_output(eff: &Effective, summary: &GateSummary, diff: Option<&ReportDiff<'_>>) {
    if eff.json {
        match serde_json::to_string_pretty(summary) {
            Ok(s) => println!("{s}"),
            Err(err) => tracing::error!("serialize summary: {err}"),
        }
        return;
    }

    let colors = Colors::enabled();
    print!("{}", status::format(summary, &colors));
    if let Some(diff) = diff {
        let text = diff.unified(
            &format!("before ({})", summary.baseline.tag),
            "after (working tree)",
            DIFF_CONTEXT,
        );
        println!();
        print!("{}", status::paint_diff(&text, &colors));
    }
}
