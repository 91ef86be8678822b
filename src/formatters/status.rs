use std::fmt::Write as _;
use std::io::IsTerminal;

use crate::gate::Verdict;
use crate::types::GateSummary;

/// Human-readable run summary for CI logs.
pub fn format(s: &GateSummary, colors: &Colors) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        colors.bold("Current errors:"),
        format_num(s.current.errors)
    );
    let when = s
        .baseline
        .committed_at
        .as_deref()
        .map(|d| format!(", {d}"))
        .unwrap_or_default();
    let _ = writeln!(
        out,
        "{} {} ({:.7}{when}) errors: {}",
        colors.bold("Baseline"),
        s.baseline.tag,
        s.baseline.commit,
        format_num(s.baseline.errors)
    );
    let _ = writeln!(out, "Delta (baseline - current): {:+}", s.delta);

    let (label, code) = match s.verdict {
        Verdict::Unchanged => ("PASS: error count unchanged", "32"),
        Verdict::Clean => ("PASS: no lint errors", "32"),
        Verdict::Improved => ("PASS: error count decreased", "32"),
        Verdict::Regressed => ("FAIL: lint errors changed against baseline", "31"),
    };
    let _ = writeln!(out, "{}", colors.paint(label, code));
    out
}

/// Colors a unified diff line by line; a no-op when colors are off.
pub fn paint_diff(diff: &str, colors: &Colors) -> String {
    if !colors.enabled {
        return diff.to_string();
    }
    let mut out = String::with_capacity(diff.len());
    for line in diff.lines() {
        let painted = if line.starts_with("+++") || line.starts_with("---") {
            colors.bold(line)
        } else if line.starts_with('+') {
            colors.paint(line, "32")
        } else if line.starts_with('-') {
            colors.paint(line, "31")
        } else if line.starts_with("@@") {
            colors.paint(line, "36")
        } else {
            line.to_string()
        };
        out.push_str(&painted);
        out.push('\n');
    }
    out
}

fn format_num(n: usize) -> String {
    let s = n.to_string();
    let mut out = String::with_capacity(s.len() + s.len() / 3);
    for (i, ch) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct Colors {
    enabled: bool,
}

impl Colors {
    pub fn enabled() -> Self {
        let force = std::env::var("CLICOLOR_FORCE")
            .ok()
            .filter(|v| v != "0")
            .is_some();
        let no_color = std::env::var_os("NO_COLOR").is_some();
        let clicolor_zero = std::env::var("CLICOLOR").ok().is_some_and(|v| v == "0");
        let term = std::io::stdout().is_terminal();
        let enabled = if force {
            true
        } else if no_color || clicolor_zero {
            false
        } else {
            term
        };
        Colors { enabled }
    }

    pub fn plain() -> Self {
        Colors { enabled: false }
    }

    fn paint(&self, s: &str, code: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }

    fn bold(&self, s: &str) -> String {
        if self.enabled {
            format!("\x1b[1m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    }
}
