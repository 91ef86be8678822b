use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::gate::{GatePolicy, Verdict};

static VIOLATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<path>.+?):(?P<line>\d+):(?:(?P<col>\d+):)?\s*(?P<code>[A-Za-z]+\d+)\s*(?P<message>.*)$")
        .expect("violation regex is valid")
});

/// One `path:line:col: code message` line, parsed on a best-effort basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub line: usize,
    pub column: Option<usize>,
    pub code: String,
    pub message: String,
}

impl Violation {
    pub fn parse(line: &str) -> Option<Self> {
        let caps = VIOLATION_RE.captures(line)?;
        Some(Violation {
            path: caps["path"].to_string(),
            line: caps["line"].parse().ok()?,
            column: caps.name("col").and_then(|m| m.as_str().parse().ok()),
            code: caps["code"].to_string(),
            message: caps["message"].trim().to_string(),
        })
    }
}

/// Filtered linter output for one checkout, in the order the linter printed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    lines: Vec<String>,
}

impl LintReport {
    pub fn from_lines(lines: Vec<String>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The report's error count.
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Violations per rule code, most frequent first. Unparseable lines are
    /// grouped under `?`.
    pub fn by_code(&self) -> IndexMap<String, usize> {
        let mut per_code: IndexMap<String, usize> = IndexMap::new();
        for line in &self.lines {
            let code = Violation::parse(line).map_or_else(|| "?".to_string(), |v| v.code);
            *per_code.entry(code).or_default() += 1;
        }
        per_code.sort_by(|ka, a, kb, b| b.cmp(a).then_with(|| ka.cmp(kb)));
        per_code
    }

    /// Report contents as written to a report file: one violation per line.
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SideSummary {
    pub errors: usize,
    pub by_code: IndexMap<String, usize>,
}

impl SideSummary {
    pub fn of(report: &LintReport) -> Self {
        Self {
            errors: report.count(),
            by_code: report.by_code(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BaselineSummary {
    pub tag: String,
    pub commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub committed_at: Option<String>,
    pub errors: usize,
    pub by_code: IndexMap<String, usize>,
}

/// Machine-readable outcome of one gate run (`--json`).
#[derive(Debug, Clone, Serialize)]
pub struct GateSummary {
    pub current: SideSummary,
    pub baseline: BaselineSummary,
    pub delta: i64,
    pub policy: GatePolicy,
    pub verdict: Verdict,
    pub passed: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub new_violations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixed_violations: Vec<String>,
}
