//! Line diff between two lint reports, rendered in `diff -u` format.

use std::collections::HashMap;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal { old: usize, new: usize },
    Delete { old: usize },
    Insert { new: usize },
}

impl Op {
    fn is_change(self) -> bool {
        !matches!(self, Op::Equal { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ReportDiff<'a> {
    old: &'a [String],
    new: &'a [String],
    ops: Vec<Op>,
}

impl<'a> ReportDiff<'a> {
    pub fn compute(old: &'a [String], new: &'a [String]) -> Self {
        // Compare interned ids rather than strings.
        let mut ids: HashMap<&str, u32> = HashMap::new();
        let mut intern = |line: &'a String| {
            let next = u32::try_from(ids.len()).unwrap_or(u32::MAX);
            *ids.entry(line.as_str()).or_insert(next)
        };
        let a: Vec<u32> = old.iter().map(&mut intern).collect();
        let b: Vec<u32> = new.iter().map(&mut intern).collect();

        let mut differ = Differ {
            a: &a,
            b: &b,
            ops: Vec::with_capacity(a.len().max(b.len())),
        };
        differ.diff(0, a.len(), 0, b.len());
        let ops = differ.ops;

        Self { old, new, ops }
    }

    pub fn has_changes(&self) -> bool {
        self.ops.iter().any(|op| op.is_change())
    }

    /// Lines present only in the new report.
    pub fn added(&self) -> Vec<&'a str> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Insert { new } => Some(self.new[new].as_str()),
                _ => None,
            })
            .collect()
    }

    /// Lines present only in the old report.
    pub fn removed(&self) -> Vec<&'a str> {
        self.ops
            .iter()
            .filter_map(|op| match *op {
                Op::Delete { old } => Some(self.old[old].as_str()),
                _ => None,
            })
            .collect()
    }

    /// Renders hunks with `context` lines around each change. Empty when the
    /// reports are identical.
    pub fn unified(&self, old_label: &str, new_label: &str, context: usize) -> String {
        let mut out = String::new();
        if !self.has_changes() {
            return out;
        }
        let _ = writeln!(out, "--- {old_label}");
        let _ = writeln!(out, "+++ {new_label}");

        // Line counters before each op, for hunk headers.
        let mut before = Vec::with_capacity(self.ops.len());
        let (mut o, mut n) = (0usize, 0usize);
        for op in &self.ops {
            before.push((o, n));
            match op {
                Op::Equal { .. } => {
                    o += 1;
                    n += 1;
                }
                Op::Delete { .. } => o += 1,
                Op::Insert { .. } => n += 1,
            }
        }

        for (start, end) in self.hunk_ranges(context) {
            let slice = &self.ops[start..end];
            let old_count = slice
                .iter()
                .filter(|op| !matches!(op, Op::Insert { .. }))
                .count();
            let new_count = slice
                .iter()
                .filter(|op| !matches!(op, Op::Delete { .. }))
                .count();
            let (o0, n0) = before[start];
            let _ = writeln!(
                out,
                "@@ -{} +{} @@",
                range(o0, old_count),
                range(n0, new_count)
            );
            for op in slice {
                let _ = match *op {
                    Op::Equal { old, .. } => writeln!(out, " {}", self.old[old]),
                    Op::Delete { old } => writeln!(out, "-{}", self.old[old]),
                    Op::Insert { new } => writeln!(out, "+{}", self.new[new]),
                };
            }
        }
        out
    }

    fn hunk_ranges(&self, context: usize) -> Vec<(usize, usize)> {
        let mut ranges: Vec<(usize, usize)> = Vec::new();
        for (i, op) in self.ops.iter().enumerate() {
            if !op.is_change() {
                continue;
            }
            let start = i.saturating_sub(context);
            let end = (i + context + 1).min(self.ops.len());
            match ranges.last_mut() {
                Some(last) if start <= last.1 => last.1 = end,
                _ => ranges.push((start, end)),
            }
        }
        ranges
    }
}

fn range(before: usize, count: usize) -> String {
    match count {
        0 => format!("{before},0"),
        1 => format!("{}", before + 1),
        _ => format!("{},{}", before + 1, count),
    }
}

/// Divide-and-conquer Myers: each bisection keeps two diagonal vectors, so
/// memory stays linear in the input.
struct Differ<'s> {
    a: &'s [u32],
    b: &'s [u32],
    ops: Vec<Op>,
}

impl Differ<'_> {
    fn diff(&mut self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) {
        let (a, b) = (self.a, self.b);
        let prefix = a[a_lo..a_hi]
            .iter()
            .zip(&b[b_lo..b_hi])
            .take_while(|(x, y)| x == y)
            .count();
        self.ops.extend((0..prefix).map(|i| Op::Equal {
            old: a_lo + i,
            new: b_lo + i,
        }));
        let (a_lo, b_lo) = (a_lo + prefix, b_lo + prefix);

        let suffix = a[a_lo..a_hi]
            .iter()
            .rev()
            .zip(b[b_lo..b_hi].iter().rev())
            .take_while(|(x, y)| x == y)
            .count();
        let (a_end, b_end) = (a_hi - suffix, b_hi - suffix);

        if a_lo == a_end {
            self.ops.extend((b_lo..b_end).map(|new| Op::Insert { new }));
        } else if b_lo == b_end {
            self.ops.extend((a_lo..a_end).map(|old| Op::Delete { old }));
        } else if let Some((x, y)) = self.bisect(a_lo, a_end, b_lo, b_end) {
            self.diff(a_lo, a_lo + x, b_lo, b_lo + y);
            self.diff(a_lo + x, a_end, b_lo + y, b_end);
        } else {
            self.ops.extend((a_lo..a_end).map(|old| Op::Delete { old }));
            self.ops.extend((b_lo..b_end).map(|new| Op::Insert { new }));
        }

        self.ops.extend((0..suffix).map(|i| Op::Equal {
            old: a_end + i,
            new: b_end + i,
        }));
    }

    /// Finds where the forward and reverse searches meet and returns that
    /// split point relative to `(a_lo, b_lo)`, or `None` when the ranges
    /// share nothing.
    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss)]
    fn bisect(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Option<(usize, usize)> {
        let a = &self.a[a_lo..a_hi];
        let b = &self.b[b_lo..b_hi];
        let n = a.len() as isize;
        let m = b.len() as isize;
        let max_d = (n + m + 1) / 2;
        let offset = max_d;
        let len = 2 * max_d + 2;
        let mut fwd = vec![-1isize; len as usize];
        let mut rev = vec![-1isize; len as usize];
        fwd[(offset + 1) as usize] = 0;
        rev[(offset + 1) as usize] = 0;
        let delta = n - m;
        let front = delta % 2 != 0;
        // Diagonals that ran off the grid are skipped from then on.
        let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

        for d in 0..max_d {
            let mut k1 = -d + k1_start;
            while k1 <= d - k1_end {
                let k1_off = (offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && fwd[k1_off - 1] < fwd[k1_off + 1]) {
                    fwd[k1_off + 1]
                } else {
                    fwd[k1_off - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                fwd[k1_off] = x1;
                if x1 > n {
                    k1_end += 2;
                } else if y1 > m {
                    k1_start += 2;
                } else if front {
                    let k2_off = offset + delta - k1;
                    if k2_off >= 0 && k2_off < len && rev[k2_off as usize] != -1 {
                        let x2 = n - rev[k2_off as usize];
                        if x1 >= x2 {
                            return Some((x1 as usize, y1 as usize));
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2_start;
            while k2 <= d - k2_end {
                let k2_off = (offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && rev[k2_off - 1] < rev[k2_off + 1]) {
                    rev[k2_off + 1]
                } else {
                    rev[k2_off - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                    x2 += 1;
                    y2 += 1;
                }
                rev[k2_off] = x2;
                if x2 > n {
                    k2_end += 2;
                } else if y2 > m {
                    k2_start += 2;
                } else if !front {
                    let k1_off = offset + delta - k2;
                    if k1_off >= 0 && k1_off < len && fwd[k1_off as usize] != -1 {
                        let x1 = fwd[k1_off as usize];
                        let y1 = offset + x1 - k1_off;
                        if x1 >= n - x2 {
                            return Some((x1 as usize, y1 as usize));
                        }
                    }
                }
                k2 += 2;
            }
        }
        None
    }
}
