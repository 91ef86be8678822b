//! Comparator and pass/fail decision.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// `baseline_count - current_count`. Positive means the current tree has
/// fewer violations than the baseline.
#[allow(clippy::cast_possible_wrap)]
pub fn delta(baseline_count: usize, current_count: usize) -> i64 {
    baseline_count as i64 - current_count as i64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GatePolicy {
    /// Pass only on identical counts or a fully clean tree.
    #[default]
    Strict,
    /// Pass whenever the count did not grow.
    NoIncrease,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Unchanged,
    Clean,
    Improved,
    Regressed,
}

impl Verdict {
    pub fn passed(self) -> bool {
        !matches!(self, Verdict::Regressed)
    }

    pub fn exit_code(self) -> i32 {
        if self.passed() { 0 } else { 1 }
    }
}

impl GatePolicy {
    pub fn evaluate(self, baseline_count: usize, current_count: usize) -> Verdict {
        let d = delta(baseline_count, current_count);
        match self {
            GatePolicy::Strict => {
                #[allow(clippy::cast_possible_wrap)]
                let cleaned_up = d == baseline_count as i64;
                if d == 0 {
                    Verdict::Unchanged
                } else if cleaned_up {
                    Verdict::Clean
                } else {
                    // Partial improvements also land here.
                    Verdict::Regressed
                }
            }
            GatePolicy::NoIncrease => {
                if d == 0 {
                    Verdict::Unchanged
                } else if current_count == 0 {
                    Verdict::Clean
                } else if d > 0 {
                    Verdict::Improved
                } else {
                    Verdict::Regressed
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn documented_scenarios() {
        let strict = GatePolicy::Strict;
        // A
        assert_eq!(delta(10, 10), 0);
        assert_eq!(strict.evaluate(10, 10), Verdict::Unchanged);
        // B
        assert_eq!(delta(10, 0), 10);
        assert_eq!(strict.evaluate(10, 0), Verdict::Clean);
        // C
        assert_eq!(delta(10, 12), -2);
        assert_eq!(strict.evaluate(10, 12), Verdict::Regressed);
        assert_eq!(strict.evaluate(10, 12).exit_code(), 1);
        // D
        assert_eq!(strict.evaluate(0, 0), Verdict::Unchanged);
        assert_eq!(strict.evaluate(0, 0).exit_code(), 0);
        // E
        assert_eq!(delta(5, 3), 2);
        assert_eq!(strict.evaluate(5, 3), Verdict::Regressed);
    }

    #[test]
    fn no_increase_tolerates_partial_improvement() {
        let p = GatePolicy::NoIncrease;
        assert_eq!(p.evaluate(5, 3), Verdict::Improved);
        assert_eq!(p.evaluate(5, 0), Verdict::Clean);
        assert_eq!(p.evaluate(5, 5), Verdict::Unchanged);
        assert_eq!(p.evaluate(5, 6), Verdict::Regressed);
        assert_eq!(p.evaluate(0, 1), Verdict::Regressed);
    }

    #[test]
    fn policy_names_round_trip_through_config_strings() {
        let p: GatePolicy = serde_json::from_str("\"no-increase\"").unwrap();
        assert_eq!(p, GatePolicy::NoIncrease);
        assert_eq!(serde_json::to_string(&Verdict::Regressed).unwrap(), "\"regressed\"");
    }

    proptest! {
        #[test]
        fn strict_passes_iff_equal_or_clean(baseline in 0usize..10_000, current in 0usize..10_000) {
            let passed = GatePolicy::Strict.evaluate(baseline, current).passed();
            prop_assert_eq!(passed, current == baseline || current == 0);
        }

        #[test]
        fn no_increase_passes_iff_not_larger(baseline in 0usize..10_000, current in 0usize..10_000) {
            let passed = GatePolicy::NoIncrease.evaluate(baseline, current).passed();
            prop_assert_eq!(passed, current <= baseline);
        }
    }
}
