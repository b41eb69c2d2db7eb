//! Offline evaluation of a check against Graphite series.
//!
//! Each target is reduced with every limit's aggregate and must satisfy all
//! of them. Without a group limit exactly one target is expected; with one,
//! the count or fraction of passing targets is compared instead.

use std::fmt;

use serde::Serialize;

use crate::graphite::Series;
use crate::query::{GroupAggregate, GroupComparison, Query};

/// Result of evaluating a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub ok: bool,
    /// Empty when ok
    pub reason: String,
}

impl Outcome {
    fn pass() -> Self {
        Self {
            ok: true,
            reason: String::new(),
        }
    }

    fn fail(reason: impl Into<String>) -> Self {
        Self {
            ok: false,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ok {
            write!(f, "OK")
        } else {
            write!(f, "NOT OK: {}", self.reason)
        }
    }
}

/// Per-target verdict.
#[derive(Debug, Clone, PartialEq)]
struct TargetResult {
    ok: bool,
    /// Excluded from group accounting
    ignore: bool,
    reason: String,
}

fn check_target(series: &Series, q: &Query) -> TargetResult {
    let values = series.values();
    for limit in &q.limit {
        if values.is_empty() {
            return TargetResult {
                ok: false,
                ignore: !q.include_empty_targets,
                reason: format!("{}: no datapoints", series.target),
            };
        }
        let agg = limit.subject.apply(&values);
        if !limit.holds(agg) {
            tracing::debug!(series = %series.target, %limit, agg, "limit violated");
            return TargetResult {
                ok: false,
                ignore: false,
                reason: format!(
                    "{}: limit violated: {} ({}={:.4})",
                    series.target, limit, limit.subject, agg
                ),
            };
        }
    }
    TargetResult {
        ok: true,
        ignore: false,
        reason: String::new(),
    }
}

fn check_group(results: &[TargetResult], limit: &GroupComparison) -> Outcome {
    if results.is_empty() {
        return Outcome::fail("no data to check");
    }

    let good = results.iter().filter(|r| r.ok).count();
    let observed = match limit.subject {
        GroupAggregate::Count => good as f64,
        GroupAggregate::Fraction => good as f64 / results.len() as f64,
    };
    if limit.holds(observed) {
        return Outcome::pass();
    }

    let mut reason = format!(
        "group_limit {} check failed ({}/{} good datapoints)\nFailed datapoints:",
        limit,
        good,
        results.len()
    );
    for r in results.iter().filter(|r| !r.ok) {
        reason.push('\n');
        reason.push_str(&r.reason);
    }
    Outcome::fail(reason)
}

/// Evaluate `q` against the series Graphite returned for its metric.
pub fn evaluate(q: &Query, series: &[Series]) -> Outcome {
    if series.is_empty() {
        return Outcome::fail("No datapoints returned from Graphite.");
    }

    match q.group_limit.effective() {
        Some(limit) => {
            let results: Vec<_> = series
                .iter()
                .map(|s| check_target(s, q))
                .filter(|r| !r.ignore)
                .collect();
            tracing::debug!(
                targets = series.len(),
                considered = results.len(),
                "evaluating group limit"
            );
            check_group(&results, &limit)
        }
        None if series.len() > 1 => {
            Outcome::fail("group_limit not given, yet Graphite returned multiple datapoints")
        }
        None => {
            let r = check_target(&series[0], q);
            if r.ok {
                Outcome::pass()
            } else {
                Outcome::fail(r.reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphite::Datapoint;
    use crate::query::{parse, GroupLimit};

    fn series(target: &str, values: &[Option<f64>]) -> Series {
        Series {
            target: target.to_string(),
            datapoints: values.iter().map(|v| Datapoint(*v, None)).collect(),
        }
    }

    fn check(raw: &str) -> Query {
        parse(raw).unwrap().unwrap()
    }

    #[test]
    fn test_no_series() {
        let q = check("metric=a&from=1h&until=0s&limit=avg<5");
        let outcome = evaluate(&q, &[]);
        assert!(!outcome.ok);
        assert_eq!(outcome.reason, "No datapoints returned from Graphite.");
    }

    #[test]
    fn test_single_target_within_limits() {
        let q = check("metric=a&from=1h&until=0s&limit=avg<5,max<=10");
        let outcome = evaluate(&q, &[series("a", &[Some(1.0), None, Some(4.0)])]);
        assert_eq!(outcome, Outcome::pass());
        assert_eq!(outcome.to_string(), "OK");
    }

    #[test]
    fn test_single_target_average_over_limit() {
        // Null points are skipped: (1 + 10) / 2 = 5.5
        let q = check("metric=a&from=1h&until=0s&limit=avg<5,max<=10");
        let outcome = evaluate(&q, &[series("a", &[Some(1.0), None, Some(10.0)])]);
        assert_eq!(outcome.reason, "a: limit violated: avg<5 (avg=5.5000)");
    }

    #[test]
    fn test_single_target_violation() {
        let q = check("metric=a&from=1h&until=0s&limit=sum<5");
        let outcome = evaluate(&q, &[series("a", &[Some(3.0), Some(4.0)])]);
        assert!(!outcome.ok);
        assert_eq!(outcome.reason, "a: limit violated: sum<5 (sum=7.0000)");
        assert!(outcome.to_string().starts_with("NOT OK: a: limit violated"));
    }

    #[test]
    fn test_single_target_empty() {
        let q = check("metric=a&from=1h&until=0s&limit=min>0");
        let outcome = evaluate(&q, &[series("a", &[None, None])]);
        assert_eq!(outcome.reason, "a: no datapoints");
    }

    #[test]
    fn test_multiple_targets_without_group_limit() {
        let q = check("metric=a.*&from=1h&until=0s&limit=avg<5");
        let outcome = evaluate(&q, &[series("a.x", &[Some(1.0)]), series("a.y", &[Some(1.0)])]);
        assert!(!outcome.ok);
        assert!(outcome.reason.starts_with("group_limit not given"));
    }

    #[test]
    fn test_group_any() {
        let q = check("metric=a.*&from=1h&until=0s&limit=avg<5&group_limit=any");
        let data = [series("a.x", &[Some(9.0)]), series("a.y", &[Some(1.0)])];
        assert!(evaluate(&q, &data).ok);

        let data = [series("a.x", &[Some(9.0)]), series("a.y", &[Some(8.0)])];
        let outcome = evaluate(&q, &data);
        assert!(!outcome.ok);
        assert_eq!(
            outcome.reason,
            "group_limit count>0 check failed (0/2 good datapoints)\nFailed datapoints:\n\
             a.x: limit violated: avg<5 (avg=9.0000)\na.y: limit violated: avg<5 (avg=8.0000)"
        );
    }

    #[test]
    fn test_group_all() {
        let q = check("metric=a.*&from=1h&until=0s&limit=max<5&group_limit=all");
        let data = [series("a.x", &[Some(1.0)]), series("a.y", &[Some(6.0)])];
        let outcome = evaluate(&q, &data);
        assert!(outcome.reason.contains("fraction=1 check failed (1/2"));
    }

    #[test]
    fn test_group_fraction_comparison() {
        let q = check("metric=a.*&from=1h&until=0s&limit=max<5&group_limit=fraction>=0.5");
        let data = [series("a.x", &[Some(1.0)]), series("a.y", &[Some(6.0)])];
        assert!(evaluate(&q, &data).ok);
    }

    #[test]
    fn test_empty_targets_ignored_by_default() {
        let q = check("metric=a.*&from=1h&until=0s&limit=avg<5&group_limit=all");
        let data = [series("a.x", &[Some(1.0)]), series("a.y", &[None])];
        assert!(evaluate(&q, &data).ok);
    }

    #[test]
    fn test_empty_targets_included() {
        let q = check("metric=a.*&from=1h&until=0s&limit=avg<5&include_empty_targets=true")
            .with_group_limit(GroupLimit::All);
        let data = [series("a.x", &[Some(1.0)]), series("a.y", &[None])];
        let outcome = evaluate(&q, &data);
        assert!(!outcome.ok);
        assert!(outcome.reason.ends_with("a.y: no datapoints"));
    }

    #[test]
    fn test_all_targets_empty() {
        let q = check("metric=a.*&from=1h&until=0s&limit=avg<5&group_limit=any");
        let outcome = evaluate(&q, &[series("a.x", &[]), series("a.y", &[None])]);
        assert_eq!(outcome, Outcome::fail("no data to check"));
    }
}
