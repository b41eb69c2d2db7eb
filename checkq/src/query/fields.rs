//! Per-field parsers for the top-level query keys.

use super::grammar::parse_comparison;
use super::model::{Aggregate, Comparison, Duration, GroupAggregate, GroupLimit, ThresholdComparison};
use crate::{Error, Result};

/// Top-level query keys, in canonical encoding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Metric,
    From,
    Until,
    Limit,
    GroupLimit,
    IncludeEmptyTargets,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Metric,
        Field::From,
        Field::Until,
        Field::Limit,
        Field::GroupLimit,
        Field::IncludeEmptyTargets,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Metric => "metric",
            Field::From => "from",
            Field::Until => "until",
            Field::Limit => "limit",
            Field::GroupLimit => "group_limit",
            Field::IncludeEmptyTargets => "include_empty_targets",
        }
    }

    /// Required fields must be present with a non-empty value.
    pub fn is_required(&self) -> bool {
        matches!(self, Field::Metric | Field::From | Field::Until | Field::Limit)
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }
}

pub fn parse_metric(raw: &str) -> String {
    raw.to_string()
}

pub fn parse_window(raw: &str) -> Result<Duration> {
    raw.parse()
}

/// Parse a comma-separated list of per-target thresholds.
pub fn parse_limit(raw: &str) -> Result<Vec<ThresholdComparison>> {
    raw.split(',')
        .map(|piece| {
            let c = parse_comparison(piece)?;
            let subject = c.subject.parse::<Aggregate>()?;
            Ok(Comparison::new(subject, c.op, c.value))
        })
        .collect()
}

/// Parse the optional group limit. Absent or empty means no group limit.
pub fn parse_group_limit(raw: Option<&str>) -> Result<GroupLimit> {
    let raw = match raw {
        None | Some("") => return Ok(GroupLimit::None),
        Some(raw) => raw,
    };

    match raw {
        "all" => return Ok(GroupLimit::All),
        "any" => return Ok(GroupLimit::Any),
        _ => {}
    }

    if raw.contains(',') {
        return Err(Error::MultipleGroupLimitComparisons(raw.to_string()));
    }

    let c = parse_comparison(raw)?;
    let subject = c.subject.parse::<GroupAggregate>()?;
    if subject == GroupAggregate::Fraction && c.value > 1.0 {
        return Err(Error::InvalidGroupLimitBound(raw.to_string()));
    }

    Ok(GroupLimit::Comparison(Comparison::new(subject, c.op, c.value)))
}

/// Only the literal `true` enables empty targets.
pub fn parse_include_empty_targets(raw: Option<&str>) -> bool {
    raw == Some("true")
}

