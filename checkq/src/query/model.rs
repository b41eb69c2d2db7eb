//! Typed check query record and its building blocks.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fields::Field;
use super::grammar::{parse_duration, CompareOp};
use crate::format::dedent;
use crate::{Error, Result};

/// A decoded check query.
///
/// Deserializing runs [`Query::validate`], so a JSON record can never hold
/// a query the string form could not carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "QueryRecord")]
pub struct Query {
    /// Flattened metric expression (no embedded whitespace)
    pub metric: String,
    /// Start of the window, relative to now
    pub from: Duration,
    /// End of the window, relative to now
    pub until: Duration,
    /// Per-target thresholds, in input order
    pub limit: Vec<ThresholdComparison>,
    /// Group-level threshold across all targets
    pub group_limit: GroupLimit,
    /// Whether targets without datapoints count as failures
    pub include_empty_targets: bool,
}

/// Unchecked wire shape of a [`Query`].
#[derive(Deserialize)]
struct QueryRecord {
    metric: String,
    from: Duration,
    until: Duration,
    limit: Vec<ThresholdComparison>,
    #[serde(default)]
    group_limit: GroupLimit,
    #[serde(default)]
    include_empty_targets: bool,
}

impl TryFrom<QueryRecord> for Query {
    type Error = Error;

    fn try_from(r: QueryRecord) -> Result<Self> {
        let query = Query {
            metric: r.metric,
            from: r.from,
            until: r.until,
            limit: r.limit,
            group_limit: r.group_limit,
            include_empty_targets: r.include_empty_targets,
        };
        query.validate()?;
        Ok(query)
    }
}

impl Query {
    /// Create a query with no group limit and empty targets excluded.
    pub fn new(
        metric: impl Into<String>,
        from: Duration,
        until: Duration,
        limit: Vec<ThresholdComparison>,
    ) -> Self {
        Self {
            metric: metric.into(),
            from,
            until,
            limit,
            group_limit: GroupLimit::None,
            include_empty_targets: false,
        }
    }

    pub fn with_group_limit(mut self, group_limit: GroupLimit) -> Self {
        self.group_limit = group_limit;
        self
    }

    pub fn with_include_empty_targets(mut self, include: bool) -> Self {
        self.include_empty_targets = include;
        self
    }

    /// Check that the query can be encoded and decoded again unchanged.
    ///
    /// The metric must be non-empty once flattened, `limit` must hold at
    /// least one comparison, every bound must be a finite non-negative
    /// number, and a `fraction` group bound must not exceed 1.
    pub fn validate(&self) -> Result<()> {
        if dedent(&self.metric).is_empty() {
            return Err(Error::MissingRequiredField(Field::Metric.name().to_string()));
        }
        if self.limit.is_empty() {
            return Err(Error::MissingRequiredField(Field::Limit.name().to_string()));
        }
        for c in &self.limit {
            c.check_bound()?;
        }
        if let GroupLimit::Comparison(c) = &self.group_limit {
            c.check_bound()?;
            if c.subject == GroupAggregate::Fraction && c.value > 1.0 {
                return Err(Error::InvalidGroupLimitBound(c.to_string()));
            }
        }
        Ok(())
    }
}

/// Per-target aggregation applied before comparing against a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregate {
    Avg,
    Min,
    Max,
    Sum,
}

impl Aggregate {
    pub const ALL: [Aggregate; 4] = [Aggregate::Avg, Aggregate::Min, Aggregate::Max, Aggregate::Sum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregate::Avg => "avg",
            Aggregate::Min => "min",
            Aggregate::Max => "max",
            Aggregate::Sum => "sum",
        }
    }

    /// Aggregate a non-empty slice of points. An empty slice yields NaN for
    /// avg/min/max and 0 for sum.
    pub fn apply(&self, points: &[f64]) -> f64 {
        match self {
            Aggregate::Sum => points.iter().sum(),
            Aggregate::Avg => points.iter().sum::<f64>() / points.len() as f64,
            Aggregate::Max => points.iter().copied().reduce(f64::max).unwrap_or(f64::NAN),
            Aggregate::Min => points.iter().copied().reduce(f64::min).unwrap_or(f64::NAN),
        }
    }
}

impl FromStr for Aggregate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "avg" => Ok(Aggregate::Avg),
            "min" => Ok(Aggregate::Min),
            "max" => Ok(Aggregate::Max),
            "sum" => Ok(Aggregate::Sum),
            _ => Err(Error::InvalidLimitSubject(s.to_string())),
        }
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregation across targets for a group limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupAggregate {
    /// Number of targets within their limits
    Count,
    /// Share of targets within their limits, in [0, 1]
    Fraction,
}

impl GroupAggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupAggregate::Count => "count",
            GroupAggregate::Fraction => "fraction",
        }
    }
}

impl FromStr for GroupAggregate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(GroupAggregate::Count),
            "fraction" => Ok(GroupAggregate::Fraction),
            _ => Err(Error::InvalidGroupLimitSubject(s.to_string())),
        }
    }
}

impl fmt::Display for GroupAggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `subject<op>value` triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Comparison<S> {
    pub subject: S,
    pub op: CompareOp,
    pub value: f64,
}

pub type ThresholdComparison = Comparison<Aggregate>;
pub type GroupComparison = Comparison<GroupAggregate>;

impl<S> Comparison<S> {
    pub fn new(subject: S, op: CompareOp, value: f64) -> Self {
        Self { subject, op, value }
    }

    /// Whether `observed` satisfies this comparison.
    pub fn holds(&self, observed: f64) -> bool {
        self.op.holds(observed, self.value)
    }
}

impl<S: fmt::Display> Comparison<S> {
    /// The bound must be expressible in the `[0-9.]+` number grammar.
    fn check_bound(&self) -> Result<()> {
        if !self.value.is_finite() {
            return Err(Error::InvalidNumber(self.value.to_string()));
        }
        if self.value.is_sign_negative() {
            return Err(Error::MalformedComparison(self.to_string()));
        }
        Ok(())
    }
}

impl<S: fmt::Display> fmt::Display for Comparison<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.subject, self.op, self.value)
    }
}

/// Group-level limit across all targets returned for a metric.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupLimit {
    #[default]
    None,
    /// Every target must be within its limits (`fraction=1`)
    All,
    /// At least one target must be within its limits (`count>0`)
    Any,
    Comparison(GroupComparison),
}

impl GroupLimit {
    pub fn is_none(&self) -> bool {
        matches!(self, GroupLimit::None)
    }

    /// The comparison a shorthand stands for.
    pub fn effective(&self) -> Option<GroupComparison> {
        match self {
            GroupLimit::None => None,
            GroupLimit::All => Some(Comparison::new(GroupAggregate::Fraction, CompareOp::Eq, 1.0)),
            GroupLimit::Any => Some(Comparison::new(GroupAggregate::Count, CompareOp::Gt, 0.0)),
            GroupLimit::Comparison(c) => Some(*c),
        }
    }
}

/// Unit of a duration segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Day,
    Hour,
    Minute,
    Second,
}

impl TimeUnit {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'd' => Some(TimeUnit::Day),
            'h' => Some(TimeUnit::Hour),
            'm' => Some(TimeUnit::Minute),
            's' => Some(TimeUnit::Second),
            _ => None,
        }
    }

    pub fn secs(&self) -> u64 {
        match self {
            TimeUnit::Day => 86_400,
            TimeUnit::Hour => 3_600,
            TimeUnit::Minute => 60,
            TimeUnit::Second => 1,
        }
    }
}

/// A validated duration token such as `1h30m`.
///
/// Carried as its canonical string. Units may repeat and appear in any
/// order, so `30m1h` and `1m1m` are both valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Duration(String);

impl Duration {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `(amount, unit)` pairs in string order. Amounts too large for `u64`
    /// saturate.
    pub fn segments(&self) -> Vec<(u64, TimeUnit)> {
        let mut segments = Vec::new();
        let mut start = 0;
        for (i, c) in self.0.char_indices() {
            if let Some(unit) = TimeUnit::from_char(c) {
                let amount = self.0[start..i].parse().unwrap_or(u64::MAX);
                segments.push((amount, unit));
                start = i + 1;
            }
        }
        segments
    }

    /// Total length in seconds, saturating on overflow.
    pub fn as_secs(&self) -> u64 {
        self.segments()
            .into_iter()
            .fold(0u64, |total, (amount, unit)| {
                total.saturating_add(amount.saturating_mul(unit.secs()))
            })
    }
}

impl FromStr for Duration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_duration(s).map(|d| Duration(d.to_string()))
    }
}

impl TryFrom<String> for Duration {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        parse_duration(&s)?;
        Ok(Duration(s))
    }
}

impl From<Duration> for String {
    fn from(d: Duration) -> Self {
        d.0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
