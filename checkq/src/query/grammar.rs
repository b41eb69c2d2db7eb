//! Token grammars shared by the field parsers: `subject<op>value`
//! comparisons and `(\d+[dhms])+` durations.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Comparison operators accepted in limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// `<` less than
    #[serde(rename = "<")]
    Lt,
    /// `<=` less or equal
    #[serde(rename = "<=")]
    Lte,
    /// `=` equals
    #[serde(rename = "=")]
    Eq,
    /// `>=` greater or equal
    #[serde(rename = ">=")]
    Gte,
    /// `>` greater than
    #[serde(rename = ">")]
    Gt,
}

impl CompareOp {
    pub const ALL: [CompareOp; 5] = [
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::Eq,
        CompareOp::Gte,
        CompareOp::Gt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Eq => "=",
            CompareOp::Gte => ">=",
            CompareOp::Gt => ">",
        }
    }

    /// Evaluate `lhs <op> rhs`.
    pub fn holds(&self, lhs: f64, rhs: f64) -> bool {
        match self {
            CompareOp::Lt => lhs < rhs,
            CompareOp::Lte => lhs <= rhs,
            CompareOp::Eq => lhs == rhs,
            CompareOp::Gte => lhs >= rhs,
            CompareOp::Gt => lhs > rhs,
        }
    }

    /// Match an operator at the start of `input`, returning it and its
    /// length in bytes. Two-character operators win over their one-character
    /// prefixes.
    fn match_prefix(input: &str) -> Option<(CompareOp, usize)> {
        if input.starts_with("<=") {
            Some((CompareOp::Lte, 2))
        } else if input.starts_with(">=") {
            Some((CompareOp::Gte, 2))
        } else if input.starts_with('<') {
            Some((CompareOp::Lt, 1))
        } else if input.starts_with('>') {
            Some((CompareOp::Gt, 1))
        } else if input.starts_with('=') {
            Some((CompareOp::Eq, 1))
        } else {
            None
        }
    }
}

impl FromStr for CompareOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match CompareOp::match_prefix(s) {
            Some((op, len)) if len == s.len() => Ok(op),
            _ => Err(Error::MalformedComparison(s.to_string())),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A comparison whose subject has not yet been checked against a field's
/// allowed names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawComparison<'a> {
    pub subject: &'a str,
    pub op: CompareOp,
    pub value: f64,
}

/// Parse a whole `subject<op>value` token.
///
/// The subject is one or more characters other than `<`, `=` and `>`; the
/// value is one or more ASCII digits or dots and must parse as a finite
/// float.
pub fn parse_comparison(raw: &str) -> Result<RawComparison<'_>> {
    let malformed = || Error::MalformedComparison(raw.to_string());

    let subject_end = raw.find(['<', '=', '>']).ok_or_else(malformed)?;
    if subject_end == 0 {
        return Err(malformed());
    }
    let subject = &raw[..subject_end];

    let (op, op_len) = CompareOp::match_prefix(&raw[subject_end..]).ok_or_else(malformed)?;
    let number = &raw[subject_end + op_len..];
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return Err(malformed());
    }

    let value = match number.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => return Err(Error::InvalidNumber(number.to_string())),
    };

    Ok(RawComparison { subject, op, value })
}

fn duration_regex() -> &'static Regex {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    DURATION.get_or_init(|| Regex::new(r"^(?:[0-9]+[dhms])+$").expect("duration pattern compiles"))
}

/// Validate a duration token, returning it unchanged.
pub fn parse_duration(raw: &str) -> Result<&str> {
    if duration_regex().is_match(raw) {
        Ok(raw)
    } else {
        Err(Error::MalformedDuration(raw.to_string()))
    }
}
