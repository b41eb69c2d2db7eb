//! Decoding of raw check query strings into [`Query`] records and encoding
//! back into the canonical `/check?...` form.

use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::fields::{
    parse_group_limit, parse_include_empty_targets, parse_limit, parse_metric, parse_window, Field,
};
use super::model::{GroupLimit, Query, ThresholdComparison};
use crate::format::dedent;
use crate::{Error, Result};

/// Path prefix of the check endpoint.
pub const CHECK_PATH: &str = "/check";

/// Characters left unescaped in a query component: ASCII alphanumerics and
/// `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub(crate) fn encode_component(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

fn decode_component(s: &str) -> Result<String> {
    percent_decode_str(s)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| Error::InvalidEncoding(s.to_string()))
}

/// Raw decoded values keyed by query parameter name.
struct RawFields<'a> {
    values: HashMap<&'a str, String>,
}

impl<'a> RawFields<'a> {
    /// Split `key=value` pairs on `&`. A pair without `=` has an empty value.
    /// When a key repeats, the last occurrence wins.
    fn split(body: &'a str) -> Result<Self> {
        let mut values = HashMap::new();
        for pair in body.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            if Field::from_name(key).is_none() {
                tracing::debug!(key, "ignoring unknown query key");
            }
            if values.insert(key, decode_component(value)?).is_some() {
                tracing::debug!(key, "duplicate query key, keeping last value");
            }
        }
        Ok(Self { values })
    }

    /// Look up a field, enforcing its required flag.
    fn get(&self, field: Field) -> Result<Option<&str>> {
        let raw = self.values.get(field.name()).map(String::as_str);
        if field.is_required() && raw.map_or(true, str::is_empty) {
            return Err(Error::MissingRequiredField(field.name().to_string()));
        }
        tracing::trace!(field = field.name(), raw, "decoding field");
        Ok(raw)
    }

    fn require(&self, field: Field) -> Result<&str> {
        self.get(field)?
            .ok_or_else(|| Error::MissingRequiredField(field.name().to_string()))
    }
}

/// Strip a leading path ending in `check?`, or a leading `/` when no such
/// prefix is present.
///
/// Only a `?` before the first `=` or `&` can end the path, so a metric value
/// containing `check?` is left alone.
fn strip_path(raw: &str) -> &str {
    if let Some((path, rest)) = raw.split_once('?') {
        if path.ends_with("check") && !path.contains(['=', '&']) {
            return rest;
        }
    }
    raw.strip_prefix('/').unwrap_or(raw)
}

/// Decode a raw check query.
///
/// Returns `Ok(None)` when no query is present (empty input, or a bare
/// `check?` prefix). Unknown keys are ignored.
pub fn parse(raw: &str) -> Result<Option<Query>> {
    let body = strip_path(raw.trim());
    if body.is_empty() {
        return Ok(None);
    }

    let fields = RawFields::split(body)?;

    // Field::ALL order; the first failing field determines the error.
    let metric = parse_metric(fields.require(Field::Metric)?);
    let from = parse_window(fields.require(Field::From)?)?;
    let until = parse_window(fields.require(Field::Until)?)?;
    let limit = parse_limit(fields.require(Field::Limit)?)?;
    let group_limit = parse_group_limit(fields.get(Field::GroupLimit)?)?;
    let include_empty_targets = parse_include_empty_targets(fields.get(Field::IncludeEmptyTargets)?);

    let query = Query {
        metric,
        from,
        until,
        limit,
        group_limit,
        include_empty_targets,
    };
    tracing::debug!(metric = %query.metric, limits = query.limit.len(), "parsed check query");
    Ok(Some(query))
}

fn join_limits(limits: &[ThresholdComparison]) -> String {
    limits
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Encode a query into its canonical `/check?...` string.
///
/// The metric is flattened first. `include_empty_targets` is only written
/// when true.
pub fn serialize(q: &Query) -> String {
    let mut out = format!(
        "{}?{}={}&{}={}&{}={}&{}={}",
        CHECK_PATH,
        Field::Metric.name(),
        encode_component(&dedent(&q.metric)),
        Field::From.name(),
        encode_component(q.from.as_str()),
        Field::Until.name(),
        encode_component(q.until.as_str()),
        Field::Limit.name(),
        encode_component(&join_limits(&q.limit)),
    );

    let group_limit = match &q.group_limit {
        GroupLimit::None => None,
        GroupLimit::All => Some("all".to_string()),
        GroupLimit::Any => Some("any".to_string()),
        GroupLimit::Comparison(c) => Some(encode_component(&c.to_string())),
    };
    if let Some(value) = group_limit {
        out.push_str(&format!("&{}={}", Field::GroupLimit.name(), value));
    }

    if q.include_empty_targets {
        out.push_str(&format!("&{}=true", Field::IncludeEmptyTargets.name()));
    }

    out
}
