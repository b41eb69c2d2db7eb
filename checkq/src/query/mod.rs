//! Check query codec.
//!
//! # Syntax Overview
//!
//! Canonical form:
//!
//! ```text
//! /check?metric=<expr>&from=<duration>&until=<duration>&limit=<comp>[,<comp>]*
//!       [&group_limit=all|any|<comp>][&include_empty_targets=true]
//! ```
//!
//! - **Comparisons**: `subject<op>value`, e.g. `avg<=5`; operators are
//!   `<`, `<=`, `=`, `>=`, `>`
//! - **Limit subjects**: `avg`, `min`, `max`, `sum`
//! - **Group limit subjects**: `count`, `fraction`, or the shorthands
//!   `all` / `any`
//! - **Durations**: repeated `<amount><unit>` groups with units `d h m s`,
//!   e.g. `1h30m`

mod codec;
mod fields;
mod grammar;
mod model;

pub use codec::{parse, serialize, CHECK_PATH};
pub(crate) use codec::encode_component;
pub use fields::{
    parse_group_limit, parse_include_empty_targets, parse_limit, parse_metric, parse_window, Field,
};
pub use grammar::{parse_comparison, parse_duration, CompareOp, RawComparison};
pub use model::{
    Aggregate, Comparison, Duration, GroupAggregate, GroupComparison, GroupLimit, Query,
    ThresholdComparison, TimeUnit,
};
