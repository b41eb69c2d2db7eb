//! checkq: check query codec
//!
//! Translates between threshold check queries (`/check?metric=...`) and
//! typed records, and pretty-prints the nested metric expressions they carry.

pub mod config;
pub mod error;
pub mod eval;
pub mod format;
pub mod graphite;
pub mod query;

pub use config::Config;
pub use error::{Error, Result};
pub use eval::{evaluate, Outcome};
pub use format::{check_balance, dedent, indent};
pub use graphite::Series;
pub use query::{
    parse, serialize, Aggregate, CompareOp, Comparison, Duration, GroupAggregate, GroupComparison,
    GroupLimit, Query, ThresholdComparison,
};
