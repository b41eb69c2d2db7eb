//! Error types for check query operations.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Missing field: {0}")]
    MissingRequiredField(String),

    #[error("Bad comparison: {0}")]
    MalformedComparison(String),

    #[error("Bad number in comparison: {0}")]
    InvalidNumber(String),

    #[error("Bad duration: {0}")]
    MalformedDuration(String),

    #[error("Bad comparison for limit: {0}")]
    InvalidLimitSubject(String),

    #[error("Bad comparison for group limit: {0}")]
    InvalidGroupLimitSubject(String),

    #[error("Bad group limit (only one comparison allowed): {0}")]
    MultipleGroupLimitComparisons(String),

    #[error("Bad group limit bound: {0}")]
    InvalidGroupLimitBound(String),

    #[error("Invalid percent-encoding: {0}")]
    InvalidEncoding(String),

    #[error("Unbalanced parentheses in metric expression: {0}")]
    UnbalancedExpression(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
