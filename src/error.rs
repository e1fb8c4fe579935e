use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

pub type AppResult<T> = Result<T, AppError>;

/// Reason a page could not be turned into a summary or pivot table.
///
/// These never abort a report: the formatter swaps the affected table for an
/// empty one and keeps the error alongside the page so callers can tell a
/// malformed response from a genuinely empty one.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("missing field `{0}`")]
    MissingField(&'static str),

    #[error("row {row} has {found} values, expected {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column {column}: value {value} is not numeric")]
    NotNumeric {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("summary has {summary} rows but pivot has {pivot}")]
    RowCountMismatch { summary: usize, pivot: usize },
}
