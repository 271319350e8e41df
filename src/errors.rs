use std::path::PathBuf;

use thiserror::Error;

///
/// Errors produced while loading, building or querying a lookup table.
///
/// Row numbers are 1-based line numbers when the table comes from text, and 0-based
/// matrix indices when it is built from in-memory data. Columns are always 0-based.
///
#[derive(Debug, Error)]
pub enum LTError
{
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("failed to read {}: {source}", path.display())]
    FileIO
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid header at row {row}: {reason}")]
    InvalidHeader { row: usize, reason: String },

    #[error("row {row} has {actual} columns, expected {expected}")]
    Format { row: usize, expected: usize, actual: usize },

    #[error("row {row}, column {column}: '{token}' is not a number")]
    Parse { row: usize, column: usize, token: String },

    #[error("row {row}, column {column}: independent variable is not finite")]
    InvalidBreakpoint { row: usize, column: usize },

    #[error("expected {expected} values, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("lookup tree invariant violated: {0}")]
    InvariantViolation(String),

    #[error("unknown dependent variable '{0}'")]
    UnknownVariable(String),
}

impl LTError
{
    /// True for the column-count and header errors raised while loading text.
    pub fn is_format_error(&self) -> bool
    {
        matches!(self, LTError::Format { .. } | LTError::InvalidHeader { .. })
    }
}

#[test]
fn check_error_context()
{
    let err = LTError::Format { row: 4, expected: 3, actual: 2 };
    assert!(err.is_format_error());
    assert_eq!(err.to_string(), "row 4 has 2 columns, expected 3");
    let err = LTError::Parse { row: 3, column: 1, token: "abc".into() };
    assert!(!err.is_format_error());
    assert!(err.to_string().contains("'abc'"));
}
