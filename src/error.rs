use std::path::PathBuf;

use thiserror::Error;

/// Failure that prevents a record set from being loaded at all.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read header row: {0}")]
    Header(#[source] csv::Error),
    #[error("required column `{0}` is missing from the header row")]
    MissingColumn(String),
}

/// Reason a single row was dropped during load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    #[error("missing value for `{0}`")]
    MissingField(String),
    #[error("identifier {0:?} is not an integer")]
    InvalidIdentifier(String),
    #[error("score {0:?} is not a finite number")]
    InvalidScore(String),
    #[error("unreadable row: {0}")]
    Unreadable(String),
}

/// Caller-side input problems, distinct from "not found".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("identifier must be numeric, got {0:?}")]
    InvalidIdentifier(String),
    #[error("unknown grouping key {0:?} (expected region, birthplace or age)")]
    UnknownGroupKey(String),
}
