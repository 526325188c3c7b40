// Engine errors - infrastructure failures only
//
// Degenerate data (empty tables, zero denominators) is NOT an error here;
// it is reported through `Metric::Degenerate`. Everything in this enum means
// the data source itself is unusable and is returned to the caller as-is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Query or connection failure reported by SQLite
    #[error("query failed: {0}")]
    Query(#[from] rusqlite::Error),

    /// The data source handle could not be used (e.g. poisoned lock)
    #[error("data source unavailable: {0}")]
    Source(String),

    /// A query result did not carry an expected column
    #[error("column `{0}` missing from result set")]
    MissingColumn(String),

    /// A numeric column held a value that is not a number
    #[error("column `{column}` is not numeric (found {found})")]
    NotNumeric { column: String, found: String },

    #[error("unknown table `{0}`")]
    UnknownTable(String),

    #[error("invalid month `{0}`, expected YYYY-MM")]
    InvalidMonth(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
