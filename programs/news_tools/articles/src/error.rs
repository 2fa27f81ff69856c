use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// A column the operation needs is not in the table.
    #[error("cannot find {0} column")]
    MissingColumn(String),

    /// The column holds tokens where text was expected, or the other way round.
    #[error("column {column} does not hold {expected}")]
    CellKind { column: String, expected: &'static str },

    /// Trend scoring and stop-word removal only work on tokenized columns.
    #[error("column {0} is not tokenized, run tokenize first")]
    NotTokenized(String),

    #[error("empty separator")]
    EmptySeparator,

    #[error("stop words not loaded")]
    NoStopWords,

    #[error("mismatched column weights: {columns} columns but {weights} weights")]
    WeightCount { columns: usize, weights: usize },

    #[error("column weights must be non-negative with a positive sum, got {0:?}")]
    InvalidWeights(Vec<f64>),

    #[error("invalid method {0:?}, expected one of count, text, norm")]
    UnknownMethod(String),

    /// A score file name without the `<min>_<max>_` date prefix.
    #[error("{} does not start with a <min_date>_<max_date>_ prefix", .0.display())]
    MalformedFileName(PathBuf),

    #[error("could not read scores from {}", .0.display())]
    Json(PathBuf),

    /// Line number (1-based) of an article line that is not a valid record.
    #[error("line {0} is not an article record")]
    Record(usize),

    #[error("line {0} is not UTF-8")]
    NotUtf8(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
