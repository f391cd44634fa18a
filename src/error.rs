use thiserror::Error;

pub type Result<T> = std::result::Result<T, AlignError>;

/// Failures raised by the alignment and cropping core.
///
/// Every check fails synchronously and terminally: nothing is retried and no
/// partial result is returned.
#[derive(Debug, Error)]
pub enum AlignError {
    /// Mutually exclusive, missing or inconsistent time-basis parameters.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("ambiguous timestamp column: {} columns match ({})", columns.len(), columns.join(", "))]
    MalformedSchedule { columns: Vec<String> },

    #[error("invalid window: start {start} must be smaller than end {end}")]
    InvalidWindow { start: f64, end: f64 },

    #[error("timing jitter coefficient {coefficient:.6} exceeds tolerance {tolerance}")]
    JitterExceeded { coefficient: f64, tolerance: f64 },

    #[error("column '{column}', row {row}: cannot parse '{value}' as a timestamp")]
    TimestampParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("reference start {0} does not exist in the acquisition timezone")]
    InvalidReferenceStart(chrono::NaiveDateTime),

    #[error("column '{name}' has {actual} rows, table has {expected}")]
    ColumnLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("table has no time index")]
    MissingIndex,
}
