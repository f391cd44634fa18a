use std::fmt;

use crate::crop::Samples;
use crate::error::{AlignError, Result};

// ---------------------------------------------------------------------------
// Column – one named series of a table
// ---------------------------------------------------------------------------

/// A typed column, mirroring the handful of dtypes acquisition logs produce.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
    /// Elapsed wall-clock differences, as produced by the time-base normalizer.
    Duration(Vec<chrono::Duration>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Duration(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the column holds samples that can be cropped.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Int(_) | Column::Float(_))
    }

    /// Numeric view as `f64`; durations are converted to seconds.
    pub fn to_f64(&self) -> Option<Vec<f64>> {
        match self {
            Column::Int(v) => Some(v.iter().map(|&x| x as f64).collect()),
            Column::Float(v) => Some(v.clone()),
            Column::Duration(v) => Some(v.iter().map(duration_seconds).collect()),
            Column::Text(_) => None,
        }
    }

    /// One-dimensional sample buffer for the cropper, keeping integer columns integer.
    pub fn to_samples(&self) -> Option<Samples> {
        match self {
            Column::Int(v) => Some(Samples::from(v.clone())),
            Column::Float(v) => Some(Samples::from(v.clone())),
            _ => None,
        }
    }

    /// Render a single cell as text (used by the CSV writer).
    pub fn cell(&self, row: usize) -> String {
        match self {
            Column::Int(v) => v[row].to_string(),
            Column::Float(v) if v[row].is_nan() => String::new(),
            Column::Float(v) => v[row].to_string(),
            Column::Text(v) => v[row].clone(),
            Column::Duration(v) => duration_seconds(&v[row]).to_string(),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Column::Int(_) => "int",
            Column::Float(_) => "float",
            Column::Text(_) => "text",
            Column::Duration(_) => "duration",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.type_name(), self.len())
    }
}

/// Total seconds of a duration, with sub-second precision.
pub fn duration_seconds(d: &chrono::Duration) -> f64 {
    match d.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        // Beyond ±292 years nanoseconds overflow; millisecond precision is plenty there.
        None => d.num_milliseconds() as f64 / 1e3,
    }
}

// ---------------------------------------------------------------------------
// Table – a loaded, optionally time-indexed stream
// ---------------------------------------------------------------------------

/// An ordered collection of equally long named columns, with an optional
/// elapsed-time index in seconds.
///
/// Operations on tables never mutate in place: they return a new `Table`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
    index: Option<Vec<f64>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, checking its length against the table.
    ///
    /// A column with an already used name replaces the existing one in place.
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if let Some(expected) = self.row_count() {
            if column.len() != expected {
                return Err(AlignError::ColumnLength {
                    name,
                    expected,
                    actual: column.len(),
                });
            }
        }
        match self.names.iter().position(|n| *n == name) {
            Some(pos) => self.columns[pos] = column,
            None => {
                self.names.push(name);
                self.columns.push(column);
            }
        }
        Ok(self)
    }

    /// Attach an explicit time index (seconds).
    pub fn with_index(mut self, index: Vec<f64>) -> Result<Self> {
        if let Some(expected) = self.row_count() {
            if index.len() != expected {
                return Err(AlignError::ColumnLength {
                    name: "<index>".to_string(),
                    expected,
                    actual: index.len(),
                });
            }
        }
        self.index = Some(index);
        Ok(self)
    }

    /// Use a numeric (or duration) column as the time index. The column stays in the table.
    pub fn indexed_by(self, name: &str) -> Result<Self> {
        let values = self
            .column(name)
            .and_then(Column::to_f64)
            .ok_or_else(|| {
                AlignError::Configuration(format!("no numeric column '{name}' to index by"))
            })?;
        self.with_index(values)
    }

    /// Remove a column, returning the reduced table and the column (if present).
    pub fn without_column(mut self, name: &str) -> (Self, Option<Column>) {
        match self.names.iter().position(|n| n == name) {
            Some(pos) => {
                self.names.remove(pos);
                let col = self.columns.remove(pos);
                (self, Some(col))
            }
            None => (self, None),
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|pos| &self.columns[pos])
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// `(name, column)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.names.iter().map(String::as_str).zip(self.columns.iter())
    }

    pub fn index(&self) -> Option<&[f64]> {
        self.index.as_deref()
    }

    /// Number of rows; zero for a table without columns or index.
    pub fn len(&self) -> usize {
        self.row_count().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    fn row_count(&self) -> Option<usize> {
        self.columns
            .first()
            .map(Column::len)
            .or_else(|| self.index.as_ref().map(Vec::len))
    }
}
