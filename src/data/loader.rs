use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use chrono::NaiveDateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Table};
use crate::time::timestamps::{normalize_indexed, TIME_COLUMN};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a stream table and bring it onto the elapsed-time base.
///
/// The file is read with [`read_table`]; if it carries an absolute-timestamp
/// column, that column is replaced by `timedelta`/`time` columns (elapsed
/// from `reference_start`, or from the first timestamp) and `time` becomes
/// the table index.
pub fn load_file(path: &Path, reference_start: Option<NaiveDateTime>) -> Result<Table> {
    let raw = read_table(path)?;
    let table = normalize_indexed(&raw, reference_start)
        .with_context(|| format!("normalizing time base of {}", path.display()))?;
    log::info!(
        "Loaded {} rows x {} columns from {}{}",
        table.len(),
        table.n_columns(),
        path.display(),
        if table.index().is_some() { " (time-indexed)" } else { "" }
    );
    Ok(table)
}

/// Read a table from a file without touching its time columns. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one column per field
/// * `.json`    – `[{ "col": value, ... }, ...]` (records orientation)
/// * `.parquet` – flat numeric / string / boolean columns
pub fn read_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Read event times (seconds) from a file: the `time` column if present,
/// otherwise the first numeric column.
pub fn load_events(path: &Path) -> Result<Vec<f64>> {
    let table = read_table(path)?;
    let column = match table.column(TIME_COLUMN) {
        Some(col) if col.is_numeric() => col,
        _ => table
            .iter()
            .map(|(_, col)| col)
            .find(|col| col.is_numeric())
            .with_context(|| format!("{} has no numeric column", path.display()))?,
    };
    column
        .to_f64()
        .with_context(|| format!("reading event times from {}", path.display()))
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

/// Pick the narrowest column type all cells parse as.
///
/// Integers beat floats, floats beat text; empty cells are allowed in float
/// columns (as NaN) and `true`/`false` become 1/0.
fn infer_column(values: Vec<String>) -> Column {
    let trimmed = || values.iter().map(|v| v.trim());

    if !values.is_empty() && trimmed().all(|v| v.parse::<i64>().is_ok()) {
        return Column::Int(trimmed().filter_map(|v| v.parse().ok()).collect());
    }
    if !values.is_empty() && trimmed().all(|v| parse_bool(v).is_some()) {
        return Column::Int(trimmed().filter_map(parse_bool).collect());
    }
    if trimmed().all(|v| v.is_empty() || v.parse::<f64>().is_ok()) {
        return Column::Float(
            trimmed()
                .map(|v| v.parse::<f64>().unwrap_or(f64::NAN))
                .collect(),
        );
    }
    Column::Text(values)
}

fn parse_bool(s: &str) -> Option<i64> {
    match s {
        "true" | "True" | "TRUE" => Some(1),
        "false" | "False" | "FALSE" => Some(0),
        _ => None,
    }
}

fn build_table(headers: Vec<String>, cells: Vec<Vec<String>>) -> Result<Table> {
    headers
        .into_iter()
        .zip(cells)
        .try_fold(Table::new(), |table, (name, values)| {
            table
                .with_column(name.clone(), infer_column(values))
                .with_context(|| format!("adding column '{name}'"))
        })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one value per cell.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} fields, header has {}",
                record.len(),
                headers.len()
            );
        }
        for (col, value) in cells.iter_mut().zip(record.iter()) {
            col.push(value.to_string());
        }
    }

    build_table(headers, cells)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Timestamp": "2023-12-01T09:50:01.0123+01:00", "pitch": 127, "yaw": 130 },
///   ...
/// ]
/// ```
///
/// Columns follow the order in which keys first appear. Keys missing from a
/// record are read as empty cells.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let cells = headers
        .iter()
        .map(|key| {
            records
                .iter()
                .map(|rec| json_cell(rec.get(key)))
                .collect::<Vec<_>>()
        })
        .collect();

    build_table(headers, cells)
}

fn json_cell(val: Option<&JsonValue>) -> String {
    match val {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Column accumulator across record batches.
enum ColumnBuilder {
    Int(Vec<Option<i64>>),
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnBuilder {
    fn for_type(data_type: &DataType) -> Result<Self> {
        Ok(match data_type {
            DataType::Int32 | DataType::Int64 | DataType::Boolean => ColumnBuilder::Int(Vec::new()),
            DataType::Float32 | DataType::Float64 => ColumnBuilder::Float(Vec::new()),
            DataType::Utf8 | DataType::LargeUtf8 => ColumnBuilder::Text(Vec::new()),
            other => bail!("Unsupported parquet column type {other:?}"),
        })
    }

    fn extend(&mut self, col: &Arc<dyn Array>) -> Result<()> {
        match self {
            ColumnBuilder::Int(values) => match col.data_type() {
                DataType::Int32 => values.extend(
                    downcast::<Int32Array>(col)?
                        .iter()
                        .map(|v| v.map(i64::from)),
                ),
                DataType::Int64 => values.extend(downcast::<Int64Array>(col)?.iter()),
                DataType::Boolean => values.extend(
                    downcast::<BooleanArray>(col)?
                        .iter()
                        .map(|v| v.map(i64::from)),
                ),
                other => bail!("Expected integer column, got {other:?}"),
            },
            ColumnBuilder::Float(values) => match col.data_type() {
                DataType::Float32 => values.extend(
                    downcast::<Float32Array>(col)?
                        .iter()
                        .map(|v| v.map_or(f64::NAN, f64::from)),
                ),
                DataType::Float64 => values.extend(
                    downcast::<Float64Array>(col)?
                        .iter()
                        .map(|v| v.unwrap_or(f64::NAN)),
                ),
                other => bail!("Expected float column, got {other:?}"),
            },
            ColumnBuilder::Text(values) => match col.data_type() {
                DataType::Utf8 => values.extend(
                    downcast::<StringArray>(col)?
                        .iter()
                        .map(|v| v.unwrap_or_default().to_string()),
                ),
                DataType::LargeUtf8 => values.extend(
                    downcast::<LargeStringArray>(col)?
                        .iter()
                        .map(|v| v.unwrap_or_default().to_string()),
                ),
                other => bail!("Expected string column, got {other:?}"),
            },
        }
        Ok(())
    }

    /// Integer columns with nulls become float columns with NaN.
    fn finish(self) -> Column {
        match self {
            ColumnBuilder::Int(values) if values.iter().all(Option::is_some) => {
                Column::Int(values.into_iter().flatten().collect())
            }
            ColumnBuilder::Int(values) => Column::Float(
                values
                    .into_iter()
                    .map(|v| v.map_or(f64::NAN, |x| x as f64))
                    .collect(),
            ),
            ColumnBuilder::Float(values) => Column::Float(values),
            ColumnBuilder::Text(values) => Column::Text(values),
        }
    }
}

fn downcast<T: Array + 'static>(col: &Arc<dyn Array>) -> Result<&T> {
    col.as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("unexpected array layout for {:?}", col.data_type()))
}

/// Load a Parquet file with flat columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`), as long as no column is nested.
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<(String, ColumnBuilder)> = schema
        .fields()
        .iter()
        .map(|f| {
            ColumnBuilder::for_type(f.data_type())
                .with_context(|| format!("column '{}'", f.name()))
                .map(|b| (f.name().clone(), b))
        })
        .collect::<Result<_>>()?;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (idx, (name, builder)) in columns.iter_mut().enumerate() {
            builder
                .extend(batch.column(idx))
                .with_context(|| format!("column '{name}'"))?;
        }
    }

    columns
        .into_iter()
        .try_fold(Table::new(), |table, (name, builder)| {
            table
                .with_column(name.clone(), builder.finish())
                .with_context(|| format!("adding column '{name}'"))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn infers_integers() {
        assert_eq!(
            infer_column(strings(&["1", " 2", "-3"])),
            Column::Int(vec![1, 2, -3])
        );
    }

    #[test]
    fn infers_floats_with_gaps() {
        match infer_column(strings(&["1.5", "", "2"])) {
            Column::Float(v) => {
                assert_eq!(v[0], 1.5);
                assert!(v[1].is_nan());
                assert_eq!(v[2], 2.0);
            }
            other => panic!("unexpected column {other}"),
        }
    }

    #[test]
    fn infers_booleans_as_ints() {
        assert_eq!(
            infer_column(strings(&["True", "False"])),
            Column::Int(vec![1, 0])
        );
    }

    #[test]
    fn falls_back_to_text() {
        assert_eq!(
            infer_column(strings(&["10;200;5", "1.0"])),
            Column::Text(strings(&["10;200;5", "1.0"]))
        );
    }

    #[test]
    fn unsupported_extension() {
        let err = read_table(Path::new("movie.avi")).unwrap_err();
        assert!(err.to_string().contains(".avi"));
    }
}
