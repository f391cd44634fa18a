//! Absolute-timestamp detection and conversion to elapsed seconds.
//!
//! Acquisition software writes one ISO-8601 column with fractional seconds
//! and a UTC offset (e.g. `2023-12-01T09:50:01.1234567+01:00`). The column is
//! found by pattern over the first rows, parsed, and replaced by a
//! `timedelta` column (durations) and a `time` column (seconds).

use std::sync::OnceLock;

use chrono::{DateTime, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;

use crate::data::model::{Column, Table};
use crate::error::{AlignError, Result};

/// Zone in which session start times are recorded.
pub const TIMEZONE: Tz = chrono_tz::Europe::Rome;

/// Number of leading rows inspected when detecting a timestamp column.
pub const DETECTION_ROWS: usize = 5;

pub const TIME_COLUMN: &str = "time";
pub const TIMEDELTA_COLUMN: &str = "timedelta";

const TIMESTAMP_PATTERN: &str = r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d+[+-]\d{2}:\d{2}";

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(TIMESTAMP_PATTERN).expect("timestamp pattern is valid"))
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Whether the leading values of a column all look like absolute timestamps.
///
/// Empty columns never qualify.
pub fn is_timestamp_column<S: AsRef<str>>(values: &[S]) -> bool {
    let head = &values[..values.len().min(DETECTION_ROWS)];
    !head.is_empty() && head.iter().all(|v| timestamp_regex().is_match(v.as_ref()))
}

fn timestamp_columns(table: &Table) -> Vec<(&str, &[String])> {
    table
        .iter()
        .filter_map(|(name, column)| match column {
            Column::Text(values) if is_timestamp_column(values.as_slice()) => {
                Some((name, values.as_slice()))
            }
            _ => None,
        })
        .collect()
}

/// Name of the single absolute-timestamp column, if any.
///
/// More than one candidate makes the schedule ambiguous and is an error.
pub fn detect_timestamp_column(table: &Table) -> Result<Option<String>> {
    let found = timestamp_columns(table);
    match found.as_slice() {
        [] => Ok(None),
        [(name, _)] => Ok(Some(name.to_string())),
        many => Err(AlignError::MalformedSchedule {
            columns: many.iter().map(|(name, _)| name.to_string()).collect(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Localize a naive session start in [`TIMEZONE`].
///
/// Times repeated by a DST fold resolve to the earlier instant; times skipped
/// by a DST gap are rejected.
pub fn localize_reference(start: NaiveDateTime) -> Result<DateTime<Utc>> {
    match TIMEZONE.from_local_datetime(&start) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(AlignError::InvalidReferenceStart(start)),
    }
}

fn parse_column(name: &str, values: &[String]) -> Result<Vec<DateTime<Utc>>> {
    values
        .iter()
        .enumerate()
        .map(|(row, value)| {
            DateTime::parse_from_rfc3339(value)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| AlignError::TimestampParse {
                    column: name.to_string(),
                    row,
                    value: value.clone(),
                })
        })
        .collect()
}

/// Replace the absolute-timestamp column of `table` by elapsed time.
///
/// Elapsed time is measured from `reference_start` (a wall-clock time in
/// [`TIMEZONE`]) or, when absent, from the first timestamp of the column.
/// Tables without a timestamp column are returned unchanged.
pub fn normalize(table: &Table, reference_start: Option<NaiveDateTime>) -> Result<Table> {
    let candidates = timestamp_columns(table);
    let (name, values) = match candidates.as_slice() {
        [] => return Ok(table.clone()),
        [single] => *single,
        many => {
            return Err(AlignError::MalformedSchedule {
                columns: many.iter().map(|(name, _)| name.to_string()).collect(),
            })
        }
    };
    log::info!("Found timestamp column: {name}");

    let parsed = parse_column(name, values)?;
    let origin = match reference_start {
        Some(start) => localize_reference(start)?,
        None => parsed[0],
    };

    let deltas: Vec<chrono::Duration> = parsed.iter().map(|t| *t - origin).collect();
    let seconds: Vec<f64> = deltas.iter().map(crate::data::model::duration_seconds).collect();

    let (reduced, _) = table.clone().without_column(name);
    reduced
        .with_column(TIMEDELTA_COLUMN, Column::Duration(deltas))?
        .with_column(TIME_COLUMN, Column::Float(seconds))
}

/// [`normalize`], then index the table by its `time` column when present.
pub fn normalize_indexed(table: &Table, reference_start: Option<NaiveDateTime>) -> Result<Table> {
    let normalized = normalize(table, reference_start)?;
    match normalized.column(TIME_COLUMN) {
        Some(column) if column.is_numeric() => normalized.indexed_by(TIME_COLUMN),
        _ => Ok(normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn text(values: &[&str]) -> Column {
        Column::Text(values.iter().map(|s| s.to_string()).collect())
    }

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, s)
            .unwrap()
    }

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    fn log_table() -> Table {
        Table::new()
            .with_column("pitch", Column::Int(vec![127, 128, 126]))
            .unwrap()
            .with_column(
                "Timestamp",
                text(&[
                    "2023-12-01T09:50:01.0000000+01:00",
                    "2023-12-01T09:50:01.5000000+01:00",
                    "2023-12-01T09:50:02.2500000+01:00",
                ]),
            )
            .unwrap()
            .with_column("yaw", Column::Float(vec![0.0, 0.5, 1.0]))
            .unwrap()
    }

    #[test]
    fn detects_bonsai_timestamps() {
        assert!(is_timestamp_column(&["2023-12-01T09:50:01.1234567+01:00"]));
        assert!(is_timestamp_column(&["2024-04-21T16:52:43.5-05:00"]));
    }

    #[test]
    fn rejects_near_misses() {
        for value in [
            "2023-12-01T09:50:01+01:00",
            "2023-12-01T09:50:01.123",
            "2023-12-01 09:50:01.123+01:00",
            "2023-12-01T09:50:01.123Z",
            "12.5",
            "",
        ] {
            assert!(!is_timestamp_column(&[value]), "{value}");
        }
        assert!(!is_timestamp_column::<&str>(&[]));
    }

    #[test]
    fn only_head_is_inspected() {
        let mut values = vec!["2023-12-01T09:50:01.0+01:00"; DETECTION_ROWS];
        values.push("garbage");
        assert!(is_timestamp_column(&values[..]));
    }

    #[test]
    fn table_without_timestamps_is_unchanged() {
        let table = Table::new()
            .with_column("x", Column::Float(vec![1.0, 2.0]))
            .unwrap();
        assert_eq!(detect_timestamp_column(&table).unwrap(), None);
        assert_eq!(normalize(&table, None).unwrap(), table);
    }

    #[test]
    fn two_timestamp_columns_are_ambiguous() {
        let table = log_table()
            .with_column(
                "Other",
                text(&[
                    "2023-12-01T09:50:01.0+01:00",
                    "2023-12-01T09:50:01.1+01:00",
                    "2023-12-01T09:50:01.2+01:00",
                ]),
            )
            .unwrap();
        let err = normalize(&table, None).unwrap_err();
        match err {
            AlignError::MalformedSchedule { columns } => {
                assert_eq!(columns, vec!["Timestamp".to_string(), "Other".to_string()])
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(detect_timestamp_column(&table).is_err());
    }

    #[test]
    fn elapsed_from_first_timestamp() {
        let normalized = normalize(&log_table(), None).unwrap();
        assert_eq!(
            normalized.column_names(),
            &["pitch", "yaw", TIMEDELTA_COLUMN, TIME_COLUMN].map(String::from)
        );
        let time = normalized.column(TIME_COLUMN).unwrap().to_f64().unwrap();
        assert!(close(&time, &[0.0, 0.5, 1.25]));
        assert_eq!(
            normalized.column(TIMEDELTA_COLUMN),
            Some(&Column::Duration(vec![
                chrono::Duration::zero(),
                chrono::Duration::milliseconds(500),
                chrono::Duration::milliseconds(1250),
            ]))
        );
    }

    #[test]
    fn elapsed_from_reference_start_in_winter() {
        let normalized = normalize(&log_table(), Some(naive(2023, 12, 1, 9, 50, 0))).unwrap();
        let time = normalized.column(TIME_COLUMN).unwrap().to_f64().unwrap();
        assert!(close(&time, &[1.0, 1.5, 2.25]));
    }

    #[test]
    fn reference_start_follows_summer_time() {
        let table = Table::new()
            .with_column("ts", text(&["2024-04-21T16:52:43.000+02:00"]))
            .unwrap();
        let normalized = normalize(&table, Some(naive(2024, 4, 21, 16, 52, 42))).unwrap();
        let time = normalized.column(TIME_COLUMN).unwrap().to_f64().unwrap();
        assert!(close(&time, &[1.0]));
    }

    #[test]
    fn reference_start_in_dst_gap_is_rejected() {
        assert!(matches!(
            localize_reference(naive(2024, 3, 31, 2, 30, 0)),
            Err(AlignError::InvalidReferenceStart(_))
        ));
    }

    #[test]
    fn reference_start_in_dst_fold_takes_earlier_instant() {
        let table = Table::new()
            .with_column("ts", text(&["2024-10-27T02:30:00.5+02:00"]))
            .unwrap();
        let normalized = normalize(&table, Some(naive(2024, 10, 27, 2, 30, 0))).unwrap();
        let time = normalized.column(TIME_COLUMN).unwrap().to_f64().unwrap();
        assert!(close(&time, &[0.5]));
    }

    #[test]
    fn unparseable_value_reports_row() {
        let mut values = vec!["2023-12-01T09:50:01.0+01:00"; DETECTION_ROWS];
        values.push("2023-13-45T99:99:99.0+01:00");
        let table = Table::new().with_column("ts", text(&values)).unwrap();
        match normalize(&table, None).unwrap_err() {
            AlignError::TimestampParse { column, row, .. } => {
                assert_eq!(column, "ts");
                assert_eq!(row, DETECTION_ROWS);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn normalize_indexed_sets_time_index() {
        let indexed = normalize_indexed(&log_table(), None).unwrap();
        assert!(close(indexed.index().unwrap(), &[0.0, 0.5, 1.25]));
    }

    #[test]
    fn input_table_is_not_mutated() {
        let table = log_table();
        let before = table.clone();
        let _ = normalize(&table, None).unwrap();
        assert_eq!(table, before);
    }
}
