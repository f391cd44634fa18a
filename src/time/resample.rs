use crate::data::model::{Column, Table};
use crate::error::{AlignError, Result};

/// Relative tolerance (in bins) when counting grid points, so that spans that
/// are whole multiples of the bin up to rounding keep their last point.
const GRID_EPSILON: f64 = 1e-9;

/// Resample a time-indexed table onto a uniform grid of `timebin` seconds.
///
/// The grid starts at zero (`from_zero`) or at the first index value and runs
/// to the last index value inclusive. Integer and float columns are linearly
/// interpolated; grid points outside the recorded span get NaN. Other columns
/// are dropped.
pub fn interpolate(table: &Table, timebin: f64, from_zero: bool) -> Result<Table> {
    let index = table.index().ok_or(AlignError::MissingIndex)?;
    if !(timebin.is_finite() && timebin > 0.0) {
        return Err(AlignError::Configuration(format!(
            "time bin must be positive and finite, got {timebin}"
        )));
    }
    let (Some(&first), Some(&last)) = (index.first(), index.last()) else {
        return Err(AlignError::Configuration(
            "cannot resample an empty table".to_string(),
        ));
    };

    let start = if from_zero { 0.0 } else { first };
    if last < start {
        return Err(AlignError::Configuration(format!(
            "recording ends at {last} s, before the grid start {start} s"
        )));
    }
    let n = ((last - start) / timebin + GRID_EPSILON).floor() as usize + 1;
    let grid: Vec<f64> = (0..n)
        .map(|k| (start + k as f64 * timebin).min(last))
        .collect();

    let mut out = Table::new().with_index(grid.clone())?;
    for (name, column) in table.iter() {
        if !column.is_numeric() {
            log::debug!("resample: dropping non-numeric column '{name}'");
            continue;
        }
        let Some(values) = column.to_f64() else {
            continue;
        };
        let resampled = grid.iter().map(|&t| interp_at(index, &values, t)).collect();
        out = out.with_column(name, Column::Float(resampled))?;
    }
    Ok(out)
}

/// Linear interpolation of `(time, values)` at `t`; NaN outside `[time[0], time[n-1]]`.
fn interp_at(time: &[f64], values: &[f64], t: f64) -> f64 {
    let n = time.len();
    if n == 0 || t < time[0] || t > time[n - 1] {
        return f64::NAN;
    }
    let hi = time.partition_point(|&x| x < t);
    if time[hi] == t || hi == 0 {
        return values[hi];
    }
    let lo = hi - 1;
    let frac = (t - time[lo]) / (time[hi] - time[lo]);
    values[lo] + frac * (values[hi] - values[lo])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_nine() -> Table {
        Table::new()
            .with_column("time", Column::Int((1..10).collect()))
            .unwrap()
            .with_index((1..10).map(|i| i as f64).collect())
            .unwrap()
    }

    #[test]
    fn grid_from_zero_covers_leading_gap() {
        let out = interpolate(&one_to_nine(), 0.01, true).unwrap();
        assert_eq!(out.len(), 901);
        assert_eq!(out.n_columns(), 1);
        let values = out.column("time").unwrap().to_f64().unwrap();
        assert!(values[0].is_nan());
        assert!(values[99].is_nan());
        assert!((values[100] - 1.0).abs() < 1e-9);
        assert!((values[450] - 4.5).abs() < 1e-9);
        assert!((values[900] - 9.0).abs() < 1e-9);
    }

    #[test]
    fn grid_from_first_sample() {
        let out = interpolate(&one_to_nine(), 0.01, false).unwrap();
        assert_eq!(out.len(), 801);
        let index = out.index().unwrap();
        assert_eq!(index[0], 1.0);
        assert_eq!(index[800], 9.0);
        let values = out.column("time").unwrap().to_f64().unwrap();
        assert!(values.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn text_columns_are_dropped() {
        let table = one_to_nine()
            .with_column("label", Column::Text(vec!["a".to_string(); 9]))
            .unwrap();
        let out = interpolate(&table, 0.5, false).unwrap();
        assert!(out.column("label").is_none());
        assert_eq!(out.len(), 17);
    }

    #[test]
    fn requires_index_and_positive_bin() {
        let unindexed = Table::new()
            .with_column("x", Column::Float(vec![1.0]))
            .unwrap();
        assert!(matches!(
            interpolate(&unindexed, 0.1, false),
            Err(AlignError::MissingIndex)
        ));
        assert!(matches!(
            interpolate(&one_to_nine(), 0.0, false),
            Err(AlignError::Configuration(_))
        ));
    }

    #[test]
    fn interp_between_irregular_samples() {
        let time = [0.0, 1.0, 3.0];
        let values = [0.0, 10.0, 30.0];
        assert_eq!(interp_at(&time, &values, 2.0), 20.0);
        assert_eq!(interp_at(&time, &values, 1.0), 10.0);
        assert!(interp_at(&time, &values, 3.5).is_nan());
    }
}
