use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::model::Table;
use crate::crop::{CropOutput, Samples, SmartCrop};
use crate::time::timestamps::TIME_COLUMN;

// ---------------------------------------------------------------------------
// CSV tables
// ---------------------------------------------------------------------------

/// Write a table as CSV. Durations are written as seconds, NaN as an empty cell.
///
/// The time index is written as a leading `time` column unless the table
/// already has one.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    let index = table
        .index()
        .filter(|_| table.column(TIME_COLUMN).is_none());

    let mut header: Vec<&str> = Vec::with_capacity(table.n_columns() + 1);
    if index.is_some() {
        header.push(TIME_COLUMN);
    }
    header.extend(table.column_names().iter().map(String::as_str));
    writer.write_record(&header).context("writing CSV header")?;

    for row in 0..table.len() {
        let mut record: Vec<String> = Vec::with_capacity(header.len());
        if let Some(index) = index {
            record.push(index[row].to_string());
        }
        record.extend(table.iter().map(|(_, col)| col.cell(row)));
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON crop reports
// ---------------------------------------------------------------------------

/// A cropped buffer flattened in row-major order; NaN becomes `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CroppedSeries {
    pub shape: Vec<usize>,
    pub values: Vec<Option<f64>>,
}

impl From<&Samples> for CroppedSeries {
    fn from(samples: &Samples) -> Self {
        let values = samples
            .to_float()
            .iter()
            .map(|&v| (!v.is_nan()).then_some(v))
            .collect();
        Self {
            shape: samples.shape().to_vec(),
            values,
        }
    }
}

/// Serializable summary of a [`SmartCrop`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropReport {
    pub time_base: Vec<f64>,
    pub anchors: Vec<i64>,
    pub jitter: f64,
    /// One entry per cropped column; plain arrays are stored under `data`.
    pub series: BTreeMap<String, CroppedSeries>,
}

impl CropReport {
    pub fn from_crop(crop: &SmartCrop) -> Self {
        let series = match &crop.data {
            CropOutput::Array(samples) => {
                BTreeMap::from([("data".to_string(), CroppedSeries::from(samples))])
            }
            CropOutput::Named(cols) => cols
                .iter()
                .map(|(name, samples)| (name.clone(), CroppedSeries::from(samples)))
                .collect(),
        };
        Self {
            time_base: crop.time_base.to_vec(),
            anchors: crop.anchors.clone(),
            jitter: crop.jitter,
            series,
        }
    }
}

/// Write a crop report as pretty-printed JSON.
pub fn write_json(report: &CropReport, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report).context("writing JSON report")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn cropped_series_maps_nan_to_none() {
        let samples = Samples::from(arr2(&[[1.0, f64::NAN], [2.0, 3.0]]));
        let series = CroppedSeries::from(&samples);
        assert_eq!(series.shape, vec![2, 2]);
        assert_eq!(series.values, vec![Some(1.0), None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn report_serializes_nan_as_null() {
        let samples = Samples::from(arr2(&[[f64::NAN]]));
        let json = serde_json::to_string(&CroppedSeries::from(&samples)).unwrap();
        assert_eq!(json, r#"{"shape":[1,1],"values":[null]}"#);
    }
}
