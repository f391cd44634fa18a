//! Event-time cropping with automatic anchor resolution and jitter control.

use std::borrow::Cow;
use std::collections::BTreeMap;

use ndarray::Array1;

use super::jitter::check_jitter;
use super::nearest::nearest_indices;
use super::samples::{FillValue, Samples};
use super::window::{crop_at_indices, Window, WindowPoints};
use crate::data::model::Table;
use crate::error::{AlignError, Result};

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// The shapes of data the smart crop accepts.
#[derive(Debug, Clone, Copy)]
pub enum SeriesInput<'a> {
    /// A single 1-D series without time information.
    Series1D(&'a Samples),
    /// A `(time, channel)` matrix without time information.
    MultiChannel(&'a Samples),
    /// Named columns sharing the table's time index (if any).
    Columns(&'a Table),
}

impl<'a> SeriesInput<'a> {
    fn len(&self) -> usize {
        match self {
            SeriesInput::Series1D(s) | SeriesInput::MultiChannel(s) => s.len(),
            SeriesInput::Columns(t) => t.len(),
        }
    }

    fn intrinsic_time(&self) -> Option<&'a [f64]> {
        match *self {
            SeriesInput::Columns(t) => t.index(),
            _ => None,
        }
    }

    fn check_shape(&self) -> Result<()> {
        let (expected, actual) = match self {
            SeriesInput::Series1D(s) => (1, s.ndim()),
            SeriesInput::MultiChannel(s) => (2, s.ndim()),
            SeriesInput::Columns(_) => return Ok(()),
        };
        if expected != actual {
            return Err(AlignError::Configuration(format!(
                "expected a {expected}-D series, got {actual}-D"
            )));
        }
        Ok(())
    }
}

/// Tuning for [`smart_crop`].
#[derive(Debug, Clone, PartialEq)]
pub struct SmartCropOptions {
    /// Sampling interval in seconds. Inferred from the time axis when absent.
    pub dt: Option<f64>,
    /// Explicit per-sample times, overriding any table index.
    pub time_arr: Option<Vec<f64>>,
    pub fill: FillValue,
    /// Leave out events whose window reads outside the series.
    pub drop_out_of_range: bool,
    /// Largest accepted coefficient of variation of actual window durations.
    /// Must be finite and non-negative.
    pub max_jitter_fraction: f64,
}

impl Default for SmartCropOptions {
    fn default() -> Self {
        Self {
            dt: None,
            time_arr: None,
            fill: FillValue::NAN,
            drop_out_of_range: false,
            max_jitter_fraction: 0.1,
        }
    }
}

impl SmartCropOptions {
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = Some(dt);
        self
    }

    pub fn with_time_arr(mut self, time_arr: Vec<f64>) -> Self {
        self.time_arr = Some(time_arr);
        self
    }

    pub fn with_fill(mut self, fill: impl Into<FillValue>) -> Self {
        self.fill = fill.into();
        self
    }

    pub fn drop_out_of_range(mut self, drop: bool) -> Self {
        self.drop_out_of_range = drop;
        self
    }

    pub fn with_max_jitter(mut self, fraction: f64) -> Self {
        self.max_jitter_fraction = fraction;
        self
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

/// Cropped data, shaped after the input.
#[derive(Debug, Clone, PartialEq)]
pub enum CropOutput {
    /// `(window_len, n_events)` or `(window_len, n_events, n_channels)`.
    Array(Samples),
    /// One `(window_len, n_events)` crop per numeric column.
    Named(BTreeMap<String, Samples>),
}

impl CropOutput {
    pub fn as_array(&self) -> Option<&Samples> {
        match self {
            CropOutput::Array(s) => Some(s),
            CropOutput::Named(_) => None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&Samples> {
        match self {
            CropOutput::Named(cols) => cols.get(name),
            CropOutput::Array(_) => None,
        }
    }
}

/// Result of [`smart_crop`].
#[derive(Debug, Clone, PartialEq)]
pub struct SmartCrop {
    /// Relative time of each window row, `(lo..hi) * dt`.
    pub time_base: Array1<f64>,
    pub data: CropOutput,
    /// Anchor sample index of every event kept in `data`.
    pub anchors: Vec<i64>,
    /// Measured coefficient of variation of window durations.
    pub jitter: f64,
}

impl SmartCrop {
    pub fn n_events(&self) -> usize {
        self.anchors.len()
    }
}

// ---------------------------------------------------------------------------
// Smart crop
// ---------------------------------------------------------------------------

/// Crop windows of `data` around `events` (seconds).
///
/// Each event is resolved to its nearest sample, the window is converted to
/// samples at `dt` (given or inferred as the mean sampling step, rounded half
/// to even), and the call fails if the actual window durations vary across
/// events by more than `max_jitter_fraction` of their mean.
pub fn smart_crop(
    data: SeriesInput<'_>,
    events: &[f64],
    window: Window,
    options: &SmartCropOptions,
) -> Result<SmartCrop> {
    if options.dt.is_some() && options.time_arr.is_some() {
        return Err(AlignError::Configuration(
            "Only one of dt/time_arr can be specified".to_string(),
        ));
    }
    let tolerance = options.max_jitter_fraction;
    if !(tolerance.is_finite() && tolerance >= 0.0) {
        return Err(AlignError::Configuration(format!(
            "jitter tolerance must be non-negative and finite, got {tolerance}"
        )));
    }
    data.check_shape()?;

    let n = data.len();
    let time = resolve_time_axis(&data, options, n)?;
    let dt = match options.dt {
        Some(dt) => dt,
        None => mean_step(&time)?,
    };
    if !(dt.is_finite() && dt > 0.0) {
        return Err(AlignError::Configuration(format!(
            "sampling interval must be positive and finite, got {dt}"
        )));
    }

    let mut anchors: Vec<i64> = nearest_indices(&time, events)
        .ok_or_else(|| AlignError::Configuration("time axis is empty".to_string()))?
        .into_iter()
        .map(|i| i as i64)
        .collect();

    let points = WindowPoints::new(
        samples_for(window.start(), dt)?,
        samples_for(window.end(), dt)?,
    )?;

    let jitter = check_jitter(&time, &anchors, points, tolerance)?;

    if options.drop_out_of_range {
        let before = anchors.len();
        anchors.retain(|&a| points.fits(a, n));
        if anchors.len() < before {
            log::warn!(
                "dropped {} of {before} events with windows outside the series",
                before - anchors.len()
            );
        }
    }

    let time_base = Array1::from_iter(points.offsets().map(|k| k as f64 * dt));
    let data = match data {
        SeriesInput::Series1D(s) | SeriesInput::MultiChannel(s) => {
            CropOutput::Array(crop_at_indices(s, &anchors, points, options.fill))
        }
        SeriesInput::Columns(table) => {
            CropOutput::Named(crop_columns(table, &anchors, points, options.fill))
        }
    };

    Ok(SmartCrop {
        time_base,
        data,
        anchors,
        jitter,
    })
}

/// Per-sample times: explicit array, then table index, then `arange(n) * dt`.
fn resolve_time_axis<'a>(
    data: &SeriesInput<'a>,
    options: &'a SmartCropOptions,
    n: usize,
) -> Result<Cow<'a, [f64]>> {
    let time: Cow<'a, [f64]> = match (&options.time_arr, data.intrinsic_time(), options.dt) {
        (Some(t), _, _) => Cow::Borrowed(t.as_slice()),
        (None, Some(index), _) => Cow::Borrowed(index),
        (None, None, Some(dt)) => Cow::Owned((0..n).map(|i| i as f64 * dt).collect()),
        (None, None, None) => {
            return Err(AlignError::Configuration(
                "Either dt or time_arr must be specified for data without a time index"
                    .to_string(),
            ))
        }
    };

    if time.is_empty() {
        return Err(AlignError::Configuration("time axis is empty".to_string()));
    }
    if time.len() != n {
        return Err(AlignError::Configuration(format!(
            "time axis has {} samples, data has {n}",
            time.len()
        )));
    }
    if let Some(i) = time.windows(2).position(|w| w[1] < w[0]) {
        return Err(AlignError::Configuration(format!(
            "time axis decreases at sample {}",
            i + 1
        )));
    }
    Ok(time)
}

/// Whole number of samples spanning `seconds` at interval `dt`, rounded half to even.
fn samples_for(seconds: f64, dt: f64) -> Result<i64> {
    // 2^63; every value strictly below it converts to i64 without saturating
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    let samples = (seconds / dt).round_ties_even();
    if !(samples.is_finite() && samples.abs() < LIMIT) {
        return Err(AlignError::Configuration(format!(
            "window bound {seconds} s is {samples} samples at dt = {dt} s"
        )));
    }
    Ok(samples as i64)
}

/// Mean of consecutive differences.
fn mean_step(time: &[f64]) -> Result<f64> {
    if time.len() < 2 {
        return Err(AlignError::Configuration(
            "cannot infer dt from fewer than two samples".to_string(),
        ));
    }
    Ok((time[time.len() - 1] - time[0]) / (time.len() - 1) as f64)
}

fn crop_columns(
    table: &Table,
    anchors: &[i64],
    points: WindowPoints,
    fill: FillValue,
) -> BTreeMap<String, Samples> {
    table
        .iter()
        .filter_map(|(name, column)| match column.to_samples() {
            Some(samples) => Some((
                name.to_string(),
                crop_at_indices(&samples, anchors, points, fill),
            )),
            None => {
                log::debug!("skipping non-numeric column '{name}' ({column})");
                None
            }
        })
        .collect()
}
