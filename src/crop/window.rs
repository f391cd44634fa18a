use std::ops::Range;

use ndarray::{Array2, ArrayD, Axis, IxDyn};

use super::samples::{FillValue, Samples};
use crate::error::{AlignError, Result};

// ---------------------------------------------------------------------------
// Window bounds
// ---------------------------------------------------------------------------

/// Window relative to an event, in seconds. Always `start < end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    start: f64,
    end: f64,
}

impl Window {
    pub fn new(start: f64, end: f64) -> Result<Self> {
        // Also rejects NaN bounds.
        if !(start < end) {
            return Err(AlignError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }
}

/// Half-open window `[lo, hi)` of sample offsets relative to an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPoints {
    lo: i64,
    hi: i64,
}

impl WindowPoints {
    /// Offsets `lo..hi`; the span `hi - lo` must be positive and fit in `i64`.
    pub fn new(lo: i64, hi: i64) -> Result<Self> {
        match hi.checked_sub(lo) {
            Some(span) if span > 0 => Ok(Self { lo, hi }),
            _ => Err(AlignError::InvalidWindow {
                start: lo as f64,
                end: hi as f64,
            }),
        }
    }

    pub fn lo(&self) -> i64 {
        self.lo
    }

    pub fn hi(&self) -> i64 {
        self.hi
    }

    pub fn len(&self) -> usize {
        (self.hi - self.lo) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn offsets(&self) -> Range<i64> {
        self.lo..self.hi
    }

    /// Whether the whole window around `anchor` reads inside `[0, n)`.
    pub fn fits(&self, anchor: i64, n: usize) -> bool {
        matches!(
            (anchor.checked_add(self.lo), anchor.checked_add(self.hi)),
            (Some(start), Some(end)) if start >= 0 && end <= n as i64
        )
    }
}

// ---------------------------------------------------------------------------
// Index policy
// ---------------------------------------------------------------------------

/// How sample positions below zero are treated.
///
/// Positions at or beyond the series length are always filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexPolicy {
    /// Negative positions are out of range and receive the fill value.
    #[default]
    Fill,
    /// Negative positions in `[-n, 0)` count from the end of the series.
    Wrap,
}

impl IndexPolicy {
    /// Map a signed sample position to a valid index into a series of length `n`.
    pub fn resolve(self, pos: i64, n: usize) -> Option<usize> {
        let n = n as i64;
        let pos = match self {
            IndexPolicy::Wrap if pos < 0 => pos + n,
            _ => pos,
        };
        (0..n).contains(&pos).then_some(pos as usize)
    }
}

// ---------------------------------------------------------------------------
// Index-based crop
// ---------------------------------------------------------------------------

/// Outer sum of window offsets and anchors: a `(window_len, n_events)` matrix
/// of resolved positions, `None` where the read falls outside the series.
pub fn position_matrix(
    centers: &[i64],
    window: WindowPoints,
    n: usize,
    policy: IndexPolicy,
) -> Array2<Option<usize>> {
    Array2::from_shape_fn((window.len(), centers.len()), |(i, j)| {
        centers[j]
            .checked_add(window.lo + i as i64)
            .and_then(|pos| policy.resolve(pos, n))
    })
}

/// Gather rows of `series` at `positions`, broadcasting trailing axes.
///
/// A 0-D series has no time axis, so every position is filled.
fn gather<T, U: Clone>(
    series: &ArrayD<T>,
    positions: &Array2<Option<usize>>,
    fill: U,
    convert: impl Fn(&T) -> U,
) -> ArrayD<U> {
    let (n_points, n_events) = positions.dim();
    let mut shape = vec![n_points, n_events];
    shape.extend_from_slice(series.shape().get(1..).unwrap_or_default());

    let mut out = ArrayD::from_elem(IxDyn(&shape), fill);
    for ((i, j), pos) in positions.indexed_iter() {
        if let Some(p) = *pos {
            let src = series.index_axis(Axis(0), p);
            let mut row = out.index_axis_mut(Axis(0), i);
            let mut cell = row.index_axis_mut(Axis(0), j);
            cell.zip_mut_with(&src, |o, s| *o = convert(s));
        }
    }
    out
}

/// Crop fixed-width windows around sample indices, filling out-of-range reads.
///
/// Output shape is `(window.len(), centers.len(), trailing...)`. The element
/// type is the promotion of the series type and the fill type, so an integer
/// series cropped with a NaN fill comes back as floats.
pub fn crop_at_indices(
    series: &Samples,
    centers: &[i64],
    window: WindowPoints,
    fill: FillValue,
) -> Samples {
    crop_at_indices_with_policy(series, centers, window, fill, IndexPolicy::Fill)
}

/// [`crop_at_indices`] with an explicit negative-position policy.
pub fn crop_at_indices_with_policy(
    series: &Samples,
    centers: &[i64],
    window: WindowPoints,
    fill: FillValue,
    policy: IndexPolicy,
) -> Samples {
    let positions = position_matrix(centers, window, series.len(), policy);
    let kind = series.kind().promote(fill.kind());

    let cropped = match (series, fill) {
        (Samples::Int(a), FillValue::Int(v)) => Samples::Int(gather(a, &positions, v, |&x| x)),
        (Samples::Int(a), FillValue::Float(v)) => {
            Samples::Float(gather(a, &positions, v, |&x| x as f64))
        }
        (Samples::Float(a), fill) => {
            Samples::Float(gather(a, &positions, fill.as_f64(), |&x| x))
        }
    };
    debug_assert_eq!(cropped.kind(), kind);
    cropped
}

// ---------------------------------------------------------------------------
// Time-based crop
// ---------------------------------------------------------------------------

/// Crop around event times for a series sampled at a fixed `sample_rate` (Hz).
///
/// Times and window bounds are scaled by the rate and truncated toward zero;
/// out-of-range reads are filled with NaN.
pub fn crop_at_times(
    series: &Samples,
    event_times: &[f64],
    window: Window,
    sample_rate: f64,
) -> Result<Samples> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(AlignError::Configuration(format!(
            "sample rate must be positive and finite, got {sample_rate}"
        )));
    }
    let centers: Vec<i64> = event_times
        .iter()
        .map(|&t| (t * sample_rate) as i64)
        .collect();
    let points = WindowPoints::new(
        (window.start() * sample_rate) as i64,
        (window.end() * sample_rate) as i64,
    )?;

    Ok(crop_at_indices(series, &centers, points, FillValue::NAN))
}
