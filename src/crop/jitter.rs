use super::window::WindowPoints;
use crate::error::{AlignError, Result};

/// Actual elapsed duration of every window whose start and end samples both
/// fall inside the time axis.
pub fn window_durations(time: &[f64], anchors: &[i64], window: WindowPoints) -> Vec<f64> {
    let n = time.len() as i64;
    anchors
        .iter()
        .filter_map(|&a| {
            let start = a.checked_add(window.lo())?;
            let end = a.checked_add(window.hi())?;
            ((0..n).contains(&start) && (0..n).contains(&end))
                .then(|| time[end as usize] - time[start as usize])
        })
        .collect()
}

/// Population standard deviation over mean.
///
/// Exactly zero when all values are equal, when there are no values, or when
/// the mean is zero.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return 0.0;
    };
    if values.iter().all(|&v| v == first) {
        return 0.0;
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    var.sqrt() / mean.abs()
}

/// Measure window-duration jitter across events and fail above `tolerance`.
///
/// Returns the measured coefficient on success.
pub fn check_jitter(
    time: &[f64],
    anchors: &[i64],
    window: WindowPoints,
    tolerance: f64,
) -> Result<f64> {
    let durations = window_durations(time, anchors, window);
    let coefficient = coefficient_of_variation(&durations);
    log::debug!(
        "window jitter over {} in-range events: {coefficient:.6} (tolerance {tolerance})",
        durations.len()
    );

    if coefficient > tolerance {
        return Err(AlignError::JitterExceeded {
            coefficient,
            tolerance,
        });
    }
    Ok(coefficient)
}
