/// Index of the sample in `time` closest to `event`, or `None` for an empty axis.
///
/// `time` must be non-decreasing. The candidates are the samples on either
/// side of the binary-search insertion point; the earlier one wins only when
/// strictly closer, so exact midpoints resolve to the later sample.
pub fn nearest_index(time: &[f64], event: f64) -> Option<usize> {
    let last = time.len().checked_sub(1)?;
    let insertion = time.partition_point(|&t| t < event);
    let before = insertion.saturating_sub(1);
    let after = insertion.min(last);

    if (time[before] - event).abs() < (time[after] - event).abs() {
        Some(before)
    } else {
        Some(after)
    }
}

/// Anchor index for every event, in event order. `None` for an empty axis.
pub fn nearest_indices(time: &[f64], events: &[f64]) -> Option<Vec<usize>> {
    events.iter().map(|&e| nearest_index(time, e)).collect()
}
