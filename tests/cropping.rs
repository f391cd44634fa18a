//! End-to-end cropping scenarios through the public API.

use ndarray::{Array1, Array2};
use rusty_bonsai::crop::{
    crop_at_indices, crop_at_indices_with_policy, smart_crop, IndexPolicy, SampleKind, Samples,
    SeriesInput, SmartCropOptions, Window, WindowPoints,
};
use rusty_bonsai::{AlignError, Column, FillValue, Table};

fn arange(n: i64) -> Samples {
    Samples::from(Array1::from_iter(0..n))
}

#[test]
fn valid_positions_copy_source_and_invalid_positions_fill() {
    let series = arange(50);
    let centers = [0i64, 7, 25, 48, 60];
    let window = WindowPoints::new(-3, 4).unwrap();
    let cropped = crop_at_indices(&series, &centers, window, FillValue::NAN);
    let values = cropped.as_float().unwrap();

    for (j, &c) in centers.iter().enumerate() {
        for (i, offset) in window.offsets().enumerate() {
            let pos = c + offset;
            let v = values[[i, j]];
            if (0..50).contains(&pos) {
                assert_eq!(v, pos as f64);
            } else {
                assert!(v.is_nan(), "position {pos} should be filled");
            }
        }
    }
}

#[test]
fn negative_start_at_time_zero_fills_or_wraps() {
    let series = arange(10);
    let window = WindowPoints::new(-2, 1).unwrap();

    let filled = crop_at_indices(&series, &[0], window, FillValue::Int(-1));
    assert_eq!(filled.as_int().unwrap().as_slice().unwrap(), &[-1, -1, 0]);

    let wrapped =
        crop_at_indices_with_policy(&series, &[0], window, FillValue::Int(-1), IndexPolicy::Wrap);
    assert_eq!(wrapped.as_int().unwrap().as_slice().unwrap(), &[8, 9, 0]);
}

#[test]
fn integer_series_promotes_only_for_float_fill() {
    let series = arange(10);
    let window = WindowPoints::new(0, 2).unwrap();
    assert_eq!(
        crop_at_indices(&series, &[9], window, FillValue::Int(0)).kind(),
        SampleKind::Int
    );
    assert_eq!(
        crop_at_indices(&series, &[9], window, FillValue::NAN).kind(),
        SampleKind::Float
    );
}

#[test]
fn multichannel_crop_shape() {
    let series = Samples::from(Array2::<f64>::zeros((25, 4)));
    let window = WindowPoints::new(-2, 1).unwrap();
    let cropped = crop_at_indices(&series, &[1, 25], window, FillValue::NAN);
    assert_eq!(cropped.shape(), &[3, 2, 4]);
}

#[test]
fn smart_crop_drop_count_matches_in_bounds_events() {
    let n = 500;
    let table = Table::new()
        .with_column("signal", Column::Float((0..n).map(|i| i as f64).collect()))
        .unwrap()
        .with_index((0..n).map(|i| i as f64 * 0.002).collect())
        .unwrap();
    let events = [0.0, 0.01, 0.3, 0.5, 0.99, 1.2];
    let window = Window::new(-0.02, 0.04).unwrap();

    let kept = smart_crop(
        SeriesInput::Columns(&table),
        &events,
        window,
        &SmartCropOptions::default().drop_out_of_range(true),
    )
    .unwrap();
    let all = smart_crop(
        SeriesInput::Columns(&table),
        &events,
        window,
        &SmartCropOptions::default(),
    )
    .unwrap();

    // windows [-10, 20) samples; 0.0, 0.01 start early, 0.99 and 1.2 run past 500
    assert_eq!(kept.n_events(), 2);
    assert_eq!(kept.data.column("signal").unwrap().shape(), &[30, 2]);
    assert_eq!(all.n_events(), events.len());
    assert_eq!(all.data.column("signal").unwrap().shape(), &[30, events.len()]);
}

#[test]
fn smart_crop_time_base_is_decoupled_from_jitter() {
    let index: Vec<f64> = (0..200)
        .map(|i| i as f64 * 0.01 + if i % 2 == 0 { 0.0 } else { 0.002 })
        .collect();
    let data = Samples::from((0..200).map(|i| i as f64).collect::<Vec<_>>());
    let options = SmartCropOptions::default()
        .with_time_arr(index)
        .with_max_jitter(1.0);
    let crop = smart_crop(
        SeriesInput::Series1D(&data),
        &[0.5, 1.0],
        Window::new(-0.05, 0.05).unwrap(),
        &options,
    )
    .unwrap();

    let dt = 1.99 / 199.0 + 0.002 / 199.0;
    let expected: Vec<f64> = (-5..5).map(|k| k as f64 * dt).collect();
    assert_eq!(crop.time_base.len(), expected.len());
    for (a, b) in crop.time_base.iter().zip(&expected) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn smart_crop_errors_are_typed() {
    let data = arange(10);
    let window = Window::new(-1.0, 1.0).unwrap();
    let err = smart_crop(
        SeriesInput::Series1D(&data),
        &[5.0],
        window,
        &SmartCropOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, AlignError::Configuration(_)));

    assert!(matches!(
        Window::new(1.0, 1.0),
        Err(AlignError::InvalidWindow { .. })
    ));
}
