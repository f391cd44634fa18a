/// Windowed cropping of sample series around events.
///
/// ```text
///  event times ──► nearest ──► anchor indices
///                                   │
///        window (s) ──► samples ────┤
///                                   ▼
///                   jitter ──► accept / JitterExceeded
///                                   │
///                                   ▼
///   Samples ──► window::crop_at_indices ──► (window_len, n_events, ...)
/// ```

pub mod jitter;
pub mod nearest;
pub mod samples;
pub mod smart;
pub mod window;

pub use samples::{FillValue, SampleKind, Samples};
pub use smart::{smart_crop, CropOutput, SeriesInput, SmartCrop, SmartCropOptions};
pub use window::{
    crop_at_indices, crop_at_indices_with_policy, crop_at_times, IndexPolicy, Window,
    WindowPoints,
};
