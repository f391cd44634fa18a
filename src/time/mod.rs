/// Time-base handling: absolute timestamps to elapsed seconds, and resampling
/// onto uniform grids.

pub mod resample;
pub mod timestamps;

pub use resample::interpolate;
pub use timestamps::{
    detect_timestamp_column, is_timestamp_column, normalize, normalize_indexed, TIMEZONE,
};
