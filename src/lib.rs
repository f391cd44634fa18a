//! Rusty Bonsai
//!
//! Time alignment and event-window cropping for multi-modal behavioral
//! recordings: sensor logs, pose tables and other time-indexed streams.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  data/   - Table model, CSV / JSON / Parquet loading, output │
//! │  time/   - timestamp detection, elapsed time, resampling     │
//! │  crop/   - nearest-index anchors, jitter, windowed gather    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use rusty_bonsai::crop::{smart_crop, SeriesInput, SmartCropOptions, Window};
//!
//! let table = rusty_bonsai::data::loader::load_file(path, None)?;
//! let crop = smart_crop(
//!     SeriesInput::Columns(&table),
//!     &[0.05, 2.0, 5.0],
//!     Window::new(-0.1, 0.1)?,
//!     &SmartCropOptions::default(),
//! )?;
//! ```

pub mod crop;
pub mod data;
pub mod error;
pub mod time;

pub use crop::{
    crop_at_indices, crop_at_times, smart_crop, CropOutput, FillValue, SeriesInput, SmartCrop,
    SmartCropOptions, Window, WindowPoints,
};
pub use data::model::{Column, Table};
pub use error::{AlignError, Result};
pub use time::{normalize, normalize_indexed};
