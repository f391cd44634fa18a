/// Data layer: table model, loading and writing.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table, absolute timestamps → elapsed time
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Table    │  named typed columns, optional time index
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  writer   │  CSV tables, JSON crop reports
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod writer;
