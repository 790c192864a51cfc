/// Data layer: core types, loading, and aggregation.
///
/// Architecture:
/// ```text
///  student_data.csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (index column dropped)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Dataset  │  Vec<Record>, read-only after load
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ aggregate  │  counts / group means / raw columns / box stats
///   └───────────┘
/// ```

pub mod aggregate;
pub mod loader;
pub mod model;
