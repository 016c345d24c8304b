/// Data layer: core types, loading, filtering, summaries and export.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet       dashboard_stats.json
///        │                              │
///        ▼                              ▼
///   ┌──────────┐                 ┌────────────┐
///   │  loader   │  rows → records │  loader    │  → SummaryStatistics
///   └──────────┘                 └────────────┘
///        │                              │
///        └──────────────┬───────────────┘
///                       ▼
///                ┌────────────┐
///                │  Session    │  immutable handle for one analysis
///                └────────────┘
///                       │
///          ┌────────────┼─────────────┐
///          ▼            ▼             ▼
///     ┌────────┐   ┌─────────┐   ┌────────┐
///     │ filter  │   │ summary  │   │ export  │
///     └────────┘   └─────────┘   └────────┘
/// ```

pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod session;
pub mod summary;

#[cfg(test)]
pub(crate) mod testing;
