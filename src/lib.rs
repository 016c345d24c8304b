//! Customer Lens: typed core of the customer analytics explorer.
//!
//! The analytics themselves (RFM scores, CLV predictions, K-Means clusters)
//! are produced upstream. This crate loads the materialized table and its
//! statistics file, filters and summarizes the records, and exports subsets.

pub mod data;

pub use data::error::{ExportError, FilterError, LoadError};
pub use data::filter::{FilterSpec, Selection};
pub use data::model::{CustomerRecord, CustomerTable, SummaryStatistics};
pub use data::session::Session;
