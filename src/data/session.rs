use std::path::{Path, PathBuf};

use super::error::LoadError;
use super::loader::{load_customers, load_statistics};
use super::model::{CustomerTable, SummaryStatistics};

/// Everything one analysis works on, loaded once and then read-only.
///
/// Replacing the data means building a new `Session`; nothing is cached
/// behind the caller's back.
#[derive(Debug, Clone)]
pub struct Session {
    pub customers: CustomerTable,
    pub statistics: SummaryStatistics,
    pub customers_path: PathBuf,
    pub statistics_path: PathBuf,
}

impl Session {
    /// Load both inputs. Either failing aborts the whole session.
    pub fn load(customers_path: &Path, statistics_path: &Path) -> Result<Self, LoadError> {
        let customers = load_customers(customers_path)?;
        let statistics = load_statistics(statistics_path)?;

        if statistics.total_customers != customers.len() as u64 {
            log::warn!(
                "Statistics report {} customers but the table has {}",
                statistics.total_customers,
                customers.len()
            );
        }

        Ok(Session {
            customers,
            statistics,
            customers_path: customers_path.to_path_buf(),
            statistics_path: statistics_path.to_path_buf(),
        })
    }
}
