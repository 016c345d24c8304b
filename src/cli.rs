//! Command-line and environment configuration

use std::path::PathBuf;

use clap::Parser;
use customer_lens::{FilterSpec, Selection};

/// Customer analytics explorer for pre-computed RFM, CLV and K-Means results
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Customer table (.csv, .json or .parquet)
    #[arg(
        long,
        env = "CUSTOMER_LENS_CUSTOMERS",
        default_value = "data/customer_analytics_data.csv"
    )]
    pub customers: PathBuf,

    /// Summary statistics document (.json)
    #[arg(
        long,
        env = "CUSTOMER_LENS_STATS",
        default_value = "data/dashboard_stats.json"
    )]
    pub stats: PathBuf,

    /// Write the filtered customers to this CSV file instead of opening the window
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Keep only this RFM segment (repeatable)
    #[arg(long = "rfm-segment", value_name = "LABEL")]
    pub rfm_segments: Vec<String>,

    /// Keep only this CLV tier (repeatable)
    #[arg(long = "clv-segment", value_name = "LABEL")]
    pub clv_segments: Vec<String>,

    /// Keep only this K-Means cluster (repeatable)
    #[arg(long = "cluster", value_name = "ID", allow_negative_numbers = true)]
    pub clusters: Vec<i64>,

    /// Lowest predicted CLV to keep (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub clv_min: Option<f64>,

    /// Highest predicted CLV to keep (inclusive)
    #[arg(long, allow_negative_numbers = true)]
    pub clv_max: Option<f64>,
}

impl Args {
    /// Filter built from the flags. Fields without flags are not filtered.
    pub fn filter_spec(&self) -> FilterSpec {
        fn selection<T: Ord + Clone>(values: &[T]) -> Selection<T> {
            if values.is_empty() {
                Selection::All
            } else {
                Selection::only(values.iter().cloned())
            }
        }

        FilterSpec {
            rfm_segments: selection(&self.rfm_segments),
            clv_segments: selection(&self.clv_segments),
            cluster_ids: selection(&self.clusters),
            clv_min: self.clv_min,
            clv_max: self.clv_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["customer-lens"]).unwrap();
        assert_eq!(
            args.customers,
            PathBuf::from("data/customer_analytics_data.csv")
        );
        assert!(args.export.is_none());
        assert_eq!(args.filter_spec(), FilterSpec::default());
    }

    #[test]
    fn test_filter_flags() {
        let args = Args::try_parse_from([
            "customer-lens",
            "--export",
            "out.csv",
            "--rfm-segment",
            "Champions",
            "--rfm-segment",
            "At Risk",
            "--cluster",
            "2",
            "--clv-min",
            "-10",
            "--clv-max",
            "500.5",
        ])
        .unwrap();

        let spec = args.filter_spec();
        assert_eq!(
            spec.rfm_segments,
            Selection::only(["At Risk".to_string(), "Champions".to_string()])
        );
        assert_eq!(spec.clv_segments, Selection::All);
        assert_eq!(spec.cluster_ids, Selection::only([2]));
        assert_eq!(spec.clv_min, Some(-10.0));
        assert_eq!(spec.clv_max, Some(500.5));
    }

    #[test]
    fn test_invalid_cluster_is_rejected() {
        assert!(Args::try_parse_from(["customer-lens", "--cluster", "two"]).is_err());
    }
}
