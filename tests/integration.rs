//! Integration tests for Customer Lens

use std::io::Write;

use customer_lens::data::export::export_to_path;
use customer_lens::data::filter::{apply, apply_indices};
use customer_lens::data::loader::load_customers;
use customer_lens::data::model::{ClvTier, GroupField, GroupKey};
use customer_lens::data::summary::{
    column_values, group_summary, integer_histogram, revenue_by_group, tier_summary, value_counts,
};
use customer_lens::{FilterError, FilterSpec, LoadError, Selection, Session};
use tempfile::{Builder, NamedTempFile, TempDir};

/// Create a customer table shaped like the pipeline output
fn create_customers_csv() -> NamedTempFile {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "CustomerID,Recency,Frequency,Monetary,R_Score,F_Score,M_Score,Segment,CLV_Predictive,CLV_Segment,KMeans_Cluster,Cluster_Name"
    )
    .unwrap();
    writeln!(file, "12346,325,1,77183.6,1,1,5,Lost,0,Bronze,2,Dormant").unwrap();
    writeln!(file, "12347,2,7,4310,5,5,5,Champions,5120.75,Diamond,1,VIP").unwrap();
    writeln!(file, "12348,75,4,1797.24,3,4,4,Loyal,1520.1,Gold,0,Regulars").unwrap();
    writeln!(file, "12349,18,1,1757.55,4,1,4,New Customers,1520.1,Gold,0,Regulars").unwrap();
    writeln!(file, "12350,310,1,334.4,1,1,2,Lost,0,Bronze,2,Dormant").unwrap();
    writeln!(file, "12352,36,8,2506.04,4,5,5,Champions,2890.5,Platinum,1,VIP").unwrap();
    file
}

fn create_stats_json() -> NamedTempFile {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "total_customers": 6,
            "total_revenue": 87888.83,
            "avg_monetary": 14648.14,
            "segment_distribution": {{"Lost": 2, "Champions": 2, "Loyal": 1, "New Customers": 1}}
        }}"#
    )
    .unwrap();
    file
}

#[test]
fn test_session_load_and_top_segment() {
    let customers = create_customers_csv();
    let stats = create_stats_json();

    let session = Session::load(customers.path(), stats.path()).unwrap();

    assert_eq!(session.customers.len(), 6);
    assert_eq!(session.statistics.total_customers, 6);
    // "Lost" and "Champions" tie; the first listed wins.
    assert_eq!(session.statistics.top_segment(), Some("Lost"));
    assert_eq!(session.customers.cluster_ids.len(), 3);
}

#[test]
fn test_session_fails_when_stats_missing() {
    let customers = create_customers_csv();
    let err = Session::load(customers.path(), std::path::Path::new("/missing/stats.json"))
        .unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
}

#[test]
fn test_explorer_query() {
    let customers = create_customers_csv();
    let table = load_customers(customers.path()).unwrap();

    let spec = FilterSpec {
        clv_segments: Selection::only(["Gold".to_string(), "Diamond".to_string()]),
        clv_min: Some(1000.0),
        clv_max: Some(6000.0),
        ..FilterSpec::default()
    };
    let result = apply(&table.records, &spec).unwrap();
    let ids: Vec<&str> = result.iter().map(|r| r.customer_id.as_str()).collect();
    // Equal CLV for 12348 and 12349: id order.
    assert_eq!(ids, vec!["12347", "12348", "12349"]);

    let inverted = FilterSpec {
        clv_min: Some(500.0),
        clv_max: Some(100.0),
        ..FilterSpec::default()
    };
    assert!(matches!(
        apply_indices(&table.records, &inverted),
        Err(FilterError::InvalidRange { .. })
    ));
}

#[test]
fn test_export_round_trip() {
    let customers = create_customers_csv();
    let table = load_customers(customers.path()).unwrap();

    let spec = FilterSpec {
        rfm_segments: Selection::only(["Lost".to_string(), "Champions".to_string()]),
        ..FilterSpec::default()
    };
    let filtered = apply(&table.records, &spec).unwrap();
    assert_eq!(filtered.len(), 4);

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("export.csv");
    let written = export_to_path(&out, &table.columns, filtered.iter().copied()).unwrap();
    assert_eq!(written, 4);

    let reloaded = load_customers(&out).unwrap();
    assert_eq!(reloaded.columns, table.columns);
    let original: Vec<_> = filtered.into_iter().cloned().collect();
    assert_eq!(reloaded.records, original);
}

#[test]
fn test_dashboard_aggregates() {
    let customers = create_customers_csv();
    let table = load_customers(customers.path()).unwrap();
    let records = &table.records;

    let clusters = group_summary(records, &GroupField::Cluster);
    let keys: Vec<GroupKey> = clusters.iter().map(|s| s.key.clone()).collect();
    assert_eq!(
        keys,
        vec![GroupKey::Number(0), GroupKey::Number(1), GroupKey::Number(2)]
    );
    assert_eq!(clusters[1].count, 2);
    assert!((clusters[1].avg_clv - 4005.625).abs() < 1e-9);

    let names = value_counts(records, &GroupField::Column("Cluster_Name".into()));
    assert_eq!(names.len(), 3);

    let revenue = revenue_by_group(records, &GroupField::RfmSegment);
    let order: Vec<String> = revenue.iter().map(|(k, _)| k.to_string()).collect();
    assert_eq!(order, vec!["Lost", "Champions", "Loyal", "New Customers"]);

    let gold = tier_summary(records, ClvTier::Gold).unwrap();
    assert_eq!(gold.count, 2);
    assert!(tier_summary(records, ClvTier::Silver).is_none());
}

#[test]
fn test_named_cluster_profiles_and_score_columns() {
    let customers = create_customers_csv();
    let table = load_customers(customers.path()).unwrap();
    let records = &table.records;

    let named = group_summary(records, &GroupField::Column("Cluster_Name".into()));
    let labels: Vec<String> = named.iter().map(|s| s.key.to_string()).collect();
    assert_eq!(labels, vec!["Dormant", "Regulars", "VIP"]);
    assert!((named[0].avg_recency - 317.5).abs() < 1e-9);
    assert_eq!(named[2].count, 2);

    let bins = integer_histogram(&column_values(records, "R_Score"));
    let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
    assert_eq!(counts, vec![2, 0, 1, 2, 1]);
    assert!(column_values(records, "Customer_Segment").is_empty());
}

#[test]
fn test_export_round_trip_with_spaced_header() {
    let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(
        file,
        "CustomerID, Recency, Frequency, Monetary, Segment, CLV_Predictive, CLV_Segment, KMeans_Cluster"
    )
    .unwrap();
    writeln!(file, "1,5,2,100,Lost,50,Gold,0").unwrap();
    let table = load_customers(file.path()).unwrap();

    let all = apply(&table.records, &FilterSpec::default()).unwrap();
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("export.csv");
    export_to_path(&out, &table.columns, all.iter().copied()).unwrap();

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("1,5,2,100,Lost,50,Gold,0"), "{text}");

    let reloaded = load_customers(&out).unwrap();
    assert_eq!(reloaded.records, table.records);
}
