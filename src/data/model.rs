use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::LoadError;

// ---------------------------------------------------------------------------
// Column names of the upstream table
// ---------------------------------------------------------------------------

pub const COL_CUSTOMER_ID: &str = "CustomerID";
pub const COL_RECENCY: &str = "Recency";
pub const COL_FREQUENCY: &str = "Frequency";
pub const COL_MONETARY: &str = "Monetary";
pub const COL_RFM_SEGMENT: &str = "Segment";
pub const COL_CLV_PREDICTED: &str = "CLV_Predictive";
pub const COL_CLV_SEGMENT: &str = "CLV_Segment";
pub const COL_CLUSTER: &str = "KMeans_Cluster";

/// Columns every customer table must carry, in canonical export order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_CUSTOMER_ID,
    COL_RECENCY,
    COL_FREQUENCY,
    COL_MONETARY,
    COL_RFM_SEGMENT,
    COL_CLV_PREDICTED,
    COL_CLV_SEGMENT,
    COL_CLUSTER,
];

// ---------------------------------------------------------------------------
// CustomerId – opaque identifier with a reproducible order
// ---------------------------------------------------------------------------

/// Opaque customer identifier as it appears in the source table.
///
/// Ordering: integer ids (including float-typed ones such as `"12346.0"`)
/// compare numerically and sort before any other id; everything else
/// compares as text. Two ids with the same
/// numeric value but different spelling (`"7"` vs `"007"`) fall back to
/// text order, so `Ord` agrees with `Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CustomerId(String);

impl CustomerId {
    pub fn new(raw: impl Into<String>) -> Self {
        CustomerId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<i64> {
        if let Ok(i) = self.0.parse::<i64>() {
            return Some(i);
        }
        match self.0.parse::<f64>() {
            Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                Some(f as i64)
            }
            _ => None,
        }
    }
}

impl PartialOrd for CustomerId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CustomerId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// CustomerRecord – one row of the table
// ---------------------------------------------------------------------------

/// A single customer with its pre-computed analytics.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    /// Days since last purchase.
    pub recency: f64,
    /// Purchase count.
    pub frequency: u64,
    /// Historical spend.
    pub monetary: f64,
    pub rfm_segment: String,
    pub clv_predicted: f64,
    pub clv_segment: String,
    pub cluster_id: i64,
    /// Columns outside the core schema, kept verbatim: column_name → cell.
    pub extra: BTreeMap<String, String>,
}

impl CustomerRecord {
    /// The grouping key of this record for `field`.
    ///
    /// Empty categorical cells and absent extra columns have no key, so they
    /// never show up as a category of their own.
    pub fn group_key(&self, field: &GroupField) -> Option<GroupKey> {
        let text = match field {
            GroupField::Cluster => return Some(GroupKey::Number(self.cluster_id)),
            GroupField::RfmSegment => self.rfm_segment.as_str(),
            GroupField::ClvSegment => self.clv_segment.as_str(),
            GroupField::Column(name) => self.extra.get(name)?.as_str(),
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(GroupKey::Text(text.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// A categorical dimension records can be grouped by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupField {
    RfmSegment,
    ClvSegment,
    Cluster,
    /// Any extra column, e.g. `Customer_Segment` or `Cluster_Name`.
    Column(String),
}

impl GroupField {
    pub fn column_name(&self) -> &str {
        match self {
            GroupField::RfmSegment => COL_RFM_SEGMENT,
            GroupField::ClvSegment => COL_CLV_SEGMENT,
            GroupField::Cluster => COL_CLUSTER,
            GroupField::Column(name) => name,
        }
    }
}

/// Value of a [`GroupField`]. Numbers sort before text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Number(i64),
    Text(String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Number(n) => write!(f, "{n}"),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// CLV tiers
// ---------------------------------------------------------------------------

/// The five CLV tiers the upstream model assigns, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClvTier {
    Diamond,
    Platinum,
    Gold,
    Silver,
    Bronze,
}

impl ClvTier {
    pub const ALL: [ClvTier; 5] = [
        ClvTier::Diamond,
        ClvTier::Platinum,
        ClvTier::Gold,
        ClvTier::Silver,
        ClvTier::Bronze,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ClvTier::Diamond => "Diamond",
            ClvTier::Platinum => "Platinum",
            ClvTier::Gold => "Gold",
            ClvTier::Silver => "Silver",
            ClvTier::Bronze => "Bronze",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for ClvTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// CustomerTable – the complete loaded record set
// ---------------------------------------------------------------------------

/// The full parsed table with the distinct values of each categorical field.
#[derive(Debug, Clone)]
pub struct CustomerTable {
    pub records: Vec<CustomerRecord>,
    /// Header order of the source, used again on export.
    pub columns: Vec<String>,
    pub rfm_segments: BTreeSet<String>,
    pub clv_segments: BTreeSet<String>,
    pub cluster_ids: BTreeSet<i64>,
}

impl CustomerTable {
    /// Build a table with the canonical column order followed by every extra
    /// column seen in `records`.
    pub fn new(records: Vec<CustomerRecord>) -> Result<Self, LoadError> {
        let extras: BTreeSet<&String> = records.iter().flat_map(|r| r.extra.keys()).collect();
        let columns = REQUIRED_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(extras.into_iter().cloned())
            .collect();
        Self::with_columns(columns, records)
    }

    /// Build a table keeping the given header order.
    pub fn with_columns(
        columns: Vec<String>,
        records: Vec<CustomerRecord>,
    ) -> Result<Self, LoadError> {
        let mut seen: HashSet<&CustomerId> = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(&record.customer_id) {
                return Err(LoadError::DuplicateCustomer(record.customer_id.to_string()));
            }
        }

        let mut rfm_segments = BTreeSet::new();
        let mut clv_segments = BTreeSet::new();
        let mut cluster_ids = BTreeSet::new();
        for record in &records {
            if !record.rfm_segment.is_empty() {
                rfm_segments.insert(record.rfm_segment.clone());
            }
            if !record.clv_segment.is_empty() {
                clv_segments.insert(record.clv_segment.clone());
            }
            cluster_ids.insert(record.cluster_id);
        }

        Ok(CustomerTable {
            records,
            columns,
            rfm_segments,
            clv_segments,
            cluster_ids,
        })
    }

    /// Columns outside [`REQUIRED_COLUMNS`], in header order.
    pub fn extra_columns(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| !REQUIRED_COLUMNS.contains(c))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Number of customers.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no customers were loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SummaryStatistics – the upstream key/value document
// ---------------------------------------------------------------------------

/// Headline numbers computed by the upstream pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub total_customers: u64,
    pub total_revenue: f64,
    pub avg_monetary: f64,
    /// Segment label → customer count, in document order.
    #[serde(with = "distribution")]
    pub segment_distribution: Vec<(String, u64)>,
}

/// (De)serializes the distribution as a JSON object while keeping key order.
mod distribution {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::{Map, Value};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S: Serializer>(entries: &Vec<(String, u64)>, s: S) -> Result<S::Ok, S::Error> {
        s.collect_map(entries.iter().map(|(label, count)| (label, count)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<(String, u64)>, D::Error> {
        let map = Map::<String, Value>::deserialize(d)?;
        map.into_iter()
            .map(|(label, count)| {
                let n = count
                    .as_u64()
                    .or_else(|| {
                        count
                            .as_f64()
                            .filter(|f| *f >= 0.0 && f.fract() == 0.0)
                            .map(|f| f as u64)
                    })
                    .ok_or_else(|| {
                        D::Error::custom(format!(
                            "segment '{label}' has a non-integer count: {count}"
                        ))
                    })?;
                Ok((label, n))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::record;

    #[test]
    fn test_customer_id_orders_numbers_numerically() {
        let mut ids: Vec<CustomerId> = ["10", "9", "abc", "007", "7", "-1"]
            .into_iter()
            .map(CustomerId::new)
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(CustomerId::as_str).collect();
        assert_eq!(sorted, vec!["-1", "007", "7", "9", "10", "abc"]);
    }

    #[test]
    fn test_float_typed_ids_order_numerically() {
        let mut ids: Vec<CustomerId> = ["12346.0", "9999.0", "12346", "x1"]
            .into_iter()
            .map(CustomerId::new)
            .collect();
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(CustomerId::as_str).collect();
        assert_eq!(sorted, vec!["9999.0", "12346", "12346.0", "x1"]);
        assert_ne!(CustomerId::new("12346"), CustomerId::new("12346.0"));
    }

    #[test]
    fn test_table_rejects_duplicate_ids() {
        let err = CustomerTable::new(vec![record("1", 5.0), record("1", 6.0)]).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateCustomer(id) if id == "1"));
    }

    #[test]
    fn test_table_collects_distinct_categories() {
        let mut a = record("1", 1.0);
        a.rfm_segment = "At Risk".to_string();
        a.cluster_id = 3;
        let mut b = record("2", 2.0);
        b.clv_segment = String::new();
        let table = CustomerTable::new(vec![a, b]).unwrap();

        assert_eq!(
            table.rfm_segments.iter().collect::<Vec<_>>(),
            vec!["At Risk", "Champions"]
        );
        // Empty labels are not offered as a category.
        assert_eq!(table.clv_segments.iter().collect::<Vec<_>>(), vec!["Gold"]);
        assert_eq!(table.cluster_ids.iter().copied().collect::<Vec<_>>(), vec![0, 3]);
    }

    #[test]
    fn test_new_table_appends_extra_columns() {
        let mut a = record("1", 1.0);
        a.extra.insert("AOV".to_string(), "12.5".to_string());
        let table = CustomerTable::new(vec![a]).unwrap();
        assert_eq!(table.columns.len(), REQUIRED_COLUMNS.len() + 1);
        assert_eq!(table.extra_columns().collect::<Vec<_>>(), vec!["AOV"]);
    }

    #[test]
    fn test_empty_table_keeps_header() {
        let table = CustomerTable::new(Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), REQUIRED_COLUMNS.len());
        assert!(!CustomerTable::new(vec![record("1", 1.0)]).unwrap().is_empty());
    }

    #[test]
    fn test_group_field_column_names() {
        assert_eq!(GroupField::RfmSegment.column_name(), "Segment");
        assert_eq!(GroupField::ClvSegment.column_name(), "CLV_Segment");
        assert_eq!(GroupField::Cluster.column_name(), "KMeans_Cluster");
        assert_eq!(
            GroupField::Column("Customer_Segment".into()).column_name(),
            "Customer_Segment"
        );
    }

    #[test]
    fn test_group_key_skips_missing_labels() {
        let mut r = record("1", 1.0);
        r.rfm_segment = "  ".to_string();
        assert_eq!(r.group_key(&GroupField::RfmSegment), None);
        assert_eq!(r.group_key(&GroupField::Cluster), Some(GroupKey::Number(0)));
        assert_eq!(r.group_key(&GroupField::Column("Cluster_Name".into())), None);
    }

    #[test]
    fn test_statistics_keep_document_order() {
        let json = r#"{
            "total_customers": 20,
            "total_revenue": 1500.5,
            "avg_monetary": 75.025,
            "segment_distribution": {"Gold": 10, "Diamond": 10}
        }"#;
        let stats: SummaryStatistics = serde_json::from_str(json).unwrap();
        assert_eq!(
            stats.segment_distribution,
            vec![("Gold".to_string(), 10), ("Diamond".to_string(), 10)]
        );

        let back = serde_json::to_string(&stats).unwrap();
        let again: SummaryStatistics = serde_json::from_str(&back).unwrap();
        assert_eq!(again, stats);
    }

    #[test]
    fn test_statistics_reject_fractional_counts() {
        let json = r#"{
            "total_customers": 1,
            "total_revenue": 1.0,
            "avg_monetary": 1.0,
            "segment_distribution": {"Gold": 1.5}
        }"#;
        assert!(serde_json::from_str::<SummaryStatistics>(json).is_err());
    }

    #[test]
    fn test_tier_labels() {
        assert_eq!(ClvTier::from_label("Platinum"), Some(ClvTier::Platinum));
        assert_eq!(ClvTier::from_label("platinum"), None);
        assert_eq!(ClvTier::Bronze.to_string(), "Bronze");
    }
}
