//! Record builders shared by the unit tests.

use std::collections::BTreeMap;

use super::model::{CustomerId, CustomerRecord};

/// A "Champions" / "Gold" / cluster 0 customer with the given id and CLV.
pub fn record(id: &str, clv: f64) -> CustomerRecord {
    CustomerRecord {
        customer_id: CustomerId::new(id),
        recency: 10.0,
        frequency: 2,
        monetary: 100.0,
        rfm_segment: "Champions".to_string(),
        clv_predicted: clv,
        clv_segment: "Gold".to_string(),
        cluster_id: 0,
        extra: BTreeMap::new(),
    }
}

/// Like [`record`] with explicit categories.
pub fn categorized(id: &str, clv: f64, rfm: &str, tier: &str, cluster: i64) -> CustomerRecord {
    CustomerRecord {
        rfm_segment: rfm.to_string(),
        clv_segment: tier.to_string(),
        cluster_id: cluster,
        ..record(id, clv)
    }
}
