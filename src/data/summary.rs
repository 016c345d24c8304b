//! Aggregations over the customer table: the "top segment" reading of the
//! statistics file, group-by summaries, CLV headline numbers, histogram and
//! box-plot data, and the per-tier recommendation playbook.

use std::collections::BTreeMap;

use super::model::{ClvTier, CustomerRecord, GroupField, GroupKey, SummaryStatistics};

// ---------------------------------------------------------------------------
// Top segment
// ---------------------------------------------------------------------------

/// The segment with the highest count.
///
/// Ties go to the segment listed first in `distribution`, which keeps the
/// document order of the statistics file. Returns `None` when empty.
pub fn top_segment(distribution: &[(String, u64)]) -> Option<&str> {
    let mut best: Option<&(String, u64)> = None;
    for entry in distribution {
        if best.map_or(true, |b| entry.1 > b.1) {
            best = Some(entry);
        }
    }
    best.map(|(label, _)| label.as_str())
}

impl SummaryStatistics {
    /// See [`top_segment`].
    pub fn top_segment(&self) -> Option<&str> {
        top_segment(&self.segment_distribution)
    }

    /// Recompute the statistics document from a record set, distributing
    /// customers over `segment_field`.
    pub fn compute(records: &[CustomerRecord], segment_field: &GroupField) -> Self {
        let total_revenue: f64 = records.iter().map(|r| r.monetary).sum();
        let avg_monetary = if records.is_empty() {
            0.0
        } else {
            total_revenue / records.len() as f64
        };
        SummaryStatistics {
            total_customers: records.len() as u64,
            total_revenue,
            avg_monetary,
            segment_distribution: value_counts(records, segment_field)
                .into_iter()
                .map(|(key, count)| (key.to_string(), count as u64))
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Group-by summaries
// ---------------------------------------------------------------------------

/// Customers per group, most frequent first; equal counts in key order.
pub fn value_counts(records: &[CustomerRecord], field: &GroupField) -> Vec<(GroupKey, usize)> {
    let mut counts: BTreeMap<GroupKey, usize> = BTreeMap::new();
    for key in records.iter().filter_map(|r| r.group_key(field)) {
        *counts.entry(key).or_default() += 1;
    }
    let mut counts: Vec<(GroupKey, usize)> = counts.into_iter().collect();
    // Stable sort keeps key order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Means of the RFM and CLV columns for one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: GroupKey,
    pub count: usize,
    pub avg_recency: f64,
    pub avg_frequency: f64,
    pub avg_monetary: f64,
    pub avg_clv: f64,
    /// Share of all records passed in, in percent.
    pub share_pct: f64,
}

#[derive(Default)]
struct Accumulator {
    count: usize,
    recency: f64,
    frequency: f64,
    monetary: f64,
    clv: f64,
}

/// One row per group, in key order (clusters numerically).
pub fn group_summary(records: &[CustomerRecord], field: &GroupField) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    for record in records {
        let Some(key) = record.group_key(field) else {
            continue;
        };
        let acc = groups.entry(key).or_default();
        acc.count += 1;
        acc.recency += record.recency;
        acc.frequency += record.frequency as f64;
        acc.monetary += record.monetary;
        acc.clv += record.clv_predicted;
    }

    let total = records.len() as f64;
    groups
        .into_iter()
        .map(|(key, acc)| {
            let n = acc.count as f64;
            GroupSummary {
                key,
                count: acc.count,
                avg_recency: acc.recency / n,
                avg_frequency: acc.frequency / n,
                avg_monetary: acc.monetary / n,
                avg_clv: acc.clv / n,
                share_pct: n / total * 100.0,
            }
        })
        .collect()
}

/// Historical revenue per group, largest first.
pub fn revenue_by_group(records: &[CustomerRecord], field: &GroupField) -> Vec<(GroupKey, f64)> {
    let mut sums: BTreeMap<GroupKey, f64> = BTreeMap::new();
    for record in records {
        if let Some(key) = record.group_key(field) {
            *sums.entry(key).or_default() += record.monetary;
        }
    }
    let mut sums: Vec<(GroupKey, f64)> = sums.into_iter().collect();
    sums.sort_by(|a, b| b.1.total_cmp(&a.1));
    sums
}

// ---------------------------------------------------------------------------
// Headline numbers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClvOverview {
    pub mean: f64,
    pub total: f64,
    pub max: f64,
}

/// Mean, total and highest predicted CLV. `None` for an empty set.
pub fn clv_overview(records: &[CustomerRecord]) -> Option<ClvOverview> {
    if records.is_empty() {
        return None;
    }
    let total: f64 = records.iter().map(|r| r.clv_predicted).sum();
    let max = records
        .iter()
        .map(|r| r.clv_predicted)
        .fold(f64::NEG_INFINITY, f64::max);
    Some(ClvOverview {
        mean: total / records.len() as f64,
        total,
        max,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyInsights {
    pub diamond_share_pct: f64,
    /// Customers with more than one purchase.
    pub repeat_share_pct: f64,
    pub avg_frequency: f64,
}

pub fn key_insights(records: &[CustomerRecord]) -> Option<KeyInsights> {
    if records.is_empty() {
        return None;
    }
    let n = records.len() as f64;
    let diamond = records
        .iter()
        .filter(|r| r.clv_segment == ClvTier::Diamond.label())
        .count() as f64;
    let repeat = records.iter().filter(|r| r.frequency > 1).count() as f64;
    let purchases: f64 = records.iter().map(|r| r.frequency as f64).sum();
    Some(KeyInsights {
        diamond_share_pct: diamond / n * 100.0,
        repeat_share_pct: repeat / n * 100.0,
        avg_frequency: purchases / n,
    })
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Equal-width bins over `[min, max]`; the last bin includes `max`.
/// Non-finite values are skipped.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: finite.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut counts = vec![0usize; bins];
    for v in &finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count,
        })
        .collect()
}

/// Numeric cells of an extra column. Missing and non-numeric cells are
/// skipped.
pub fn column_values(records: &[CustomerRecord], column: &str) -> Vec<f64> {
    records
        .iter()
        .filter_map(|r| r.extra.get(column)?.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

/// One unit-wide bin per whole number between the smallest and largest
/// value, for discrete scores such as `R_Score`. Values are rounded.
pub fn integer_histogram(values: &[f64]) -> Vec<HistogramBin> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values.iter().filter(|v| v.is_finite()) {
        *counts.entry(v.round() as i64).or_default() += 1;
    }
    let (Some(&lo), Some(&hi)) = (counts.keys().next(), counts.keys().next_back()) else {
        return Vec::new();
    };
    (lo..=hi)
        .map(|k| HistogramBin {
            start: k as f64 - 0.5,
            end: k as f64 + 0.5,
            count: counts.get(&k).copied().unwrap_or(0),
        })
        .collect()
}

/// Box-plot statistics. Whiskers reach the most extreme values inside
/// 1.5 × IQR of the quartiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
}

/// Quartiles use linear interpolation between closest ranks.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let quantile = |q: f64| {
        let pos = q * (sorted.len() - 1) as f64;
        let lo = pos.floor() as usize;
        let hi = pos.ceil() as usize;
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    };
    let q1 = quantile(0.25);
    let median = quantile(0.5);
    let q3 = quantile(0.75);
    let fence = 1.5 * (q3 - q1);

    let lower_whisker = sorted
        .iter()
        .copied()
        .find(|v| *v >= q1 - fence)
        .unwrap_or(q1);
    let upper_whisker = sorted
        .iter()
        .rev()
        .copied()
        .find(|v| *v <= q3 + fence)
        .unwrap_or(q3);

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
    })
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Suggested actions for customers in `tier`.
pub fn playbook(tier: ClvTier) -> &'static [&'static str] {
    match tier {
        ClvTier::Diamond => &[
            "Provide VIP customer service and dedicated account managers",
            "Offer exclusive products and early access to new releases",
            "Implement personalized marketing campaigns",
            "Create loyalty rewards programs with premium benefits",
        ],
        ClvTier::Platinum => &[
            "Develop retention programs to prevent churn",
            "Upsell premium products and services",
            "Provide priority customer support",
            "Offer referral bonuses for bringing new customers",
        ],
        ClvTier::Gold => &[
            "Focus on increasing purchase frequency",
            "Implement cross-selling strategies",
            "Send targeted promotional campaigns",
            "Provide excellent customer service to build loyalty",
        ],
        ClvTier::Silver => &[
            "Re-engagement campaigns to increase activity",
            "Value-driven offers and discounts",
            "Educational content about product benefits",
            "Regular communication to stay top-of-mind",
        ],
        ClvTier::Bronze => &[
            "Win-back campaigns with special offers",
            "Deep discounts to encourage repurchase",
            "Survey to understand pain points",
            "Simplified onboarding for easier engagement",
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierSummary {
    pub tier: ClvTier,
    pub count: usize,
    pub share_pct: f64,
    pub avg_clv: f64,
}

/// Size and mean CLV of one tier. `None` when no customer is in it.
pub fn tier_summary(records: &[CustomerRecord], tier: ClvTier) -> Option<TierSummary> {
    let (count, clv) = records
        .iter()
        .filter(|r| r.clv_segment == tier.label())
        .fold((0usize, 0.0), |(n, sum), r| (n + 1, sum + r.clv_predicted));
    if count == 0 {
        return None;
    }
    Some(TierSummary {
        tier,
        count,
        share_pct: count as f64 / records.len() as f64 * 100.0,
        avg_clv: clv / count as f64,
    })
}
