//! Writes a deterministic synthetic customer table (CSV and Parquet) and the
//! matching statistics document.
//!
//! Usage: `generate_sample [OUTPUT_DIR] [CUSTOMERS]` (defaults: `data`, 500).

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use customer_lens::data::export::export_to_path;
use customer_lens::data::model::{
    ClvTier, CustomerId, CustomerRecord, CustomerTable, GroupField, SummaryStatistics,
    REQUIRED_COLUMNS,
};
use parquet::arrow::ArrowWriter;

/// Cluster profiles: name, mean recency (days), mean orders, mean order value.
const CLUSTERS: [(&str, f64, f64, f64); 4] = [
    ("Loyal High Spenders", 15.0, 18.0, 220.0),
    ("Regular Shoppers", 45.0, 6.0, 120.0),
    ("Occasional Buyers", 120.0, 2.5, 80.0),
    ("Dormant Customers", 260.0, 1.5, 60.0),
];

/// Share of customers per CLV tier, best first.
const TIER_SHARES: [(ClvTier, f64); 5] = [
    (ClvTier::Diamond, 0.05),
    (ClvTier::Platinum, 0.15),
    (ClvTier::Gold, 0.30),
    (ClvTier::Silver, 0.30),
    (ClvTier::Bronze, 0.20),
];

const EXTRA_COLUMNS: [&str; 6] = [
    "R_Score",
    "F_Score",
    "M_Score",
    "AOV",
    "Customer_Segment",
    "Cluster_Name",
];

/// SplitMix64 stream. The same seed always yields the same sample.
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform in `(0, 1]`.
    fn unit(&mut self) -> f64 {
        ((self.next_u64() >> 11) + 1) as f64 / (1u64 << 53) as f64
    }

    /// Normal draw with the given mean and spread.
    fn normal(&mut self, mean: f64, spread: f64) -> f64 {
        let radius = (-2.0 * self.unit().ln()).sqrt();
        let angle = std::f64::consts::TAU * self.unit();
        mean + spread * radius * angle.sin()
    }

    fn index(&mut self, len: usize) -> usize {
        (self.unit() * len as f64) as usize % len
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// 1–5 score from ascending thresholds; `higher_is_better = false` flips it.
fn score(value: f64, thresholds: [f64; 4], higher_is_better: bool) -> u8 {
    let below = thresholds.iter().filter(|&&t| value > t).count() as u8;
    if higher_is_better {
        below + 1
    } else {
        5 - below
    }
}

fn rfm_segment(r: u8, f: u8) -> &'static str {
    match (r, f) {
        (4.., 4..) => "Champions",
        (_, 4..) if r >= 3 => "Loyal Customers",
        (4.., _) => "Potential Loyalists",
        (..=2, 3..) => "At Risk",
        (..=2, _) => "Lost",
        _ => "Need Attention",
    }
}

fn business_segment(monetary: f64) -> &'static str {
    if monetary >= 2000.0 {
        "High Value"
    } else if monetary >= 500.0 {
        "Medium Value"
    } else {
        "Low Value"
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

fn generate(n: usize, rng: &mut SampleRng) -> Vec<CustomerRecord> {
    let mut records: Vec<CustomerRecord> = (0..n)
        .map(|i| {
            let cluster = rng.index(CLUSTERS.len());
            let (name, recency_mean, orders_mean, order_value) = CLUSTERS[cluster];

            let recency = rng.normal(recency_mean, recency_mean * 0.3).clamp(1.0, 373.0).round();
            let frequency = rng.normal(orders_mean, orders_mean * 0.4).round().max(1.0) as u64;
            let aov = rng.normal(order_value, order_value * 0.25).max(5.0);
            let monetary = (aov * frequency as f64 * 100.0).round() / 100.0;

            let retention = (1.0 - recency / 400.0).max(0.05);
            let clv = monetary * (1.0 + 0.25 * frequency as f64) * retention;
            let clv = (clv * 100.0).round() / 100.0;

            let r = score(recency, [30.0, 60.0, 120.0, 240.0], false);
            let f = score(frequency as f64, [1.0, 2.0, 5.0, 10.0], true);
            let m = score(monetary, [250.0, 500.0, 1000.0, 2500.0], true);

            let extra = BTreeMap::from([
                ("R_Score".to_string(), r.to_string()),
                ("F_Score".to_string(), f.to_string()),
                ("M_Score".to_string(), m.to_string()),
                ("AOV".to_string(), format!("{:.2}", monetary / frequency as f64)),
                ("Customer_Segment".to_string(), business_segment(monetary).to_string()),
                ("Cluster_Name".to_string(), name.to_string()),
            ]);

            CustomerRecord {
                customer_id: CustomerId::new((12346 + i).to_string()),
                recency,
                frequency,
                monetary,
                rfm_segment: rfm_segment(r, f).to_string(),
                clv_predicted: clv,
                clv_segment: String::new(),
                cluster_id: cluster as i64,
                extra,
            }
        })
        .collect();

    assign_tiers(&mut records);
    records
}

/// Tiers by CLV rank, following [`TIER_SHARES`].
fn assign_tiers(records: &mut [CustomerRecord]) {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by(|&a, &b| records[b].clv_predicted.total_cmp(&records[a].clv_predicted));

    let n = records.len() as f64;
    let mut cumulative = 0.0;
    let mut bounds = Vec::with_capacity(TIER_SHARES.len());
    for (tier, share) in TIER_SHARES {
        cumulative += share;
        bounds.push(((cumulative * n).round() as usize, tier));
    }

    for (rank, &idx) in order.iter().enumerate() {
        let tier = bounds
            .iter()
            .find(|(end, _)| rank < *end)
            .map_or(ClvTier::Bronze, |(_, tier)| *tier);
        records[idx].clv_segment = tier.label().to_string();
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

fn text_column(records: &[CustomerRecord], cell: impl Fn(&CustomerRecord) -> String) -> ArrayRef {
    Arc::new(StringArray::from(records.iter().map(cell).collect::<Vec<String>>()))
}

fn write_parquet(path: &Path, table: &CustomerTable) -> Result<()> {
    let records = &table.records;

    let mut fields = vec![
        Field::new("CustomerID", DataType::Utf8, false),
        Field::new("Recency", DataType::Float64, false),
        Field::new("Frequency", DataType::Int64, false),
        Field::new("Monetary", DataType::Float64, false),
        Field::new("Segment", DataType::Utf8, false),
        Field::new("CLV_Predictive", DataType::Float64, false),
        Field::new("CLV_Segment", DataType::Utf8, false),
        Field::new("KMeans_Cluster", DataType::Int64, false),
    ];
    let mut columns: Vec<ArrayRef> = vec![
        text_column(records, |r| r.customer_id.to_string()),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.recency))),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| r.frequency as i64),
        )),
        Arc::new(Float64Array::from_iter_values(records.iter().map(|r| r.monetary))),
        text_column(records, |r| r.rfm_segment.clone()),
        Arc::new(Float64Array::from_iter_values(
            records.iter().map(|r| r.clv_predicted),
        )),
        text_column(records, |r| r.clv_segment.clone()),
        Arc::new(Int64Array::from_iter_values(records.iter().map(|r| r.cluster_id))),
    ];
    for name in table.extra_columns() {
        fields.push(Field::new(name, DataType::Utf8, true));
        columns.push(text_column(records, |r| {
            r.extra.get(name).cloned().unwrap_or_default()
        }));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out_dir = args.next().unwrap_or_else(|| "data".to_string());
    let n: usize = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("invalid customer count {raw:?}"))?,
        None => 500,
    };

    let out_dir = Path::new(&out_dir);
    fs::create_dir_all(out_dir).with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SampleRng(42);
    let records = generate(n, &mut rng);
    let columns = REQUIRED_COLUMNS
        .iter()
        .chain(EXTRA_COLUMNS.iter())
        .map(|c| c.to_string())
        .collect();
    let table = CustomerTable::with_columns(columns, records)?;

    let csv_path = out_dir.join("customer_analytics_data.csv");
    export_to_path(&csv_path, &table.columns, &table.records)?;

    let parquet_path = out_dir.join("customer_analytics_data.parquet");
    write_parquet(&parquet_path, &table)?;

    let stats = SummaryStatistics::compute(&table.records, &GroupField::RfmSegment);
    let stats_path = out_dir.join("dashboard_stats.json");
    let file =
        File::create(&stats_path).with_context(|| format!("creating {}", stats_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, &stats)?;
    writer.flush()?;

    println!(
        "Wrote {} customers to {} and {}, statistics to {}",
        table.len(),
        csv_path.display(),
        parquet_path.display(),
        stats_path.display()
    );
    Ok(())
}
