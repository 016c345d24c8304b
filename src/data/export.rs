use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;

use super::error::ExportError;
use super::model::{
    CustomerRecord, COL_CLUSTER, COL_CLV_PREDICTED, COL_CLV_SEGMENT, COL_CUSTOMER_ID,
    COL_FREQUENCY, COL_MONETARY, COL_RECENCY, COL_RFM_SEGMENT,
};

/// File name offered for an export taken at `now`.
pub fn default_export_name(now: NaiveDateTime) -> String {
    format!("customer_analysis_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// Write `records` as CSV with the given header, in the order given.
///
/// Numbers use Rust's shortest round-trip formatting, so loading the output
/// again yields the same values.
pub fn write_csv<'a, W, I>(writer: W, columns: &[String], records: I) -> Result<usize, ExportError>
where
    W: Write,
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(columns)?;

    let mut written = 0;
    for record in records {
        out.write_record(columns.iter().map(|col| render_cell(record, col)))?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

/// [`write_csv`] into a new file at `path`.
pub fn export_to_path<'a, I>(path: &Path, columns: &[String], records: I) -> Result<usize, ExportError>
where
    I: IntoIterator<Item = &'a CustomerRecord>,
{
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    let written = write_csv(file, columns, records)?;
    log::info!("Exported {written} customers to {}", path.display());
    Ok(written)
}

fn render_cell(record: &CustomerRecord, column: &str) -> String {
    match column {
        COL_CUSTOMER_ID => record.customer_id.to_string(),
        COL_RECENCY => record.recency.to_string(),
        COL_FREQUENCY => record.frequency.to_string(),
        COL_MONETARY => record.monetary.to_string(),
        COL_RFM_SEGMENT => record.rfm_segment.clone(),
        COL_CLV_PREDICTED => record.clv_predicted.to_string(),
        COL_CLV_SEGMENT => record.clv_segment.clone(),
        COL_CLUSTER => record.cluster_id.to_string(),
        other => record.extra.get(other).cloned().unwrap_or_default(),
    }
}
