use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type};
use arrow::error::ArrowError;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::{Map, Value as JsonValue};

use super::error::LoadError;
use super::model::{
    CustomerId, CustomerRecord, CustomerTable, SummaryStatistics, COL_CLUSTER, COL_CLV_PREDICTED,
    COL_CLV_SEGMENT, COL_CUSTOMER_ID, COL_FREQUENCY, COL_MONETARY, COL_RECENCY, COL_RFM_SEGMENT,
};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the customer table.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one customer per line (the pipeline default)
/// * `.json`    – `[{ "CustomerID": 1, "Recency": 12, ... }, ...]`
/// * `.parquet` – flat scalar columns written by Pandas or Polars
///
/// All formats go through the same row parser, so validation and error
/// messages are identical whatever the source.
pub fn load_customers(path: &Path) -> Result<CustomerTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_csv(path)?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => return Err(LoadError::UnsupportedFormat(other.to_string())),
    };

    log::info!(
        "Loaded {} customers with {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Load the upstream statistics document.
///
/// ```json
/// {
///   "total_customers": 4338,
///   "total_revenue": 8911407.9,
///   "avg_monetary": 2054.27,
///   "segment_distribution": { "Champions": 1240, "At Risk": 610 }
/// }
/// ```
pub fn load_statistics(path: &Path) -> Result<SummaryStatistics, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let stats: SummaryStatistics =
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    log::info!(
        "Loaded statistics for {} customers ({} segments) from {}",
        stats.total_customers,
        stats.segment_distribution.len(),
        path.display()
    );
    Ok(stats)
}

// ---------------------------------------------------------------------------
// Row parser shared by every format
// ---------------------------------------------------------------------------

/// Positions of the required columns inside one header row. Header names
/// are stored trimmed, so exports and extras use the clean names.
struct RowParser {
    columns: Vec<String>,
    customer_id: usize,
    recency: usize,
    frequency: usize,
    monetary: usize,
    rfm_segment: usize,
    clv_predicted: usize,
    clv_segment: usize,
    cluster: usize,
}

impl RowParser {
    fn new(columns: Vec<String>) -> Result<Self, LoadError> {
        let columns: Vec<String> = columns.iter().map(|c| c.trim().to_string()).collect();
        let find = |name: &str| {
            columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
        };
        Ok(RowParser {
            customer_id: find(COL_CUSTOMER_ID)?,
            recency: find(COL_RECENCY)?,
            frequency: find(COL_FREQUENCY)?,
            monetary: find(COL_MONETARY)?,
            rfm_segment: find(COL_RFM_SEGMENT)?,
            clv_predicted: find(COL_CLV_PREDICTED)?,
            clv_segment: find(COL_CLV_SEGMENT)?,
            cluster: find(COL_CLUSTER)?,
            columns,
        })
    }

    fn is_core(&self, idx: usize) -> bool {
        [
            self.customer_id,
            self.recency,
            self.frequency,
            self.monetary,
            self.rfm_segment,
            self.clv_predicted,
            self.clv_segment,
            self.cluster,
        ]
        .contains(&idx)
    }

    fn parse<S: AsRef<str>>(&self, row: usize, cells: &[S]) -> Result<CustomerRecord, LoadError> {
        let cell = |idx: usize| cells.get(idx).map(|c| c.as_ref().trim()).unwrap_or("");

        let id = cell(self.customer_id);
        if id.is_empty() {
            return Err(invalid(row, COL_CUSTOMER_ID, id, "customer id is empty"));
        }

        let mut extra = BTreeMap::new();
        for (idx, name) in self.columns.iter().enumerate() {
            if self.is_core(idx) {
                continue;
            }
            let value = cells.get(idx).map(|c| c.as_ref()).unwrap_or("");
            extra.insert(name.clone(), value.to_string());
        }

        Ok(CustomerRecord {
            customer_id: CustomerId::new(id),
            recency: parse_non_negative(row, COL_RECENCY, cell(self.recency))?,
            frequency: parse_whole(row, COL_FREQUENCY, cell(self.frequency))?
                .try_into()
                .map_err(|_| {
                    invalid(row, COL_FREQUENCY, cell(self.frequency), "must not be negative")
                })?,
            monetary: parse_non_negative(row, COL_MONETARY, cell(self.monetary))?,
            rfm_segment: cell(self.rfm_segment).to_string(),
            clv_predicted: parse_finite(row, COL_CLV_PREDICTED, cell(self.clv_predicted))?,
            clv_segment: cell(self.clv_segment).to_string(),
            cluster_id: parse_whole(row, COL_CLUSTER, cell(self.cluster))?,
            extra,
        })
    }
}

fn invalid(row: usize, column: &'static str, value: &str, reason: &'static str) -> LoadError {
    LoadError::InvalidValue {
        row,
        column,
        value: value.to_string(),
        reason,
    }
}

fn parse_finite(row: usize, column: &'static str, s: &str) -> Result<f64, LoadError> {
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(invalid(row, column, s, "expected a finite number")),
    }
}

fn parse_non_negative(row: usize, column: &'static str, s: &str) -> Result<f64, LoadError> {
    let v = parse_finite(row, column, s)?;
    if v < 0.0 {
        return Err(invalid(row, column, s, "must not be negative"));
    }
    Ok(v)
}

/// Integers may arrive as `3` or, from float-typed sources, as `3.0`.
fn parse_whole(row: usize, column: &'static str, s: &str) -> Result<i64, LoadError> {
    if let Ok(i) = s.parse::<i64>() {
        return Ok(i);
    }
    match s.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(invalid(row, column, s, "expected a whole number")),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<CustomerTable, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::Reader::from_reader(file);
    let headers: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.to_string())
        .collect();
    let parser = RowParser::new(headers)?;

    let mut records = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let cells: Vec<&str> = record.iter().collect();
        records.push(parser.parse(row_no, &cells)?);
    }

    CustomerTable::with_columns(parser.columns, records)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
/// Columns are taken in order of first appearance.
fn load_json(path: &Path) -> Result<CustomerTable, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows: Vec<Map<String, JsonValue>> =
        serde_json::from_str(&text).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }
    let parser = RowParser::new(columns.clone())?;

    let mut records = Vec::with_capacity(rows.len());
    for (row_no, row) in rows.iter().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .map(|key| row.get(key).map(json_to_cell).unwrap_or_default())
            .collect();
        records.push(parser.parse(row_no, &cells)?);
    }

    CustomerTable::with_columns(parser.columns, records)
}

fn json_to_cell(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<CustomerTable, LoadError> {
    let parquet_err = |source| LoadError::Parquet {
        path: path.to_path_buf(),
        source,
    };
    let arrow_err = |source| LoadError::Arrow {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).map_err(parquet_err)?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let parser = RowParser::new(columns)?;
    let reader = builder.build().map_err(parquet_err)?;

    let mut records = Vec::new();
    let mut row_no = 0;
    for batch_result in reader {
        let batch = batch_result.map_err(arrow_err)?;
        for row in 0..batch.num_rows() {
            let cells = batch
                .columns()
                .iter()
                .map(|col| arrow_cell(col.as_ref(), row))
                .collect::<Result<Vec<String>, _>>()
                .map_err(arrow_err)?;
            records.push(parser.parse(row_no, &cells)?);
            row_no += 1;
        }
    }

    CustomerTable::with_columns(parser.columns, records)
}

/// Render one Arrow cell as text for the row parser. Nulls become empty.
fn arrow_cell(col: &dyn Array, row: usize) -> Result<String, ArrowError> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    match col.data_type() {
        DataType::Utf8 => Ok(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        // Shortest round-trip text, so exported values match the source.
        DataType::Float64 => Ok(col.as_primitive::<Float64Type>().value(row).to_string()),
        DataType::Float32 => Ok(col.as_primitive::<Float32Type>().value(row).to_string()),
        _ => array_value_to_string(col, row),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::{Builder, NamedTempFile};

    const HEADER: &str =
        "CustomerID,Recency,Frequency,Monetary,Segment,CLV_Predictive,CLV_Segment,KMeans_Cluster,AOV";

    fn temp_with(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        write!(file, "{content}").unwrap();
        file
    }

    #[test]
    fn test_load_csv_with_extra_columns() {
        let file = temp_with(
            ".csv",
            &format!(
                "{HEADER}\n\
                 12346,325,1,77183.6,Lost,0.0,Bronze,2,77183.6\n\
                 12347,2,7,4310.0,Champions,5120.75,Diamond,1,615.71\n"
            ),
        );
        let table = load_customers(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns.last().map(String::as_str), Some("AOV"));
        let second = &table.records[1];
        assert_eq!(second.customer_id.as_str(), "12347");
        assert_eq!(second.frequency, 7);
        assert_eq!(second.clv_predicted, 5120.75);
        assert_eq!(second.extra.get("AOV").map(String::as_str), Some("615.71"));
        assert!(table.rfm_segments.contains("Lost"));
        assert_eq!(table.cluster_ids.len(), 2);
    }

    #[test]
    fn test_header_names_are_trimmed() {
        let file = temp_with(
            ".csv",
            "CustomerID, Recency, Frequency, Monetary, Segment, CLV_Predictive, CLV_Segment, KMeans_Cluster, AOV \n\
             1,5,2,100,Lost,50,Gold,0,50\n",
        );
        let table = load_customers(file.path()).unwrap();

        assert_eq!(table.columns[1], "Recency");
        assert_eq!(table.columns.last().map(String::as_str), Some("AOV"));
        assert_eq!(table.records[0].extra.get("AOV").map(String::as_str), Some("50"));
    }

    #[test]
    fn test_load_csv_accepts_float_typed_integers() {
        let file = temp_with(
            ".csv",
            &format!("{HEADER}\n1,3,4.0,10,Loyal,20,Gold,2.0,\n"),
        );
        let table = load_customers(file.path()).unwrap();
        assert_eq!(table.records[0].frequency, 4);
        assert_eq!(table.records[0].cluster_id, 2);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let file = temp_with(".csv", "CustomerID,Recency\n1,2\n");
        let err = load_customers(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn(col) if col == "Frequency"));
    }

    #[test]
    fn test_negative_recency_is_rejected() {
        let file = temp_with(
            ".csv",
            &format!("{HEADER}\n1,-3,4,10,Loyal,20,Gold,2,\n"),
        );
        let err = load_customers(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { row: 0, column: "Recency", .. }
        ));
    }

    #[test]
    fn test_non_numeric_clv_is_rejected() {
        let file = temp_with(
            ".csv",
            &format!("{HEADER}\n1,3,4,10,Loyal,n/a,Gold,2,\n"),
        );
        let err = load_customers(file.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::InvalidValue { column: "CLV_Predictive", .. }
        ));
    }

    #[test]
    fn test_duplicate_customer_is_rejected() {
        let file = temp_with(
            ".csv",
            &format!("{HEADER}\n1,3,4,10,Loyal,20,Gold,2,\n1,5,1,3,Lost,2,Bronze,0,\n"),
        );
        assert!(matches!(
            load_customers(file.path()).unwrap_err(),
            LoadError::DuplicateCustomer(_)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_customers(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let file = temp_with(".xlsx", "");
        assert!(matches!(
            load_customers(file.path()).unwrap_err(),
            LoadError::UnsupportedFormat(ext) if ext == "xlsx"
        ));
    }

    #[test]
    fn test_load_json_records() {
        let file = temp_with(
            ".json",
            r#"[
                {"CustomerID": 7, "Recency": 12, "Frequency": 3, "Monetary": 250.5,
                 "Segment": "Loyal", "CLV_Predictive": 410.25, "CLV_Segment": "Silver",
                 "KMeans_Cluster": 3, "Cluster_Name": "Regulars"},
                {"CustomerID": 8, "Recency": 40, "Frequency": 1, "Monetary": 20,
                 "Segment": null, "CLV_Predictive": 15, "CLV_Segment": "Bronze",
                 "KMeans_Cluster": 0}
            ]"#,
        );
        let table = load_customers(file.path()).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].customer_id.as_str(), "7");
        assert_eq!(
            table.records[0].extra.get("Cluster_Name").map(String::as_str),
            Some("Regulars")
        );
        // Null categories load as the empty label and are not offered as values.
        assert_eq!(table.records[1].rfm_segment, "");
        assert_eq!(table.rfm_segments.len(), 1);
    }

    #[test]
    fn test_load_parquet_flat_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("CustomerID", DataType::Int64, false),
            Field::new("Recency", DataType::Float64, false),
            Field::new("Frequency", DataType::Int64, false),
            Field::new("Monetary", DataType::Float64, false),
            Field::new("Segment", DataType::Utf8, true),
            Field::new("CLV_Predictive", DataType::Float64, false),
            Field::new("CLV_Segment", DataType::Utf8, false),
            Field::new("KMeans_Cluster", DataType::Int64, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![1, 2])),
                Arc::new(Float64Array::from(vec![5.0, 90.0])),
                Arc::new(Int64Array::from(vec![8, 1])),
                Arc::new(Float64Array::from(vec![980.5, 12.0])),
                Arc::new(StringArray::from(vec![Some("Champions"), None])),
                Arc::new(Float64Array::from(vec![1200.25, 4.5])),
                Arc::new(StringArray::from(vec!["Diamond", "Bronze"])),
                Arc::new(Int64Array::from(vec![1, 0])),
            ],
        )
        .unwrap();

        let file = Builder::new().suffix(".parquet").tempfile().unwrap();
        let mut writer = ArrowWriter::try_new(file.reopen().unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_customers(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0].clv_predicted, 1200.25);
        assert_eq!(table.records[0].frequency, 8);
        assert_eq!(table.records[1].rfm_segment, "");
        assert_eq!(table.records[1].clv_segment, "Bronze");
    }

    #[test]
    fn test_load_statistics() {
        let file = temp_with(
            ".json",
            r#"{"total_customers": 3, "total_revenue": 300.0, "avg_monetary": 100.0,
                "segment_distribution": {"Champions": 2, "Lost": 1}, "generated_at": "x"}"#,
        );
        let stats = load_statistics(file.path()).unwrap();
        assert_eq!(stats.total_customers, 3);
        assert_eq!(stats.segment_distribution[0], ("Champions".to_string(), 2));
    }

    #[test]
    fn test_statistics_missing_key_is_json_error() {
        let file = temp_with(".json", r#"{"total_customers": 3}"#);
        assert!(matches!(
            load_statistics(file.path()).unwrap_err(),
            LoadError::Json { .. }
        ));
    }
}
