//! Loading ridership records from parquet or CSV.

use anyhow::{Context, Result, bail};
use arrow::array::RecordBatch;
use arrow::compute::cast;
use arrow::datatypes::{DataType, FieldRef, Schema};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use super::records::{REQUIRED_COLUMNS, RIDERSHIP_COLUMN, RawRidershipRow, RidershipRecord};
use crate::output::read_parquet;

/// Reads every record in `path`.
///
/// Files ending in `.csv` are read as CSV; anything else as parquet.
#[tracing::instrument(skip(path), fields(path = %path.display()))]
pub fn load_records(path: &Path) -> Result<Vec<RidershipRecord>> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

    let raw = if is_csv {
        read_csv_rows(path)?
    } else {
        read_parquet_rows(path)?
    };

    let records = raw
        .into_iter()
        .map(RidershipRecord::try_from)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid record in {}", path.display()))?;

    info!(records = records.len(), "Loaded ridership records");
    Ok(records)
}

/// Casts the ridership count to Float64 and the other columns to Utf8.
///
/// Extracts differ in how they type these columns (integer counts, numeric
/// years, dictionary-encoded strings); only their presence is required.
fn normalize_columns(batch: RecordBatch) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<FieldRef> = schema.fields().iter().cloned().collect();
    let mut columns = batch.columns().to_vec();

    for (idx, field) in schema.fields().iter().enumerate() {
        let target = if field.name() == RIDERSHIP_COLUMN {
            DataType::Float64
        } else {
            DataType::Utf8
        };
        if field.data_type() == &target {
            continue;
        }

        debug!(column = %field.name(), from = %field.data_type(), to = %target, "Casting column");
        columns[idx] = cast(&columns[idx], &target)
            .with_context(|| format!("column '{}' cannot be read as {target}", field.name()))?;
        fields[idx] = Arc::new(field.as_ref().clone().with_data_type(target));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn read_parquet_rows(path: &Path) -> Result<Vec<RawRidershipRow>> {
    let mut rows = Vec::new();
    for batch in read_parquet(path, &REQUIRED_COLUMNS)? {
        let batch = normalize_columns(batch)?;
        let batch_rows: Vec<RawRidershipRow> = serde_arrow::from_record_batch(&batch)
            .with_context(|| format!("unexpected column types in {}", path.display()))?;
        rows.extend(batch_rows);
    }
    Ok(rows)
}

fn read_csv_rows(path: &Path) -> Result<Vec<RawRidershipRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            bail!("{} is missing required column '{column}'", path.display());
        }
    }

    let rows = reader
        .deserialize()
        .collect::<Result<Vec<RawRidershipRow>, _>>()
        .with_context(|| format!("malformed row in {}", path.display()))?;
    Ok(rows)
}
