//! File persistence shared by both pipelines.
//!
//! Parquet files are written with Snappy compression through
//! [`ArrowWriter`]; CSV tables go through the `csv` crate.

use anyhow::{Context, Result, bail};
use arrow::array::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use tracing::debug;

/// Writes `batch` to `path`, replacing any existing file.
pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    debug!(path = %path.display(), rows = batch.num_rows(), "Writing parquet file");

    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;

    Ok(())
}

/// Reads the named columns of a parquet file.
///
/// Fails before decoding any data if one of `columns` is absent, so a
/// malformed input is reported by column name rather than as a deserialization
/// error deep inside a batch.
pub fn read_parquet(path: &Path, columns: &[&str]) -> Result<Vec<RecordBatch>> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("{} is not a parquet file", path.display()))?;

    let schema = builder.schema().clone();
    for column in columns {
        if schema.field_with_name(column).is_err() {
            bail!("{} is missing required column '{column}'", path.display());
        }
    }

    let mask = ProjectionMask::columns(builder.parquet_schema(), columns.iter().copied());
    let reader = builder.with_projection(mask).build()?;

    let batches = reader.collect::<Result<Vec<_>, _>>()?;
    debug!(
        path = %path.display(),
        batches = batches.len(),
        rows = batches.iter().map(RecordBatch::num_rows).sum::<usize>(),
        "Read parquet file"
    );
    Ok(batches)
}

/// Writes a header row followed by `rows`, replacing any existing file.
pub fn write_csv<I, R>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = String>,
{
    debug!(path = %path.display(), "Writing CSV file");

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::env;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn temp_path(name: &str) -> PathBuf {
        env::temp_dir().join(name)
    }

    fn sample_batch() -> RecordBatch {
        let schema = Schema::new(vec![
            Field::new("line", DataType::Utf8, false),
            Field::new("ridership", DataType::Float64, false),
        ]);
        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(vec!["801", "20"])),
                Arc::new(Float64Array::from(vec![10.0, 2.5])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_parquet_write_then_read_projected() {
        let path = temp_path("metro_ridership_test_projection.parquet");
        let _ = fs::remove_file(&path);

        write_parquet(&path, &sample_batch()).unwrap();
        let batches = read_parquet(&path, &["line"]).unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_columns(), 1);
        assert_eq!(batches[0].num_rows(), 2);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_read_parquet_missing_column_names_it() {
        let path = temp_path("metro_ridership_test_missing_column.parquet");
        let _ = fs::remove_file(&path);

        write_parquet(&path, &sample_batch()).unwrap();
        let err = read_parquet(&path, &["line", "Day Type"]).unwrap_err();
        assert!(err.to_string().contains("Day Type"));

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_write_csv_overwrites() {
        let path = temp_path("metro_ridership_test_overwrite.csv");
        let _ = fs::remove_file(&path);

        let header = vec!["line".to_string(), "ridership".to_string()];
        write_csv(&path, &header, vec![vec!["1".to_string(), "2".to_string()]]).unwrap();
        write_csv(&path, &header, vec![vec!["3".to_string(), "4".to_string()]]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines, vec!["line,ridership", "3,4"]);

        fs::remove_file(&path).unwrap();
    }
}
