//! Writing comparison tables as CSV and parquet.

use anyhow::Result;
use arrow::array::{ArrayRef, Date32Array, Float64Array, RecordBatch, StringArray};
use arrow::datatypes::{DataType, Date32Type, Field, Schema};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use super::records::{ComparisonTable, RouteMode};
use crate::output::{write_csv, write_parquet};

/// Fixed output path for a mode and extension; reruns overwrite it.
pub fn output_path(dir: &Path, mode: RouteMode, extension: &str) -> PathBuf {
    dir.join(format!("metro-{}-covid-recovery.{extension}", mode.as_str()))
}

pub fn to_record_batch(table: &ComparisonTable) -> Result<RecordBatch> {
    let columns = table.columns();
    let mut fields = vec![
        Field::new(&columns[0], DataType::Date32, false),
        Field::new(&columns[1], DataType::Utf8, false),
        Field::new(&columns[2], DataType::Float64, false),
    ];
    let mut arrays: Vec<ArrayRef> = vec![
        Arc::new(Date32Array::from_iter_values(
            table.rows.iter().map(|r| Date32Type::from_naive_date(r.date)),
        )),
        Arc::new(StringArray::from_iter_values(
            table.rows.iter().map(|r| r.line.as_str()),
        )),
        Arc::new(Float64Array::from_iter_values(
            table.rows.iter().map(|r| r.ridership),
        )),
    ];

    let mut next = 3;
    if table.mode == RouteMode::Rail {
        fields.push(Field::new(&columns[next], DataType::Utf8, true));
        arrays.push(Arc::new(StringArray::from_iter(
            table.rows.iter().map(|r| r.line_name.as_deref()),
        )));
        next += 1;
    }

    for (idx, name) in columns[next..].iter().enumerate() {
        fields.push(Field::new(name, DataType::Float64, false));
        arrays.push(Arc::new(Float64Array::from_iter_values(
            table.rows.iter().map(|r| r.baselines[idx]),
        )));
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

/// Always keeps a fractional part, so whole counts read `30.0` rather than `30`.
fn csv_float(value: f64) -> String {
    format!("{value:?}")
}

fn csv_rows(table: &ComparisonTable) -> impl Iterator<Item = Vec<String>> + '_ {
    table.rows.iter().map(move |row| {
        let mut record = vec![
            row.date.format("%Y-%m-%d").to_string(),
            row.line.clone(),
            csv_float(row.ridership),
        ];
        if table.mode == RouteMode::Rail {
            record.push(row.line_name.clone().unwrap_or_default());
        }
        record.extend(row.baselines.iter().copied().map(csv_float));
        record
    })
}

/// Writes the CSV and parquet renditions of `table` into `dir`.
pub fn write_table(dir: &Path, table: &ComparisonTable) -> Result<()> {
    let csv_path = output_path(dir, table.mode, "csv");
    write_csv(&csv_path, &table.columns(), csv_rows(table))?;

    let parquet_path = output_path(dir, table.mode, "parquet");
    write_parquet(&parquet_path, &to_record_batch(table)?)?;

    info!(
        mode = table.mode.as_str(),
        rows = table.rows.len(),
        csv = %csv_path.display(),
        parquet = %parquet_path.display(),
        "Wrote comparison table"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ridership::records::ComparisonRow;
    use arrow::array::Array;
    use chrono::NaiveDate;

    fn rail_table() -> ComparisonTable {
        ComparisonTable {
            mode: RouteMode::Rail,
            baseline_years: vec![2019, 2018],
            rows: vec![ComparisonRow {
                date: NaiveDate::from_ymd_opt(2020, 4, 1).unwrap(),
                line: "801".to_string(),
                ridership: 1500.0,
                line_name: Some("Blue".to_string()),
                baselines: vec![3000.0, 2800.5],
            }],
        }
    }

    #[test]
    fn test_output_paths_are_fixed() {
        let dir = Path::new("out");
        assert_eq!(
            output_path(dir, RouteMode::Bus, "csv"),
            PathBuf::from("out/metro-bus-covid-recovery.csv")
        );
        assert_eq!(
            output_path(dir, RouteMode::Rail, "parquet"),
            PathBuf::from("out/metro-rail-covid-recovery.parquet")
        );
    }

    #[test]
    fn test_rail_record_batch_schema() {
        let batch = to_record_batch(&rail_table()).unwrap();
        let names: Vec<_> = batch
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();
        assert_eq!(
            names,
            vec!["date", "line", "ridership", "line_name", "ridership_2019", "ridership_2018"]
        );
        assert_eq!(batch.num_rows(), 1);

        let dates = batch
            .column(0)
            .as_any()
            .downcast_ref::<Date32Array>()
            .unwrap();
        assert_eq!(dates.value_as_date(0), NaiveDate::from_ymd_opt(2020, 4, 1));
    }

    #[test]
    fn test_csv_rows_formatting() {
        let rows: Vec<_> = csv_rows(&rail_table()).collect();
        assert_eq!(rows, vec![vec!["2020-04-01", "801", "1500.0", "Blue", "3000.0", "2800.5"]]);
    }
}
