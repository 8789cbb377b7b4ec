//! Daily snapshot files.
//!
//! One parquet file per Pacific-time calendar day holds every trip seen so
//! far that day, one row per `trip_id`. Repeated polls on the same day read
//! the file, merge the new records in and overwrite it.

use anyhow::{Context, Result};
use arrow::datatypes::{DataType, Field, FieldRef, TimeUnit};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::Los_Angeles;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::TripUpdateRecord;
use crate::output::{read_parquet, write_parquet};

const COLUMNS: [&str; 3] = ["trip_id", "schedule_relationship", "timestamp"];

/// The calendar date in Los Angeles at `now`, which names the snapshot.
pub fn pacific_today(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Los_Angeles).date_naive()
}

pub fn snapshot_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("trip-updates-{}.parquet", date.format("%Y-%m-%d")))
}

fn snapshot_fields() -> Vec<FieldRef> {
    vec![
        Arc::new(Field::new(COLUMNS[0], DataType::Utf8, false)),
        Arc::new(Field::new(COLUMNS[1], DataType::Utf8, false)),
        Arc::new(Field::new(
            COLUMNS[2],
            DataType::Timestamp(TimeUnit::Millisecond, Some("UTC".into())),
            true,
        )),
    ]
}

pub fn read_snapshot(path: &Path) -> Result<Vec<TripUpdateRecord>> {
    let mut records = Vec::new();
    for batch in read_parquet(path, &COLUMNS)? {
        let rows: Vec<TripUpdateRecord> = serde_arrow::from_record_batch(&batch)
            .with_context(|| format!("malformed snapshot {}", path.display()))?;
        records.extend(rows);
    }
    Ok(records)
}

pub fn write_snapshot(path: &Path, records: &[TripUpdateRecord]) -> Result<()> {
    let batch = serde_arrow::to_record_batch(&snapshot_fields(), &records)?;
    write_parquet(path, &batch)
}

/// Appends `updates` after `existing` and keeps the last record for each
/// `trip_id`.
///
/// Retained records stay at the position of their last occurrence, so an
/// unchanged trip keeps its place and a replaced one moves to where its
/// newer record landed.
pub fn merge_snapshot(
    existing: Vec<TripUpdateRecord>,
    updates: Vec<TripUpdateRecord>,
) -> Vec<TripUpdateRecord> {
    let combined: Vec<_> = existing.into_iter().chain(updates).collect();

    let keep: Vec<bool> = {
        let mut last_seen: HashMap<&str, usize> = HashMap::with_capacity(combined.len());
        for (idx, record) in combined.iter().enumerate() {
            last_seen.insert(record.trip_id.as_str(), idx);
        }
        combined
            .iter()
            .enumerate()
            .map(|(idx, record)| last_seen.get(record.trip_id.as_str()) == Some(&idx))
            .collect()
    };

    combined
        .into_iter()
        .zip(keep)
        .filter_map(|(record, keep)| keep.then_some(record))
        .collect()
}
