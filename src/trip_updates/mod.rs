//! Real-time trip-update polling.
//!
//! A poll decodes one GTFS-RT feed, pulls a [`TripUpdateRecord`] out of every
//! entity that carries a trip update and folds them into the day's snapshot
//! file (see [`snapshot`]).

pub mod poller;
pub mod snapshot;

use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::gtfs_rt::FeedMessage;

/// Relation of a trip to the static schedule.
///
/// Only the four original GTFS-RT values are recognised; feeds using the
/// newer values (`REPLACEMENT`, `DUPLICATED`, ...) are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum ScheduleRelationship {
    Scheduled,
    Added,
    Unscheduled,
    Canceled,
}

impl ScheduleRelationship {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Added => "added",
            Self::Unscheduled => "unscheduled",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ScheduleRelationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleRelationship {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "added" => Ok(Self::Added),
            "unscheduled" => Ok(Self::Unscheduled),
            "canceled" => Ok(Self::Canceled),
            other => Err(anyhow!("unknown schedule relationship '{other}'")),
        }
    }
}

impl TryFrom<String> for ScheduleRelationship {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ScheduleRelationship> for String {
    fn from(value: ScheduleRelationship) -> Self {
        value.as_str().to_string()
    }
}

/// Maps the protobuf wire value of `TripDescriptor.schedule_relationship`.
impl TryFrom<i32> for ScheduleRelationship {
    type Error = anyhow::Error;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Scheduled),
            1 => Ok(Self::Added),
            2 => Ok(Self::Unscheduled),
            3 => Ok(Self::Canceled),
            other => Err(anyhow!("unsupported schedule relationship value {other}")),
        }
    }
}

/// One row of a daily snapshot, keyed by `trip_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripUpdateRecord {
    pub trip_id: String,
    pub schedule_relationship: ScheduleRelationship,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Extracts a record from every entity in `feed` that has a trip update.
///
/// Missing `trip_id` and `schedule_relationship` take their protobuf
/// defaults (empty string, `SCHEDULED`); a missing timestamp stays `None`.
pub fn extract_trip_updates(feed: &FeedMessage) -> Result<Vec<TripUpdateRecord>> {
    let mut updates = Vec::new();

    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };
        let trip = &trip_update.trip;

        let schedule_relationship =
            ScheduleRelationship::try_from(trip.schedule_relationship.unwrap_or_default())
                .map_err(|e| e.context(format!("entity '{}'", entity.id)))?;

        let timestamp = match trip_update.timestamp {
            None => None,
            Some(secs) => {
                let parsed = i64::try_from(secs)
                    .ok()
                    .and_then(|secs| DateTime::from_timestamp(secs, 0));
                match parsed {
                    Some(ts) => Some(ts),
                    None => bail!("entity '{}' has out-of-range timestamp {secs}", entity.id),
                }
            }
        };

        updates.push(TripUpdateRecord {
            trip_id: trip.trip_id.clone().unwrap_or_default(),
            schedule_relationship,
            timestamp,
        });
    }

    debug!(
        entities = feed.entity.len(),
        trip_updates = updates.len(),
        "Extracted trip updates"
    );
    Ok(updates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, TripDescriptor, TripUpdate, VehiclePosition};

    fn trip_entity(id: &str, trip_id: Option<&str>, rel: Option<i32>, ts: Option<u64>) -> FeedEntity {
        FeedEntity {
            id: id.to_string(),
            trip_update: Some(TripUpdate {
                trip: TripDescriptor {
                    trip_id: trip_id.map(str::to_string),
                    schedule_relationship: rel,
                    ..Default::default()
                },
                timestamp: ts,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn feed(entity: Vec<FeedEntity>) -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                ..Default::default()
            },
            entity,
        }
    }

    #[test]
    fn test_extract_skips_non_trip_entities() {
        let vehicle = FeedEntity {
            id: "v1".to_string(),
            vehicle: Some(VehiclePosition::default()),
            ..Default::default()
        };
        let feed = feed(vec![vehicle, trip_entity("t1", Some("A"), Some(1), Some(100))]);

        let updates = extract_trip_updates(&feed).unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].trip_id, "A");
        assert_eq!(updates[0].schedule_relationship, ScheduleRelationship::Added);
        assert_eq!(updates[0].timestamp, DateTime::from_timestamp(100, 0));
    }

    #[test]
    fn test_extract_applies_protobuf_defaults() {
        let feed = feed(vec![trip_entity("t1", None, None, None)]);

        let updates = extract_trip_updates(&feed).unwrap();
        assert_eq!(updates[0].trip_id, "");
        assert_eq!(updates[0].schedule_relationship, ScheduleRelationship::Scheduled);
        assert_eq!(updates[0].timestamp, None);
    }

    #[test]
    fn test_extract_rejects_unmapped_relationship() {
        // 5 is REPLACEMENT, outside the fixed mapping
        let feed = feed(vec![trip_entity("t1", Some("A"), Some(5), None)]);
        let err = extract_trip_updates(&feed).unwrap_err();
        assert!(format!("{err:#}").contains("entity 't1'"));
    }

    #[test]
    fn test_relationship_string_round_trip_names() {
        for rel in [
            ScheduleRelationship::Scheduled,
            ScheduleRelationship::Added,
            ScheduleRelationship::Unscheduled,
            ScheduleRelationship::Canceled,
        ] {
            assert_eq!(rel.as_str().parse::<ScheduleRelationship>().unwrap(), rel);
        }
        assert!("cancelled".parse::<ScheduleRelationship>().is_err());
    }
}
