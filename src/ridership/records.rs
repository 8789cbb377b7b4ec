//! Row types flowing through the ridership transformer.

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;

/// Columns every input file must carry, by their source names.
pub const REQUIRED_COLUMNS: [&str; 5] = ["year", "month", "line", "Day Type", RIDERSHIP_COLUMN];

/// Source name of the ridership count.
pub const RIDERSHIP_COLUMN: &str = "Estimated Ridership";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayType {
    Weekday,
    Saturday,
    Sunday,
}

impl FromStr for DayType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Weekday" => Ok(Self::Weekday),
            "Saturday" => Ok(Self::Saturday),
            "Sunday" => Ok(Self::Sunday),
            other => Err(anyhow!("unknown day type '{other}'")),
        }
    }
}

/// A row as stored in the source file; the ridership count is renamed here.
#[derive(Debug, Deserialize)]
pub(crate) struct RawRidershipRow {
    year: String,
    month: String,
    line: String,
    #[serde(rename = "Day Type")]
    day_type: String,
    #[serde(rename = "Estimated Ridership")]
    ridership: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RidershipRecord {
    pub year: String,
    pub month: String,
    pub line: String,
    pub day_type: DayType,
    pub ridership: f64,
}

impl TryFrom<RawRidershipRow> for RidershipRecord {
    type Error = anyhow::Error;

    fn try_from(raw: RawRidershipRow) -> Result<Self> {
        let day_type = raw
            .day_type
            .parse()
            .with_context(|| format!("line {} {}-{}", raw.line, raw.year, raw.month))?;
        Ok(Self {
            year: raw.year,
            month: raw.month,
            line: raw.line,
            day_type,
            // a missing count contributes nothing to the monthly sum
            ridership: raw.ridership.unwrap_or_default(),
        })
    }
}

/// Weekday ridership summed per (year, month, canonical line).
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: u32,
    pub line: String,
    pub ridership: f64,
}

impl MonthlyTotal {
    /// First day of the month this total covers.
    pub fn date(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .ok_or_else(|| anyhow!("invalid month {}-{}", self.year, self.month))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteMode {
    Rail,
    Bus,
}

impl RouteMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rail => "rail",
            Self::Bus => "bus",
        }
    }
}

/// One output row: a month of current ridership next to each baseline mean.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub date: NaiveDate,
    pub line: String,
    pub ridership: f64,
    /// Set for rail rows only.
    pub line_name: Option<String>,
    /// One value per baseline year, in [`ComparisonTable::baseline_years`] order.
    pub baselines: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonTable {
    pub mode: RouteMode,
    pub baseline_years: Vec<i32>,
    pub rows: Vec<ComparisonRow>,
}

impl ComparisonTable {
    /// Output column names, in file order.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec!["date".to_string(), "line".to_string(), "ridership".to_string()];
        if self.mode == RouteMode::Rail {
            columns.push("line_name".to_string());
        }
        columns.extend(self.baseline_years.iter().map(|y| format!("ridership_{y}")));
        columns
    }
}
