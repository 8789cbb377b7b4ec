//! Historical ridership comparison.
//!
//! Weekday ridership is summed into monthly totals per canonical line,
//! averaged per baseline year, and every month after the baseline window is
//! set beside those averages. Rail and bus lines end up in separate tables.

pub mod baseline;
pub mod reader;
pub mod records;
pub mod routes;
pub mod writer;

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use baseline::{BaselineWindow, YearlyBaseline};
use records::{ComparisonRow, ComparisonTable, DayType, MonthlyTotal, RidershipRecord, RouteMode};
use routes::{RouteAliases, RouteCatalog};

/// Weekday service only.
pub fn weekday_only(records: &[RidershipRecord]) -> impl Iterator<Item = &RidershipRecord> {
    records.iter().filter(|r| r.day_type == DayType::Weekday)
}

/// Sums ridership per (year, month, canonical line), ordered by that key.
///
/// # Errors
///
/// Fails on a year or month that is not a number.
pub fn monthly_totals<'a, I>(records: I, aliases: &RouteAliases) -> Result<Vec<MonthlyTotal>>
where
    I: IntoIterator<Item = &'a RidershipRecord>,
{
    let mut sums: BTreeMap<(i32, u32, &str), f64> = BTreeMap::new();
    for record in records {
        let year = record
            .year
            .trim()
            .parse::<i32>()
            .with_context(|| format!("invalid year '{}'", record.year))?;
        let month = record
            .month
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid month '{}'", record.month))?;
        let line = aliases.canonicalize(&record.line);
        *sums.entry((year, month, line)).or_default() += record.ridership;
    }

    Ok(sums
        .into_iter()
        .map(|((year, month, line), ridership)| MonthlyTotal {
            year,
            month,
            line: line.to_string(),
            ridership,
        })
        .collect())
}

/// One baseline per window year, in window order.
pub fn yearly_baselines(totals: &[MonthlyTotal], window: &BaselineWindow) -> Vec<YearlyBaseline> {
    window
        .years()
        .iter()
        .map(|&year| {
            let baseline = YearlyBaseline::from_totals(totals, year);
            debug!(
                year,
                lines = baseline.len(),
                top = ?baseline.ranked().first(),
                "Computed yearly baseline"
            );
            baseline
        })
        .collect()
}

/// Monthly totals from years after the baseline window.
pub fn current_series<'a>(
    totals: &'a [MonthlyTotal],
    window: &BaselineWindow,
) -> impl Iterator<Item = &'a MonthlyTotal> {
    let cutoff = window.latest();
    totals.iter().filter(move |t| t.year > cutoff)
}

/// Joins the post-window series against the baselines.
///
/// Excluded shuttles are dropped, rail lines get their name, and a line
/// missing from any baseline is left out of the result entirely.
pub fn compare(
    totals: &[MonthlyTotal],
    catalog: &RouteCatalog,
    window: &BaselineWindow,
) -> Result<(ComparisonTable, ComparisonTable)> {
    let baselines = yearly_baselines(totals, window);

    let mut rail = ComparisonTable {
        mode: RouteMode::Rail,
        baseline_years: window.years().to_vec(),
        rows: Vec::new(),
    };
    let mut bus = ComparisonTable {
        mode: RouteMode::Bus,
        baseline_years: window.years().to_vec(),
        rows: Vec::new(),
    };
    let mut unmatched = 0usize;

    for total in current_series(totals, window) {
        if catalog.excluded.contains(&total.line) {
            continue;
        }

        let Some(values) = baselines
            .iter()
            .map(|b| b.get(&total.line))
            .collect::<Option<Vec<f64>>>()
        else {
            unmatched += 1;
            continue;
        };

        let line_name = catalog.rail_lines.name(&total.line).map(str::to_string);
        let table = if line_name.is_some() { &mut rail } else { &mut bus };
        table.rows.push(ComparisonRow {
            date: total.date()?,
            line: total.line.clone(),
            ridership: total.ridership,
            line_name,
            baselines: values,
        });
    }

    debug!(unmatched, cutoff = window.latest(), "Dropped monthly totals without a full baseline");
    Ok((rail, bus))
}

/// Runs the whole transformer on `input`, writing four files into `output_dir`.
///
/// Every table is built before the first file is written.
#[tracing::instrument(
    skip(input, output_dir, catalog),
    fields(input = %input.display(), output_dir = %output_dir.display())
)]
pub fn run(
    input: &Path,
    output_dir: &Path,
    catalog: &RouteCatalog,
    window: &BaselineWindow,
) -> Result<()> {
    let records = reader::load_records(input)?;
    let totals = monthly_totals(weekday_only(&records), &catalog.aliases)?;
    info!(monthly_totals = totals.len(), "Aggregated weekday ridership");

    let (rail, bus) = compare(&totals, catalog, window)?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;
    writer::write_table(output_dir, &rail)?;
    writer::write_table(output_dir, &bus)?;

    Ok(())
}
