//! Historical baselines the current series is compared against.

use anyhow::{Result, bail};
use std::collections::HashMap;

use super::records::MonthlyTotal;

/// Which years serve as baselines.
///
/// The current series starts after the latest of them. The default is the
/// pre-pandemic pair 2019 and 2018.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaselineWindow {
    years: Vec<i32>,
}

impl BaselineWindow {
    pub fn new(years: Vec<i32>) -> Result<Self> {
        if years.is_empty() {
            bail!("at least one baseline year is required");
        }
        for (idx, year) in years.iter().enumerate() {
            if years[..idx].contains(year) {
                bail!("baseline year {year} given twice");
            }
        }
        Ok(Self { years })
    }

    /// Baseline years in output column order.
    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Rows from years after this one form the current series.
    pub fn latest(&self) -> i32 {
        self.years.iter().copied().max().unwrap_or_default()
    }
}

impl Default for BaselineWindow {
    fn default() -> Self {
        Self {
            years: vec![2019, 2018],
        }
    }
}

/// Mean monthly weekday ridership per line for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearlyBaseline {
    pub year: i32,
    means: HashMap<String, f64>,
}

impl YearlyBaseline {
    pub fn from_totals(totals: &[MonthlyTotal], year: i32) -> Self {
        let mut sums: HashMap<&str, (f64, usize)> = HashMap::new();
        for total in totals.iter().filter(|t| t.year == year) {
            let entry = sums.entry(total.line.as_str()).or_default();
            entry.0 += total.ridership;
            entry.1 += 1;
        }

        let means = sums
            .into_iter()
            .map(|(line, (sum, months))| (line.to_string(), sum / months as f64))
            .collect();
        Self { year, means }
    }

    pub fn get(&self, line: &str) -> Option<f64> {
        self.means.get(line).copied()
    }

    pub fn len(&self) -> usize {
        self.means.len()
    }

    pub fn is_empty(&self) -> bool {
        self.means.is_empty()
    }

    /// Lines ordered by descending mean ridership.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<_> = self.means.iter().map(|(l, m)| (l.as_str(), *m)).collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }
}
