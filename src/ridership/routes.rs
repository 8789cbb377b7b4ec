//! Static route tables: rapid/local aliases, rail line names and the
//! temporary shuttles that are never analysed.

use anyhow::{Result, bail};
use std::collections::{HashMap, HashSet};

/// Rapid and local variants merged under one id. Metro folded several rapids
/// into their locals in December 2020, so only the combined line has a
/// comparable baseline.
const LA_METRO_ALIASES: &[(&str, &[&str])] = &[
    ("28/728", &["28", "728"]),
    ("105/705", &["105", "705"]),
    ("210/710", &["210", "710"]),
    ("40/740", &["40", "740"]),
    ("45/745", &["45", "745"]),
    ("251/751", &["251", "751"]),
    ("60/760", &["60", "760"]),
    ("260/762", &["260", "762"]),
];

const LA_METRO_RAIL: &[(&str, &str)] = &[
    ("801", "Blue"),
    ("802", "Red"),
    ("803", "Green"),
    ("804", "Gold"),
    ("805", "Purple"),
    ("806", "Expo"),
];

/// Bus bridges run during the 2019 Blue Line closure.
const LA_METRO_SHUTTLES: &[&str] = &["856", "860", "861", "862", "863", "864"];

/// Raw route id to canonical route id.
#[derive(Debug, Clone, Default)]
pub struct RouteAliases {
    canonical: HashMap<String, String>,
}

impl RouteAliases {
    /// Builds the lookup from `(canonical, members)` groups.
    ///
    /// # Errors
    ///
    /// Fails if a raw id is listed in more than one group.
    pub fn new<'a, I>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
    {
        let mut canonical: HashMap<String, String> = HashMap::new();
        for (group, members) in groups {
            for member in members {
                if let Some(previous) = canonical.insert(member.to_string(), group.to_string()) {
                    if previous != group {
                        bail!("route '{member}' is in both alias groups '{previous}' and '{group}'");
                    }
                }
            }
        }
        Ok(Self { canonical })
    }

    /// Returns the group id for `line`, or `line` itself when ungrouped.
    pub fn canonicalize<'a>(&'a self, line: &'a str) -> &'a str {
        self.canonical.get(line).map(String::as_str).unwrap_or(line)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RailLineMap(HashMap<String, String>);

impl RailLineMap {
    pub fn name(&self, line: &str) -> Option<&str> {
        self.0.get(line).map(String::as_str)
    }

    pub fn contains(&self, line: &str) -> bool {
        self.0.contains_key(line)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for RailLineMap {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a str)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(id, name)| (id.to_string(), name.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExcludedShuttles(HashSet<String>);

impl ExcludedShuttles {
    pub fn contains(&self, line: &str) -> bool {
        self.0.contains(line)
    }
}

impl<'a> FromIterator<&'a str> for ExcludedShuttles {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

/// The three route tables the transformer consults.
#[derive(Debug, Clone, Default)]
pub struct RouteCatalog {
    pub aliases: RouteAliases,
    pub rail_lines: RailLineMap,
    pub excluded: ExcludedShuttles,
}

impl RouteCatalog {
    pub fn la_metro() -> Result<Self> {
        Ok(Self {
            aliases: RouteAliases::new(LA_METRO_ALIASES.iter().copied())?,
            rail_lines: LA_METRO_RAIL.iter().copied().collect(),
            excluded: LA_METRO_SHUTTLES.iter().copied().collect(),
        })
    }
}
