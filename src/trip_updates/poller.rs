//! One-shot poll: snapshot in, feed fetched, snapshot out.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::extract_trip_updates;
use super::snapshot::{merge_snapshot, read_snapshot, snapshot_path, write_snapshot};
use crate::fetch::auth::ApiKey;
use crate::fetch::{BasicClient, HttpClient, load_feed};
use crate::parser::parse_feed;

pub const SWIFTLY_TRIP_UPDATES_URL: &str =
    "https://api.goswift.ly/real-time/lametro/gtfs-rt-trip-updates";
pub const API_KEY_ENV: &str = "SWIFTLY_API_KEY";
pub const DEFAULT_SNAPSHOT_DIR: &str = "trip-updates";

/// Everything a poll needs; `main` fills it from CLI flags and the environment.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Feed URL, or a local file holding a saved feed.
    pub source: String,
    pub api_key: Option<String>,
    pub snapshot_dir: PathBuf,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            source: SWIFTLY_TRIP_UPDATES_URL.to_string(),
            api_key: None,
            snapshot_dir: PathBuf::from(DEFAULT_SNAPSHOT_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSummary {
    pub path: PathBuf,
    pub existing: usize,
    pub fetched: usize,
    pub written: usize,
}

/// Polls once for `today`, choosing the client from the configured credential.
pub async fn run(config: &PollerConfig, today: NaiveDate) -> Result<PollSummary> {
    let path = snapshot_path(&config.snapshot_dir, today);
    let basic = BasicClient::new()?;

    match &config.api_key {
        Some(key) => {
            let client = ApiKey::authorization(basic, key)?;
            poll_once(&client, &config.source, &path).await
        }
        None => {
            warn!(env = API_KEY_ENV, "No API key configured, requesting without credential");
            poll_once(&basic, &config.source, &path).await
        }
    }
}

/// Merges one fetch from `source` into the snapshot at `path`.
///
/// The request and decode both happen before anything is written, so a
/// failure leaves the previous snapshot untouched.
#[tracing::instrument(skip(client), fields(snapshot = %path.display()))]
pub async fn poll_once<C: HttpClient>(client: &C, source: &str, path: &Path) -> Result<PollSummary> {
    let existing = if path.exists() {
        info!(path = %path.display(), "Reading from existing snapshot");
        read_snapshot(path)?
    } else {
        Vec::new()
    };
    let existing_count = existing.len();

    let bytes = load_feed(client, source).await?;
    let feed = parse_feed(&bytes)?;
    let updates = extract_trip_updates(&feed)?;
    let fetched = updates.len();
    info!(count = fetched, "Got trip updates");

    let merged = merge_snapshot(existing, updates);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    info!(path = %path.display(), rows = merged.len(), "Writing snapshot");
    write_snapshot(path, &merged)?;

    Ok(PollSummary {
        path: path.to_path_buf(),
        existing: existing_count,
        fetched,
        written: merged.len(),
    })
}
