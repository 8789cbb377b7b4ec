//! CLI entry point for the Metro ridership tools.
//!
//! `transform` builds the rail and bus recovery tables from a ridership
//! extract; `poll-trip-updates` merges one Swiftly trip-update fetch into
//! today's snapshot.

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use metro_ridership::ridership::{self, baseline::BaselineWindow, routes::RouteCatalog};
use metro_ridership::trip_updates::{
    poller::{self, API_KEY_ENV, DEFAULT_SNAPSHOT_DIR, PollerConfig, SWIFTLY_TRIP_UPDATES_URL},
    snapshot::pacific_today,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "metro_ridership")]
#[command(about = "LA Metro ridership recovery tables and trip-update snapshots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build rail and bus comparison tables from a ridership extract
    Transform {
        /// Parquet (or .csv) file with year, month, line, Day Type and Estimated Ridership
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Directory the four output files are written to
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Baseline year to compare against; repeat for several
        #[arg(long = "baseline-year", value_name = "YEAR", default_values_t = [2019, 2018])]
        baseline_years: Vec<i32>,
    },
    /// Fetch trip updates once and merge them into today's snapshot
    PollTripUpdates {
        /// Feed URL, or a file holding a saved feed
        #[arg(long, value_name = "URL_OR_FILE", default_value = SWIFTLY_TRIP_UPDATES_URL)]
        endpoint: String,

        /// Directory holding the daily snapshot files
        #[arg(long, default_value = DEFAULT_SNAPSHOT_DIR)]
        snapshot_dir: PathBuf,
    },
}

/// Colored stderr output plus a JSON daily rolling log file.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_tracing() -> Result<WorkerGuard> {
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/metro_ridership.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("metro_ridership.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .try_init()?;

    Ok(file_guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let _file_guard = init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Transform {
            input,
            output_dir,
            baseline_years,
        } => {
            let catalog = RouteCatalog::la_metro()?;
            let window = BaselineWindow::new(baseline_years)?;
            ridership::run(&input, &output_dir, &catalog, &window)
                .with_context(|| format!("transform of {} failed", input.display()))?;
        }
        Commands::PollTripUpdates {
            endpoint,
            snapshot_dir,
        } => {
            let config = PollerConfig {
                source: endpoint,
                api_key: std::env::var(API_KEY_ENV).ok(),
                snapshot_dir,
            };
            let today = pacific_today(Utc::now());
            let summary = poller::run(&config, today).await?;

            info!(
                path = %summary.path.display(),
                existing = summary.existing,
                fetched = summary.fetched,
                written = summary.written,
                "Snapshot updated"
            );
        }
    }

    Ok(())
}
