//! CLI entry point for the listing insights tool.
//!
//! Each subcommand runs one load cycle for a dashboard view: the needed
//! datasets are loaded, filtered and aggregated, and the resulting series is
//! logged as JSON and optionally exported to CSV.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use listing_insights::{
    aggregate::BucketOrder,
    config::{AppConfig, ViewThresholds},
    cycle::{CycleGuard, run_cycle},
    dataset::{City, DatasetId, Period},
    fetch::SourceRoot,
    loader::{DatasetSelection, LoadOutcome, Loader},
    output::{print_json, print_pretty, write_buckets, write_rows},
    parser::DistancePolicy,
    views::{Metric, city_metrics, price_distance_series, superhost_comparison, value_matrix_points},
};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt::Debug;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "listing_insights")]
#[command(about = "Aggregate rental-listing datasets into dashboard series", long_about = None)]
struct Cli {
    /// Directory or base URL holding `<city>_<period>.csv` files
    #[arg(long, global = true)]
    data_root: Option<String>,

    /// Maximum number of source files read at once
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// JSON file overriding the view thresholds
    #[arg(long, global = true)]
    thresholds: Option<String>,

    /// Also export the resulting rows to this CSV file
    #[arg(long, global = true)]
    csv: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mean price per distance bin for one city and period
    PriceDistance {
        #[arg(short, long, default_value = "amsterdam")]
        city: City,

        /// Use the weekend dataset instead of weekdays
        #[arg(short, long, default_value_t = false)]
        weekend: bool,
    },
    /// Price vs guest satisfaction points for one city, both periods
    ValueMatrix {
        #[arg(short, long, default_value = "amsterdam")]
        city: City,
    },
    /// Superhost vs non-superhost mean prices across all cities
    Superhost,
    /// Per-city cost, family or distance metric across all cities
    CityMetrics {
        #[arg(short, long, default_value = "cost")]
        metric: Metric,

        /// asc, desc or discovery
        #[arg(short, long, default_value = "asc")]
        sort: BucketOrder,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    let config = AppConfig::from_env()?;

    // Logging setup: colored stderr + JSON rolling log file
    let log_dir = Path::new(&config.log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&config.log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("listing_insights.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

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
        .init();

    let cli = Cli::parse();

    let data_root = cli.data_root.unwrap_or(config.data_root);
    let concurrency = cli.concurrency.unwrap_or(config.concurrency);
    let thresholds = match &cli.thresholds {
        Some(path) => ViewThresholds::load(path)?,
        None => ViewThresholds::default(),
    };
    info!(data_root = %data_root, concurrency, ?thresholds, "Configuration resolved");

    let loader = Loader::basic(SourceRoot::parse(&data_root)).with_concurrency(concurrency);
    let csv = cli.csv.as_deref();

    match cli.command {
        Commands::PriceDistance { city, weekend } => {
            let selection =
                DatasetSelection::One(DatasetId::new(city, Period::from_weekend(weekend)));
            let series = cycle(&loader, selection, |outcome| {
                price_distance_series(&outcome.records, &thresholds)
            })
            .await?;
            if let Some(path) = csv {
                write_buckets(path, &series)?;
            }
        }
        Commands::ValueMatrix { city } => {
            let loader = loader.with_distance_policy(DistancePolicy::DefaultZero);
            let points = cycle(&loader, DatasetSelection::City(city), |outcome| {
                value_matrix_points(&outcome.records, &thresholds)
            })
            .await?;
            if let Some(path) = csv {
                write_rows(path, &points)?;
            }
        }
        Commands::Superhost => {
            let comparison = cycle(&loader, DatasetSelection::AllCities, |outcome| {
                superhost_comparison(&outcome.records, &outcome.loaded)
            })
            .await?;
            if let Some(path) = csv {
                let cities: Vec<_> = comparison
                    .bars
                    .iter()
                    .flat_map(|bar| bar.cities.iter().copied())
                    .collect();
                write_buckets(path, &cities)?;
            }
        }
        Commands::CityMetrics { metric, sort } => {
            info!(metric = metric.label(), description = metric.description(), "Metric selected");
            let metrics = cycle(&loader, DatasetSelection::AllCities, |outcome| {
                city_metrics(&outcome.records, metric, sort)
            })
            .await?;
            if let Some(path) = csv {
                write_rows(path, &metrics)?;
            }
        }
    }

    Ok(())
}

/// Runs a single load cycle for a view and logs its published result.
async fn cycle<T, F>(loader: &Loader, selection: DatasetSelection, view: F) -> Result<T>
where
    T: Serialize + Debug + Clone,
    F: FnOnce(&LoadOutcome) -> T,
{
    let guard = CycleGuard::new();
    let Some(snapshot) = run_cycle(&guard, loader, selection, |outcome| {
        if outcome.is_empty() {
            warn!(failures = outcome.failures.len(), "No listings loaded");
        }
        view(outcome)
    })
    .await
    else {
        bail!("load cycle was superseded");
    };

    info!(
        generation = snapshot.generation,
        completed_at = %snapshot.completed_at,
        "View ready"
    );
    print_pretty(&snapshot.value);
    print_json(&snapshot.value)?;
    Ok(snapshot.value.clone())
}
