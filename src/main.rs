//! CLI entry point for the air quality pipeline.
//!
//! Provides subcommands for fetching raw OpenAQ measurements for a city,
//! cleaning a raw CSV into daily per-pollutant averages with AQI scores,
//! running both steps end to end, and scoring a single concentration.

mod infra;
mod services;

use crate::infra::openaq::client::OpenAqClient;
use crate::services::measurements_api::{MeasurementQuery, MeasurementsApi};
use air_quality_pipeline::analyzers::aqi::AqiCategory;
use air_quality_pipeline::{
    calculate_aqi,
    config::Settings,
    fetch::{BasicClient, auth::ApiKey},
    output::{print_json, print_pretty, save_daily_aggregates, save_raw_table},
    pipeline::{PipelineOutput, process_file, process_table},
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "air_quality_pipeline")]
#[command(about = "Daily air quality averages and AQI from OpenAQ measurements", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch raw measurements for a city and save them as CSV
    Fetch {
        /// City name to fetch data for
        #[arg(short, long)]
        city: String,

        /// Number of days of data to include
        #[arg(short, long, default_value_t = 3)]
        days: u32,

        /// Maximum number of records to fetch
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,

        /// Directory for raw CSVs (defaults to RAW_DIR)
        #[arg(long)]
        raw_dir: Option<PathBuf>,
    },
    /// Clean a raw CSV into daily averages with AQI
    Clean {
        /// Raw CSV written by `fetch`
        #[arg(value_name = "RAW_FILE")]
        raw_file: PathBuf,

        /// City name used in the output file name
        #[arg(short, long)]
        city: String,

        /// Directory for processed CSVs (defaults to PROCESSED_DIR)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also log the aggregates as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Fetch, clean and save in one go
    Run {
        /// City name to fetch data for
        #[arg(short, long)]
        city: String,

        /// Number of days of data to include
        #[arg(short, long, default_value_t = 3)]
        days: u32,

        /// Maximum number of records to fetch
        #[arg(short, long, default_value_t = 1000)]
        limit: usize,
    },
    /// Compute the AQI for a single concentration
    Aqi {
        /// Pollutant parameter, e.g. pm25 or no2
        parameter: String,

        /// Concentration in the table's unit (µg/m³ for pm25, ppb for no2)
        #[arg(allow_negative_numbers = true)]
        concentration: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/air_quality_pipeline.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("air_quality_pipeline.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("RUST_LOG")
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::DEBUG.into())
                .with_env_var("RUST_LOG_JSON")
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Commands::Fetch {
            city,
            days,
            limit,
            raw_dir,
        } => {
            let raw_dir = raw_dir.unwrap_or_else(|| settings.raw_dir.clone());
            let api = build_api(&settings)?;
            let query = MeasurementQuery::last_days(&city, days, limit, &settings.parameters);

            let table = api.fetch_measurements(&query).await?;
            if table.is_empty() {
                info!(city = %city, "Nothing to save");
            } else {
                save_raw_table(&raw_dir, &city, &table)?;
            }
        }
        Commands::Clean {
            raw_file,
            city,
            output_dir,
            json,
        } => {
            let output_dir = output_dir.unwrap_or_else(|| settings.processed_dir.clone());
            let output = process_file(&raw_file)?;

            finish(&output_dir, &city, &output, json)?;
        }
        Commands::Run { city, days, limit } => {
            run(&settings, &city, days, limit).await?;
        }
        Commands::Aqi {
            parameter,
            concentration,
        } => match calculate_aqi(&parameter, concentration) {
            Some(aqi) => println!("{parameter} {concentration}: AQI {aqi} ({})", AqiCategory::from_aqi(aqi)),
            None => println!("{parameter} {concentration}: AQI undefined"),
        },
    }

    Ok(())
}

/// Builds the OpenAQ client, adding the API key header when one is configured.
fn build_api(settings: &Settings) -> Result<Box<dyn MeasurementsApi>> {
    let http = BasicClient::new(settings.timeout)?;

    let api: Box<dyn MeasurementsApi> = match &settings.api_key {
        Some(key) => Box::new(OpenAqClient::new(
            ApiKey::openaq(http, key)?,
            &settings.base_url,
        )),
        None => Box::new(OpenAqClient::new(http, &settings.base_url)),
    };

    Ok(api)
}

/// Fetches the last `days` days for `city`, keeps the raw CSV, then cleans,
/// aggregates and saves the daily file.
#[tracing::instrument(skip(settings))]
async fn run(settings: &Settings, city: &str, days: u32, limit: usize) -> Result<()> {
    let api = build_api(settings)?;
    let query = MeasurementQuery::last_days(city, days, limit, &settings.parameters);

    let table = api.fetch_measurements(&query).await?;
    if table.is_empty() {
        info!("Nothing to process");
        return Ok(());
    }

    save_raw_table(&settings.raw_dir, city, &table)?;
    let output = process_table(&table);

    finish(&settings.processed_dir, city, &output, false)
}

fn finish(dir: &Path, city: &str, output: &PipelineOutput, json: bool) -> Result<()> {
    if output.aggregates.is_empty() {
        warn!(
            input_rows = output.stats.input_rows,
            dropped_rows = output.stats.dropped_rows(),
            "No daily aggregates produced"
        );
        return Ok(());
    }

    print_pretty(&output.aggregates);
    if json {
        print_json(&output.aggregates)?;
    }

    for aggregate in &output.aggregates {
        if let Some(aqi) = aggregate.aqi {
            info!(
                date = %aggregate.date,
                parameter = %aggregate.parameter,
                value = aggregate.value,
                aqi,
                category = %AqiCategory::from_aqi(aqi),
                "Daily AQI"
            );
        }
    }

    save_daily_aggregates(dir, city, &output.aggregates)?;
    Ok(())
}
