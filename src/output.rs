//! Output formatting and persistence for daily aggregates.
//!
//! Supports pretty-printing, JSON logging, and CSV files for both the raw
//! tables coming back from a fetch and the processed daily aggregates.

use anyhow::Result;
use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::analyzers::types::DailyAggregate;
use crate::parser::RawTable;

/// Logs aggregates using Rust's debug pretty-print format.
pub fn print_pretty(aggregates: &[DailyAggregate]) {
    debug!("{:#?}", aggregates);
}

/// Logs aggregates as pretty-printed JSON.
pub fn print_json(aggregates: &[DailyAggregate]) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(aggregates)?);
    Ok(())
}

/// Writes aggregates to `path`, replacing any existing file.
///
/// Columns: `city,country,parameter,unit,date,value,aqi`. A missing AQI is
/// an empty cell.
pub fn write_aggregates(path: &Path, aggregates: &[DailyAggregate]) -> Result<()> {
    debug!(path = %path.display(), rows = aggregates.len(), "Writing daily aggregates");

    let file = File::create(path)?;
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);

    if aggregates.is_empty() {
        writer.write_record(["city", "country", "parameter", "unit", "date", "value", "aqi"])?;
    }
    for aggregate in aggregates {
        writer.serialize(aggregate)?;
    }
    writer.flush()?;

    Ok(())
}

/// Reads aggregates previously written by [`write_aggregates`].
pub fn read_aggregates(path: &Path) -> Result<Vec<DailyAggregate>> {
    let mut rdr = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: DailyAggregate = result?;
        rows.push(record);
    }

    Ok(rows)
}

/// Writes a raw table to `path` as CSV, nulls as empty cells.
pub fn write_raw_table(path: &Path, table: &RawTable) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;

    Ok(())
}

/// Lowercases a city name and replaces whitespace so it is safe in a file name.
pub fn city_slug(city: &str) -> String {
    city.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn stamped_path(dir: &Path, city: &str, kind: &str, at: DateTime<Utc>) -> PathBuf {
    dir.join(format!(
        "{}_{}_{}.csv",
        city_slug(city),
        kind,
        at.format("%Y%m%dT%H%M%SZ")
    ))
}

/// Saves daily aggregates as `<dir>/<city>_daily_<UTC stamp>.csv`, creating
/// `dir` if needed. Returns the written path.
pub fn save_daily_aggregates(
    dir: &Path,
    city: &str,
    aggregates: &[DailyAggregate],
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = stamped_path(dir, city, "daily", Utc::now());

    write_aggregates(&path, aggregates)?;
    info!(path = %path.display(), rows = aggregates.len(), "Saved daily aggregates");

    Ok(path)
}

/// Saves a fetched raw table as `<dir>/<city>_air_quality_<UTC stamp>.csv`.
pub fn save_raw_table(dir: &Path, city: &str, table: &RawTable) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = stamped_path(dir, city, "air_quality", Utc::now());

    write_raw_table(&path, table)?;
    info!(path = %path.display(), rows = table.len(), "Saved raw measurements");

    Ok(path)
}
