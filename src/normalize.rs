//! Normalizer: raw tables in, cleaned measurements out.
//!
//! Column names are case-folded with `.` replaced by `_`, so `date.utc` and
//! `DATE_UTC` are the same column. Duplicate rows, rows missing a mandatory
//! field and rows whose value or timestamp cannot be parsed are dropped and
//! counted; nothing about the data itself is ever an error.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use tracing::{debug, info, warn};

use crate::analyzers::types::CleanedMeasurement;
use crate::error::{PipelineError, Result};
use crate::parser::{RawTable, read_csv};
use crate::stats::CleanStats;

pub const CITY: &str = "city";
pub const COUNTRY: &str = "country";
pub const PARAMETER: &str = "parameter";
pub const VALUE: &str = "value";
pub const UNIT: &str = "unit";
pub const DATE_UTC: &str = "date_utc";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Output of [`clean_table`]: the surviving rows and what happened to the rest.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub measurements: Vec<CleanedMeasurement>,
    pub stats: CleanStats,
}

/// Case-folds a column name and turns `.` separators into `_`.
pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase().replace('.', "_")
}

/// Indices of the columns the pipeline reads. The first source column that
/// normalizes to a given name wins.
#[derive(Debug, Default)]
struct Columns {
    city: Option<usize>,
    country: Option<usize>,
    parameter: Option<usize>,
    value: Option<usize>,
    unit: Option<usize>,
    date_utc: Option<usize>,
}

impl Columns {
    fn locate(headers: &[String]) -> Self {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_column(h)).collect();
        let find = |name: &str| normalized.iter().position(|h| h == name);

        Self {
            city: find(CITY),
            country: find(COUNTRY),
            parameter: find(PARAMETER),
            value: find(VALUE),
            unit: find(UNIT),
            date_utc: find(DATE_UTC),
        }
    }

    fn missing_mandatory(&self) -> Vec<&'static str> {
        [
            (PARAMETER, self.parameter),
            (VALUE, self.value),
            (DATE_UTC, self.date_utc),
        ]
        .into_iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

fn field(row: &[Option<String>], col: Option<usize>) -> Option<&str> {
    col.and_then(|i| row.get(i))
        .and_then(|c| c.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// A cell as the duplicate check sees it. In a column where every non-empty
/// cell is a number, cells compare by value, so `15` and `15.0` match.
#[derive(Debug, PartialEq, Eq, Hash)]
enum CellKey<'a> {
    Null,
    Number(u64),
    Text(&'a str),
}

fn numeric_columns(table: &RawTable) -> Vec<bool> {
    (0..table.headers.len())
        .map(|col| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(col).and_then(|c| c.as_deref()))
                .all(|c| c.trim().parse::<f64>().is_ok())
        })
        .collect()
}

fn row_key<'a>(row: &'a [Option<String>], numeric: &[bool]) -> Vec<CellKey<'a>> {
    row.iter()
        .zip(numeric)
        .map(|(cell, &is_numeric)| match cell.as_deref().map(str::trim) {
            None | Some("") => CellKey::Null,
            Some(text) if is_numeric => match text.parse::<f64>() {
                Ok(v) if v.is_nan() => CellKey::Null,
                // -0.0 and 0.0 are the same reading
                Ok(v) if v == 0.0 => CellKey::Number(0f64.to_bits()),
                Ok(v) => CellKey::Number(v.to_bits()),
                Err(_) => CellKey::Text(text),
            },
            Some(text) => CellKey::Text(text),
        })
        .collect()
}

fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a timestamp into a UTC instant.
///
/// Offsets are converted to UTC; timestamps without an offset are taken to
/// already be UTC, and a bare date means midnight UTC.
pub fn parse_utc_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = s
        .strip_suffix('Z')
        .or_else(|| s.strip_suffix('z'))
        .unwrap_or(s);
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// Cleans a raw table into measurements ready for aggregation.
///
/// Steps, in order: drop duplicate rows (first occurrence kept; numeric
/// columns compare by value), drop
/// rows missing `parameter`, `value` or `date_utc`, drop rows whose value is
/// not a finite number, drop rows whose timestamp does not parse. Each
/// survivor gets its UTC calendar date attached.
pub fn clean_table(table: &RawTable) -> NormalizedBatch {
    let columns = Columns::locate(&table.headers);
    let mut stats = CleanStats {
        input_rows: table.len(),
        ..Default::default()
    };

    if table.is_empty() {
        return NormalizedBatch {
            measurements: Vec::new(),
            stats,
        };
    }

    let missing = columns.missing_mandatory();
    if !missing.is_empty() {
        warn!(?missing, "Raw table lacks mandatory columns, every row will be dropped");
    }

    let numeric = numeric_columns(table);
    let mut seen: HashSet<Vec<CellKey<'_>>> = HashSet::with_capacity(table.len());
    let mut measurements = Vec::with_capacity(table.len());

    for row in &table.rows {
        if !seen.insert(row_key(row, &numeric)) {
            stats.duplicate_rows += 1;
            continue;
        }

        let (Some(parameter), Some(raw_value), Some(raw_timestamp)) = (
            field(row, columns.parameter),
            field(row, columns.value),
            field(row, columns.date_utc),
        ) else {
            stats.missing_fields += 1;
            continue;
        };

        let Some(value) = parse_value(raw_value) else {
            stats.invalid_values += 1;
            continue;
        };

        let Some(timestamp) = parse_utc_timestamp(raw_timestamp) else {
            stats.invalid_timestamps += 1;
            continue;
        };

        measurements.push(CleanedMeasurement {
            city: field(row, columns.city).map(str::to_string),
            country: field(row, columns.country).map(str::to_string),
            parameter: parameter.to_string(),
            value,
            unit: field(row, columns.unit).map(str::to_string),
            timestamp,
            date: timestamp.date_naive(),
        });
    }

    stats.cleaned_rows = measurements.len();

    debug!(
        duplicates = stats.duplicate_rows,
        missing_fields = stats.missing_fields,
        invalid_values = stats.invalid_values,
        invalid_timestamps = stats.invalid_timestamps,
        "Dropped rows by reason"
    );
    info!(
        input_rows = stats.input_rows,
        cleaned_rows = stats.cleaned_rows,
        dropped_pct = stats.dropped_pct(),
        "Normalized raw table"
    );

    NormalizedBatch {
        measurements,
        stats,
    }
}

/// Reads a raw CSV file and cleans it with [`clean_table`].
///
/// # Errors
///
/// [`PipelineError::InputNotFound`] if `path` does not exist; CSV or I/O
/// errors if it exists but cannot be read. An empty file is not an error.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn clean_file(path: impl AsRef<Path>) -> Result<NormalizedBatch> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(PipelineError::InputNotFound(path.to_path_buf()));
    }

    let table = read_csv(path)?;
    if table.is_empty() {
        info!("No data found in raw file");
    }

    Ok(clean_table(&table))
}
