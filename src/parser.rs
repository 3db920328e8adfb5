//! Parsers turning raw payloads into a [`RawTable`].
//!
//! Two shapes arrive from the outside world: CSV files written by a previous
//! fetch, and the JSON body of the OpenAQ measurements endpoint. Both end up
//! as the same loosely typed table so the normalizer never has to care where
//! a row came from.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;

/// A raw tabular record set: ordered column names plus rows of nullable cells.
///
/// Every row has exactly `headers.len()` cells. Empty cells are `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Builds a table, padding or truncating each row to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn cell(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parses CSV bytes with a header row into a [`RawTable`].
///
/// Zero bytes or a header-only file give an empty table.
///
/// # Errors
///
/// Returns an error if the bytes are not readable as CSV (e.g. invalid UTF-8).
pub fn parse_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(cell).collect());
    }

    debug!(columns = headers.len(), rows = rows.len(), "Parsed CSV table");
    Ok(RawTable::new(headers, rows))
}

/// Reads a CSV file from disk and parses it with [`parse_csv`].
pub fn read_csv(path: &Path) -> Result<RawTable> {
    let bytes = std::fs::read(path)?;
    parse_csv(&bytes)
}

/// Decodes an OpenAQ-style JSON payload into a [`RawTable`].
///
/// Accepts either `{"results": [...]}` or a bare array of records. Nested
/// objects are flattened with `.` between key segments, so
/// `{"date": {"utc": ..}}` becomes the column `date.utc`. Arrays are kept as
/// their JSON text.
pub fn parse_json_results(bytes: &[u8]) -> Result<RawTable> {
    let payload: Value = serde_json::from_slice(bytes)?;

    let records = match &payload {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("results")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };

    let mut headers: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows = Vec::with_capacity(records.len());

    for record in records {
        let mut flat = Vec::new();
        flatten("", record, &mut flat);

        let mut row = vec![None; headers.len()];
        for (name, value) in flat {
            let col = *index.entry(name.clone()).or_insert_with(|| {
                headers.push(name);
                headers.len() - 1
            });
            if col >= row.len() {
                row.resize(col + 1, None);
            }
            row[col] = value;
        }
        rows.push(row);
    }

    debug!(columns = headers.len(), rows = rows.len(), "Parsed JSON results");
    Ok(RawTable::new(headers, rows))
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, Option<String>)>) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                let name = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&name, inner, out);
            }
        }
        Value::Null => out.push((prefix.to_string(), None)),
        Value::String(s) => out.push((prefix.to_string(), cell(s))),
        Value::Number(n) => out.push((prefix.to_string(), Some(n.to_string()))),
        Value::Bool(b) => out.push((prefix.to_string(), Some(b.to_string()))),
        Value::Array(_) => out.push((prefix.to_string(), Some(value.to_string()))),
    }
}
